/// Dispatch-boundary error containment: unknown types, short packets and
/// malformed bodies are dropped per message, never fatal; role gating and
/// the server error report.
use tether_manager::GameConfig;
use tether_shared::{game_msg, ByteWriter, Rotation, SpawnObjectMessage, Vec3};
use tether_test::helpers::{self, HandlerLog, ReplicaLog, ScriptedHandler, TestReplica};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn unknown_message_types_are_dropped_not_fatal() {
    init_logs();
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_server();
    manager.on_peer_connected(1);
    packets.clear();

    // a type from a newer protocol revision
    manager.receive_server_message(1, &helpers::empty_packet(game_msg::HIGHEST + 10));
    assert_eq!(packets.count(), 0);

    // dispatch still works afterwards
    manager.receive_server_message(1, &helpers::empty_packet(game_msg::CLIENT_READY));
    assert!(manager.player(1).unwrap().is_ready());
}

#[test]
fn packets_without_a_full_type_prefix_are_dropped() {
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_server();
    manager.on_peer_connected(1);
    packets.clear();

    manager.receive_server_message(1, &[]);
    manager.receive_server_message(1, &[0x01]);
    assert_eq!(packets.count(), 0);
}

#[test]
fn malformed_bodies_only_kill_the_one_message() {
    let replica_log = ReplicaLog::default();
    let (mut manager, _packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_client();
    manager.on_client_connected();
    let factory_log = replica_log.clone();
    manager
        .registry_mut()
        .register_prefab(7, move || Box::new(TestReplica::new(&factory_log)));

    let spawn = helpers::message_packet(
        game_msg::SERVER_SPAWN_OBJECT,
        &SpawnObjectMessage {
            hash_asset_id: 7,
            object_id: 4,
            is_owner: false,
            position: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
        },
    );
    manager.receive_client_message(&spawn[..spawn.len() - 3]);
    assert!(manager.registry().is_empty(), "truncated spawn dropped");

    manager.receive_client_message(&spawn);
    assert!(manager.registry().contains(4), "intact spawn applied");
}

#[test]
fn roles_only_consume_their_own_message_space() {
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_server();
    manager.on_peer_connected(1);
    packets.clear();

    // a client-bound type arriving at the server table is unknown there
    manager.receive_server_message(1, &helpers::empty_packet(game_msg::SERVER_SPAWN_OBJECT));
    assert_eq!(packets.count(), 0);

    // and without the client role, client-bound dispatch is inert
    let beacon = helpers::empty_packet(game_msg::SERVER_TIME);
    manager.receive_client_message(&beacon);
}

#[test]
fn spawn_for_an_unregistered_asset_is_dropped() {
    let (mut manager, _packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_client();
    manager.on_client_connected();

    let spawn = helpers::message_packet(
        game_msg::SERVER_SPAWN_OBJECT,
        &SpawnObjectMessage {
            hash_asset_id: 404,
            object_id: 4,
            is_owner: false,
            position: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
        },
    );
    manager.receive_client_message(&spawn);
    assert!(manager.registry().is_empty());
}

#[test]
fn server_error_report_uses_its_own_message_type() {
    let (mut server, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    server.start_server();
    server.on_peer_connected(1);
    server.receive_server_message(1, &helpers::empty_packet(game_msg::CLIENT_READY));
    packets.clear();

    server.server_send_error(1, true, "incompatible protocol");

    let sent = packets.sent_to(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].msg_type(), game_msg::SERVER_ERROR);

    // client side: the hook fires and a disconnect request stops the client
    let handler_log = HandlerLog::default();
    let (mut client, _client_packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&handler_log)),
        0,
    );
    client.start_client();
    client.on_client_connected();
    client.receive_client_message(&sent[0].payload);

    assert_eq!(
        handler_log.events().server_errors,
        vec![(true, "incompatible protocol".to_string())]
    );
    assert!(!client.is_client(), "disconnect request stopped the client");
}

#[test]
fn errors_are_not_sent_to_players_that_are_not_ready() {
    let (mut server, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    server.start_server();
    server.on_peer_connected(1);
    packets.clear();

    server.server_send_error(1, false, "nope");
    assert_eq!(packets.count(), 0);
}

#[test]
fn custom_message_types_can_extend_the_protocol() {
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_server();
    manager.on_peer_connected(1);
    packets.clear();

    // appended after the reserved range, never renumbering existing values
    const CUSTOM_PING: u16 = game_msg::HIGHEST + 1;
    fn handle_ping(
        manager: &mut tether_manager::GameManager,
        connection_id: u64,
        reader: &mut tether_shared::ByteReader<'_>,
    ) -> Result<(), tether_manager::GameError> {
        let value = reader.read_u8()?;
        let mut writer = ByteWriter::new();
        writer.write_u16(CUSTOM_PING);
        writer.write_u8(value);
        let payload = writer.to_bytes();
        manager.server_send_raw(connection_id, &payload);
        Ok(())
    }
    manager.register_server_message(CUSTOM_PING, handle_ping);

    let mut writer = ByteWriter::new();
    writer.write_u16(CUSTOM_PING);
    writer.write_u8(0x77);
    manager.receive_server_message(1, writer.as_slice());

    let sent = packets.sent_to(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload[2], 0x77);
}
