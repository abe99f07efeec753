/// Ready-state transitions: idempotence, controlled-entity spawn,
/// late-join full sync, not-ready teardown and disconnect cleanup.
use tether_manager::{GameConfig, GameManager, SyncInit};
use tether_shared::{
    game_msg, ByteReader, DestroyReason, ElementInfo, Rotation, Serde, SpawnObjectMessage, Vec3,
};
use tether_test::helpers::{
    self, HandlerLog, PacketLog, ReplicaLog, ScriptedHandler, TestReplica,
};

const PLAYER_ASSET: u32 = 7;

fn server_with_player_asset(replica_log: &ReplicaLog) -> (GameManager, PacketLog, HandlerLog) {
    let handler_log = HandlerLog::default();
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&handler_log)),
        0,
    );
    manager.start_server();
    let factory_log = replica_log.clone();
    manager
        .registry_mut()
        .register_prefab(PLAYER_ASSET, move || Box::new(TestReplica::new(&factory_log)));
    manager.registry_mut().set_player_asset(PLAYER_ASSET);
    (manager, packets, handler_log)
}

fn ready(manager: &mut GameManager, connection_id: u64) {
    manager.receive_server_message(connection_id, &helpers::empty_packet(game_msg::CLIENT_READY));
}

#[test]
fn second_ready_is_a_no_op() {
    let replica_log = ReplicaLog::default();
    let (mut manager, packets, _) = server_with_player_asset(&replica_log);
    manager.on_peer_connected(1);
    packets.clear();

    ready(&mut manager, 1);
    ready(&mut manager, 1);

    assert_eq!(manager.registry().len(), 1, "one controlled entity");
    assert_eq!(packets.count_of_type_to(1, game_msg::SERVER_SPAWN_OBJECT), 1);

    let player = manager.player(1).unwrap();
    assert!(player.is_ready());
    assert_eq!(player.subscribing_count(), 1);
    assert_eq!(player.owned_count(), 1);
}

#[test]
fn controlled_entity_is_spawned_as_owner() {
    let replica_log = ReplicaLog::default();
    let (mut manager, packets, handler_log) = server_with_player_asset(&replica_log);
    manager.on_peer_connected(1);
    packets.clear();

    ready(&mut manager, 1);

    let spawns: Vec<_> = packets
        .sent_to(1)
        .into_iter()
        .filter(|packet| packet.msg_type() == game_msg::SERVER_SPAWN_OBJECT)
        .collect();
    assert_eq!(spawns.len(), 1);
    let mut reader = ByteReader::new(spawns[0].body());
    let message = SpawnObjectMessage::de(&mut reader).unwrap();
    assert_eq!(message.hash_asset_id, PLAYER_ASSET);
    assert!(message.is_owner);

    // the ready-extra hook saw the freshly spawned entity
    let extras = handler_log.events().ready_extras;
    assert_eq!(extras.len(), 1);
    assert_eq!(extras[0].0, Some(message.object_id));
    assert_eq!(extras[0].1, 1);
}

#[test]
fn ready_extra_payload_travels_from_client_to_server() {
    // client side serializes the extra payload into Ready
    let client_handler_log = HandlerLog::default();
    let client_handler =
        ScriptedHandler::new(&client_handler_log).with_ready_extra(vec![0xC0, 0xFF]);
    let (mut client, client_packets, _) =
        helpers::manager_with(GameConfig::default(), Box::new(client_handler), 0);
    client.start_client();
    client.on_client_connected();
    client.send_client_ready();

    let ready_packet = client_packets
        .sent_to(0)
        .into_iter()
        .find(|packet| packet.msg_type() == game_msg::CLIENT_READY)
        .expect("client sent Ready");

    // server side hands it to the deserialize hook
    let replica_log = ReplicaLog::default();
    let (mut server, _, server_handler_log) = server_with_player_asset(&replica_log);
    server.on_peer_connected(3);
    server.receive_server_message(3, &ready_packet.payload);

    let extras = server_handler_log.events().ready_extras;
    assert_eq!(extras.len(), 1);
    assert_eq!(extras[0].1, 3);
    assert_eq!(extras[0].2, vec![0xC0, 0xFF]);
}

#[test]
fn late_joiner_receives_spawn_then_full_state_for_accepted_entities_only() {
    let replica_log = ReplicaLog::default();
    let handler_log = HandlerLog::default();
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&handler_log)),
        0,
    );
    manager.start_server();

    let stateful_log = replica_log.clone();
    manager.registry_mut().register_prefab(20, move || {
        Box::new(
            TestReplica::new(&stateful_log)
                .with_initial_fields(vec![SyncInit::new(0, 1, vec![0xAA])])
                .with_initial_lists(vec![SyncInit::new(0, 2, vec![0xBB, 0xBC])]),
        )
    });
    let picky_log = replica_log.clone();
    manager
        .registry_mut()
        .register_prefab(21, move || {
            Box::new(TestReplica::new(&picky_log).accepting_only(&[2]))
        });

    let accepted = manager
        .server_spawn(20, Vec3::new(1.0, 0.0, 0.0), Rotation::IDENTITY, 0)
        .unwrap();
    let rejected = manager
        .server_spawn(21, Vec3::ZERO, Rotation::IDENTITY, 0)
        .unwrap();

    manager.on_peer_connected(1);
    packets.clear();
    ready(&mut manager, 1);

    assert_eq!(
        packets.msg_types_to(1),
        vec![
            game_msg::SERVER_SPAWN_OBJECT,
            game_msg::SERVER_UPDATE_SYNC_FIELD,
            game_msg::SERVER_UPDATE_SYNC_LIST,
        ],
        "spawn first, then the complete state dump"
    );

    let sent = packets.sent_to(1);
    let mut reader = ByteReader::new(sent[0].body());
    let spawn = SpawnObjectMessage::de(&mut reader).unwrap();
    assert_eq!(spawn.object_id, accepted);
    assert!(!spawn.is_owner);

    let mut reader = ByteReader::new(sent[1].body());
    let info = ElementInfo::de(&mut reader).unwrap();
    assert_eq!(info, ElementInfo::new(accepted, 0, 1));
    assert_eq!(reader.take_remaining(), &[0xAA]);

    let mut reader = ByteReader::new(sent[2].body());
    let info = ElementInfo::de(&mut reader).unwrap();
    assert_eq!(info, ElementInfo::new(accepted, 0, 2));
    assert_eq!(reader.take_remaining(), &[0xBB, 0xBC]);

    let player = manager.player(1).unwrap();
    assert!(player.is_subscribed(accepted));
    assert!(!player.is_subscribed(rejected));
}

#[test]
fn sync_field_updates_reach_ready_subscribers_only() {
    let replica_log = ReplicaLog::default();
    let (mut manager, packets, _) = server_with_player_asset(&replica_log);
    manager.on_peer_connected(1);
    manager.on_peer_connected(2);
    ready(&mut manager, 1);
    // the controlled entity is the only spawned one
    assert_eq!(manager.player(1).unwrap().owned_count(), 1);
    let object_id = manager.registry().object_ids()[0];
    packets.clear();

    manager.server_update_sync_field(ElementInfo::new(object_id, 1, 4), &[0x11, 0x22]);

    assert_eq!(
        packets.count_of_type_to(1, game_msg::SERVER_UPDATE_SYNC_FIELD),
        1
    );
    assert!(packets.sent_to(2).is_empty(), "non-subscriber hears nothing");
}

#[test]
fn not_ready_clears_subscriptions_and_destroys_owned() {
    let replica_log = ReplicaLog::default();
    let (mut manager, packets, _) = server_with_player_asset(&replica_log);
    manager.on_peer_connected(1);
    manager.on_peer_connected(2);
    ready(&mut manager, 1);
    ready(&mut manager, 2);
    packets.clear();

    manager.receive_server_message(1, &helpers::empty_packet(game_msg::CLIENT_NOT_READY));

    let player = manager.player(1).unwrap();
    assert!(!player.is_ready());
    assert_eq!(player.subscribing_count(), 0);
    assert_eq!(player.owned_count(), 0);

    // the other player was told about the destroyed controlled entity
    assert_eq!(packets.count_of_type_to(2, game_msg::SERVER_DESTROY_OBJECT), 1);
    // the leaver itself hears nothing
    assert!(packets.sent_to(1).is_empty());

    // idempotent
    packets.clear();
    manager.receive_server_message(1, &helpers::empty_packet(game_msg::CLIENT_NOT_READY));
    assert_eq!(packets.count(), 0);
}

#[test]
fn disconnect_destroys_owned_entities_and_removes_the_player() {
    let replica_log = ReplicaLog::default();
    let handler_log = HandlerLog::default();
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&handler_log)),
        0,
    );
    manager.start_server();
    let factory_log = replica_log.clone();
    manager
        .registry_mut()
        .register_prefab(7, move || Box::new(TestReplica::new(&factory_log)));
    manager.on_peer_connected(1);
    manager.on_peer_connected(2);
    ready(&mut manager, 1);
    ready(&mut manager, 2);

    let mut owned = Vec::new();
    for _ in 0..3 {
        owned.push(
            manager
                .server_spawn(7, Vec3::ZERO, Rotation::IDENTITY, 1)
                .unwrap(),
        );
    }
    assert_eq!(manager.registry().len(), 3);
    packets.clear();

    manager.on_peer_disconnected(1);

    assert!(manager.player(1).is_none(), "player record removed");
    assert_eq!(manager.player_count(), 1);
    assert!(manager.registry().is_empty(), "all owned entities destroyed");
    for object_id in &owned {
        assert_eq!(
            replica_log.state(*object_id).destroyed,
            Some(DestroyReason::RequestedToDestroy)
        );
    }
    assert_eq!(packets.count_of_type_to(2, game_msg::SERVER_DESTROY_OBJECT), 3);
    assert!(
        packets.sent_to(1).is_empty(),
        "no traffic to the disconnecting peer"
    );
}

#[test]
fn entities_tick_over_a_stable_snapshot() {
    let replica_log = ReplicaLog::default();
    let setup_log = replica_log.clone();
    let handler = ScriptedHandler::new(&HandlerLog::default()).with_setup(move |_, registry| {
        registry.register_scene_object(
            10,
            Box::new(TestReplica::new(&setup_log)),
            Vec3::ZERO,
            Rotation::IDENTITY,
        );
        let destroyer_log = setup_log.clone();
        registry.register_scene_object(
            20,
            Box::new(
                TestReplica::new(&destroyer_log)
                    .destroying_on_update(10, DestroyReason::RequestedToDestroy),
            ),
            Vec3::ZERO,
            Rotation::IDENTITY,
        );
    });
    let (mut manager, _packets, _loads) =
        helpers::manager_with(GameConfig::default(), Box::new(handler), 0);
    manager.start_server();

    manager.update(0.1);
    // both ran on the snapshot taken before the destroy applied
    assert_eq!(replica_log.state(10).update_ticks, 1);
    assert_eq!(replica_log.state(20).update_ticks, 1);
    assert_eq!(
        replica_log.state(10).destroyed,
        Some(DestroyReason::RequestedToDestroy)
    );

    manager.update(0.1);
    assert_eq!(replica_log.state(10).update_ticks, 1, "destroyed, no longer ticked");
    assert_eq!(replica_log.state(20).update_ticks, 2);
}
