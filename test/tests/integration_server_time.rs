/// The clock beacon: immediate send on connect, periodic rebroadcast,
/// client offset computation and the host short-circuit.
use tether_manager::GameConfig;
use tether_shared::{game_msg, DeliveryMode, ServerTimeMessage};
use tether_test::helpers::{self, HandlerLog, ScriptedHandler};

#[test]
fn beacon_is_the_first_thing_a_new_connection_receives() {
    let (mut manager, packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_server();

    manager.on_peer_connected(1);

    let sent = packets.sent_to(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].msg_type(), game_msg::SERVER_TIME);
    assert_eq!(sent[0].mode, DeliveryMode::Sequenced, "latest-wins delivery");
}

#[test]
fn beacon_repeats_on_the_configured_interval() {
    let config = GameConfig {
        server_time_interval: 5.0,
        ..GameConfig::default()
    };
    let (mut manager, packets, _loads) = helpers::manager_with(
        config,
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_server();
    manager.on_peer_connected(1);
    packets.clear();

    manager.update(2.0);
    assert_eq!(packets.count_of_type_to(1, game_msg::SERVER_TIME), 0);

    manager.update(4.0); // clock now past the interval
    assert_eq!(packets.count_of_type_to(1, game_msg::SERVER_TIME), 1);

    manager.update(1.0);
    assert_eq!(packets.count_of_type_to(1, game_msg::SERVER_TIME), 1, "not every tick");
}

#[test]
fn client_computes_its_offset_from_the_beacon() {
    let (mut manager, _packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_client();
    manager.on_client_connected();

    manager.update(2.0);
    let beacon = helpers::message_packet(
        game_msg::SERVER_TIME,
        &ServerTimeMessage { server_time: 42.0 },
    );
    manager.receive_client_message(&beacon);

    assert_eq!(manager.server_time_offset(), 40.0);
    manager.update(1.0);
    assert_eq!(manager.server_time(), 43.0);
}

#[test]
fn host_keeps_its_own_clock() {
    let (mut manager, _packets, _loads) = helpers::manager_with(
        GameConfig::default(),
        Box::new(ScriptedHandler::new(&HandlerLog::default())),
        0,
    );
    manager.start_host();
    manager.on_client_connected();
    manager.update(3.0);

    let beacon = helpers::message_packet(
        game_msg::SERVER_TIME,
        &ServerTimeMessage { server_time: 99.0 },
    );
    manager.receive_client_message(&beacon);

    assert_eq!(manager.server_time_offset(), 0.0);
    assert_eq!(manager.server_time(), 3.0);
}
