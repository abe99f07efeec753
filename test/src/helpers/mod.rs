
pub use mock_transport::{PacketLog, RecordingTransport, SentPacket};
pub use scripted_loader::{LoadLog, ScriptedLoader};
pub use test_handler::{HandlerEvents, HandlerLog, ScriptedHandler};
pub use test_replica::{ReplicaLog, ReplicaState, TestReplica};

use tether_manager::{GameConfig, GameHandler, GameManager};
use tether_shared::{ByteWriter, Serde};

/// Builds a manager wired to a recording transport and a scripted loader,
/// handing back the log ends of both.
pub fn manager_with(
    config: GameConfig,
    handler: Box<dyn GameHandler>,
    polls_per_load: u32,
) -> (GameManager, PacketLog, LoadLog) {
    let (transport, packets) = mock_transport::recording_transport();
    let (loader, loads) = scripted_loader::scripted_loader(polls_per_load);
    let manager = GameManager::new(config, transport, loader, handler);
    (manager, packets, loads)
}

/// Ticks the manager until the in-flight scene transition settles.
pub fn drive_until_idle(manager: &mut GameManager) {
    for _ in 0..64 {
        if !manager.is_scene_loading() {
            return;
        }
        manager.update(0.1);
    }
    panic!("scene transition never settled");
}

/// Wire packet with the given type and no body.
pub fn empty_packet(msg_type: u16) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(msg_type);
    writer.to_bytes()
}

/// Wire packet with the given type and a serialized body.
pub fn message_packet<M: Serde>(msg_type: u16, message: &M) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(msg_type);
    message.ser(&mut writer);
    writer.to_bytes()
}

/// Message type prefix of a recorded wire packet.
pub fn msg_type_of(payload: &[u8]) -> u16 {
    u16::from_le_bytes([payload[0], payload[1]])
}
