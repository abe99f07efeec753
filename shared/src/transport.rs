use crate::{delivery::DeliveryMode, types::ConnectionId};

/// The outbound half of whatever carries packets between peers. Implemented
/// by the consuming host process; this library's responsibility ends the
/// moment a payload is handed over. Connect/disconnect events flow the
/// other way, as calls into the manager.
pub trait Transport {
    fn send_to_one(&mut self, connection_id: ConnectionId, mode: DeliveryMode, payload: &[u8]);

    fn send_to_many(&mut self, connection_ids: &[ConnectionId], mode: DeliveryMode, payload: &[u8]);
}
