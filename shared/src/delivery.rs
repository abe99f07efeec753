/// Delivery guarantee a message semantically requires. Honoring it is the
/// transport's job; this library only records which mode each send needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DeliveryMode {
    /// Arrives exactly once, in send order per sender. Lifecycle and
    /// dispatch-critical traffic.
    ReliableOrdered,
    /// Latest-wins: stale packets are dropped, delivery is not guaranteed.
    /// Clock beacons.
    Sequenced,
    /// Fire and forget. High-frequency transform uploads.
    Unreliable,
}
