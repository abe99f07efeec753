use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Transport-level connection handle. Assigned by the transport, opaque to
/// this library.
pub type ConnectionId = u64;

/// Owner value for entities that belong to the server / the world rather
/// than to any connection.
pub const SERVER_OWNED: ConnectionId = 0;

/// Process-wide unique identifier of a networked entity. Assigned once by
/// the server-side registry and never reused while the process lives.
/// Passing `0` into a spawn operation asks the registry to allocate.
pub type ObjectId = u32;

/// Hash identifying the prefab/template a dynamic entity is instantiated
/// from on remote peers.
pub type AssetHash = u32;

/// Why an entity is being removed on the receiving side. The distinction
/// matters on a host (server + client in one process): losing a
/// subscription must hide the entity, not delete the authoritative record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DestroyReason {
    RequestedToDestroy,
    RemovedFromSubscribing,
}

impl DestroyReason {
    pub fn to_u8(self) -> u8 {
        match self {
            DestroyReason::RequestedToDestroy => 0,
            DestroyReason::RemovedFromSubscribing => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DestroyReason::RequestedToDestroy),
            1 => Some(DestroyReason::RemovedFromSubscribing),
            _ => None,
        }
    }
}

impl Serde for DestroyReason {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(self.to_u8());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Self::from_u8(reader.read_u8()?).ok_or(SerdeErr)
    }
}

/// Addressing mode of a remote function call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RpcTarget {
    /// Execute on the server only, never forwarded.
    Server,
    /// Forward to every connection.
    All,
    /// Forward to every connection except the target entity's owner.
    AllExceptOwner,
    /// Forward to exactly one connection, named in the envelope.
    Target,
}

impl RpcTarget {
    pub fn to_u8(self) -> u8 {
        match self {
            RpcTarget::Server => 0,
            RpcTarget::All => 1,
            RpcTarget::AllExceptOwner => 2,
            RpcTarget::Target => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(RpcTarget::Server),
            1 => Some(RpcTarget::All),
            2 => Some(RpcTarget::AllExceptOwner),
            3 => Some(RpcTarget::Target),
            _ => None,
        }
    }
}

impl Serde for RpcTarget {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_u8(self.to_u8());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Self::from_u8(reader.read_u8()?).ok_or(SerdeErr)
    }
}
