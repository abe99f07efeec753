use thiserror::Error;

use tether_shared::{AssetHash, ObjectId, SerdeErr};

/// Errors surfaced by the manager. Decode-class variants are fatal to the
/// one message they came from and are contained at the dispatch boundary;
/// the registry-class variants come back from the public spawn API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Message body ended early or a field failed to decode
    #[error("message body failed to decode: {0}")]
    Malformed(#[from] SerdeErr),

    /// Packet shorter than the two-byte message type prefix
    #[error("packet of {length} bytes is too short to carry a message type")]
    MissingMessageType { length: usize },

    /// No prefab factory registered for the asset hash
    #[error("no prefab registered for asset hash {hash:#010x}")]
    UnknownAsset { hash: AssetHash },

    /// No pending scene object carries the stable id
    #[error("no scene object registered with id {object_id}")]
    UnknownSceneObject { object_id: ObjectId },

    /// The explicit object id is already live in the registry
    #[error("object id {object_id} is already spawned")]
    DuplicateObjectId { object_id: ObjectId },

    /// A server-only operation was invoked on a process without the
    /// server role
    #[error("operation requires the server role")]
    ServerOnly,
}
