//! # Tether Shared
//! Wire format, message kinds and the transport contract shared between the
//! server and client roles of the tether runtime.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

mod delivery;
mod math;
mod messages;
mod transport;
mod types;

pub use delivery::DeliveryMode;
pub use math::{Rotation, Vec3};
pub use messages::{
    game_msg, DestroyObjectMessage, ElementInfo, SceneChangeMessage, ServerErrorMessage,
    ServerTimeMessage, SpawnObjectMessage, SpawnSceneObjectMessage,
};
pub use transport::Transport;
pub use types::{AssetHash, ConnectionId, DestroyReason, ObjectId, RpcTarget, SERVER_OWNED};
