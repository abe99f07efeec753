//! # Tether Manager
//! The network-synchronization core of a client/server game runtime:
//! connection lifecycle, entity replication with per-player subscriptions,
//! remote function dispatch, scene-transition coordination and the compact
//! binary encoding tying it together.
//!
//! The manager is a library: a host process (server binary, client binary,
//! or a host running both roles) owns the transport, the scene loader and
//! startup/config/logging, and drives [`GameManager::update`] from its tick
//! loop.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use tether_shared::{
        game_msg, AssetHash, ByteReader, ByteWriter, ConnectionId, DeliveryMode,
        DestroyObjectMessage, DestroyReason, ElementInfo, ObjectId, Rotation, RpcTarget,
        SceneChangeMessage, Serde, SerdeErr, ServerErrorMessage, ServerTimeMessage,
        SpawnObjectMessage, SpawnSceneObjectMessage, Transport, Vec3,
    };
}

mod config;
mod error;
mod handler;
mod handlers;
mod manager;
mod player;
mod registry;
mod replica;
mod rpc;
mod scene;

pub use config::GameConfig;
pub use error::GameError;
pub use handler::{GameHandler, NullGameHandler};
pub use manager::{GameManager, MessageFn};
pub use player::Player;
pub use registry::{EntityRecord, EntityRegistry, ReplicaFactory};
pub use replica::{Replica, ReplicaCommands, SyncInit};
pub use scene::{LoadHandle, LoadStep, SceneLoader, SceneState};
