use std::collections::{HashMap, HashSet};

use log::debug;

use tether_shared::{AssetHash, ConnectionId, DestroyReason, ObjectId, Rotation, Vec3};

use crate::{error::GameError, replica::Replica};

pub type ReplicaFactory = Box<dyn Fn() -> Box<dyn Replica>>;

/// A live networked entity plus the identity the manager owns for it.
pub struct EntityRecord {
    pub replica: Box<dyn Replica>,
    /// Prefab hash for dynamic entities, 0 for scene-placed ones.
    pub hash_asset_id: AssetHash,
    /// Connection that spawned/owns the entity, 0 for server-owned.
    pub owner: ConnectionId,
    pub is_scene_object: bool,
    /// Client-side flag: did the server spawn this entity for us. Applied
    /// once from the spawn message, immutable afterwards.
    pub is_owner: bool,
    pub position: Vec3,
    pub rotation: Rotation,
    /// Connections currently receiving this entity's replication.
    pub subscribers: HashSet<ConnectionId>,
}

struct PendingSceneObject {
    replica: Box<dyn Replica>,
    position: Vec3,
    rotation: Rotation,
}

/// Arena of live entities keyed by object id, plus the prefab factories
/// and pre-placed scene objects spawns draw from.
///
/// Object ids are allocated from a counter that is never reset while the
/// process runs, so a delayed message can reference a destroyed id without
/// ever aliasing a new entity.
pub struct EntityRegistry {
    factories: HashMap<AssetHash, ReplicaFactory>,
    pending_scene: HashMap<ObjectId, PendingSceneObject>,
    spawned: HashMap<ObjectId, EntityRecord>,
    next_object_id: ObjectId,
    player_asset: Option<AssetHash>,
}

impl EntityRegistry {
    pub(crate) fn new() -> Self {
        Self {
            factories: HashMap::new(),
            pending_scene: HashMap::new(),
            spawned: HashMap::new(),
            next_object_id: 1,
            player_asset: None,
        }
    }

    /// Registers the factory used to instantiate dynamic entities with
    /// this asset hash. Re-registering replaces the previous factory.
    pub fn register_prefab<F>(&mut self, hash_asset_id: AssetHash, factory: F)
    where
        F: Fn() -> Box<dyn Replica> + 'static,
    {
        self.factories.insert(hash_asset_id, Box::new(factory));
    }

    /// Registers a pre-placed scene entity under its stable baked-in id.
    /// It goes live when the server spawns scene objects (or, on a client,
    /// when the matching spawn message arrives).
    pub fn register_scene_object(
        &mut self,
        object_id: ObjectId,
        replica: Box<dyn Replica>,
        position: Vec3,
        rotation: Rotation,
    ) {
        debug_assert_ne!(object_id, 0, "scene objects need a stable non-zero id");
        self.bump_past(object_id);
        self.pending_scene.insert(
            object_id,
            PendingSceneObject {
                replica,
                position,
                rotation,
            },
        );
    }

    /// Prefab the server instantiates as a player's controlled entity when
    /// that player becomes ready.
    pub fn set_player_asset(&mut self, hash_asset_id: AssetHash) {
        self.player_asset = Some(hash_asset_id);
    }

    pub fn player_asset(&self) -> Option<AssetHash> {
        self.player_asset
    }

    pub fn get(&self, object_id: ObjectId) -> Option<&EntityRecord> {
        self.spawned.get(&object_id)
    }

    pub fn get_mut(&mut self, object_id: ObjectId) -> Option<&mut EntityRecord> {
        self.spawned.get_mut(&object_id)
    }

    pub fn contains(&self, object_id: ObjectId) -> bool {
        self.spawned.contains_key(&object_id)
    }

    pub fn len(&self) -> usize {
        self.spawned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty()
    }

    /// Stable snapshot of live ids, sorted for deterministic iteration.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.spawned.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Server side: makes every registered scene object live. Returns the
    /// ids that went live, in id order.
    pub(crate) fn spawn_scene_objects(&mut self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.pending_scene.keys().copied().collect();
        ids.sort_unstable();

        for &object_id in &ids {
            let pending = self
                .pending_scene
                .remove(&object_id)
                .expect("id came from the pending map");
            let mut record = EntityRecord {
                replica: pending.replica,
                hash_asset_id: 0,
                owner: 0,
                is_scene_object: true,
                is_owner: false,
                position: pending.position,
                rotation: pending.rotation,
                subscribers: HashSet::new(),
            };
            record.replica.on_spawn(object_id, false);
            self.spawned.insert(object_id, record);
        }
        ids
    }

    /// Client side: attach to a pre-placed scene entity announced by the
    /// server.
    pub(crate) fn network_spawn_scene(
        &mut self,
        object_id: ObjectId,
        position: Vec3,
        rotation: Rotation,
    ) -> Result<(), GameError> {
        let pending = self
            .pending_scene
            .remove(&object_id)
            .ok_or(GameError::UnknownSceneObject { object_id })?;
        let mut record = EntityRecord {
            replica: pending.replica,
            hash_asset_id: 0,
            owner: 0,
            is_scene_object: true,
            is_owner: false,
            position,
            rotation,
            subscribers: HashSet::new(),
        };
        record.replica.on_spawn(object_id, false);
        self.spawned.insert(object_id, record);
        self.bump_past(object_id);
        Ok(())
    }

    /// Instantiates a dynamic entity. `object_id` 0 allocates a fresh id;
    /// a non-zero id is used verbatim (how clients re-create an entity the
    /// server already numbered).
    pub(crate) fn network_spawn(
        &mut self,
        hash_asset_id: AssetHash,
        position: Vec3,
        rotation: Rotation,
        object_id: ObjectId,
        owner: ConnectionId,
        is_owner: bool,
    ) -> Result<ObjectId, GameError> {
        let object_id = if object_id == 0 {
            self.allocate_object_id()
        } else {
            if self.spawned.contains_key(&object_id) {
                return Err(GameError::DuplicateObjectId { object_id });
            }
            self.bump_past(object_id);
            object_id
        };

        let factory = self
            .factories
            .get(&hash_asset_id)
            .ok_or(GameError::UnknownAsset {
                hash: hash_asset_id,
            })?;
        let mut record = EntityRecord {
            replica: factory(),
            hash_asset_id,
            owner,
            is_scene_object: false,
            is_owner,
            position,
            rotation,
            subscribers: HashSet::new(),
        };
        record.replica.on_spawn(object_id, is_owner);
        self.spawned.insert(object_id, record);
        Ok(object_id)
    }

    /// Full teardown of one entity. The caller has already decided this is
    /// a real destroy (host hide-only paths never reach here).
    pub(crate) fn destroy(
        &mut self,
        object_id: ObjectId,
        reason: DestroyReason,
    ) -> Option<EntityRecord> {
        let mut record = self.spawned.remove(&object_id)?;
        record.replica.on_destroy(reason);
        Some(record)
    }

    /// Drops every live and pending entity, e.g. when the hosting scene
    /// unloads. The id counter is deliberately left alone: ids are never
    /// reused while the process runs.
    pub(crate) fn clear(&mut self) {
        for (_, mut record) in self.spawned.drain() {
            record.replica.on_destroy(DestroyReason::RequestedToDestroy);
        }
        if !self.pending_scene.is_empty() {
            debug!(
                "clearing {} scene objects that never went live",
                self.pending_scene.len()
            );
            self.pending_scene.clear();
        }
    }

    fn allocate_object_id(&mut self) -> ObjectId {
        let object_id = self.next_object_id;
        self.next_object_id += 1;
        object_id
    }

    fn bump_past(&mut self, object_id: ObjectId) {
        if object_id >= self.next_object_id {
            self.next_object_id = object_id + 1;
        }
    }
}
