use tether_shared::{ByteReader, DestroyReason, ElementInfo, ObjectId, SerdeErr};

use crate::player::Player;

/// One element of the full-state dump a late joiner receives right after
/// its spawn message.
#[derive(Clone, Debug)]
pub struct SyncInit {
    pub behaviour_index: u8,
    pub element_id: u16,
    pub payload: Vec<u8>,
}

impl SyncInit {
    pub fn new(behaviour_index: u8, element_id: u16, payload: Vec<u8>) -> Self {
        Self {
            behaviour_index,
            element_id,
            payload,
        }
    }
}

/// Deferred effects a replica queues during its per-tick update. The tick
/// pass iterates a stable snapshot of object ids; routing world mutations
/// through this buffer keeps the registry unaliased while replicas run.
#[derive(Default)]
pub struct ReplicaCommands {
    pub(crate) destroys: Vec<(ObjectId, DestroyReason)>,
    pub(crate) field_updates: Vec<(ElementInfo, Vec<u8>)>,
    pub(crate) list_updates: Vec<(ElementInfo, Vec<u8>)>,
}

impl ReplicaCommands {
    pub fn destroy(&mut self, object_id: ObjectId, reason: DestroyReason) {
        self.destroys.push((object_id, reason));
    }

    pub fn update_sync_field(&mut self, info: ElementInfo, payload: Vec<u8>) {
        self.field_updates.push((info, payload));
    }

    pub fn update_sync_list(&mut self, info: ElementInfo, payload: Vec<u8>) {
        self.list_updates.push((info, payload));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.destroys.is_empty() && self.field_updates.is_empty() && self.list_updates.is_empty()
    }
}

/// Capability contract every networked entity exposes to the manager. The
/// manager owns identity (object id, owner, spawn transform, subscribers)
/// and calls into the replica for everything gameplay-specific.
///
/// `apply_*` and `invoke` receive untrusted bytes; a decode failure drops
/// the one message that carried them.
pub trait Replica {
    /// Relevance predicate: whether `player` should receive this entity's
    /// replication traffic. Evaluated when a player becomes ready and when
    /// the entity spawns.
    fn should_subscribe(&self, _player: &Player) -> bool {
        true
    }

    /// A peer gained visibility of this entity. On a host this doubles as
    /// the "show again" signal for the colocated client view.
    fn on_subscriber_added(&mut self) {}

    /// A peer lost visibility. On a host this hides the colocated client
    /// view without touching the authoritative record.
    fn on_subscriber_removed(&mut self) {}

    /// Called once when the entity goes live. `is_owner` is only
    /// meaningful on the client side, where it arrives with the spawn
    /// message and never changes afterwards.
    fn on_spawn(&mut self, _object_id: ObjectId, _is_owner: bool) {}

    /// Full field state for a late-joining subscriber.
    fn initial_sync_fields(&self) -> Vec<SyncInit> {
        Vec::new()
    }

    /// Full list state for a late-joining subscriber.
    fn initial_sync_lists(&self) -> Vec<SyncInit> {
        Vec::new()
    }

    fn apply_sync_field(
        &mut self,
        _info: &ElementInfo,
        _reader: &mut ByteReader,
    ) -> Result<(), SerdeErr> {
        Ok(())
    }

    fn apply_sync_list(
        &mut self,
        _info: &ElementInfo,
        _reader: &mut ByteReader,
    ) -> Result<(), SerdeErr> {
        Ok(())
    }

    fn apply_sync_behaviour(
        &mut self,
        _behaviour_index: u8,
        _reader: &mut ByteReader,
    ) -> Result<(), SerdeErr> {
        Ok(())
    }

    /// High-frequency transform upload from the owning client.
    fn apply_transform(
        &mut self,
        _behaviour_index: u8,
        _reader: &mut ByteReader,
    ) -> Result<(), SerdeErr> {
        Ok(())
    }

    /// Remote function entry point, keyed by behaviour index and function
    /// id inside `info`. Argument bytes are opaque to the manager.
    fn invoke(&mut self, _info: &ElementInfo, _reader: &mut ByteReader) -> Result<(), SerdeErr> {
        Ok(())
    }

    /// Per-tick update. Runs only on the server role, only while no scene
    /// transition is in flight.
    fn update(&mut self, _dt: f32, _commands: &mut ReplicaCommands) {}

    /// Teardown notification. For `RemovedFromSubscribing` on a host the
    /// record stays alive and only [`Replica::on_subscriber_removed`]
    /// fires instead.
    fn on_destroy(&mut self, _reason: DestroyReason) {}
}
