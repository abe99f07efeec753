use std::collections::HashSet;

use tether_shared::{ConnectionId, ObjectId};

/// Server-side record of one active connection. Exists exactly as long as
/// the connection is open: created the instant the transport reports the
/// peer, removed when it drops.
pub struct Player {
    connection_id: ConnectionId,
    pub(crate) is_ready: bool,
    /// Entities this player currently receives replication for.
    pub(crate) subscribing: HashSet<ObjectId>,
    /// Entities spawned with this player as owner.
    pub(crate) owned_objects: HashSet<ObjectId>,
}

impl Player {
    pub(crate) fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            is_ready: false,
            subscribing: HashSet::new(),
            owned_objects: HashSet::new(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Whether this player participates in entity replication yet. False
    /// until the client reports its scene load finished.
    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn is_subscribed(&self, object_id: ObjectId) -> bool {
        self.subscribing.contains(&object_id)
    }

    pub fn subscribing_count(&self) -> usize {
        self.subscribing.len()
    }

    pub fn owns(&self, object_id: ObjectId) -> bool {
        self.owned_objects.contains(&object_id)
    }

    pub fn owned_count(&self) -> usize {
        self.owned_objects.len()
    }
}
