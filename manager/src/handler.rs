use tether_shared::{ByteReader, ByteWriter, ConnectionId, ObjectId, Rotation, ServerErrorMessage, Vec3};

use crate::{manager::GameManager, registry::EntityRegistry};

/// Host-application hooks, injected into the manager at construction. All
/// methods default to no-ops so a host only writes the ones it cares
/// about.
///
/// Hooks that receive `&mut GameManager` run with the handler temporarily
/// detached from it; a hook that re-enters another hook gets silence, not
/// recursion.
pub trait GameHandler {
    /// A scene just finished loading (or was already active): register its
    /// prefabs and pre-placed scene objects.
    fn setup_scene(&mut self, _scene_name: &str, _registry: &mut EntityRegistry) {}

    fn on_load_scene_start(&mut self, _scene_name: &str, _online: bool, _progress: f32) {}

    fn on_load_scene_progress(&mut self, _scene_name: &str, _online: bool, _progress: f32) {}

    fn on_load_scene_finish(&mut self, _scene_name: &str, _online: bool, _progress: f32) {}

    /// Server role, after scene objects went live.
    fn on_server_scene_loaded(&mut self, _manager: &mut GameManager) {}

    /// Client role, right before Ready is sent.
    fn on_client_scene_loaded(&mut self, _manager: &mut GameManager) {}

    fn on_offline_scene_loaded(&mut self, _scene_name: &str) {}

    /// Client role: the server reported an error.
    fn on_server_error(&mut self, _message: &ServerErrorMessage) {}

    /// Extra payload appended to the Ready message.
    fn serialize_ready_extra(&mut self, _writer: &mut ByteWriter) {}

    /// Reads back whatever [`GameHandler::serialize_ready_extra`] wrote.
    /// `controlled_entity` is the freshly spawned player entity, when the
    /// registry has a player asset configured.
    fn deserialize_ready_extra(
        &mut self,
        _controlled_entity: Option<ObjectId>,
        _connection_id: ConnectionId,
        _reader: &mut ByteReader,
    ) {
    }

    /// Where a player's controlled entity spawns.
    fn player_spawn_position(&mut self) -> (Vec3, Rotation) {
        (Vec3::ZERO, Rotation::IDENTITY)
    }
}

/// Handler for hosts that want every default.
pub struct NullGameHandler;

impl GameHandler for NullGameHandler {}
