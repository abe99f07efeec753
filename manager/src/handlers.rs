//! Built-in message handlers, bound to their message types at manager
//! construction. Server-bound handlers run with the server role's view of
//! the world, client-bound ones with the client role's; on a host both
//! tables are live and the disjoint type numbering keeps routing
//! unambiguous.

use log::{trace, warn};

use tether_shared::{
    ByteReader, ConnectionId, DestroyObjectMessage, DestroyReason, ElementInfo,
    SceneChangeMessage, Serde, ServerErrorMessage, ServerTimeMessage, SpawnObjectMessage,
    SpawnSceneObjectMessage,
};

use crate::{error::GameError, manager::GameManager, rpc::CallEnvelope};

// Server-bound handlers

pub(crate) fn client_enter_game(
    manager: &mut GameManager,
    connection_id: ConnectionId,
    _reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let message = SceneChangeMessage {
        scene_name: manager.server_scene_name().to_string(),
    };
    manager.server_send_scene_change(connection_id, &message);
    Ok(())
}

pub(crate) fn client_ready(
    manager: &mut GameManager,
    connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    manager.set_player_ready(connection_id, reader);
    Ok(())
}

pub(crate) fn client_not_ready(
    manager: &mut GameManager,
    connection_id: ConnectionId,
    _reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    manager.set_player_not_ready(connection_id);
    Ok(())
}

pub(crate) fn client_call_function(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let envelope = CallEnvelope::de(reader)?;
    manager.route_client_call(envelope)
}

pub(crate) fn client_send_transform(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let object_id = reader.read_packed_u32()?;
    let behaviour_index = reader.read_u8()?;
    if let Some(record) = manager.registry.get_mut(object_id) {
        record.replica.apply_transform(behaviour_index, reader)?;
    } else {
        trace!("transform for missing object {}", object_id);
    }
    Ok(())
}

// Client-bound handlers

pub(crate) fn server_spawn_scene_object(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let message = SpawnSceneObjectMessage::de(reader)?;
    if !manager.is_server() {
        if let Err(error) = manager.registry.network_spawn_scene(
            message.object_id,
            message.position,
            message.rotation,
        ) {
            warn!("dropping scene spawn: {}", error);
        }
    } else if let Some(record) = manager.registry.get_mut(message.object_id) {
        // host: the colocated client regained this entity, show it again
        record.replica.on_subscriber_added();
    }
    Ok(())
}

pub(crate) fn server_spawn_object(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let message = SpawnObjectMessage::de(reader)?;
    if !manager.is_server() {
        if let Err(error) = manager.registry.network_spawn(
            message.hash_asset_id,
            message.position,
            message.rotation,
            message.object_id,
            0,
            message.is_owner,
        ) {
            warn!("dropping spawn: {}", error);
        }
    } else if let Some(record) = manager.registry.get_mut(message.object_id) {
        record.is_owner = message.is_owner;
        record.replica.on_subscriber_added();
    }
    Ok(())
}

pub(crate) fn server_destroy_object(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let message = DestroyObjectMessage::de(reader)?;
    if !manager.is_server() {
        if manager
            .registry
            .destroy(message.object_id, message.reason)
            .is_none()
        {
            trace!("destroy for missing object {}", message.object_id);
        }
    } else if message.reason == DestroyReason::RemovedFromSubscribing {
        // host: subscription ended but the server still simulates the
        // entity, so only the client-side view goes away
        if let Some(record) = manager.registry.get_mut(message.object_id) {
            record.replica.on_subscriber_removed();
        }
    }
    Ok(())
}

pub(crate) fn server_update_sync_field(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    if manager.is_server() {
        // host: the server-side state is authoritative
        return Ok(());
    }
    let info = ElementInfo::de(reader)?;
    if let Some(record) = manager.registry.get_mut(info.object_id) {
        record.replica.apply_sync_field(&info, reader)?;
    } else {
        trace!("field update for missing object {}", info.object_id);
    }
    Ok(())
}

pub(crate) fn server_update_sync_list(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    if manager.is_server() {
        return Ok(());
    }
    let info = ElementInfo::de(reader)?;
    if let Some(record) = manager.registry.get_mut(info.object_id) {
        record.replica.apply_sync_list(&info, reader)?;
    } else {
        trace!("list update for missing object {}", info.object_id);
    }
    Ok(())
}

pub(crate) fn server_call_function(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let info = ElementInfo::de(reader)?;
    if let Some(record) = manager.registry.get_mut(info.object_id) {
        record.replica.invoke(&info, reader)?;
    } else {
        trace!("call for missing object {}", info.object_id);
    }
    Ok(())
}

pub(crate) fn server_time(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    if manager.is_server() {
        // host: the local clock already is the server clock
        return Ok(());
    }
    let message = ServerTimeMessage::de(reader)?;
    manager.apply_server_time(message.server_time);
    Ok(())
}

pub(crate) fn server_sync_behaviour(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    if manager.is_server() {
        return Ok(());
    }
    let object_id = reader.read_packed_u32()?;
    let behaviour_index = reader.read_u8()?;
    if let Some(record) = manager.registry.get_mut(object_id) {
        record.replica.apply_sync_behaviour(behaviour_index, reader)?;
    } else {
        trace!("behaviour sync for missing object {}", object_id);
    }
    Ok(())
}

pub(crate) fn server_error(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    let message = ServerErrorMessage::de(reader)?;
    manager.with_handler(|_, handler| handler.on_server_error(&message));
    if message.should_disconnect && !manager.is_server() {
        manager.stop_client();
    }
    Ok(())
}

pub(crate) fn server_scene_change(
    manager: &mut GameManager,
    _connection_id: ConnectionId,
    reader: &mut ByteReader<'_>,
) -> Result<(), GameError> {
    if manager.is_server() {
        // host: the client side never reloads what the server runs
        return Ok(());
    }
    let message = SceneChangeMessage::de(reader)?;
    manager.handle_scene_change(message.scene_name);
    Ok(())
}
