use std::collections::HashMap;

use log::{debug, trace, warn};

use tether_shared::{
    game_msg, AssetHash, ByteReader, ByteWriter, ConnectionId, DeliveryMode, DestroyObjectMessage,
    DestroyReason, ElementInfo, ObjectId, Rotation, RpcTarget, SceneChangeMessage, Serde,
    ServerErrorMessage, ServerTimeMessage, SpawnObjectMessage, SpawnSceneObjectMessage, Transport,
    Vec3,
};

use crate::{
    config::GameConfig,
    error::GameError,
    handler::GameHandler,
    handlers,
    player::Player,
    registry::EntityRegistry,
    replica::ReplicaCommands,
    rpc,
    scene::{LoadHandle, LoadStep, SceneLoader, SceneState},
};

/// A message handler: receives the sender's connection id and a positioned
/// reader over the message body. Returning an error drops that one message.
pub type MessageFn =
    fn(&mut GameManager, ConnectionId, &mut ByteReader<'_>) -> Result<(), GameError>;

/// The synchronization core of one process. Holds the server role, the
/// client role, or both (the host topology); role flags gate every
/// operation, so a pure client simply no-ops the server surface and vice
/// versa.
///
/// Everything here runs on one logical thread: the host drives
/// [`GameManager::update`] once per tick and feeds inbound packets through
/// the two `receive_*` entry points, which are never re-entered.
pub struct GameManager {
    config: GameConfig,
    is_server: bool,
    is_client: bool,
    client_connected: bool,
    clock: f32,
    server_time_offset: f32,
    last_server_time: f32,
    active_scene: String,
    server_scene: String,
    pub(crate) players: HashMap<ConnectionId, Player>,
    pub(crate) registry: EntityRegistry,
    scene: SceneState,
    server_handlers: HashMap<u16, MessageFn>,
    client_handlers: HashMap<u16, MessageFn>,
    transport: Box<dyn Transport>,
    loader: Box<dyn SceneLoader>,
    handler: Option<Box<dyn GameHandler>>,
}

fn packet<M: Serde>(msg_type: u16, message: &M) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(msg_type);
    message.ser(&mut writer);
    writer.to_bytes()
}

fn empty_packet(msg_type: u16) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(msg_type);
    writer.to_bytes()
}

impl GameManager {
    pub fn new(
        config: GameConfig,
        transport: Box<dyn Transport>,
        loader: Box<dyn SceneLoader>,
        handler: Box<dyn GameHandler>,
    ) -> Self {
        let mut manager = Self {
            config,
            is_server: false,
            is_client: false,
            client_connected: false,
            clock: 0.0,
            server_time_offset: 0.0,
            last_server_time: 0.0,
            active_scene: String::new(),
            server_scene: String::new(),
            players: HashMap::new(),
            registry: EntityRegistry::new(),
            scene: SceneState::Idle,
            server_handlers: HashMap::new(),
            client_handlers: HashMap::new(),
            transport,
            loader,
            handler: Some(handler),
        };
        manager.register_builtin_messages();
        manager
    }

    fn register_builtin_messages(&mut self) {
        self.register_server_message(game_msg::CLIENT_ENTER_GAME, handlers::client_enter_game);
        self.register_server_message(game_msg::CLIENT_READY, handlers::client_ready);
        self.register_server_message(game_msg::CLIENT_NOT_READY, handlers::client_not_ready);
        self.register_server_message(game_msg::CLIENT_CALL_FUNCTION, handlers::client_call_function);
        self.register_server_message(
            game_msg::CLIENT_SEND_TRANSFORM,
            handlers::client_send_transform,
        );

        self.register_client_message(
            game_msg::SERVER_SPAWN_SCENE_OBJECT,
            handlers::server_spawn_scene_object,
        );
        self.register_client_message(game_msg::SERVER_SPAWN_OBJECT, handlers::server_spawn_object);
        self.register_client_message(
            game_msg::SERVER_DESTROY_OBJECT,
            handlers::server_destroy_object,
        );
        self.register_client_message(
            game_msg::SERVER_UPDATE_SYNC_FIELD,
            handlers::server_update_sync_field,
        );
        self.register_client_message(game_msg::SERVER_CALL_FUNCTION, handlers::server_call_function);
        self.register_client_message(
            game_msg::SERVER_UPDATE_SYNC_LIST,
            handlers::server_update_sync_list,
        );
        self.register_client_message(game_msg::SERVER_TIME, handlers::server_time);
        self.register_client_message(
            game_msg::SERVER_SYNC_BEHAVIOUR,
            handlers::server_sync_behaviour,
        );
        self.register_client_message(game_msg::SERVER_ERROR, handlers::server_error);
        self.register_client_message(game_msg::SERVER_SCENE_CHANGE, handlers::server_scene_change);
    }

    /// Binds a server-bound message type to a handler. Built-in types can
    /// be overridden; new types extend the protocol by appending values.
    pub fn register_server_message(&mut self, msg_type: u16, handler: MessageFn) {
        self.server_handlers.insert(msg_type, handler);
    }

    /// Binds a client-bound message type to a handler.
    pub fn register_client_message(&mut self, msg_type: u16, handler: MessageFn) {
        self.client_handlers.insert(msg_type, handler);
    }

    // Roles

    pub fn is_server(&self) -> bool {
        self.is_server
    }

    pub fn is_client(&self) -> bool {
        self.is_client
    }

    /// Server and client in one process.
    pub fn is_host(&self) -> bool {
        self.is_server && self.is_client
    }

    pub fn is_client_connected(&self) -> bool {
        self.client_connected
    }

    /// Takes on the server role. Loads the configured online scene, or
    /// initializes in the active scene when none is configured (or it is
    /// already loaded).
    pub fn start_server(&mut self) {
        if self.is_server {
            return;
        }
        self.is_server = true;
        match self.config.online_scene.clone() {
            Some(scene_name) if scene_name != self.active_scene => {
                self.server_scene = scene_name.clone();
                self.begin_scene_transition(&scene_name, true);
            }
            _ => {
                self.server_scene = self.active_scene.clone();
                let scene_name = self.active_scene.clone();
                self.with_handler(|manager, handler| {
                    handler.setup_scene(&scene_name, &mut manager.registry)
                });
                for object_id in self.registry.spawn_scene_objects() {
                    self.announce_spawn(object_id);
                }
                self.with_handler(|manager, handler| handler.on_server_scene_loaded(manager));
            }
        }
    }

    /// Drops the server role, clearing players and entities. Transitions
    /// to the configured offline scene when one is set.
    pub fn stop_server(&mut self) {
        if !self.is_server {
            return;
        }
        self.is_server = false;
        self.server_scene.clear();
        self.players.clear();
        self.registry.clear();
        if let Some(offline) = self.config.offline_scene.clone() {
            if offline != self.active_scene {
                self.begin_scene_transition(&offline, false);
            }
        }
    }

    pub fn start_client(&mut self) {
        self.is_client = true;
    }

    pub fn stop_client(&mut self) {
        if !self.is_client {
            return;
        }
        self.is_client = false;
        self.client_connected = false;
        if !self.is_server {
            self.players.clear();
            self.registry.clear();
            if let Some(offline) = self.config.offline_scene.clone() {
                if offline != self.active_scene {
                    self.begin_scene_transition(&offline, false);
                }
            }
        }
    }

    pub fn start_host(&mut self) {
        self.start_server();
        self.start_client();
    }

    /// Transport reports the client connection is up.
    pub fn on_client_connected(&mut self) {
        if !self.is_client {
            return;
        }
        self.client_connected = true;
        if self.config.enter_game_on_connect {
            self.send_client_enter_game();
        }
    }

    /// Transport reports the client connection dropped.
    pub fn on_client_disconnected(&mut self) {
        self.client_connected = false;
    }

    // Clock

    /// Advances the manager one tick. Entity updates and the time beacon
    /// are suspended while a scene transition is in flight; the transition
    /// advances exactly one step per tick instead.
    pub fn update(&mut self, dt: f32) {
        self.clock += dt;
        if self.scene.is_loading() {
            self.advance_scene();
            return;
        }
        if self.is_server {
            self.update_entities(dt);
            if self.clock - self.last_server_time >= self.config.server_time_interval {
                self.send_server_time_all();
                self.last_server_time = self.clock;
            }
        }
    }

    /// The synchronized clock: local on a server, offset-corrected on a
    /// pure client.
    pub fn server_time(&self) -> f32 {
        if self.is_server {
            self.clock
        } else {
            self.clock + self.server_time_offset
        }
    }

    pub fn server_time_offset(&self) -> f32 {
        self.server_time_offset
    }

    pub(crate) fn apply_server_time(&mut self, server_time: f32) {
        self.server_time_offset = server_time - self.clock;
    }

    fn update_entities(&mut self, dt: f32) {
        let mut commands = ReplicaCommands::default();
        // stable snapshot: replicas may queue destroys mid-iteration
        for object_id in self.registry.object_ids() {
            if let Some(record) = self.registry.get_mut(object_id) {
                record.replica.update(dt, &mut commands);
            }
        }
        if commands.is_empty() {
            return;
        }
        for (info, payload) in commands.field_updates.drain(..) {
            self.server_update_sync_field(info, &payload);
        }
        for (info, payload) in commands.list_updates.drain(..) {
            self.server_update_sync_list(info, &payload);
        }
        for (object_id, reason) in commands.destroys.drain(..) {
            self.server_destroy_object(object_id, reason);
        }
    }

    // Scenes

    pub fn active_scene(&self) -> &str {
        &self.active_scene
    }

    /// Names the scene the process booted into, so SceneChange
    /// announcements for an already-loaded scene can short-circuit.
    pub fn set_active_scene(&mut self, scene_name: &str) {
        self.active_scene = scene_name.to_string();
    }

    /// The gameplay scene the server runs; empty on a pure client.
    pub fn server_scene_name(&self) -> &str {
        if self.is_server {
            &self.server_scene
        } else {
            ""
        }
    }

    pub fn is_scene_loading(&self) -> bool {
        self.scene.is_loading()
    }

    /// Starts a server-driven gameplay scene change; clients are told once
    /// the load finishes.
    pub fn server_scene_change(&mut self, scene_name: &str) {
        if !self.is_server {
            return;
        }
        self.begin_scene_transition(scene_name, true);
    }

    fn begin_scene_transition(&mut self, scene_name: &str, online: bool) {
        if self.scene.is_loading() {
            debug!(
                "scene transition to {:?} ignored, another is in flight",
                scene_name
            );
            return;
        }
        self.scene = SceneState::Loading {
            scene_name: scene_name.to_string(),
            online,
            step: LoadStep::Start,
            handle: None,
        };
    }

    fn set_scene_step(&mut self, next_step: LoadStep, next_handle: Option<LoadHandle>) {
        if let SceneState::Loading { step, handle, .. } = &mut self.scene {
            *step = next_step;
            *handle = next_handle;
        }
    }

    fn advance_scene(&mut self) {
        let (scene_name, online, step, handle) = match &self.scene {
            SceneState::Loading {
                scene_name,
                online,
                step,
                handle,
            } => (scene_name.clone(), *online, *step, *handle),
            SceneState::Idle => return,
        };

        match step {
            LoadStep::Start => {
                if online {
                    // transient state must be gone before the scene handle
                    // changes underneath the registry
                    self.reset_transient_state();
                }
                debug!("loading scene {:?} (online: {})", scene_name, online);
                self.with_handler(|_, handler| {
                    handler.on_load_scene_start(&scene_name, online, 0.0)
                });
                let handle = self.loader.begin_load(&scene_name);
                self.set_scene_step(LoadStep::Poll, Some(handle));
            }
            LoadStep::Poll => {
                let handle = handle.expect("poll step always has a load handle");
                if self.loader.is_done(handle) {
                    self.active_scene = scene_name.clone();
                    debug!("loaded scene {:?} (online: {})", scene_name, online);
                    self.with_handler(|_, handler| {
                        handler.on_load_scene_finish(&scene_name, online, 1.0)
                    });
                    let next = if online {
                        LoadStep::Setup
                    } else {
                        LoadStep::OfflineFinish
                    };
                    self.set_scene_step(next, Some(handle));
                } else {
                    let progress = self.loader.progress(handle);
                    self.with_handler(|_, handler| {
                        handler.on_load_scene_progress(&scene_name, online, progress)
                    });
                }
            }
            LoadStep::Setup => {
                self.with_handler(|manager, handler| {
                    handler.setup_scene(&scene_name, &mut manager.registry)
                });
                self.set_scene_step(LoadStep::ServerSpawn, handle);
            }
            LoadStep::ServerSpawn => {
                if self.is_server {
                    self.server_scene = scene_name.clone();
                    for object_id in self.registry.spawn_scene_objects() {
                        self.announce_spawn(object_id);
                    }
                    self.with_handler(|manager, handler| handler.on_server_scene_loaded(manager));
                }
                self.set_scene_step(LoadStep::Broadcast, handle);
            }
            LoadStep::Broadcast => {
                if self.is_server {
                    let message = SceneChangeMessage {
                        scene_name: scene_name.clone(),
                    };
                    let payload = packet(game_msg::SERVER_SCENE_CHANGE, &message);
                    let connections: Vec<ConnectionId> = self.players.keys().copied().collect();
                    if !connections.is_empty() {
                        self.transport.send_to_many(
                            &connections,
                            DeliveryMode::ReliableOrdered,
                            &payload,
                        );
                    }
                }
                self.set_scene_step(LoadStep::ClientFinish, handle);
            }
            LoadStep::ClientFinish => {
                if self.is_client {
                    self.with_handler(|manager, handler| handler.on_client_scene_loaded(manager));
                    self.send_client_ready();
                }
                self.scene = SceneState::Idle;
            }
            LoadStep::OfflineFinish => {
                self.with_handler(|_, handler| handler.on_offline_scene_loaded(&scene_name));
                if !self.config.persist_across_scenes {
                    self.is_server = false;
                    self.is_client = false;
                    self.client_connected = false;
                    self.players.clear();
                    self.registry.clear();
                }
                self.scene = SceneState::Idle;
            }
        }
    }

    fn reset_transient_state(&mut self) {
        for player in self.players.values_mut() {
            player.is_ready = false;
            player.subscribing.clear();
            player.owned_objects.clear();
        }
        self.registry.clear();
    }

    /// A client received the server's scene announcement. An empty or
    /// already-active scene skips loading: just re-send Ready and run the
    /// client-loaded hook.
    pub(crate) fn handle_scene_change(&mut self, scene_name: String) {
        if scene_name.is_empty() || scene_name == self.active_scene {
            let active = self.active_scene.clone();
            self.with_handler(|manager, handler| {
                handler.setup_scene(&active, &mut manager.registry)
            });
            self.send_client_ready();
            self.with_handler(|manager, handler| handler.on_client_scene_loaded(manager));
        } else {
            self.begin_scene_transition(&scene_name, true);
        }
    }

    // Connections

    /// Transport accepted a connection. The new player gets a ServerTime
    /// beacon before anything else, so it can compute its clock offset.
    pub fn on_peer_connected(&mut self, connection_id: ConnectionId) {
        if !self.is_server || self.players.contains_key(&connection_id) {
            return;
        }
        self.send_server_time_to(connection_id);
        self.players
            .insert(connection_id, Player::new(connection_id));
    }

    /// Transport lost a connection. Subscriptions are cleared without
    /// notifying the (gone) peer, owned entities are destroyed, and the
    /// player record is removed.
    pub fn on_peer_disconnected(&mut self, connection_id: ConnectionId) {
        if !self.is_server {
            return;
        }
        let Some(mut player) = self.players.remove(&connection_id) else {
            return;
        };
        for object_id in player.subscribing.drain() {
            if let Some(record) = self.registry.get_mut(object_id) {
                record.subscribers.remove(&connection_id);
            }
        }
        let mut owned: Vec<ObjectId> = player.owned_objects.drain().collect();
        owned.sort_unstable();
        for object_id in owned {
            self.server_destroy_object(object_id, DestroyReason::RequestedToDestroy);
        }
    }

    pub fn player(&self, connection_id: ConnectionId) -> Option<&Player> {
        self.players.get(&connection_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // Ready state

    /// Marks a player ready: spawns its controlled entity (when a player
    /// asset is configured) and subscribes it to every live entity its
    /// predicate accepts. Idempotent; a second Ready does nothing.
    pub fn set_player_ready(&mut self, connection_id: ConnectionId, reader: &mut ByteReader) {
        if !self.is_server {
            return;
        }
        match self.players.get_mut(&connection_id) {
            Some(player) if !player.is_ready => player.is_ready = true,
            Some(_) => {
                debug!("connection {} is already ready", connection_id);
                return;
            }
            None => {
                warn!("ready from unknown connection {}", connection_id);
                return;
            }
        }

        let controlled = self.spawn_controlled_entity(connection_id);
        self.with_handler(|_, handler| {
            handler.deserialize_ready_extra(controlled, connection_id, reader)
        });

        // entities that already existed before this player became ready;
        // the player's own spawns were announced at spawn time
        let mut accepted = Vec::new();
        if let Some(player) = self.players.get(&connection_id) {
            for object_id in self.registry.object_ids() {
                let Some(record) = self.registry.get(object_id) else {
                    continue;
                };
                if record.owner == connection_id {
                    continue;
                }
                if record.replica.should_subscribe(player) {
                    accepted.push(object_id);
                }
            }
        }
        for object_id in accepted {
            self.subscribe(connection_id, object_id);
        }
    }

    /// Clears a player's subscriptions and destroys everything it owned.
    /// Idempotent; a second NotReady does nothing.
    pub fn set_player_not_ready(&mut self, connection_id: ConnectionId) {
        if !self.is_server {
            return;
        }
        let (subscribing, owned) = match self.players.get_mut(&connection_id) {
            Some(player) if player.is_ready => {
                player.is_ready = false;
                let mut subscribing: Vec<ObjectId> = player.subscribing.drain().collect();
                subscribing.sort_unstable();
                let mut owned: Vec<ObjectId> = player.owned_objects.drain().collect();
                owned.sort_unstable();
                (subscribing, owned)
            }
            _ => return,
        };
        for object_id in subscribing {
            if let Some(record) = self.registry.get_mut(object_id) {
                record.subscribers.remove(&connection_id);
            }
            // no unsubscribe notification: the player is no longer ready,
            // so the per-connection destroy would be dropped anyway
        }
        for object_id in owned {
            self.server_destroy_object(object_id, DestroyReason::RequestedToDestroy);
        }
    }

    fn spawn_controlled_entity(&mut self, connection_id: ConnectionId) -> Option<ObjectId> {
        let hash_asset_id = self.registry.player_asset()?;
        let (position, rotation) = self
            .with_handler(|_, handler| handler.player_spawn_position())
            .unwrap_or((Vec3::ZERO, Rotation::IDENTITY));
        match self.server_spawn_at(hash_asset_id, position, rotation, 0, connection_id) {
            Ok(object_id) => Some(object_id),
            Err(error) => {
                warn!(
                    "could not spawn controlled entity for {}: {}",
                    connection_id, error
                );
                None
            }
        }
    }

    // Entities

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Spawns a dynamic entity with a fresh id and announces it to every
    /// ready player its predicate accepts.
    pub fn server_spawn(
        &mut self,
        hash_asset_id: AssetHash,
        position: Vec3,
        rotation: Rotation,
        owner: ConnectionId,
    ) -> Result<ObjectId, GameError> {
        self.server_spawn_at(hash_asset_id, position, rotation, 0, owner)
    }

    /// Spawn variant taking an explicit object id (0 allocates).
    pub fn server_spawn_at(
        &mut self,
        hash_asset_id: AssetHash,
        position: Vec3,
        rotation: Rotation,
        object_id: ObjectId,
        owner: ConnectionId,
    ) -> Result<ObjectId, GameError> {
        if !self.is_server {
            return Err(GameError::ServerOnly);
        }
        let object_id =
            self.registry
                .network_spawn(hash_asset_id, position, rotation, object_id, owner, false)?;
        if owner != 0 {
            if let Some(player) = self.players.get_mut(&owner) {
                player.owned_objects.insert(object_id);
            }
        }
        self.announce_spawn(object_id);
        Ok(object_id)
    }

    fn announce_spawn(&mut self, object_id: ObjectId) {
        let mut accepted = Vec::new();
        if let Some(record) = self.registry.get(object_id) {
            for player in self.players.values() {
                if player.is_ready() && record.replica.should_subscribe(player) {
                    accepted.push(player.connection_id());
                }
            }
        }
        for connection_id in accepted {
            self.subscribe(connection_id, object_id);
        }
    }

    /// Destroys an entity: notifies every ready player, runs entity
    /// teardown and unlinks ownership/subscriptions. Returns false when
    /// the id is not live (or this is not a server).
    pub fn server_destroy_object(&mut self, object_id: ObjectId, reason: DestroyReason) -> bool {
        if !self.is_server || !self.registry.contains(object_id) {
            return false;
        }
        let payload = packet(
            game_msg::SERVER_DESTROY_OBJECT,
            &DestroyObjectMessage { object_id, reason },
        );
        let ready: Vec<ConnectionId> = self
            .players
            .values()
            .filter(|player| player.is_ready())
            .map(Player::connection_id)
            .collect();
        if !ready.is_empty() {
            self.transport
                .send_to_many(&ready, DeliveryMode::ReliableOrdered, &payload);
        }

        if let Some(record) = self.registry.destroy(object_id, reason) {
            if record.owner != 0 {
                if let Some(player) = self.players.get_mut(&record.owner) {
                    player.owned_objects.remove(&object_id);
                }
            }
        }
        for player in self.players.values_mut() {
            player.subscribing.remove(&object_id);
        }
        true
    }

    // Subscriptions

    /// Starts replicating an entity to a ready player: sends the spawn
    /// message followed by the entity's complete field/list state, so a
    /// late joiner is never left with default state.
    pub fn subscribe(&mut self, connection_id: ConnectionId, object_id: ObjectId) {
        if !self.is_server {
            return;
        }
        let ready = self
            .players
            .get(&connection_id)
            .map(Player::is_ready)
            .unwrap_or(false);
        if !ready {
            return;
        }
        let Some(record) = self.registry.get_mut(object_id) else {
            return;
        };
        if !record.subscribers.insert(connection_id) {
            return;
        }

        let spawn_payload = if record.is_scene_object {
            packet(
                game_msg::SERVER_SPAWN_SCENE_OBJECT,
                &SpawnSceneObjectMessage {
                    object_id,
                    position: record.position,
                    rotation: record.rotation,
                },
            )
        } else {
            packet(
                game_msg::SERVER_SPAWN_OBJECT,
                &SpawnObjectMessage {
                    hash_asset_id: record.hash_asset_id,
                    object_id,
                    is_owner: record.owner == connection_id,
                    position: record.position,
                    rotation: record.rotation,
                },
            )
        };
        let mut state_payloads = Vec::new();
        for init in record.replica.initial_sync_fields() {
            state_payloads.push(sync_packet(
                game_msg::SERVER_UPDATE_SYNC_FIELD,
                object_id,
                init.behaviour_index,
                init.element_id,
                &init.payload,
            ));
        }
        for init in record.replica.initial_sync_lists() {
            state_payloads.push(sync_packet(
                game_msg::SERVER_UPDATE_SYNC_LIST,
                object_id,
                init.behaviour_index,
                init.element_id,
                &init.payload,
            ));
        }

        if let Some(player) = self.players.get_mut(&connection_id) {
            player.subscribing.insert(object_id);
        }
        self.transport
            .send_to_one(connection_id, DeliveryMode::ReliableOrdered, &spawn_payload);
        for payload in &state_payloads {
            self.transport
                .send_to_one(connection_id, DeliveryMode::ReliableOrdered, payload);
        }
    }

    /// Ends one player's subscription to one entity. With `notify`, the
    /// player is told to hide it (`RemovedFromSubscribing`).
    pub fn unsubscribe(&mut self, connection_id: ConnectionId, object_id: ObjectId, notify: bool) {
        if !self.is_server {
            return;
        }
        if let Some(record) = self.registry.get_mut(object_id) {
            record.subscribers.remove(&connection_id);
        }
        if let Some(player) = self.players.get_mut(&connection_id) {
            player.subscribing.remove(&object_id);
        }
        if notify {
            let ready = self
                .players
                .get(&connection_id)
                .map(Player::is_ready)
                .unwrap_or(false);
            if ready {
                let payload = packet(
                    game_msg::SERVER_DESTROY_OBJECT,
                    &DestroyObjectMessage {
                        object_id,
                        reason: DestroyReason::RemovedFromSubscribing,
                    },
                );
                self.transport
                    .send_to_one(connection_id, DeliveryMode::ReliableOrdered, &payload);
            }
        }
    }

    // State replication

    /// Fans a field update out to the entity's ready subscribers.
    pub fn server_update_sync_field(&mut self, info: ElementInfo, payload: &[u8]) {
        self.send_sync_element(game_msg::SERVER_UPDATE_SYNC_FIELD, info, payload);
    }

    /// Fans a list operation out to the entity's ready subscribers.
    pub fn server_update_sync_list(&mut self, info: ElementInfo, payload: &[u8]) {
        self.send_sync_element(game_msg::SERVER_UPDATE_SYNC_LIST, info, payload);
    }

    fn send_sync_element(&mut self, msg_type: u16, info: ElementInfo, payload: &[u8]) {
        if !self.is_server {
            return;
        }
        let Some(record) = self.registry.get(info.object_id) else {
            trace!("sync update for missing object {}", info.object_id);
            return;
        };
        let targets: Vec<ConnectionId> = record
            .subscribers
            .iter()
            .copied()
            .filter(|connection_id| {
                self.players
                    .get(connection_id)
                    .map(Player::is_ready)
                    .unwrap_or(false)
            })
            .collect();
        if targets.is_empty() {
            return;
        }
        let full = sync_packet(
            msg_type,
            info.object_id,
            info.behaviour_index,
            info.element_id,
            payload,
        );
        self.transport
            .send_to_many(&targets, DeliveryMode::ReliableOrdered, &full);
    }

    /// Behaviour-granularity sync to the entity's ready subscribers, with
    /// a caller-chosen delivery mode.
    pub fn server_sync_behaviour(
        &mut self,
        object_id: ObjectId,
        behaviour_index: u8,
        mode: DeliveryMode,
        payload: &[u8],
    ) {
        if !self.is_server {
            return;
        }
        let Some(record) = self.registry.get(object_id) else {
            return;
        };
        let targets: Vec<ConnectionId> = record
            .subscribers
            .iter()
            .copied()
            .filter(|connection_id| {
                self.players
                    .get(connection_id)
                    .map(Player::is_ready)
                    .unwrap_or(false)
            })
            .collect();
        if targets.is_empty() {
            return;
        }
        let mut writer = ByteWriter::new();
        writer.write_u16(game_msg::SERVER_SYNC_BEHAVIOUR);
        writer.write_packed_u32(object_id);
        writer.write_u8(behaviour_index);
        writer.write_bytes(payload);
        self.transport.send_to_many(&targets, mode, writer.as_slice());
    }

    // Remote calls

    /// Invokes a function on an entity from the server side. `Server`
    /// executes locally; every other mode forwards the opaque envelope to
    /// the connections the mode implies. A host's colocated client gets
    /// its copy through the transport like any other connection.
    pub fn server_call_function(
        &mut self,
        target: RpcTarget,
        target_connection: ConnectionId,
        info: ElementInfo,
        args: &[u8],
    ) {
        if !self.is_server {
            return;
        }
        if !self.registry.contains(info.object_id) {
            trace!("call for missing object {}", info.object_id);
            return;
        }
        if target == RpcTarget::Server {
            if let Some(record) = self.registry.get_mut(info.object_id) {
                let mut reader = ByteReader::new(args);
                if let Err(error) = record.replica.invoke(&info, &mut reader) {
                    warn!("server-side call on object {} failed: {}", info.object_id, error);
                }
            }
            return;
        }
        let payload = rpc::server_call_packet(&info, args);
        let targets = self.rpc_targets(target, target_connection, info.object_id);
        if !targets.is_empty() {
            self.transport
                .send_to_many(&targets, DeliveryMode::ReliableOrdered, &payload);
        }
    }

    pub(crate) fn route_client_call(
        &mut self,
        envelope: rpc::CallEnvelope<'_>,
    ) -> Result<(), GameError> {
        if !self.registry.contains(envelope.info.object_id) {
            // expected churn: the entity died between queue and delivery
            trace!("dropping call for missing object {}", envelope.info.object_id);
            return Ok(());
        }
        if envelope.target == RpcTarget::Server {
            if let Some(record) = self.registry.get_mut(envelope.info.object_id) {
                let mut reader = ByteReader::new(envelope.args);
                record.replica.invoke(&envelope.info, &mut reader)?;
            }
            return Ok(());
        }
        let payload = rpc::server_call_packet(&envelope.info, envelope.args);
        let targets = self.rpc_targets(
            envelope.target,
            envelope.target_connection,
            envelope.info.object_id,
        );
        if !targets.is_empty() {
            self.transport
                .send_to_many(&targets, DeliveryMode::ReliableOrdered, &payload);
        }
        Ok(())
    }

    fn rpc_targets(
        &self,
        target: RpcTarget,
        target_connection: ConnectionId,
        object_id: ObjectId,
    ) -> Vec<ConnectionId> {
        match target {
            RpcTarget::Server => Vec::new(),
            RpcTarget::All => self.players.keys().copied().collect(),
            RpcTarget::AllExceptOwner => {
                let owner = self
                    .registry
                    .get(object_id)
                    .map(|record| record.owner)
                    .unwrap_or(0);
                self.players
                    .keys()
                    .copied()
                    .filter(|connection_id| *connection_id != owner)
                    .collect()
            }
            RpcTarget::Target => vec![target_connection],
        }
    }

    /// Invokes a function on an entity from the client side. The server
    /// re-dispatches by mode.
    pub fn client_call_function(
        &mut self,
        target: RpcTarget,
        target_connection: ConnectionId,
        info: ElementInfo,
        args: &[u8],
    ) {
        if !self.client_connected {
            return;
        }
        let payload = rpc::client_call_packet(target, target_connection, &info, args);
        self.transport
            .send_to_one(0, DeliveryMode::ReliableOrdered, &payload);
    }

    // Outbound client messages

    pub fn send_client_enter_game(&mut self) {
        if !self.client_connected {
            return;
        }
        self.transport.send_to_one(
            0,
            DeliveryMode::ReliableOrdered,
            &empty_packet(game_msg::CLIENT_ENTER_GAME),
        );
    }

    pub fn send_client_ready(&mut self) {
        if !self.client_connected {
            return;
        }
        let mut writer = ByteWriter::new();
        writer.write_u16(game_msg::CLIENT_READY);
        self.with_handler(|_, handler| handler.serialize_ready_extra(&mut writer));
        self.transport
            .send_to_one(0, DeliveryMode::ReliableOrdered, writer.as_slice());
    }

    pub fn send_client_not_ready(&mut self) {
        if !self.client_connected {
            return;
        }
        self.transport.send_to_one(
            0,
            DeliveryMode::ReliableOrdered,
            &empty_packet(game_msg::CLIENT_NOT_READY),
        );
    }

    /// High-frequency transform upload; tolerates loss by design.
    pub fn client_send_transform(
        &mut self,
        object_id: ObjectId,
        behaviour_index: u8,
        payload: &[u8],
    ) {
        if !self.client_connected {
            return;
        }
        let mut writer = ByteWriter::new();
        writer.write_u16(game_msg::CLIENT_SEND_TRANSFORM);
        writer.write_packed_u32(object_id);
        writer.write_u8(behaviour_index);
        writer.write_bytes(payload);
        self.transport
            .send_to_one(0, DeliveryMode::Unreliable, writer.as_slice());
    }

    // Outbound server messages

    pub fn send_server_time_all(&mut self) {
        if !self.is_server {
            return;
        }
        let connections: Vec<ConnectionId> = self.players.keys().copied().collect();
        if connections.is_empty() {
            return;
        }
        let message = ServerTimeMessage {
            server_time: self.server_time(),
        };
        let payload = packet(game_msg::SERVER_TIME, &message);
        self.transport
            .send_to_many(&connections, DeliveryMode::Sequenced, &payload);
    }

    pub fn send_server_time_to(&mut self, connection_id: ConnectionId) {
        if !self.is_server {
            return;
        }
        let message = ServerTimeMessage {
            server_time: self.server_time(),
        };
        self.transport.send_to_one(
            connection_id,
            DeliveryMode::Sequenced,
            &packet(game_msg::SERVER_TIME, &message),
        );
    }

    /// Announces the server scene to one connection, e.g. in response to
    /// EnterGame.
    pub fn server_send_scene_change(
        &mut self,
        connection_id: ConnectionId,
        message: &SceneChangeMessage,
    ) {
        if !self.is_server {
            return;
        }
        self.transport.send_to_one(
            connection_id,
            DeliveryMode::ReliableOrdered,
            &packet(game_msg::SERVER_SCENE_CHANGE, message),
        );
    }

    /// Reports an error to one ready player, optionally asking it to
    /// disconnect.
    pub fn server_send_error(
        &mut self,
        connection_id: ConnectionId,
        should_disconnect: bool,
        message: &str,
    ) {
        if !self.is_server {
            return;
        }
        let ready = self
            .players
            .get(&connection_id)
            .map(Player::is_ready)
            .unwrap_or(false);
        if !ready {
            return;
        }
        let message = ServerErrorMessage {
            should_disconnect,
            message: message.to_string(),
        };
        self.transport.send_to_one(
            connection_id,
            DeliveryMode::ReliableOrdered,
            &packet(game_msg::SERVER_ERROR, &message),
        );
    }

    pub fn server_broadcast_error(&mut self, should_disconnect: bool, message: &str) {
        if !self.is_server {
            return;
        }
        let connections: Vec<ConnectionId> = self.players.keys().copied().collect();
        for connection_id in connections {
            self.server_send_error(connection_id, should_disconnect, message);
        }
    }

    // Custom message plumbing

    /// Sends a typed packet to one connection from the server role. For
    /// host-defined message types registered alongside the built-ins.
    pub fn server_send_packet<M: Serde>(
        &mut self,
        connection_id: ConnectionId,
        mode: DeliveryMode,
        msg_type: u16,
        message: &M,
    ) {
        if !self.is_server {
            return;
        }
        self.transport
            .send_to_one(connection_id, mode, &packet(msg_type, message));
    }

    /// Sends a pre-built packet (type prefix included) from the server
    /// role.
    pub fn server_send_raw(&mut self, connection_id: ConnectionId, payload: &[u8]) {
        if !self.is_server {
            return;
        }
        self.transport
            .send_to_one(connection_id, DeliveryMode::ReliableOrdered, payload);
    }

    /// Sends a typed packet to the server from the client role.
    pub fn client_send_packet<M: Serde>(&mut self, mode: DeliveryMode, msg_type: u16, message: &M) {
        if !self.client_connected {
            return;
        }
        self.transport.send_to_one(0, mode, &packet(msg_type, message));
    }

    /// Sends a pre-built packet (type prefix included) from the client
    /// role.
    pub fn client_send_raw(&mut self, payload: &[u8]) {
        if !self.client_connected {
            return;
        }
        self.transport
            .send_to_one(0, DeliveryMode::ReliableOrdered, payload);
    }

    // Inbound dispatch

    /// Entry point for packets arriving at the server role. Unknown types
    /// and malformed bodies are dropped; nothing here aborts the process.
    pub fn receive_server_message(&mut self, connection_id: ConnectionId, payload: &[u8]) {
        if !self.is_server {
            return;
        }
        self.dispatch(true, connection_id, payload);
    }

    /// Entry point for packets arriving at the client role.
    pub fn receive_client_message(&mut self, payload: &[u8]) {
        if !self.is_client {
            return;
        }
        self.dispatch(false, 0, payload);
    }

    fn dispatch(&mut self, server_bound: bool, connection_id: ConnectionId, payload: &[u8]) {
        if payload.len() < 2 {
            warn!(
                "{}",
                GameError::MissingMessageType {
                    length: payload.len()
                }
            );
            return;
        }
        let msg_type = u16::from_le_bytes([payload[0], payload[1]]);
        let table = if server_bound {
            &self.server_handlers
        } else {
            &self.client_handlers
        };
        let Some(handler) = table.get(&msg_type).copied() else {
            // forward compatibility with newer senders
            warn!("dropping unknown message type {}", msg_type);
            return;
        };
        let mut reader = ByteReader::new(&payload[2..]);
        if let Err(error) = handler(self, connection_id, &mut reader) {
            warn!("dropping message type {}: {}", msg_type, error);
        }
    }

    // Hooks

    pub(crate) fn with_handler<R>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut dyn GameHandler) -> R,
    ) -> Option<R> {
        let mut handler = self.handler.take()?;
        let result = f(self, handler.as_mut());
        self.handler = Some(handler);
        Some(result)
    }
}

fn sync_packet(
    msg_type: u16,
    object_id: ObjectId,
    behaviour_index: u8,
    element_id: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(msg_type);
    ElementInfo::new(object_id, behaviour_index, element_id).ser(&mut writer);
    writer.write_bytes(payload);
    writer.to_bytes()
}
