/// Tunables of a [`GameManager`](crate::GameManager). The defaults match
/// the common dedicated-server setup; a host process overrides what it
/// needs at construction time.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Seconds of manager clock between periodic ServerTime beacons.
    pub server_time_interval: f32,
    /// Send EnterGame automatically once the client connection is up.
    pub enter_game_on_connect: bool,
    /// Keep the manager alive after loading an offline scene. When false,
    /// finishing an offline load resets the manager completely.
    pub persist_across_scenes: bool,
    /// Gameplay scene the server loads on start. When unset (or already
    /// active) the server initializes in the current scene instead.
    pub online_scene: Option<String>,
    /// Lobby/menu scene loaded when the server or client stops.
    pub offline_scene: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            server_time_interval: 5.0,
            enter_game_on_connect: true,
            persist_across_scenes: false,
            online_scene: None,
            offline_scene: None,
        }
    }
}
