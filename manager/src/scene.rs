/// Opaque handle to an in-flight load, minted by the [`SceneLoader`].
pub type LoadHandle = u64;

/// The asset-loading side of a scene transition, implemented by the host
/// engine. The manager only coordinates when loading starts and ends; how
/// content gets into memory is not its business.
pub trait SceneLoader {
    fn begin_load(&mut self, scene_name: &str) -> LoadHandle;

    /// Progress in `[0, 1]` for an in-flight load.
    fn progress(&self, handle: LoadHandle) -> f32;

    fn is_done(&self, handle: LoadHandle) -> bool;
}

/// Where a scene transition currently stands. One slot per process: a
/// transition request while another is in flight is coalesced into a
/// no-op, never queued, and a transition cannot be cancelled.
pub enum SceneState {
    Idle,
    Loading {
        scene_name: String,
        online: bool,
        step: LoadStep,
        handle: Option<LoadHandle>,
    },
}

impl SceneState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SceneState::Loading { .. })
    }
}

/// The strictly-ordered steps of a transition. The tick loop advances one
/// step per tick, so every boundary below is a suspension point; no other
/// part of the manager spans ticks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadStep {
    /// Reset transient state (online only), announce progress 0, hand the
    /// scene name to the loader.
    Start,
    /// Poll the loader, announcing progress each tick, until it reports
    /// done; then announce progress 1.
    Poll,
    /// Online: let the host register prefabs and scene objects for the
    /// freshly loaded scene.
    Setup,
    /// Online, server role: make scene objects live and run the
    /// server-loaded hook.
    ServerSpawn,
    /// Online, server role: broadcast SceneChange to every connection.
    Broadcast,
    /// Online, client role: run the client-loaded hook and send Ready.
    ClientFinish,
    /// Offline: run the offline hook; a non-persistent manager resets
    /// itself here.
    OfflineFinish,
}
