//! The closed message-type numbering shared by server and client. These
//! values are part of the deployed wire format: extending the protocol
//! means appending after [`HIGHEST`], never renumbering.
//!
//! Client-bound and server-bound types occupy disjoint values, so a host
//! process (both roles at once) can route any packet unambiguously.

/// Client announces presence after connecting.
pub const CLIENT_ENTER_GAME: u16 = 0;
/// Client is loaded and wants to participate in replication.
pub const CLIENT_READY: u16 = 1;
/// Client withdraws from replication.
pub const CLIENT_NOT_READY: u16 = 2;
/// Remote function call invoked by a client.
pub const CLIENT_CALL_FUNCTION: u16 = 3;
/// Attach to a pre-placed scene entity.
pub const SERVER_SPAWN_SCENE_OBJECT: u16 = 4;
/// Instantiate a dynamic entity from an asset hash.
pub const SERVER_SPAWN_OBJECT: u16 = 5;
/// Remove or hide an entity, with a reason code.
pub const SERVER_DESTROY_OBJECT: u16 = 6;
/// Generic field replication.
pub const SERVER_UPDATE_SYNC_FIELD: u16 = 7;
/// Remote function call invoked on client(s).
pub const SERVER_CALL_FUNCTION: u16 = 8;
/// Generic list replication.
pub const SERVER_UPDATE_SYNC_LIST: u16 = 9;
/// Clock beacon.
pub const SERVER_TIME: u16 = 10;
/// Behaviour-granularity state sync.
pub const SERVER_SYNC_BEHAVIOUR: u16 = 11;
/// Error report, optionally asking the client to disconnect.
pub const SERVER_ERROR: u16 = 12;
/// Scene-transition announcement.
pub const SERVER_SCENE_CHANGE: u16 = 13;
/// High-frequency transform upload.
pub const CLIENT_SEND_TRANSFORM: u16 = 14;

pub const HIGHEST: u16 = 14;
