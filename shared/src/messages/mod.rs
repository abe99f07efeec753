pub mod game_msg;

mod destroy;
mod element_info;
mod scene;
mod server_error;
mod spawn;
mod time;

pub use destroy::DestroyObjectMessage;
pub use element_info::ElementInfo;
pub use scene::SceneChangeMessage;
pub use server_error::ServerErrorMessage;
pub use spawn::{SpawnObjectMessage, SpawnSceneObjectMessage};
pub use time::ServerTimeMessage;
