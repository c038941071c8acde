pub mod artwork;
pub mod idle;
pub mod list_playlist;
pub mod outputs;
pub mod playlists;
pub mod status;

pub use idle::{IdleEvent, IdleEvents};
pub use playlists::Playlists;
pub use status::{OnOffOneshot, State, Status};
