use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Name of the stored playlist that backs [`crate::model::Source::Favorites`].
pub const FAVORITES_PLAYLIST: &str = "Favorites";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    /// As reported by the server, never persisted.
    #[serde(skip)]
    pub last_modified: Option<String>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), last_modified: None }
    }

    pub fn favorites() -> Self {
        Self::new(FAVORITES_PLAYLIST)
    }

    pub fn is_favorites(&self) -> bool {
        self.name == FAVORITES_PLAYLIST
    }
}

impl PartialEq for Playlist {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Playlist {}

impl Hash for Playlist {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
