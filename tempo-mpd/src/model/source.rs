use serde::{Deserialize, Serialize};

use super::{
    MediaType, Playlist,
    search::SearchField,
    sort::SortField,
};

/// Where a listing comes from. Governs which operations make sense for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "playlist", rename_all = "lowercase")]
pub enum Source {
    Database,
    Queue,
    Playlist(Playlist),
    Favorites,
}

impl Source {
    /// Name of the stored playlist backing this source, if any.
    pub fn playlist_name(&self) -> Option<&str> {
        match self {
            Source::Playlist(playlist) => Some(&playlist.name),
            Source::Favorites => Some(super::FAVORITES_PLAYLIST),
            Source::Database | Source::Queue => None,
        }
    }

    pub fn is_reorderable(&self) -> bool {
        matches!(self, Source::Queue | Source::Playlist(_) | Source::Favorites)
    }

    pub fn is_sortable(&self) -> bool {
        matches!(self, Source::Database)
    }

    pub fn sort_fields(&self, media_type: MediaType) -> &'static [SortField] {
        if !self.is_sortable() {
            return &[];
        }
        match media_type {
            MediaType::Song => &[
                SortField::AlbumArtist,
                SortField::Artist,
                SortField::Album,
                SortField::Disc,
                SortField::Track,
                SortField::Title,
                SortField::Date,
                SortField::Genre,
                SortField::LastModified,
            ],
            MediaType::Album => &[
                SortField::AlbumArtist,
                SortField::AlbumArtistSort,
                SortField::Album,
                SortField::AlbumSort,
                SortField::Date,
            ],
            MediaType::Artist => &[
                SortField::AlbumArtist,
                SortField::AlbumArtistSort,
                SortField::Artist,
                SortField::ArtistSort,
            ],
            MediaType::Playlist => &[],
        }
    }

    pub fn search_fields(&self, media_type: MediaType) -> &'static [SearchField] {
        match (self, media_type) {
            (Source::Database, MediaType::Song) => &[
                SearchField::Any,
                SearchField::Title,
                SearchField::Artist,
                SearchField::AlbumArtist,
                SearchField::Album,
                SearchField::Genre,
                SearchField::Composer,
                SearchField::Performer,
                SearchField::File,
            ],
            (Source::Database, MediaType::Album) => &[SearchField::Album, SearchField::AlbumArtist],
            (Source::Database, MediaType::Artist) => {
                &[SearchField::Artist, SearchField::AlbumArtist]
            }
            (Source::Queue, MediaType::Song) => {
                &[SearchField::Any, SearchField::Title, SearchField::Artist, SearchField::Album]
            }
            _ => &[],
        }
    }
}
