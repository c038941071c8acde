mod media;
mod output;
mod playlist;
mod search;
mod sort;
mod source;

pub use media::{
    Album, Artist, Media, MediaItem, MediaType, Song, UNKNOWN_ALBUM, UNKNOWN_ARTIST,
    UNKNOWN_TITLE,
};
pub use output::{Output, Outputs};
pub use playlist::{FAVORITES_PLAYLIST, Playlist};
pub use search::{SearchField, SearchFields};
pub use sort::{SortDescriptor, SortDirection, SortField};
pub use source::Source;
