use std::{
    borrow::Cow,
    hash::{Hash, Hasher},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Capabilities shared by every media entity. Identity, and therefore
/// equality and hashing, is derived from [`MediaItem::id`] alone.
pub trait MediaItem {
    fn id(&self) -> Cow<'_, str>;
    fn file(&self) -> &str;
}

macro_rules! identified_by_id {
    ($($ty:ty),+) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.id() == other.id()
                }
            }

            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.id().hash(state);
                }
            }
        )+
    };
}

identified_by_id!(Artist, Album, Song);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Song,
    Album,
    Artist,
    Playlist,
}

#[derive(Debug, Clone, Serialize)]
pub struct Artist {
    pub name: String,
    pub sort_name: Option<String>,
    pub file: String,
}

impl MediaItem for Artist {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn file(&self) -> &str {
        &self.file
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub title: String,
    pub sort_title: Option<String>,
    pub artist: Artist,
    pub file: String,
}

impl MediaItem for Album {
    fn id(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{} - {}", self.artist.name, self.title))
    }

    fn file(&self) -> &str {
        &self.file
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Song {
    pub file: String,
    /// Queue assigned id, only present for songs listed from the queue
    pub id: Option<u32>,
    pub position: Option<u32>,
    pub artist: String,
    pub artist_sort: Option<String>,
    pub title: String,
    pub title_sort: Option<String>,
    pub duration: Duration,
    pub disc: u32,
    pub track: u32,
    pub genre: Option<String>,
    pub composer: Option<String>,
    pub performer: Option<String>,
    pub conductor: Option<String>,
    pub ensemble: Option<String>,
    pub mood: Option<String>,
    pub comment: Option<String>,
    pub album: Album,
}

impl MediaItem for Song {
    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.file)
    }

    fn file(&self) -> &str {
        &self.file
    }
}

/// A parsed media record. The parser hands this out instead of a type
/// parameter so callers match on what they actually received.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Media {
    Song(Song),
    Album(Album),
    Artist(Artist),
}

impl Media {
    pub fn media_type(&self) -> MediaType {
        match self {
            Media::Song(_) => MediaType::Song,
            Media::Album(_) => MediaType::Album,
            Media::Artist(_) => MediaType::Artist,
        }
    }

    pub fn into_song(self) -> Option<Song> {
        match self {
            Media::Song(song) => Some(song),
            _ => None,
        }
    }

    pub fn into_album(self) -> Option<Album> {
        match self {
            Media::Album(album) => Some(album),
            _ => None,
        }
    }

    pub fn into_artist(self) -> Option<Artist> {
        match self {
            Media::Artist(artist) => Some(artist),
            _ => None,
        }
    }
}

impl MediaItem for Media {
    fn id(&self) -> Cow<'_, str> {
        match self {
            Media::Song(song) => song.id(),
            Media::Album(album) => album.id(),
            Media::Artist(artist) => artist.id(),
        }
    }

    fn file(&self) -> &str {
        match self {
            Media::Song(song) => song.file(),
            Media::Album(album) => album.file(),
            Media::Artist(artist) => artist.file(),
        }
    }
}

impl PartialEq for Media {
    fn eq(&self, other: &Self) -> bool {
        self.media_type() == other.media_type() && self.id() == other.id()
    }
}

impl Eq for Media {}

impl Hash for Media {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.media_type().hash(state);
        self.id().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        hash::{DefaultHasher, Hash, Hasher},
    };

    use super::*;

    fn artist(name: &str) -> Artist {
        Artist { name: name.to_owned(), sort_name: None, file: "a.flac".to_owned() }
    }

    fn song(file: &str, title: &str) -> Song {
        Song {
            file: file.to_owned(),
            id: None,
            position: None,
            artist: UNKNOWN_ARTIST.to_owned(),
            artist_sort: None,
            title: title.to_owned(),
            title_sort: None,
            duration: Duration::ZERO,
            disc: 1,
            track: 1,
            genre: None,
            composer: None,
            performer: None,
            conductor: None,
            ensemble: None,
            mood: None,
            comment: None,
            album: Album {
                title: UNKNOWN_ALBUM.to_owned(),
                sort_title: None,
                artist: artist(UNKNOWN_ARTIST),
                file: file.to_owned(),
            },
        }
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn songs_with_same_file_are_equal_regardless_of_metadata() {
        let a = song("music/a.mp3", "First");
        let mut b = song("music/a.mp3", "Second");
        b.duration = Duration::from_secs(10);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn songs_with_different_files_differ() {
        assert_ne!(song("a.mp3", "Same"), song("b.mp3", "Same"));
    }

    #[test]
    fn album_id_combines_artist_and_title() {
        let album = Album {
            title: "Blonde on Blonde".to_owned(),
            sort_title: None,
            artist: artist("Bob Dylan"),
            file: "x.flac".to_owned(),
        };

        assert_eq!(album.id(), "Bob Dylan - Blonde on Blonde");
    }

    #[test]
    fn artists_are_identified_by_name() {
        let mut other = artist("Bach");
        other.file = "other.flac".to_owned();
        other.sort_name = Some("Bach, J.S.".to_owned());

        let set: HashSet<Artist> = [artist("Bach"), other].into_iter().collect();

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn media_of_different_kinds_never_compare_equal() {
        let as_artist = Media::Artist(artist("x.flac"));
        let as_song = Media::Song(song("x.flac", "t"));

        assert_eq!(as_artist.id(), as_song.id());
        assert_ne!(as_artist, as_song);
    }

    #[test]
    fn media_type_parses_case_insensitively() {
        assert_eq!("Album".parse::<MediaType>().ok(), Some(MediaType::Album));
        assert_eq!(MediaType::Playlist.to_string(), "playlist");
    }
}
