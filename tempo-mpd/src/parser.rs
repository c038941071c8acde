//! Turns response lines into key/value records and media entities.

use std::{collections::HashMap, str::FromStr, time::Duration};

use log::warn;

use crate::{
    errors::{MpdError, MpdResult},
    model::{
        Album, Artist, Media, MediaType, Song, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE,
    },
};

/// Lower-cased keys, the last occurrence of a key wins.
pub type Record = HashMap<String, String>;

const NAME_SEPARATOR: &str = " - ";

pub(crate) fn is_terminator(line: &str) -> bool {
    line.starts_with("OK") || line.starts_with("list_OK")
}

/// Splits at the first colon. Both halves are trimmed and the key is lower-cased.
pub fn parse_line(line: &str) -> MpdResult<(String, String)> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| MpdError::Malformed(format!("Expected 'key: value' but got '{line}'")))?;
    Ok((key.trim().to_lowercase(), value.trim().to_owned()))
}

/// Groups lines into chunks, each starting at a line beginning with `prefix`.
/// Lines preceding the first match form a chunk of their own.
pub fn chunk_lines<'lines, S: AsRef<str>>(lines: &'lines [S], prefix: &str) -> Vec<&'lines [S]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (idx, line) in lines.iter().enumerate() {
        if idx > start && line.as_ref().starts_with(prefix) {
            chunks.push(&lines[start..idx]);
            start = idx;
        }
    }
    if start < lines.len() {
        chunks.push(&lines[start..]);
    }
    chunks
}

/// Ordered key/value pairs, terminators skipped.
pub fn parse_pairs<S: AsRef<str>>(lines: &[S]) -> MpdResult<Vec<(String, String)>> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !is_terminator(line))
        .map(parse_line)
        .collect()
}

pub fn parse_record<S: AsRef<str>>(lines: &[S]) -> MpdResult<Record> {
    Ok(parse_pairs(lines)?.into_iter().collect())
}

/// Builds a single media entity from one response block. `index` is used as
/// the song position when the block carries no `pos`.
pub fn parse_media_response<S: AsRef<str>>(
    lines: &[S],
    media_type: MediaType,
    index: Option<u32>,
) -> MpdResult<Media> {
    let record = parse_record(lines)?;
    media_from_record(&record, media_type, index)
}

pub fn parse_media_response_array<S: AsRef<str>>(
    lines: &[S],
    media_type: MediaType,
    index: bool,
) -> MpdResult<Vec<Media>> {
    chunk_lines(lines, "file:")
        .into_iter()
        .filter(|chunk| chunk.iter().any(|line| !is_terminator(line.as_ref())))
        .enumerate()
        .map(|(idx, chunk)| {
            let position = index.then(|| u32::try_from(idx).ok()).flatten();
            parse_media_response(chunk, media_type, position)
        })
        .collect()
}

fn media_from_record(record: &Record, media_type: MediaType, index: Option<u32>) -> MpdResult<Media> {
    let file = record
        .get("file")
        .ok_or_else(|| MpdError::Malformed("Response is missing the 'file' key".to_owned()))?;

    match media_type {
        MediaType::Song => Ok(Media::Song(song_from_record(record, file, index))),
        MediaType::Album => Ok(Media::Album(album_from_record(record, file))),
        MediaType::Artist => Ok(Media::Artist(artist_from_record(record, file))),
        MediaType::Playlist => {
            Err(MpdError::Unsupported(format!("Cannot build '{media_type}' from a media record")))
        }
    }
}

fn artist_from_record(record: &Record, file: &str) -> Artist {
    Artist {
        name: first_of(record, &["albumartist", "artist"])
            .unwrap_or(UNKNOWN_ARTIST)
            .to_owned(),
        sort_name: first_of(record, &["albumartistsort", "artistsort"]).map(str::to_owned),
        file: file.to_owned(),
    }
}

fn album_from_record(record: &Record, file: &str) -> Album {
    Album {
        title: text(record, "album").unwrap_or(UNKNOWN_ALBUM).to_owned(),
        sort_title: text(record, "albumsort").map(str::to_owned),
        artist: artist_from_record(record, file),
        file: file.to_owned(),
    }
}

fn song_from_record(record: &Record, file: &str, index: Option<u32>) -> Song {
    let (artist, title) = match (text(record, "name"), text(record, "artist"), text(record, "title")) {
        (Some(name), None, None) => match name.split_once(NAME_SEPARATOR) {
            Some((artist, title)) => (artist.to_owned(), title.to_owned()),
            None => (UNKNOWN_ARTIST.to_owned(), name.to_owned()),
        },
        (_, artist, title) => (
            artist.unwrap_or(UNKNOWN_ARTIST).to_owned(),
            title.unwrap_or(UNKNOWN_TITLE).to_owned(),
        ),
    };

    let duration = lenient::<f64>(record, "duration")
        .or_else(|| lenient::<f64>(record, "time"))
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or_default();

    Song {
        file: file.to_owned(),
        id: lenient(record, "id"),
        position: lenient(record, "pos").or(index),
        artist,
        artist_sort: text(record, "artistsort").map(str::to_owned),
        title,
        title_sort: text(record, "titlesort").map(str::to_owned),
        duration,
        disc: lenient(record, "disc").unwrap_or(1),
        track: lenient(record, "track").unwrap_or(1),
        genre: text(record, "genre").map(str::to_owned),
        composer: text(record, "composer").map(str::to_owned),
        performer: text(record, "performer").map(str::to_owned),
        conductor: text(record, "conductor").map(str::to_owned),
        ensemble: text(record, "ensemble").map(str::to_owned),
        mood: text(record, "mood").map(str::to_owned),
        comment: text(record, "comment").map(str::to_owned),
        album: album_from_record(record, file),
    }
}

fn text<'r>(record: &'r Record, key: &str) -> Option<&'r str> {
    record.get(key).map(String::as_str)
}

fn first_of<'r>(record: &'r Record, keys: &[&str]) -> Option<&'r str> {
    keys.iter().find_map(|key| text(record, key))
}

/// Numeric value of `key`. Values in the `3/12` form use the part before the
/// slash. Unparseable values are logged and treated as absent.
fn lenient<T: FromStr>(record: &Record, key: &str) -> Option<T> {
    let raw = text(record, key)?;
    let value = raw.split('/').next().unwrap_or(raw).trim();
    match value.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw; "Failed to parse numeric value, ignoring it");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;
    use crate::model::MediaItem;

    fn song(lines: &[&str]) -> Song {
        parse_media_response(lines, MediaType::Song, None).unwrap().into_song().unwrap()
    }

    #[rstest]
    #[case("Artist: Foo", ("artist", "Foo"))]
    #[case("a:b:c", ("a", "b:c"))]
    #[case("  Title :  spaced out  ", ("title", "spaced out"))]
    #[case("empty:", ("empty", ""))]
    fn parses_lines(#[case] line: &str, #[case] expected: (&str, &str)) {
        let (key, value) = parse_line(line).unwrap();

        assert_eq!((key.as_str(), value.as_str()), expected);
    }

    #[test]
    fn line_without_colon_is_malformed() {
        assert!(matches!(parse_line("OK MPD"), Err(MpdError::Malformed(_))));
    }

    #[test]
    fn chunks_on_prefix() {
        let lines = ["file: a", "Title: A", "file: b", "Title: B"];

        let chunks = chunk_lines(&lines, "file:");

        assert_eq!(chunks, vec![&lines[0..2], &lines[2..4]]);
    }

    #[test]
    fn leading_lines_form_their_own_chunk() {
        let lines = ["directory: x", "file: a", "Title: A"];

        let chunks = chunk_lines(&lines, "file:");

        assert_eq!(chunks, vec![&lines[0..1], &lines[1..3]]);
    }

    #[test]
    fn no_match_gives_single_chunk() {
        let lines = ["volume: 1", "state: play"];

        assert_eq!(chunk_lines(&lines, "file:"), vec![&lines[..]]);
    }

    #[test]
    fn empty_input_gives_no_chunks() {
        let lines: [&str; 0] = [];

        assert!(chunk_lines(&lines, "file:").is_empty());
    }

    #[test]
    fn missing_file_is_malformed() {
        let result = parse_media_response(&["Title: x", "OK"], MediaType::Song, None);

        assert!(matches!(result, Err(MpdError::Malformed(_))));
    }

    #[test]
    fn playlist_media_type_is_unsupported() {
        let result = parse_media_response(&["file: a.mp3"], MediaType::Playlist, None);

        assert!(matches!(result, Err(MpdError::Unsupported(_))));
    }

    #[test]
    fn builds_full_song() {
        let song = song(&[
            "file: music/song.flac",
            "Artist: Artist",
            "ArtistSort: Artist, The",
            "AlbumArtist: Album Artist",
            "Title: Song",
            "Album: Record",
            "AlbumSort: Record, The",
            "duration: 215.123",
            "Time: 999",
            "Disc: 2",
            "Track: 3/12",
            "Genre: Rock",
            "Pos: 4",
            "Id: 17",
            "OK",
        ]);

        assert_eq!(song.file, "music/song.flac");
        assert_eq!(song.artist, "Artist");
        assert_eq!(song.artist_sort.as_deref(), Some("Artist, The"));
        assert_eq!(song.title, "Song");
        assert_eq!(song.duration, Duration::from_secs_f64(215.123));
        assert_eq!(song.disc, 2);
        assert_eq!(song.track, 3);
        assert_eq!(song.position, Some(4));
        assert_eq!(song.id, Some(17));
        assert_eq!(song.genre.as_deref(), Some("Rock"));
        assert_eq!(song.album.title, "Record");
        assert_eq!(song.album.sort_title.as_deref(), Some("Record, The"));
        assert_eq!(song.album.artist.name, "Album Artist");
    }

    #[test]
    fn applies_defaults() {
        let song = song(&["file: a.mp3"]);

        assert_eq!(song.artist, UNKNOWN_ARTIST);
        assert_eq!(song.title, UNKNOWN_TITLE);
        assert_eq!(song.album.title, UNKNOWN_ALBUM);
        assert_eq!(song.album.artist.name, UNKNOWN_ARTIST);
        assert_eq!(song.duration, Duration::ZERO);
        assert_eq!((song.disc, song.track), (1, 1));
        assert_eq!((song.id, song.position), (None, None));
    }

    #[rstest]
    #[case("Name: Radio Host - Morning Show", "Radio Host", "Morning Show")]
    #[case("Name: Some Stream", UNKNOWN_ARTIST, "Some Stream")]
    #[case("Name: A - B - C", "A", "B - C")]
    fn splits_stream_name(#[case] name: &str, #[case] artist: &str, #[case] title: &str) {
        let song = song(&["file: http://stream", name]);

        assert_eq!(song.artist, artist);
        assert_eq!(song.title, title);
    }

    #[test]
    fn name_is_ignored_when_title_present() {
        let song = song(&["file: http://stream", "Name: A - B", "Title: Real"]);

        assert_eq!(song.artist, UNKNOWN_ARTIST);
        assert_eq!(song.title, "Real");
    }

    #[test]
    fn falls_back_to_legacy_time() {
        assert_eq!(song(&["file: a", "Time: 42"]).duration, Duration::from_secs(42));
    }

    #[test]
    fn garbage_numbers_are_ignored() {
        let song = song(&["file: a", "Track: x", "duration: soon", "Id: -3"]);

        assert_eq!(song.track, 1);
        assert_eq!(song.duration, Duration::ZERO);
        assert_eq!(song.id, None);
    }

    #[test]
    fn last_value_wins() {
        assert_eq!(song(&["file: a", "Title: first", "Title: second"]).title, "second");
    }

    #[test]
    fn artist_falls_back_to_artist_tag() {
        let media =
            parse_media_response(&["file: a", "Artist: Solo", "ArtistSort: Solo, X"], MediaType::Artist, None)
                .unwrap();

        let artist = media.into_artist().unwrap();
        assert_eq!(artist.name, "Solo");
        assert_eq!(artist.sort_name.as_deref(), Some("Solo, X"));
        assert_eq!(artist.id(), "Solo");
    }

    #[test]
    fn album_id_uses_album_artist() {
        let media = parse_media_response(
            &["file: a", "Artist: Guest", "AlbumArtist: Host", "Album: Live"],
            MediaType::Album,
            None,
        )
        .unwrap();

        assert_eq!(media.id(), "Host - Live");
    }

    #[test]
    fn array_assigns_index_when_position_missing() {
        let lines = ["file: a", "Title: A", "file: b", "Pos: 7", "file: c", "OK"];

        let songs: Vec<Song> = parse_media_response_array(&lines, MediaType::Song, true)
            .unwrap()
            .into_iter()
            .filter_map(Media::into_song)
            .collect();

        assert_eq!(songs.len(), 3);
        assert_eq!(songs[0].position, Some(0));
        assert_eq!(songs[1].position, Some(7));
        assert_eq!(songs[2].position, Some(2));
    }

    #[test]
    fn array_without_index_leaves_position_empty() {
        let media = parse_media_response_array(&["file: a", "file: b", "OK"], MediaType::Song, false)
            .unwrap();

        assert!(media.into_iter().filter_map(Media::into_song).all(|s| s.position.is_none()));
    }

    #[test]
    fn empty_response_gives_no_media() {
        assert!(parse_media_response_array(&["OK"], MediaType::Song, true).unwrap().is_empty());
    }
}
