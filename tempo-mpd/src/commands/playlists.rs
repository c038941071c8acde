use derive_more::{AsRef, Into, IntoIterator};

use crate::{
    errors::{MpdError, MpdResult},
    from_mpd::{FromMpd, LineHandled},
    model::Playlist,
};

#[derive(Debug, Default, IntoIterator, AsRef, Into)]
pub struct Playlists(pub Vec<Playlist>);

impl FromMpd for Playlists {
    fn next_internal(&mut self, key: &str, value: String) -> MpdResult<LineHandled> {
        match key {
            "playlist" => self.0.push(Playlist::new(value)),
            "last-modified" => {
                let Some(last) = self.0.last_mut() else {
                    return Err(MpdError::Malformed(format!(
                        "No playlist in accumulator for last-modified '{value}'"
                    )));
                };
                last.last_modified = Some(value);
            }
            _ => return Ok(LineHandled::No { value }),
        }
        Ok(LineHandled::Yes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::from_mpd::parse_response;

    #[test]
    fn parses_playlists() {
        let playlists: Playlists = parse_response(&[
            "playlist: Favorites",
            "Last-Modified: 2024-05-01T10:00:00Z",
            "playlist: Road trip",
            "OK",
        ])
        .unwrap();

        assert_eq!(playlists.0, vec![Playlist::favorites(), Playlist::new("Road trip")]);
        assert_eq!(playlists.0[0].last_modified.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(playlists.0[1].last_modified, None);
    }

    #[test]
    fn modification_time_without_playlist_is_malformed() {
        let result = parse_response::<Playlists, _>(&["Last-Modified: 2024-05-01T10:00:00Z"]);

        assert!(matches!(result, Err(MpdError::Malformed(_))));
    }
}
