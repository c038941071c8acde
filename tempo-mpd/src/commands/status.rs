use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::{
    errors::{MpdError, MpdResult},
    from_mpd::{FromMpd, LineHandled},
    model::{Playlist, Song},
};

#[derive(Debug, Default, Clone, Serialize)]
pub struct Status {
    pub volume: Option<u8>, // None when MPD reports -1, no mixer
    pub repeat: bool,
    pub random: bool,
    pub single: OnOffOneshot,
    pub consume: OnOffOneshot,
    pub queue_version: Option<u32>,
    pub queue_length: u32,
    pub state: State,
    pub song: Option<u32>,   // queue position of the current song
    pub songid: Option<u32>, // queue id of the current song
    pub nextsong: Option<u32>,
    pub nextsongid: Option<u32>,
    pub elapsed: Duration,
    pub duration: Duration,
    pub bitrate: Option<u32>, // kbps
    pub xfade: Option<u32>,
    pub audio: Option<String>, // samplerate:bits:channels
    pub updating_db: Option<u32>,
    pub error: Option<String>,
    /// Stored playlist most recently loaded into the queue
    pub playlist: Option<Playlist>,
    pub current_song: Option<Song>,
}

impl FromMpd for Status {
    fn next_internal(&mut self, key: &str, value: String) -> MpdResult<LineHandled> {
        match key {
            "volume" => self.volume = u8::try_from(value.parse::<i32>()?).ok(),
            "repeat" => self.repeat = value != "0",
            "random" => self.random = value != "0",
            "single" => self.single = value.parse()?,
            "consume" => self.consume = value.parse()?,
            "playlist" => self.queue_version = Some(value.parse()?),
            "playlistlength" => self.queue_length = value.parse()?,
            "state" => self.state = value.parse()?,
            "song" => self.song = Some(value.parse()?),
            "songid" => self.songid = Some(value.parse()?),
            "nextsong" => self.nextsong = Some(value.parse()?),
            "nextsongid" => self.nextsongid = Some(value.parse()?),
            "elapsed" => self.elapsed = seconds(&value)?,
            "duration" => self.duration = seconds(&value)?,
            "bitrate" if value != "0" => self.bitrate = Some(value.parse()?),
            "bitrate" => self.bitrate = None,
            "xfade" => self.xfade = Some(value.parse()?),
            "audio" => self.audio = Some(value),
            "updating_db" => self.updating_db = Some(value.parse()?),
            "error" => self.error = Some(value),
            "lastloadedplaylist" if value.is_empty() => self.playlist = None,
            "lastloadedplaylist" => self.playlist = Some(Playlist::new(value)),
            "time" | "partition" | "mixrampdb" | "mixrampdelay" => {} // not surfaced
            _ => return Ok(LineHandled::No { value }),
        }
        Ok(LineHandled::Yes)
    }
}

fn seconds(value: &str) -> MpdResult<Duration> {
    Duration::try_from_secs_f64(value.parse()?)
        .map_err(|err| MpdError::Malformed(format!("Invalid duration '{value}': {err}")))
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum State {
    Play,
    #[default]
    Stop,
    Pause,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Display, EnumString, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOffOneshot {
    #[strum(serialize = "1")]
    On,
    #[default]
    #[strum(serialize = "0")]
    Off,
    #[strum(serialize = "oneshot")]
    Oneshot,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::from_mpd::parse_response;

    #[test]
    fn parses_status_block() {
        let lines = [
            "volume: 65",
            "repeat: 1",
            "random: 0",
            "single: oneshot",
            "consume: 0",
            "playlist: 12",
            "playlistlength: 3",
            "state: pause",
            "song: 1",
            "songid: 42",
            "elapsed: 12.5",
            "duration: 200.25",
            "bitrate: 320",
            "audio: 44100:16:2",
            "lastloadedplaylist: Road trip",
            "OK",
        ];

        let status: Status = parse_response(&lines).unwrap();

        assert_eq!(status.volume, Some(65));
        assert!(status.repeat);
        assert!(!status.random);
        assert_eq!(status.single, OnOffOneshot::Oneshot);
        assert_eq!(status.state, State::Pause);
        assert_eq!(status.queue_length, 3);
        assert_eq!(status.songid, Some(42));
        assert_eq!(status.elapsed, Duration::from_millis(12_500));
        assert_eq!(status.bitrate, Some(320));
        assert_eq!(status.playlist, Some(Playlist::new("Road trip")));
    }

    #[test]
    fn volume_without_mixer_is_none() {
        let status: Status = parse_response(&["volume: -1", "state: stop"]).unwrap();

        assert_eq!(status.volume, None);
        assert_eq!(status.state, State::Stop);
        assert_eq!(status.playlist, None);
    }

    #[test]
    fn unknown_state_is_malformed() {
        let result = parse_response::<Status, _>(&["state: dancing"]);

        assert!(matches!(result, Err(MpdError::Malformed(_))));
    }

    #[test]
    fn unknown_keys_are_not_fatal() {
        let status: Status = parse_response(&["state: play", "newfangled: 1"]).unwrap();

        assert_eq!(status.state, State::Play);
    }
}
