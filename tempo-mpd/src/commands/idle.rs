use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::{
    errors::MpdResult,
    from_mpd::{FromMpd, LineHandled},
};

/// Subsystems a client can wait on with `idle`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, VariantArray, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IdleEvent {
    Database,       // the song database has been modified after update
    StoredPlaylist, // a stored playlist has been modified, renamed, created or deleted
    #[strum(serialize = "playlist")]
    #[serde(rename = "playlist")]
    Queue, // the queue has been modified
    Options,        // repeat, random, crossfade, replay gain
    Player,         // started, stopped, seeked or tags of the current song changed
    Mixer,          // the volume has been changed
    Output,         // an audio output has been added, removed or modified
}

#[derive(Debug, Default)]
pub struct IdleEvents(pub Vec<IdleEvent>);

impl FromMpd for IdleEvents {
    fn next_internal(&mut self, key: &str, value: String) -> MpdResult<LineHandled> {
        if key != "changed" {
            return Ok(LineHandled::No { value });
        }
        match value.parse() {
            Ok(event) => self.0.push(event),
            Err(_) => return Ok(LineHandled::No { value }),
        }
        Ok(LineHandled::Yes)
    }
}

/// The `idle` command line for the given subsystems, all of them when empty.
pub(crate) fn idle_command(events: &[IdleEvent]) -> String {
    let mut command = String::from("idle");
    for event in events {
        command.push(' ');
        command.push_str(event.as_ref());
    }
    command
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::from_mpd::parse_response;

    #[test]
    fn uses_wire_names() {
        assert_eq!(IdleEvent::Queue.as_ref(), "playlist");
        assert_eq!(IdleEvent::StoredPlaylist.as_ref(), "stored_playlist");
        assert_eq!("mixer".parse::<IdleEvent>().unwrap(), IdleEvent::Mixer);
        assert_eq!(IdleEvent::VARIANTS.len(), 7);
    }

    #[test]
    fn builds_idle_command() {
        assert_eq!(idle_command(&[]), "idle");
        assert_eq!(idle_command(&[IdleEvent::Player, IdleEvent::Queue]), "idle player playlist");
    }

    #[test]
    fn skips_unknown_subsystems() {
        let events: IdleEvents =
            parse_response(&["changed: sticker", "changed: player", "changed: mixer", "OK"]).unwrap();

        assert_eq!(events.0, vec![IdleEvent::Player, IdleEvent::Mixer]);
    }
}
