use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::errors::{MpdError, MpdResult};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u32 = 6600;

#[derive(Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MpdPassword(pub String);

impl std::fmt::Debug for MpdPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "*****")
    }
}

impl From<&str> for MpdPassword {
    fn from(s: &str) -> Self {
        s.to_owned().into()
    }
}

impl From<String> for MpdPassword {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which command fetches cover art.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkGetter {
    /// `albumart`, a cover file next to the song
    #[default]
    Library,
    /// `readpicture`, a picture embedded in the song's tags
    Embedded,
}

impl ArtworkGetter {
    pub fn command(self) -> &'static str {
        match self {
            ArtworkGetter::Library => "albumart",
            ArtworkGetter::Embedded => "readpicture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct Server {
    #[builder(into, default = DEFAULT_HOST.to_owned())]
    pub host: String,
    #[builder(default = DEFAULT_PORT)]
    pub port: u32,
    #[builder(into)]
    pub password: Option<MpdPassword>,
    #[builder(default)]
    pub artwork_getter: ArtworkGetter,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            password: None,
            artwork_getter: ArtworkGetter::default(),
        }
    }
}

impl Server {
    /// Defaults overridden by `MPD_HOST` (`host` or `password@host`) and
    /// `MPD_PORT`.
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::var("MPD_HOST").ok(), std::env::var("MPD_PORT").ok())
    }

    fn from_env_vars(mpd_host: Option<String>, mpd_port: Option<String>) -> Self {
        let mut server = Self::default();

        if let Some(host) = mpd_host.filter(|h| !h.is_empty()) {
            let (password, host) = match host.split_once('@') {
                Some((password, host)) if !password.is_empty() => {
                    (Some(MpdPassword::from(password)), host)
                }
                _ => (None, host.as_str()),
            };
            if host.starts_with('/') || host.starts_with('@') || host.is_empty() {
                log::warn!(host; "Only TCP connections are supported, ignoring MPD_HOST");
            } else {
                server.host = host.to_owned();
            }
            server.password = password;
        }

        if let Some(port) = mpd_port {
            match port.trim().parse() {
                Ok(port) => server.port = port,
                Err(err) => log::warn!(port = port.as_str(), err:?; "Invalid MPD_PORT, using default port"),
            }
        }

        server
    }

    pub fn validate(&self) -> MpdResult<()> {
        if self.host.trim().is_empty() {
            return Err(MpdError::InvalidConfig("Host must not be empty".to_owned()));
        }
        if !(1..=u32::from(u16::MAX)).contains(&self.port) {
            return Err(MpdError::InvalidConfig(format!(
                "Port must be between 1 and {}, got {}",
                u16::MAX,
                self.port
            )));
        }
        Ok(())
    }

    pub(crate) fn socket_port(&self) -> MpdResult<u16> {
        u16::try_from(self.port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| MpdError::InvalidConfig(format!("Invalid port {}", self.port)))
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.0.as_str()).filter(|p| !p.is_empty())
    }
}
