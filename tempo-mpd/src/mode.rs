use strum::Display;

/// Per-session transport tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionMode {
    /// Upper bound of a single socket read
    pub chunk_size: usize,
    pub keepalive: bool,
}

impl ConnectionMode {
    /// Sits in `idle` for long stretches, responses are a handful of lines.
    pub const IDLE: Self = Self { chunk_size: 1024, keepalive: true };
    /// Large binary transfers, also used as the negotiated `binarylimit`.
    pub const ARTWORK: Self = Self { chunk_size: 1 << 18, keepalive: false };
    pub const COMMAND: Self = Self { chunk_size: 16 * 1024, keepalive: true };
}

/// The three independent sessions a client keeps open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Profile {
    Idle,
    Artwork,
    Command,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Idle, Profile::Artwork, Profile::Command];

    pub fn mode(self) -> ConnectionMode {
        match self {
            Profile::Idle => ConnectionMode::IDLE,
            Profile::Artwork => ConnectionMode::ARTWORK,
            Profile::Command => ConnectionMode::COMMAND,
        }
    }
}
