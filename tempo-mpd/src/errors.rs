use std::fmt::Display;

use thiserror::Error;

use crate::version::Version;

pub type MpdResult<T> = Result<T, MpdError>;

#[derive(Error, Debug, PartialEq)]
pub enum MpdError {
    #[error("Invalid server configuration: '{0}'")]
    InvalidConfig(String),
    #[error("Handshake failed: '{0}'")]
    Handshake(String),
    #[error("Unsupported MPD version '{found}', at least '{required}' is required")]
    UnsupportedMpdVersion { found: Version, required: Version },
    #[error("Authentication failed: '{0}'")]
    Authentication(MpdFailureResponse),
    #[error("Client has been already closed.")]
    ClientClosed,
    #[error("Connection to MPD timed out, '{0}'")]
    TimedOut(String),
    #[error("Connection refused, '{0}'")]
    Refused(String),
    #[error("IoError: '{0}'")]
    Io(String),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("MpdError: '{0}'")]
    Mpd(MpdFailureResponse),
    #[error("Malformed response: '{0}'")]
    Malformed(String),
    #[error("Unsupported operation: '{0}'")]
    Unsupported(String),
    #[error("Connection closed after {received} lines without a terminator")]
    UnterminatedResponse { received: usize },
}

/// Coarse classification of [`MpdError`] for callers deciding whether to
/// reconnect, give up or surface the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    Configuration,
    Handshake,
    Transport,
    Protocol,
    MalformedResponse,
    UnsupportedOperation,
    ReadLoop,
}

impl MpdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MpdError::InvalidConfig(_) => ErrorKind::Configuration,
            MpdError::Handshake(_)
            | MpdError::UnsupportedMpdVersion { .. }
            | MpdError::Authentication(_) => ErrorKind::Handshake,
            MpdError::ClientClosed
            | MpdError::TimedOut(_)
            | MpdError::Refused(_)
            | MpdError::Io(_)
            | MpdError::Cancelled => ErrorKind::Transport,
            MpdError::Mpd(_) => ErrorKind::Protocol,
            MpdError::Malformed(_) => ErrorKind::MalformedResponse,
            MpdError::Unsupported(_) => ErrorKind::UnsupportedOperation,
            MpdError::UnterminatedResponse { .. } => ErrorKind::ReadLoop,
        }
    }

    /// Whether reconnecting later has a chance of succeeding. Incompatible
    /// servers, bad credentials and rejected commands stay false.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            ErrorKind::Transport | ErrorKind::ReadLoop => true,
            ErrorKind::Handshake => matches!(self, MpdError::Handshake(_)),
            ErrorKind::Configuration
            | ErrorKind::Protocol
            | ErrorKind::MalformedResponse
            | ErrorKind::UnsupportedOperation => false,
        }
    }

    pub fn detail_or_display(&self) -> String {
        match self {
            MpdError::Mpd(failure) | MpdError::Authentication(failure) => {
                failure.message.clone()
            }
            _ => self.to_string(),
        }
    }
}

impl From<std::io::Error> for MpdError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                MpdError::TimedOut(err.to_string())
            }
            std::io::ErrorKind::ConnectionRefused => MpdError::Refused(err.to_string()),
            std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => MpdError::ClientClosed,
            _ => MpdError::Io(err.to_string()),
        }
    }
}

impl From<std::num::ParseIntError> for MpdError {
    fn from(value: std::num::ParseIntError) -> Self {
        Self::Malformed(value.to_string())
    }
}

impl From<strum::ParseError> for MpdError {
    fn from(value: strum::ParseError) -> Self {
        Self::Malformed(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for MpdError {
    fn from(value: std::num::ParseFloatError) -> Self {
        Self::Malformed(value.to_string())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorCode {
    /// not a list
    NotList,
    /// bad command arguments
    Argument,
    /// invalid password
    Password,
    /// insufficient permissions
    Permission,
    /// unknown command
    UnknownCmd,
    /// object doesn't exist
    NoExist,
    /// maximum playlist size exceeded
    PlaylistMax,
    /// general system error
    System,
    /// error loading playlist
    PlaylistLoad,
    /// update database is already in progress
    UpdateAlready,
    /// player synchronization error
    PlayerSync,
    /// object already exists
    Exist,
    Unknown(u16),
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NotList => write!(f, "not a list"),
            ErrorCode::Argument => write!(f, "bad argument"),
            ErrorCode::Password => write!(f, "invalid password"),
            ErrorCode::Permission => write!(f, "no permission"),
            ErrorCode::UnknownCmd => write!(f, "unknown command"),
            ErrorCode::NoExist => write!(f, "resource does not exist"),
            ErrorCode::PlaylistMax => write!(f, "maximum playlist size"),
            ErrorCode::System => write!(f, "system error"),
            ErrorCode::PlaylistLoad => write!(f, "unable to load playlist"),
            ErrorCode::UpdateAlready => write!(f, "database update already in progress"),
            ErrorCode::PlayerSync => write!(f, "player is in an inconsistent state"),
            ErrorCode::Exist => write!(f, "resource already exists"),
            ErrorCode::Unknown(code) => write!(f, "unknown error code {code}"),
        }
    }
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::NotList,
            2 => Self::Argument,
            3 => Self::Password,
            4 => Self::Permission,
            5 => Self::UnknownCmd,

            50 => Self::NoExist,
            51 => Self::PlaylistMax,
            52 => Self::System,
            53 => Self::PlaylistLoad,
            54 => Self::UpdateAlready,
            55 => Self::PlayerSync,
            56 => Self::Exist,

            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MpdFailureResponse {
    pub code: ErrorCode,
    pub command_list_index: u32,
    pub command: String,
    pub message: String,
    /// The ACK line exactly as the server sent it
    pub line: String,
}

impl Display for MpdFailureResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cannot execute command: '{}'. Detail: '{}'. Reason: '{}'. Cmd idx: '{}'",
            self.command, self.message, self.code, self.command_list_index
        )
    }
}

enum ParseError {
    NoAck,
    NoCode,
    InvalidCode,
    NoCommandIndex,
    InvalidCommandIndex,
    NoCurrentCommand,
}

impl From<ParseError> for MpdError {
    fn from(value: ParseError) -> Self {
        let text = match value {
            ParseError::NoAck => "No Ack",
            ParseError::NoCode => "No error code",
            ParseError::InvalidCode => "Invalid error code",
            ParseError::NoCommandIndex => "No command index",
            ParseError::InvalidCommandIndex => "Invalid command index",
            ParseError::NoCurrentCommand => "No current command",
        };
        Self::Malformed(format!("Invalid error format. {text}."))
    }
}

impl MpdFailureResponse {
    /// Builds a failure from an ACK line. Lines that do not follow the
    /// `ACK [code@idx] {cmd} text` layout still produce a failure, with the
    /// whole remainder kept as the message.
    pub fn from_ack_line(line: &str) -> Self {
        line.parse().unwrap_or_else(|error: MpdError| {
            log::warn!(line, error:?; "Received ACK line in an unexpected format");
            Self {
                code: ErrorCode::Unknown(0),
                command_list_index: 0,
                command: String::new(),
                message: line.strip_prefix("ACK").unwrap_or(line).trim().to_owned(),
                line: line.to_owned(),
            }
        })
    }
}

// ACK [error@command_listNum] {current_command} message_text
impl std::str::FromStr for MpdFailureResponse {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, MpdError> {
        let rest = s.strip_prefix("ACK [").ok_or(ParseError::NoAck)?;
        let (error_code, rest) = rest.split_once('@').ok_or(ParseError::NoCode)?;
        let error_code: u16 = error_code.parse().map_err(|_| ParseError::InvalidCode)?;
        let (command_idx, rest) = rest.split_once(']').ok_or(ParseError::NoCommandIndex)?;
        let command_idx = command_idx.parse().map_err(|_| ParseError::InvalidCommandIndex)?;
        let rest = rest.strip_prefix(" {").ok_or(ParseError::NoCurrentCommand)?;
        let (command, message) = rest.split_once('}').ok_or(ParseError::NoCurrentCommand)?;

        Ok(Self {
            code: error_code.into(),
            command_list_index: command_idx,
            command: command.to_owned(),
            message: message.trim().to_owned(),
            line: s.trim_end().to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn parses_ack_line() {
        let line = "ACK [50@1] {play} song doesn't exist";

        let result: MpdFailureResponse = line.parse().unwrap();

        assert_eq!(result, MpdFailureResponse {
            code: ErrorCode::NoExist,
            command_list_index: 1,
            command: "play".to_owned(),
            message: "song doesn't exist".to_owned(),
            line: line.to_owned(),
        });
    }

    #[test]
    fn keeps_unknown_codes() {
        let result: MpdFailureResponse = "ACK [99@0] {} whatever".parse().unwrap();

        assert_eq!(result.code, ErrorCode::Unknown(99));
        assert_eq!(result.command, "");
        assert_eq!(result.message, "whatever");
    }

    #[test]
    fn falls_back_for_unstructured_ack() {
        let result = MpdFailureResponse::from_ack_line("ACK something broke");

        assert_eq!(result.code, ErrorCode::Unknown(0));
        assert_eq!(result.message, "something broke");
        assert_eq!(result.line, "ACK something broke");
    }

    #[test_case(MpdError::InvalidConfig(String::new()), ErrorKind::Configuration, false)]
    #[test_case(MpdError::Handshake(String::new()), ErrorKind::Handshake, true)]
    #[test_case(
        MpdError::UnsupportedMpdVersion { found: Version::new(0, 21, 0), required: Version::new(0, 22, 0) },
        ErrorKind::Handshake,
        false
    )]
    #[test_case(MpdError::ClientClosed, ErrorKind::Transport, true)]
    #[test_case(MpdError::Refused(String::new()), ErrorKind::Transport, true)]
    #[test_case(MpdError::Malformed(String::new()), ErrorKind::MalformedResponse, false)]
    #[test_case(MpdError::Unsupported(String::new()), ErrorKind::UnsupportedOperation, false)]
    #[test_case(MpdError::UnterminatedResponse { received: 3 }, ErrorKind::ReadLoop, true)]
    fn classifies_errors(error: MpdError, kind: ErrorKind, retryable: bool) {
        assert_eq!(error.kind(), kind);
        assert_eq!(error.is_retryable(), retryable);
    }

    #[test]
    fn protocol_errors_are_not_retryable() {
        let error = MpdError::Mpd(MpdFailureResponse::from_ack_line("ACK [5@0] {foo} unknown command \"foo\""));

        assert_eq!(error.kind(), ErrorKind::Protocol);
        assert!(!error.is_retryable());
        assert_eq!(error.detail_or_display(), "unknown command \"foo\"");
    }

    #[test]
    fn maps_io_errors() {
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);

        assert!(matches!(MpdError::from(refused), MpdError::Refused(_)));
        assert_eq!(MpdError::from(reset), MpdError::ClientClosed);
    }
}
