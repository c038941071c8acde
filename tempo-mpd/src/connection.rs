use std::{sync::Arc, time::Duration};

use log::{debug, error, trace, warn};
use parking_lot::Mutex;
use strum::Display;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpSocket, TcpStream, lookup_host},
};

use crate::{
    codec::{StrExt, build_command_line, take_line},
    config::Server,
    errors::{MpdError, MpdFailureResponse, MpdResult},
    mode::{ConnectionMode, Profile},
    version::Version,
};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const MIN_SUPPORTED_VERSION: Version = Version::new(0, 22, 0);
const BINARY_LIMIT_SINCE: Version = Version::new(0, 22, 4);

const GREETING_PREFIX: &str = "OK MPD ";
const SUCCESS_PREFIX: &str = "OK";
const FAILURE_PREFIX: &str = "ACK";

/// Anything a session can speak the protocol over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Ready,
    Failed,
}

pub type StateObserver = Arc<dyn Fn(ConnectionState) + Send + Sync>;

#[derive(Default)]
struct StateInner {
    state: ConnectionState,
    observer: Option<StateObserver>,
}

/// Shared view of a session's state. Readable without holding the session,
/// which may be parked in a long `idle`.
#[derive(Clone, Default)]
pub struct StateHandle(Arc<Mutex<StateInner>>);

impl std::fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateHandle({})", self.get())
    }
}

impl StateHandle {
    pub fn get(&self) -> ConnectionState {
        self.0.lock().state
    }

    pub fn set_observer(&self, observer: impl Fn(ConnectionState) + Send + Sync + 'static) {
        self.0.lock().observer = Some(Arc::new(observer));
    }

    fn transition(&self, state: ConnectionState) {
        let observer = {
            let mut inner = self.0.lock();
            if inner.state == state {
                return;
            }
            inner.state = state;
            inner.observer.clone()
        };
        // called outside the lock so the observer may query the state
        if let Some(observer) = observer {
            observer(state);
        }
    }
}

pub struct Connection {
    profile: Profile,
    mode: ConnectionMode,
    server: Arc<Server>,
    stream: Option<Box<dyn Transport>>,
    version: Option<Version>,
    buffer: Vec<u8>,
    state: StateHandle,
    /// A request was sent and its response is not fully consumed yet.
    in_flight: bool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Connection {{ profile: {}, host: {:?}, port: {}, state: {}, version: {:?} }}",
            self.profile,
            self.server.host,
            self.server.port,
            self.state.get(),
            self.version
        )
    }
}

impl Connection {
    pub fn new(profile: Profile, server: Arc<Server>) -> Self {
        Self {
            profile,
            mode: profile.mode(),
            server,
            stream: None,
            version: None,
            buffer: Vec::new(),
            state: StateHandle::default(),
            in_flight: false,
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some() && self.state.get() == ConnectionState::Ready
    }

    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    /// Swaps the configuration used by the next `connect`. The live socket, if
    /// any, is closed first.
    pub fn set_server(&mut self, server: Arc<Server>) {
        self.disconnect();
        self.server = server;
    }

    /// Opens a TCP connection and performs the handshake. Does nothing when
    /// the session is already ready.
    pub async fn connect(&mut self) -> MpdResult<()> {
        self.abandon_request();
        if self.is_connected() {
            return Ok(());
        }
        self.server.validate()?;
        let port = self.server.socket_port()?;

        self.state.transition(ConnectionState::Connecting);
        let stream = match open_socket(&self.server.host, port, self.mode.keepalive).await {
            Ok(stream) => stream,
            Err(err) => {
                error!(
                    profile:% = self.profile, host = self.server.host.as_str(), port, err:?;
                    "Failed to connect to MPD"
                );
                self.fail();
                return Err(err);
            }
        };

        self.handshake(Box::new(stream)).await
    }

    /// Performs the handshake over an already established stream.
    pub async fn connect_over<S: Transport + 'static>(&mut self, stream: S) -> MpdResult<()> {
        self.abandon_request();
        if self.is_connected() {
            return Ok(());
        }
        self.state.transition(ConnectionState::Connecting);
        self.handshake(Box::new(stream)).await
    }

    /// Drops the socket and forgets everything negotiated over it.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            debug!(profile:% = self.profile; "Disconnected from MPD");
        }
        self.version = None;
        self.buffer.clear();
        self.in_flight = false;
        self.state.transition(ConnectionState::Disconnected);
    }

    /// Sends `commands`, wrapped in a command list when there is more than
    /// one, and collects the response lines including the final `OK`.
    pub async fn run<S: AsRef<str>>(&mut self, commands: &[S]) -> MpdResult<Vec<String>> {
        self.send(commands).await?;
        self.read_response().await
    }

    pub(crate) async fn send<S: AsRef<str>>(&mut self, commands: &[S]) -> MpdResult<()> {
        let command_line = build_command_line(commands);
        trace!(profile:% = self.profile, command = command_line.trim_end(); "Executing MPD command");
        self.in_flight = true;
        self.write(command_line.as_bytes()).await
    }

    /// Reads up to and including the terminating `OK`. Anything but a clean
    /// terminator or `ACK` leaves the rest of the response unread, so the
    /// session is torn down.
    pub(crate) async fn read_response(&mut self) -> MpdResult<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = match self.read_line().await {
                Ok(line) => line,
                Err(MpdError::ClientClosed) if !lines.is_empty() => {
                    return Err(MpdError::UnterminatedResponse { received: lines.len() });
                }
                Err(err) => {
                    self.abandon_request();
                    return Err(err);
                }
            };

            if line.starts_with(FAILURE_PREFIX) {
                self.finish_request();
                return Err(MpdError::Mpd(MpdFailureResponse::from_ack_line(&line)));
            }
            let done = line.starts_with(SUCCESS_PREFIX);
            lines.push(line);
            if done {
                self.finish_request();
                return Ok(lines);
            }
        }
    }

    /// Marks the current response as fully consumed.
    pub(crate) fn finish_request(&mut self) {
        self.in_flight = false;
    }

    /// Drops a session whose last response was not read to its end, e.g.
    /// after a parse failure or when the future driving it was dropped.
    pub(crate) fn abandon_request(&mut self) {
        if self.in_flight && self.stream.is_some() {
            warn!(profile:% = self.profile; "Response left unread, dropping out of sync session");
            self.fail();
        }
        self.in_flight = false;
    }

    pub(crate) async fn read_line(&mut self) -> MpdResult<String> {
        loop {
            if let Some(line) = take_line(&mut self.buffer)? {
                return Ok(line);
            }
            self.receive(self.mode.chunk_size).await?;
        }
    }

    /// Reads exactly `length` raw bytes, consuming already buffered input
    /// first.
    pub async fn read_fixed_length_data(&mut self, length: usize) -> MpdResult<Vec<u8>> {
        if length == 0 {
            return Ok(Vec::new());
        }

        let mut data = Vec::with_capacity(length);
        let buffered = length.min(self.buffer.len());
        data.extend(self.buffer.drain(..buffered));

        while data.len() < length {
            let remaining = length - data.len();
            match self.receive(remaining.min(self.mode.chunk_size)).await {
                Ok(_) => {}
                Err(MpdError::ClientClosed) => {
                    return Err(MpdError::Malformed(format!(
                        "Expected {length} bytes of binary data but the connection closed after {}",
                        data.len()
                    )));
                }
                Err(err) => return Err(err),
            }
            let take = remaining.min(self.buffer.len());
            data.extend(self.buffer.drain(..take));
        }

        Ok(data)
    }

    async fn handshake(&mut self, stream: Box<dyn Transport>) -> MpdResult<()> {
        self.buffer.clear();
        self.in_flight = false;
        self.stream = Some(stream);

        match self.negotiate().await {
            Ok(version) => {
                self.version = Some(version);
                self.state.transition(ConnectionState::Ready);
                Ok(())
            }
            Err(err) => {
                error!(profile:% = self.profile, err:?; "MPD handshake failed");
                self.fail();
                Err(err)
            }
        }
    }

    async fn negotiate(&mut self) -> MpdResult<Version> {
        let greeting = self.read_greeting().await?;
        let version: Version = greeting
            .split_whitespace()
            .last()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                MpdError::Handshake(format!("Cannot parse version from '{greeting}'"))
            })?;

        if version < MIN_SUPPORTED_VERSION {
            return Err(MpdError::UnsupportedMpdVersion {
                found: version,
                required: MIN_SUPPORTED_VERSION,
            });
        }

        let server = Arc::clone(&self.server);
        if let Some(password) = server.password() {
            debug!(profile:% = self.profile; "Authenticating with password");
            match self.run(&[format!("password {}", password.quote_and_escape())]).await {
                Ok(_) => {}
                Err(MpdError::Mpd(failure)) => return Err(MpdError::Authentication(failure)),
                Err(err) => return Err(err),
            }
        }

        if self.profile == Profile::Artwork && version >= BINARY_LIMIT_SINCE {
            self.run(&[format!("binarylimit {}", self.mode.chunk_size)]).await?;
        }

        debug!(
            profile:% = self.profile,
            host = server.host.as_str(),
            version = version.to_string().as_str(),
            handshake = greeting.as_str();
            "MPD client initialized"
        );

        Ok(version)
    }

    async fn read_greeting(&mut self) -> MpdResult<String> {
        let greeting = loop {
            let line = match self.read_line().await {
                Ok(line) => line,
                Err(MpdError::ClientClosed) => {
                    return Err(MpdError::Handshake(
                        "Connection closed before the server greeting".to_owned(),
                    ));
                }
                Err(err) => return Err(err),
            };
            if line.starts_with(SUCCESS_PREFIX) {
                break line;
            }
            if line.starts_with(FAILURE_PREFIX) {
                return Err(MpdError::Handshake(format!("Server refused the connection '{line}'")));
            }
            warn!(line = line.as_str(); "Skipping unexpected line before the greeting");
        };

        if !greeting.starts_with(GREETING_PREFIX) {
            return Err(MpdError::Handshake(format!("Handshake validation failed. '{greeting}'")));
        }
        Ok(greeting)
    }

    async fn receive(&mut self, max: usize) -> MpdResult<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(MpdError::ClientClosed);
        };
        let mut chunk = vec![0; max.clamp(1, self.mode.chunk_size)];
        let result = stream.read(&mut chunk).await;

        match result {
            Ok(0) => {
                error!(profile:% = self.profile; "MPD closed the connection");
                self.fail();
                Err(MpdError::ClientClosed)
            }
            Ok(read) => {
                self.buffer.extend_from_slice(&chunk[..read]);
                Ok(read)
            }
            Err(err) => {
                error!(profile:% = self.profile, err:?; "Failed to read from MPD");
                self.fail();
                Err(err.into())
            }
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> MpdResult<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(MpdError::ClientClosed);
        };
        let result = match stream.write_all(bytes).await {
            Ok(()) => stream.flush().await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            error!(profile:% = self.profile, err:?; "Failed to write to MPD");
            self.fail();
            return Err(err.into());
        }
        Ok(())
    }

    /// Transport failure, tears the socket down and leaves the session in
    /// `Failed` until the next `connect`.
    fn fail(&mut self) {
        self.stream = None;
        self.version = None;
        self.buffer.clear();
        self.in_flight = false;
        self.state.transition(ConnectionState::Failed);
    }
}

async fn open_socket(host: &str, port: u16, keepalive: bool) -> MpdResult<TcpStream> {
    let connect = async {
        let mut last_err = None;
        for addr in lookup_host((host, port)).await? {
            let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
            socket.set_keepalive(keepalive)?;
            match socket.connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => {
                    debug!(addr:?, err:?; "Failed to connect to resolved address");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.map_or_else(
            || MpdError::Handshake(format!("Could not resolve '{host}'")),
            MpdError::from,
        ))
    };

    tokio::time::timeout(CONNECT_TIMEOUT, connect).await.map_err(|_| {
        MpdError::TimedOut(format!("Could not connect to {host}:{port} within {CONNECT_TIMEOUT:?}"))
    })?
}
