use std::{sync::Arc, time::Duration};

use itertools::Itertools;
use log::debug;
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::{
    codec::StrExt,
    commands::{
        IdleEvent,
        IdleEvents,
        Playlists,
        Status,
        artwork::fetch_artwork,
        idle::idle_command,
        list_playlist::FileList,
        outputs::parse_outputs,
    },
    config::Server,
    connection::{Connection, ConnectionState, StateHandle},
    errors::{MpdError, MpdResult},
    filter::{Comparator, Filter, FilterExt, Tag},
    from_mpd::parse_response,
    mode::Profile,
    model::{
        Album,
        Artist,
        Media,
        MediaType,
        Outputs,
        Playlist,
        SearchFields,
        Song,
        SortDescriptor,
        Source,
    },
    parser::{parse_media_response, parse_media_response_array},
    version::Version,
};

struct Session {
    connection: Mutex<Connection>,
    state: StateHandle,
}

impl Session {
    fn new(profile: Profile, server: Arc<Server>) -> Self {
        let connection = Connection::new(profile, server);
        let state = connection.state_handle();
        Self { connection: Mutex::new(connection), state }
    }
}

/// MPD client keeping three independent sessions: one parked in `idle`, one
/// for artwork transfers and one for everything else. Every operation
/// connects its session lazily.
pub struct Mpd {
    server: RwLock<Arc<Server>>,
    idle: Session,
    artwork: Session,
    command: Session,
    idle_cancel: parking_lot::Mutex<CancellationToken>,
}

impl std::fmt::Debug for Mpd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let server = self.server();
        write!(
            f,
            "Mpd {{ host: {:?}, port: {}, idle: {}, artwork: {}, command: {} }}",
            server.host,
            server.port,
            self.idle.state.get(),
            self.artwork.state.get(),
            self.command.state.get()
        )
    }
}

impl Mpd {
    pub fn new(server: Server) -> Self {
        let server = Arc::new(server);
        Self {
            idle: Session::new(Profile::Idle, Arc::clone(&server)),
            artwork: Session::new(Profile::Artwork, Arc::clone(&server)),
            command: Session::new(Profile::Command, Arc::clone(&server)),
            server: RwLock::new(server),
            idle_cancel: parking_lot::Mutex::new(CancellationToken::new()),
        }
    }

    fn session(&self, profile: Profile) -> &Session {
        match profile {
            Profile::Idle => &self.idle,
            Profile::Artwork => &self.artwork,
            Profile::Command => &self.command,
        }
    }

    pub fn server(&self) -> Arc<Server> {
        Arc::clone(&self.server.read())
    }

    pub fn state(&self, profile: Profile) -> ConnectionState {
        self.session(profile).state.get()
    }

    /// Called with every state transition of the given session.
    pub fn set_state_observer(
        &self,
        profile: Profile,
        observer: impl Fn(ConnectionState) + Send + Sync + 'static,
    ) {
        self.session(profile).state.set_observer(observer);
    }

    pub async fn connect(&self) -> MpdResult<()> {
        for profile in Profile::ALL {
            self.session(profile).connection.lock().await.connect().await?;
        }
        let server = self.server();
        debug!(host = server.host.as_str(), port = server.port; "All MPD sessions connected");
        Ok(())
    }

    /// Cancels a pending idle wait and closes every session.
    pub async fn disconnect(&self) {
        self.cancel_idle();
        for profile in Profile::ALL {
            self.session(profile).connection.lock().await.disconnect();
        }
    }

    pub async fn reconnect(&self) -> MpdResult<()> {
        self.disconnect().await;
        self.connect().await
    }

    /// Replaces the server configuration. All sessions are disconnected and
    /// pick up the new configuration on their next use.
    pub async fn reconfigure(&self, server: Server) -> MpdResult<()> {
        server.validate()?;
        self.disconnect().await;

        let server = Arc::new(server);
        *self.server.write() = Arc::clone(&server);
        for profile in Profile::ALL {
            self.session(profile).connection.lock().await.set_server(Arc::clone(&server));
        }
        debug!(host = server.host.as_str(), port = server.port; "MPD configuration replaced");
        Ok(())
    }

    pub async fn version(&self) -> MpdResult<Version> {
        let connection = self.command_session().await?;
        connection.version().ok_or(MpdError::ClientClosed)
    }

    async fn command_session(&self) -> MpdResult<MutexGuard<'_, Connection>> {
        let mut connection = self.command.connection.lock().await;
        connection.connect().await?;
        Ok(connection)
    }

    async fn execute<S: AsRef<str>>(&self, commands: &[S]) -> MpdResult<Vec<String>> {
        self.command_session().await?.run(commands).await
    }

    async fn execute_media<S: AsRef<str>>(
        &self,
        commands: &[S],
        media_type: MediaType,
        index: bool,
        dedupe: bool,
    ) -> MpdResult<Vec<Media>> {
        let lines = self.execute(commands).await?;
        let media = parse_media_response_array(&lines, media_type, index)?;
        Ok(if dedupe { media.into_iter().unique().collect() } else { media })
    }

    // Idle
    /// Waits until one of `events` changes on the server, any subsystem when
    /// `events` is empty. Returns [`MpdError::Cancelled`] and closes the idle
    /// session when [`Mpd::cancel_idle`] fires first.
    ///
    /// The wait belongs to the cancellation generation current when this is
    /// called, so a `cancel_idle` issued before the future is first polled
    /// still stops it. Dropping the future leaves the `idle` unanswered, the
    /// session is then replaced on its next use.
    pub fn idle_for_events<'a>(
        &'a self,
        events: &'a [IdleEvent],
    ) -> impl Future<Output = MpdResult<IdleEvent>> + Send + 'a {
        let token = self.idle_cancel.lock().clone();
        async move {
            let mut connection = self.idle.connection.lock().await;
            let command = idle_command(events);
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => None,
                result = async {
                    connection.connect().await?;
                    connection.run(&[command.as_str()]).await
                } => Some(result),
            };

            let Some(result) = outcome else {
                debug!("Idle wait cancelled, closing idle session");
                connection.disconnect();
                return Err(MpdError::Cancelled);
            };
            let changed: IdleEvents = parse_response(&result?)?;
            changed
                .0
                .into_iter()
                .find(|event| events.is_empty() || events.contains(event))
                .ok_or_else(|| MpdError::Malformed(format!("Idle returned none of {events:?}")))
        }
    }

    /// Cancels every idle wait requested so far. Later waits are unaffected.
    pub fn cancel_idle(&self) {
        let previous = std::mem::replace(&mut *self.idle_cancel.lock(), CancellationToken::new());
        previous.cancel();
    }

    // Status
    pub async fn status(&self) -> MpdResult<Status> {
        let lines = self.execute(&["status", "currentsong"]).await?;
        let song_start =
            lines.iter().position(|line| line.starts_with("file:")).unwrap_or(lines.len());
        let (status_lines, song_lines) = lines.split_at(song_start);

        let mut status: Status = parse_response(status_lines)?;
        if !song_lines.is_empty() {
            status.current_song =
                parse_media_response(song_lines, MediaType::Song, None)?.into_song();
        }
        Ok(status)
    }

    // Library, queue and stored playlist listings
    pub async fn get_songs(
        &self,
        source: &Source,
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Song>> {
        let media = self.list(source, MediaType::Song, &[], sort).await?;
        Ok(media.into_iter().filter_map(Media::into_song).collect())
    }

    pub async fn get_albums(
        &self,
        source: &Source,
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Album>> {
        let media = self.list(source, MediaType::Album, &[], sort).await?;
        Ok(media.into_iter().filter_map(Media::into_album).collect())
    }

    pub async fn get_artists(
        &self,
        source: &Source,
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Artist>> {
        let media = self.list(source, MediaType::Artist, &[], sort).await?;
        Ok(media.into_iter().filter_map(Media::into_artist).collect())
    }

    pub async fn get_songs_for_artist(
        &self,
        artist: &Artist,
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Song>> {
        let commands = by_artist(artist, &[], sort, MediaType::Song)?;
        let media = self.execute_media(&commands, MediaType::Song, false, true).await?;
        Ok(media.into_iter().filter_map(Media::into_song).collect())
    }

    pub async fn get_albums_for_artist(
        &self,
        artist: &Artist,
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Album>> {
        let commands = by_artist(artist, &[], sort, MediaType::Album)?;
        let media = self.execute_media(&commands, MediaType::Album, false, true).await?;
        Ok(media.into_iter().filter_map(Media::into_album).collect())
    }

    pub async fn get_songs_for_album(
        &self,
        album: &Album,
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Song>> {
        let title = [Filter::new(Tag::Album, album.title.as_str())];
        let commands = by_artist(&album.artist, &title, sort, MediaType::Song)?;
        let media = self.execute_media(&commands, MediaType::Song, false, true).await?;
        Ok(media.into_iter().filter_map(Media::into_song).collect())
    }

    pub async fn get_songs_for_playlist(&self, playlist: &Playlist) -> MpdResult<Vec<Song>> {
        self.get_songs(&Source::Playlist(playlist.clone()), None).await
    }

    async fn list(
        &self,
        source: &Source,
        media_type: MediaType,
        filters: &[Filter<'_>],
        sort: Option<&SortDescriptor>,
    ) -> MpdResult<Vec<Media>> {
        let command = listing_command(source, media_type, filters, sort)?;
        let from_database = matches!(source, Source::Database);
        self.execute_media(&[command], media_type, !from_database, media_type != MediaType::Song)
            .await
    }

    /// Database search, one `search` per field sent as a single command list.
    pub async fn search(
        &self,
        query: &str,
        media_type: MediaType,
        fields: &SearchFields,
    ) -> MpdResult<Vec<Media>> {
        self.search_in(&Source::Database, query, media_type, fields).await
    }

    pub async fn search_in(
        &self,
        source: &Source,
        query: &str,
        media_type: MediaType,
        fields: &SearchFields,
    ) -> MpdResult<Vec<Media>> {
        let supported = source.search_fields(media_type);
        if let Some(field) = fields.iter().find(|field| !supported.contains(*field)) {
            return Err(MpdError::Unsupported(format!(
                "Cannot search {media_type} in {source:?} by {field}"
            )));
        }
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let verb = match source {
            Source::Database => "search",
            Source::Queue => "playlistsearch",
            Source::Playlist(_) | Source::Favorites => {
                return Err(MpdError::Unsupported(format!("Cannot search in {source:?}")));
            }
        };

        let commands = fields
            .iter()
            .map(|field| {
                let filter = [Filter::new_with_comparator(*field, query, Comparator::Contains)];
                format!("{verb} {}", filter.as_slice().to_query_arg())
            })
            .collect_vec();
        self.execute_media(&commands, media_type, matches!(source, Source::Queue), true).await
    }

    // Playback
    pub async fn play(&self) -> MpdResult<()> {
        self.execute(&["play"]).await.map(|_| ())
    }

    /// Plays a queued song, by id when known and by queue position otherwise.
    pub async fn play_song(&self, song: &Song) -> MpdResult<()> {
        let command = match (song.id, song.position) {
            (Some(id), _) => format!("playid {id}"),
            (None, Some(position)) => format!("play {position}"),
            (None, None) => {
                return Err(MpdError::Unsupported(format!("'{}' is not in the queue", song.file)));
            }
        };
        self.execute(&[command]).await.map(|_| ())
    }

    pub async fn pause(&self, paused: bool) -> MpdResult<()> {
        self.execute(&[format!("pause {}", u8::from(paused))]).await.map(|_| ())
    }

    pub async fn toggle_pause(&self) -> MpdResult<()> {
        self.execute(&["pause"]).await.map(|_| ())
    }

    pub async fn stop(&self) -> MpdResult<()> {
        self.execute(&["stop"]).await.map(|_| ())
    }

    pub async fn next(&self) -> MpdResult<()> {
        self.execute(&["next"]).await.map(|_| ())
    }

    pub async fn previous(&self) -> MpdResult<()> {
        self.execute(&["previous"]).await.map(|_| ())
    }

    /// Seeks within the current song.
    pub async fn seek(&self, position: Duration) -> MpdResult<()> {
        self.execute(&[format!("seekcur {:.3}", position.as_secs_f64())]).await.map(|_| ())
    }

    pub async fn repeat(&self, enabled: bool) -> MpdResult<()> {
        self.execute(&[format!("repeat {}", u8::from(enabled))]).await.map(|_| ())
    }

    pub async fn random(&self, enabled: bool) -> MpdResult<()> {
        self.execute(&[format!("random {}", u8::from(enabled))]).await.map(|_| ())
    }

    pub async fn set_volume(&self, volume: u8) -> MpdResult<()> {
        self.execute(&[format!("setvol {}", volume.min(100))]).await.map(|_| ())
    }

    // Queue
    pub async fn add_to_queue(&self, songs: &[Song]) -> MpdResult<()> {
        if songs.is_empty() {
            return Ok(());
        }
        let commands = songs
            .iter()
            .map(|song| format!("add {}", song.file.as_str().quote_and_escape()))
            .collect_vec();
        self.execute(&commands).await.map(|_| ())
    }

    pub async fn clear_queue(&self) -> MpdResult<()> {
        self.execute(&["clear"]).await.map(|_| ())
    }

    pub async fn load_playlist(&self, playlist: &Playlist) -> MpdResult<()> {
        let load = format!("load {}", playlist.name.as_str().quote_and_escape());
        self.execute(&[load]).await.map(|_| ())
    }

    /// Replaces the queue with the playlist and starts playback.
    pub async fn play_playlist(&self, playlist: &Playlist) -> MpdResult<()> {
        let load = format!("load {}", playlist.name.as_str().quote_and_escape());
        self.execute(&["clear", load.as_str(), "play"]).await.map(|_| ())
    }

    // Stored playlists
    pub async fn get_playlists(&self) -> MpdResult<Vec<Playlist>> {
        let lines = self.execute(&["listplaylists"]).await?;
        let playlists: Playlists = parse_response(&lines)?;
        Ok(playlists.0)
    }

    /// Creates an empty stored playlist. Fails when the name is taken.
    pub async fn create_playlist(&self, name: &str) -> MpdResult<Playlist> {
        let quoted = name.quote_and_escape();
        self.execute(&[format!("save {quoted}"), format!("playlistclear {quoted}")]).await?;
        Ok(Playlist::new(name))
    }

    pub async fn rename_playlist(
        &self,
        playlist: &Playlist,
        new_name: &str,
    ) -> MpdResult<Playlist> {
        self.execute(&[format!(
            "rename {} {}",
            playlist.name.as_str().quote_and_escape(),
            new_name.quote_and_escape()
        )])
        .await?;
        Ok(Playlist::new(new_name))
    }

    pub async fn remove_playlist(&self, playlist: &Playlist) -> MpdResult<()> {
        let remove = format!("rm {}", playlist.name.as_str().quote_and_escape());
        self.execute(&[remove]).await.map(|_| ())
    }

    pub async fn add_to_playlist(&self, playlist: &Playlist, songs: &[Song]) -> MpdResult<()> {
        if songs.is_empty() {
            return Ok(());
        }
        let name = playlist.name.as_str().quote_and_escape();
        let commands = songs
            .iter()
            .map(|song| format!("playlistadd {name} {}", song.file.as_str().quote_and_escape()))
            .collect_vec();
        self.execute(&commands).await.map(|_| ())
    }

    /// Removes every occurrence of `songs` from the stored playlist.
    pub async fn remove_from_playlist(&self, playlist: &Playlist, songs: &[Song]) -> MpdResult<()> {
        if songs.is_empty() {
            return Ok(());
        }
        let name = playlist.name.as_str().quote_and_escape();
        let mut connection = self.command_session().await?;

        let listing = connection.run(&[format!("listplaylist {name}")]).await?;
        let files: FileList = parse_response(&listing)?;
        let positions = files.positions_of(songs.iter().map(|song| song.file.as_str()));
        if positions.is_empty() {
            debug!(playlist = playlist.name.as_str(); "None of the songs are in the playlist");
            return Ok(());
        }

        let commands =
            positions.into_iter().map(|pos| format!("playlistdelete {name} {pos}")).collect_vec();
        connection.run(&commands).await.map(|_| ())
    }

    // Outputs
    pub async fn outputs(&self) -> MpdResult<Outputs> {
        parse_outputs(&self.execute(&["outputs"]).await?)
    }

    pub async fn enable_output(&self, id: u32) -> MpdResult<()> {
        self.execute(&[format!("enableoutput {id}")]).await.map(|_| ())
    }

    pub async fn disable_output(&self, id: u32) -> MpdResult<()> {
        self.execute(&[format!("disableoutput {id}")]).await.map(|_| ())
    }

    pub async fn toggle_output(&self, id: u32) -> MpdResult<()> {
        self.execute(&[format!("toggleoutput {id}")]).await.map(|_| ())
    }

    // Artwork
    /// Cover art for `file`, fetched with the configured getter on the
    /// artwork session.
    pub async fn artwork(&self, file: &str) -> MpdResult<Option<Vec<u8>>> {
        let mut connection = self.artwork.connection.lock().await;
        connection.connect().await?;
        let getter = connection.server().artwork_getter;
        fetch_artwork(&mut connection, getter, file).await
    }
}

fn sort_suffix(
    source: &Source,
    media_type: MediaType,
    sort: Option<&SortDescriptor>,
) -> MpdResult<String> {
    let Some(sort) = sort else {
        return Ok(String::new());
    };
    if !source.sort_fields(media_type).contains(&sort.field) {
        return Err(MpdError::Unsupported(format!(
            "Cannot sort {media_type} from {source:?} by {}",
            sort.field
        )));
    }
    Ok(format!(" sort {}", sort.to_mpd_arg()))
}

fn listing_command(
    source: &Source,
    media_type: MediaType,
    filters: &[Filter<'_>],
    sort: Option<&SortDescriptor>,
) -> MpdResult<String> {
    let sort = sort_suffix(source, media_type, sort)?;
    match source {
        Source::Database => Ok(format!("find {}{sort}", filters.to_query_arg())),
        Source::Queue if filters.is_empty() => Ok("playlistinfo".to_owned()),
        Source::Queue => Ok(format!("playlistfind {}", filters.to_query_arg())),
        Source::Playlist(_) | Source::Favorites if filters.is_empty() => {
            let name = source.playlist_name().unwrap_or_default();
            Ok(format!("listplaylistinfo {}", name.quote_and_escape()))
        }
        Source::Playlist(_) | Source::Favorites => {
            Err(MpdError::Unsupported(format!("Cannot filter {source:?}")))
        }
    }
}

/// Database queries matching songs of `artist`. Songs tagged with an album
/// artist are matched on it, untagged ones fall back to the plain artist.
fn by_artist(
    artist: &Artist,
    extra: &[Filter<'_>],
    sort: Option<&SortDescriptor>,
    media_type: MediaType,
) -> MpdResult<Vec<String>> {
    let name = artist.name.as_str();
    let tagged = extra.iter().cloned().chain([Filter::new(Tag::AlbumArtist, name)]).collect_vec();
    let untagged = extra
        .iter()
        .cloned()
        .chain([Filter::new(Tag::Artist, name), Filter::new(Tag::AlbumArtist, "")])
        .collect_vec();

    [tagged, untagged]
        .iter()
        .map(|filters| listing_command(&Source::Database, media_type, filters, sort))
        .collect()
}
