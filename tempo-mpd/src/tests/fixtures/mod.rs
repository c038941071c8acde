use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

use crate::config::Server;

/// Reply for a request, `None` leaves the client waiting.
type Responder = Arc<dyn Fn(&str) -> Option<Vec<u8>> + Send + Sync>;

/// Replies from a fixed table. An empty key matches every request, anything
/// without a match gets a bare `OK`.
pub fn respond_with(
    table: &'static [(&'static str, &'static str)],
) -> impl Fn(&str) -> Option<Vec<u8>> + Send + Sync + 'static {
    move |request| {
        let response = table
            .iter()
            .find(|(key, _)| key.is_empty() || *key == request)
            .map_or("OK\n", |(_, response)| *response);
        Some(response.as_bytes().to_vec())
    }
}

/// Scripted MPD server on a loopback port. Command lists arrive as a single
/// request with the commands joined by newlines.
pub struct FakeMpd {
    pub port: u16,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FakeMpd {
    pub async fn start(
        responder: impl Fn(&str) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self::with_greeting("OK MPD 0.23.5\n", responder).await
    }

    pub async fn with_greeting(
        greeting: &'static str,
        responder: impl Fn(&str) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("loopback listener to bind");
        let port = listener.local_addr().expect("listener to have an address").port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let responder: Responder = Arc::new(responder);

        let connections = Arc::new(AtomicUsize::new(0));
        let recorder = Arc::clone(&received);
        let accepted = Arc::clone(&connections);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let responder = Arc::clone(&responder);
                let recorder = Arc::clone(&recorder);
                tokio::spawn(async move {
                    let _ = serve(stream, greeting, responder, recorder).await;
                });
            }
        });

        Self { port, received, connections, handle }
    }

    pub fn server(&self) -> Server {
        Server::builder().host("127.0.0.1").port(u32::from(self.port)).build()
    }

    /// Requests in arrival order across all connections.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub async fn wait_for(&self, request: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.received.lock().iter().any(|r| r == request) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("request to arrive in time");
    }
}

impl Drop for FakeMpd {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    stream: TcpStream,
    greeting: &str,
    responder: Responder,
    recorder: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    writer.write_all(greeting.as_bytes()).await?;

    while let Some(line) = lines.next_line().await? {
        let request = if line == "command_list_begin" {
            let mut commands = Vec::new();
            while let Some(line) = lines.next_line().await? {
                if line == "command_list_end" {
                    break;
                }
                commands.push(line);
            }
            commands.join("\n")
        } else {
            line
        };

        recorder.lock().push(request.clone());
        if let Some(response) = responder(&request) {
            writer.write_all(&response).await?;
        }
    }
    Ok(())
}
