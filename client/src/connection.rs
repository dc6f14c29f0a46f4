use futures::{SinkExt, StreamExt};
use market::protocol::{ClientEvent, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::error::{FeedError, ProtocolError};
use crate::reconnect::{Backoff, BackoffPolicy};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the feed hands to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connected,
    Server(ServerEvent),
    /// The session dropped; a reconnect follows.
    Disconnected,
}

enum SessionEnd {
    Dropped(String),
    ConsumerGone,
}

/// Decode one text frame from the server.
pub fn decode_event(text: &str) -> Result<ServerEvent, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// WebSocket subscriber with bounded automatic reconnection.
///
/// - one connection attempt at a time
/// - every (re)connect sends `subscribe` and is answered by a fresh
///   `initialData`, so no continuity is assumed across sessions
/// - `max_retries` consecutive failed attempts end `run` with
///   [`FeedError::RetriesExhausted`]
pub struct PriceFeedClient {
    url: String,
    city_ids: Vec<String>,
    policy: BackoffPolicy,
}

impl PriceFeedClient {
    pub fn new(url: impl Into<String>, policy: BackoffPolicy) -> Self {
        Self {
            url: url.into(),
            city_ids: Vec::new(),
            policy,
        }
    }

    /// Cities announced in `subscribe`. Advisory; the server still pushes the
    /// full table.
    pub fn with_cities(mut self, city_ids: Vec<String>) -> Self {
        self.city_ids = city_ids;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stream events into `events` until the consumer goes away (`Ok`) or
    /// reconnection gives up (`Err`). `commands` are forwarded to the server
    /// while a session is up.
    pub async fn run(
        &self,
        events: Sender<FeedEvent>,
        mut commands: Receiver<ClientEvent>,
    ) -> Result<(), FeedError> {
        let mut backoff = Backoff::new(self.policy);

        loop {
            info!(url = %self.url, "connecting to price feed");

            match self.open().await {
                Ok(ws) => {
                    backoff.reset();
                    if events.send(FeedEvent::Connected).await.is_err() {
                        return Ok(());
                    }

                    match self.pump(ws, &events, &mut commands).await {
                        SessionEnd::ConsumerGone => return Ok(()),
                        SessionEnd::Dropped(reason) => {
                            warn!(%reason, "price feed dropped");
                            if events.send(FeedEvent::Disconnected).await.is_err() {
                                return Ok(());
                            }
                            tokio::time::sleep(self.policy.base_delay).await;
                        }
                    }
                }
                Err(e) => {
                    let Some(delay) = backoff.record_failure() else {
                        error!(error = %e, attempts = backoff.failures(), "price feed unreachable; giving up");
                        return Err(FeedError::RetriesExhausted(backoff.failures()));
                    };
                    warn!(
                        error = %e,
                        attempt = backoff.failures(),
                        retry_in_ms = delay.as_millis() as u64,
                        "connect failed"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn open(&self) -> Result<WsStream, FeedError> {
        let (mut ws, _) = connect_async(&self.url).await?;

        let subscribe = ClientEvent::Subscribe {
            city_ids: self.city_ids.clone(),
        };
        send_command(&mut ws, &subscribe).await?;

        Ok(ws)
    }

    async fn pump(
        &self,
        ws: WsStream,
        events: &Sender<FeedEvent>,
        commands: &mut Receiver<ClientEvent>,
    ) -> SessionEnd {
        let (mut write, mut read) = ws.split();
        let mut commands_open = true;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let msg = match msg {
                        Some(Ok(m)) => m,
                        Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                        None => return SessionEnd::Dropped("stream ended".into()),
                    };

                    let decoded = match msg {
                        Message::Text(text) => decode_event(text.as_str()),
                        Message::Binary(bytes) => Err(ProtocolError::Binary(bytes.len())),
                        Message::Close(frame) => {
                            return SessionEnd::Dropped(format!("closed by server: {frame:?}"));
                        }
                        _ => continue,
                    };

                    match decoded {
                        Ok(event) => {
                            if events.send(FeedEvent::Server(event)).await.is_err() {
                                return SessionEnd::ConsumerGone;
                            }
                        }
                        // a bad frame is skipped, the session stays up
                        Err(e) => debug!(error = %e, "skipping frame"),
                    }
                }

                cmd = commands.recv(), if commands_open => match cmd {
                    Some(cmd) => {
                        let text = match serde_json::to_string(&cmd) {
                            Ok(t) => t,
                            Err(e) => {
                                debug!(error = %e, "unencodable command");
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            return SessionEnd::Dropped(e.to_string());
                        }
                    }
                    None => commands_open = false,
                },
            }
        }
    }
}

async fn send_command(ws: &mut WsStream, cmd: &ClientEvent) -> Result<(), FeedError> {
    let text = serde_json::to_string(cmd).map_err(ProtocolError::from)?;
    ws.send(Message::Text(text.into())).await?;
    Ok(())
}
