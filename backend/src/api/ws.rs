use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use common::logger::{TraceId, root_span};
use futures::stream::StreamExt;
use futures::{Sink, SinkExt};
use market::PriceSnapshot;
use market::protocol::{ClientEvent, ServerEvent};
use thiserror::Error;
use tracing::{Instrument, debug, info, warn};

use crate::state::AppState;

#[derive(Debug, Error)]
enum PushError {
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("socket: {0}")]
    Socket(#[from] axum::Error),
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let trace_id = TraceId::new();
    serve_subscriber(socket, state)
        .instrument(root_span("subscriber", &trace_id))
        .await
}

async fn serve_subscriber(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let limit = state.config.subscriber_send_timeout;
    let mut sub = state.broadcaster.subscribe();

    info!(
        subscribers = state.broadcaster.subscriber_count(),
        "subscriber connected"
    );

    let hello = ServerEvent::initial(state.cities.cities(), sub.initial().as_ref().clone());
    if let Err(e) = push(&mut sender, &hello, limit).await {
        warn!(error = %e, "initial snapshot not delivered; dropping subscriber");
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Subscribe { city_ids }) => {
                        // scoping is advisory; every snapshot is still pushed in full
                        info!(?city_ids, "subscribe");
                    }
                    Ok(ClientEvent::RequestUpdate) => {
                        let latest = state.broadcaster.latest();
                        if sub.already_sent(&latest) {
                            debug!(updated_ms = latest.updated_ms, "refresh requested; subscriber is current");
                            continue;
                        }
                        if let Err(e) = push_snapshot(&mut sender, &latest, limit).await {
                            warn!(error = %e, "resend failed; dropping subscriber");
                            break;
                        }
                        sub.mark_sent(&latest);
                    }
                    Err(e) => debug!(error = %e, "ignoring unrecognised client frame"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(error = %e, "socket read failed");
                    break;
                }
            },

            update = sub.next() => match update {
                Some(snapshot) => {
                    if let Err(e) = push_snapshot(&mut sender, &snapshot, limit).await {
                        warn!(error = %e, "push failed; dropping subscriber");
                        break;
                    }
                }
                None => break,
            },
        }
    }

    info!("subscriber disconnected");
}

async fn push_snapshot<S>(
    sender: &mut S,
    snapshot: &PriceSnapshot,
    limit: Duration,
) -> Result<(), PushError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    push(sender, &ServerEvent::PriceUpdate(snapshot.clone()), limit).await
}

/// Send one event, bounded by `limit` so a stalled peer cannot hold up the
/// connection task indefinitely.
async fn push<S>(sender: &mut S, event: &ServerEvent, limit: Duration) -> Result<(), PushError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let text = serde_json::to_string(event)?;
    tokio::time::timeout(limit, sender.send(Message::Text(text.into())))
        .await
        .map_err(|_| PushError::Timeout(limit))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    /// A peer that never drains its socket.
    struct StalledPeer;

    impl Sink<Message> for StalledPeer {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_peer_hits_the_send_timeout() {
        let limit = Duration::from_secs(2);
        let started = tokio::time::Instant::now();

        let err = push_snapshot(&mut StalledPeer, &PriceSnapshot::default(), limit)
            .await
            .unwrap_err();

        assert!(matches!(err, PushError::Timeout(d) if d == limit), "{err:?}");
        assert!(started.elapsed() >= limit);
    }

    #[tokio::test]
    async fn ready_peer_receives_the_encoded_event() {
        let (tx, mut rx) = futures::channel::mpsc::unbounded::<Message>();
        let mut sink = tx.sink_map_err(axum::Error::new);

        let snapshot = PriceSnapshot {
            updated_ms: 42,
            ..Default::default()
        };
        push_snapshot(&mut sink, &snapshot, Duration::from_secs(1))
            .await
            .unwrap();

        let Some(Message::Text(text)) = rx.next().await else {
            panic!("expected a text frame");
        };
        let event: ServerEvent = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(event, ServerEvent::PriceUpdate(snapshot));
    }
}
