use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// A push-channel frame that could not be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected binary frame ({0} bytes)")]
    Binary(usize),

    #[error("invalid event: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FeedError {
    /// Automatic reconnection gave up; a new `run` must be started by hand.
    #[error("gave up after {0} failed connection attempts")]
    RetriesExhausted(u32),

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
