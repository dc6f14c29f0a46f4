//! Subscriber side of the price feed.
//!
//! [`connection`] keeps a WebSocket session alive with bounded backoff and
//! hands decoded events to the caller. [`model`] reconciles those events into
//! current / previous snapshots plus rolling chart series, and [`render`]
//! projects the model into display cards.
pub mod connection;
pub mod error;
pub mod filter;
pub mod model;
pub mod reconnect;
pub mod render;
pub mod series;

pub use connection::{FeedEvent, PriceFeedClient};
pub use error::{FeedError, ProtocolError};
pub use filter::FilterState;
pub use model::{Applied, ClientModel, PriceAlert};
pub use reconnect::{Backoff, BackoffPolicy};
pub use series::{ChartPoint, ChartSeries, Timeframe};
