pub mod errors;
pub mod live;
pub mod mode;

use async_trait::async_trait;
use market::quote::LiveQuotes;

pub use errors::FetchError;
pub use live::LiveSourceClient;
pub use mode::{DataSource, SourceMode};

/// Upstream reference prices. Implementations must bound their own latency
/// and report every failure as a `FetchError`; callers fall back to the
/// synthetic generator.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<LiveQuotes, FetchError>;
}
