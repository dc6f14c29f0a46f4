use std::time::Duration;

use async_trait::async_trait;
use market::quote::{LiveQuotes, parse_live_payload};
use market::types::Metal;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{FetchError, PriceSource};

/// HTTP client for the exchange quote endpoint.
#[derive(Clone)]
pub struct LiveSourceClient {
    http: Client,
    url: String,
}

impl LiveSourceClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PriceSource for LiveSourceClient {
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    async fn fetch(&self) -> Result<LiveQuotes, FetchError> {
        let symbols: Vec<&str> = Metal::ALL.iter().map(|m| m.symbol()).collect();

        let resp = self
            .http
            .post(&self.url)
            .json(&json!({ "symbols": symbols }))
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = resp.json().await?;
        let quotes = parse_live_payload(&payload)?;

        debug!(
            gold = ?quotes.gold.as_ref().map(|q| q.last_traded_price),
            silver = ?quotes.silver.as_ref().map(|q| q.last_traded_price),
            "live quotes fetched"
        );

        Ok(quotes)
    }
}
