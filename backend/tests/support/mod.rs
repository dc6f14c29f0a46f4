#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backend::config::AppConfig;
use backend::source::{FetchError, PriceSource};
use backend::state::AppState;
use market::CityTable;
use market::quote::{LiveQuotes, Quote};
use market::time::now_ms;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Notify;

pub const COOLDOWN_MS: u64 = 300_000;

/// Always times out, counting calls.
#[derive(Default)]
pub struct TimeoutSource {
    calls: AtomicUsize,
}

impl TimeoutSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for TimeoutSource {
    async fn fetch(&self) -> Result<LiveQuotes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::Timeout)
    }
}

/// Returns the same quotes on every call.
pub struct FixedSource {
    pub quotes: LiveQuotes,
}

#[async_trait]
impl PriceSource for FixedSource {
    async fn fetch(&self) -> Result<LiveQuotes, FetchError> {
        Ok(self.quotes.clone())
    }
}

/// Answers with `quotes` every call, counting calls.
pub struct CountingSource {
    quotes: LiveQuotes,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn new(quotes: LiveQuotes) -> Self {
        Self {
            quotes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for CountingSource {
    async fn fetch(&self) -> Result<LiveQuotes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quotes.clone())
    }
}

/// Holds every fetch until [`GatedSource::release`] is called.
pub struct GatedSource {
    quotes: LiveQuotes,
    entered: Notify,
    gate: Notify,
}

impl GatedSource {
    pub fn new(quotes: LiveQuotes) -> Self {
        Self {
            quotes,
            entered: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Resolves once a fetch is in flight.
    pub async fn wait_until_fetching(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl PriceSource for GatedSource {
    async fn fetch(&self) -> Result<LiveQuotes, FetchError> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.quotes.clone())
    }
}

pub fn quote(last_traded_price: f64, change_percent: f64) -> Quote {
    Quote {
        last_traded_price,
        change_percent,
        ..Quote::default()
    }
}

pub fn app(source: Option<Arc<dyn PriceSource>>) -> Arc<AppState> {
    let cfg = AppConfig {
        live_source_cooldown: Duration::from_millis(COOLDOWN_MS),
        ..AppConfig::default()
    };
    AppState::new(cfg, CityTable::default(), source, StdRng::seed_from_u64(7))
}

/// A tick timestamp safely after bootstrap.
pub fn later() -> u64 {
    now_ms() + 1_000
}
