//! Price update scheduler.
//!
//! Two independent cadences drive every write to the [`PriceStore`]:
//!
//! - **fast tick**: try the live source; derive every city from the live
//!   quote on success, otherwise random-walk the previous prices. Always
//!   publishes afterwards, so subscribers never see a stale table because the
//!   upstream failed.
//! - **regime shift**: shock the reference table by one market-wide factor
//!   and regenerate every city from the new base.
//!
//! Both apply and publish under one engine lock, so no two updates interleave
//! and snapshots are published in the order they were written. The live fetch
//! itself happens before the lock is taken.

use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, child_span, root_span, warn_if_slow};
use market::deriver::derive;
use market::quote::LiveQuotes;
use market::synthetic::{draw_direction, draw_regime_shock, generate_bundle, walk_set};
use market::time::now_ms;
use market::{CityTable, Direction, Metal, PriceSnapshot, ReferencePriceTable, Trend};
use parking_lot::RwLock;
use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{Instrument, info, warn};

use crate::broadcast::Broadcaster;
use crate::source::{DataSource, PriceSource, SourceMode};
use crate::store::PriceStore;

/// Mutable state owned by the update loop.
struct Engine {
    reference: ReferencePriceTable,
    mode: SourceMode,
    rng: StdRng,
}

/// Source health as reported by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub data_source: DataSource,
    pub live_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub source: DataSource,
    pub snapshot: Arc<PriceSnapshot>,
    pub subscribers: usize,
}

pub struct UpdateScheduler {
    cities: Arc<CityTable>,
    store: PriceStore,
    broadcaster: Broadcaster,
    source: Option<Arc<dyn PriceSource>>,
    cooldown: Duration,
    engine: Mutex<Engine>,
    status: RwLock<SourceStatus>,
}

/// Initial table: every city priced from the reference table, trends stable.
pub fn bootstrap_snapshot<R: Rng>(
    cities: &CityTable,
    reference: &ReferencePriceTable,
    now_ms: u64,
    rng: &mut R,
) -> PriceSnapshot {
    let prices = cities
        .profiles()
        .iter()
        .map(|p| {
            let bundle = generate_bundle(p, reference, Trend::default(), now_ms, rng);
            (p.city.id.clone(), bundle)
        })
        .collect();

    PriceSnapshot {
        updated_ms: now_ms,
        prices,
    }
}

impl UpdateScheduler {
    pub fn new(
        cities: Arc<CityTable>,
        store: PriceStore,
        broadcaster: Broadcaster,
        reference: ReferencePriceTable,
        source: Option<Arc<dyn PriceSource>>,
        cooldown: Duration,
        rng: StdRng,
    ) -> Self {
        let mode = SourceMode::initial(source.is_some());
        Self {
            cities,
            store,
            broadcaster,
            source,
            cooldown,
            status: RwLock::new(SourceStatus {
                data_source: DataSource::Synthetic,
                live_enabled: mode.is_live(),
            }),
            engine: Mutex::new(Engine {
                reference,
                mode,
                rng,
            }),
        }
    }

    pub fn status(&self) -> SourceStatus {
        *self.status.read()
    }

    pub async fn reference_table(&self) -> ReferencePriceTable {
        self.engine.lock().await.reference.clone()
    }

    /// One fast tick at `now_ms`.
    pub async fn fast_tick(&self, now_ms: u64) -> TickReport {
        let trace_id = TraceId::new();
        self.fast_tick_inner(now_ms)
            .instrument(root_span("fast_tick", &trace_id))
            .await
    }

    async fn fast_tick_inner(&self, now_ms: u64) -> TickReport {
        // the upstream call runs outside the engine lock so a slow fetch
        // cannot hold up a regime shift
        let should_fetch = match &self.source {
            Some(_) => self.engine.lock().await.mode.should_fetch(now_ms),
            None => false,
        };
        let fetched = match &self.source {
            Some(source) if should_fetch => {
                Some(source.fetch().instrument(child_span("fetch")).await)
            }
            _ => None,
        };

        let mut engine = self.engine.lock().await;
        let cooldown_ms = self.cooldown.as_millis() as u64;

        let live = match fetched {
            Some(Ok(quotes)) if quotes.has_usable() => Some(quotes),
            Some(Ok(_)) => {
                warn!(cooldown_ms, "live source returned no usable quote; using random walk");
                engine.mode.on_failure(now_ms, cooldown_ms);
                None
            }
            Some(Err(e)) => {
                warn!(error = %e, cooldown_ms, "live source failed; using random walk");
                engine.mode.on_failure(now_ms, cooldown_ms);
                None
            }
            None => None,
        };

        let source = if live.is_some() {
            DataSource::Live
        } else {
            DataSource::Synthetic
        };

        let cities = &self.cities;
        let rng = &mut engine.rng;
        let snapshot = child_span("apply").in_scope(|| {
            self.store.apply(now_ms, |prices| {
                for profile in cities.profiles() {
                    let Some(bundle) = prices.get_mut(&profile.city.id) else {
                        continue;
                    };
                    for metal in Metal::ALL {
                        match live.as_ref().and_then(|q: &LiveQuotes| q.usable(metal)) {
                            Some(quote) => {
                                *bundle.prices_mut(metal) =
                                    derive(metal, quote.last_traded_price, profile.multiplier);
                                bundle.trend.set(metal, quote.direction());
                            }
                            None => {
                                let next = walk_set(bundle.prices(metal), metal, rng);
                                *bundle.prices_mut(metal) = next;
                                bundle.trend.set(metal, draw_direction(rng));
                            }
                        }
                    }
                    bundle.last_updated = now_ms;
                }
            })
        });

        let subscribers = self.broadcaster.publish(Arc::clone(&snapshot));

        *self.status.write() = SourceStatus {
            data_source: source,
            live_enabled: engine.mode.is_live(),
        };

        info!(
            source = ?source,
            cities = snapshot.len(),
            subscribers,
            "tick published"
        );

        TickReport {
            source,
            snapshot,
            subscribers,
        }
    }

    /// One regime shift at `now_ms`. Returns the applied shock factor.
    pub async fn regime_shift(&self, now_ms: u64) -> f64 {
        let trace_id = TraceId::new();
        self.regime_shift_inner(now_ms)
            .instrument(root_span("regime_shift", &trace_id))
            .await
    }

    async fn regime_shift_inner(&self, now_ms: u64) -> f64 {
        let mut engine = self.engine.lock().await;
        let Engine { reference, rng, .. } = &mut *engine;

        let factor = draw_regime_shock(rng);
        reference.apply_shock(factor);

        let cities = &self.cities;
        let reference = &*reference;
        let snapshot = self.store.apply(now_ms, |prices| {
            for profile in cities.profiles() {
                let mut fresh = generate_bundle(profile, reference, Trend::default(), now_ms, rng);
                if let Some(old) = prices.get(&profile.city.id) {
                    for metal in Metal::ALL {
                        let before = old.reference_price(metal).unwrap_or(0);
                        let after = fresh.reference_price(metal).unwrap_or(0);
                        fresh.trend.set(metal, Direction::between(before, after));
                    }
                }
                prices.insert(profile.city.id.clone(), fresh);
            }
        });

        let subscribers = self.broadcaster.publish(snapshot);
        info!(
            shock_pct = (factor - 1.0) * 100.0,
            subscribers, "regime shift applied"
        );
        factor
    }

    /// Spawn both cadences. Each first fires one full period after start;
    /// the store is already fresh from bootstrap.
    pub fn spawn(
        self: &Arc<Self>,
        tick_every: Duration,
        regime_every: Duration,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        let ticks = tokio::spawn(Arc::clone(self).run_fast_ticks(tick_every));
        let regimes = tokio::spawn(Arc::clone(self).run_regime_shifts(regime_every));
        (ticks, regimes)
    }

    async fn run_fast_ticks(self: Arc<Self>, every: Duration) {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every_ms = every.as_millis() as u64, "fast tick loop started");

        loop {
            ticker.tick().await;
            warn_if_slow("fast_tick", every, self.fast_tick(now_ms())).await;
        }
    }

    async fn run_regime_shifts(self: Arc<Self>, every: Duration) {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(every_ms = every.as_millis() as u64, "regime shift loop started");

        loop {
            ticker.tick().await;
            self.regime_shift(now_ms()).await;
        }
    }
}
