//! Synthetic price generation.
//!
//! Two distinct formulas are used:
//!
//! - **from base** (startup and regime shifts): `base × city multiplier × jitter`,
//!   with jitter drawn uniformly from [`JITTER_RANGE`]. Prices scatter i.i.d.
//!   around the reference table.
//! - **random walk** (fast ticks): `previous × (1 + change)`, with change drawn
//!   uniformly from ±[`Metal::walk_amplitude`]. Each tick builds on the last
//!   stored price, so prices wander instead of reverting to the base.
//!
//! Every result is rounded to the nearest currency unit and floored at 1.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::cities::CityProfile;
use crate::reference::ReferencePriceTable;
use crate::types::{CityPriceBundle, Direction, Metal, PurityPriceSet, Trend};

pub const JITTER_RANGE: RangeInclusive<f64> = 0.995..=1.005;
/// Half-width of the market-wide regime shock.
pub const REGIME_SHOCK_AMPLITUDE: f64 = 0.01;

/// Round to the nearest integer unit; never returns zero.
pub fn round_price(raw: f64) -> u64 {
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    raw.round() as u64
}

/// `round(base × multiplier × jitter)`. Pure, so callers can pin the jitter.
pub fn price_from_base(base: u64, multiplier: f64, jitter: f64) -> u64 {
    round_price(base as f64 * multiplier * jitter)
}

/// `round(previous × (1 + change))`.
pub fn walk_price(previous: u64, change: f64) -> u64 {
    round_price(previous as f64 * (1.0 + change))
}

pub fn draw_jitter<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(JITTER_RANGE)
}

pub fn draw_walk_change<R: Rng>(rng: &mut R, metal: Metal) -> f64 {
    let amp = metal.walk_amplitude();
    rng.random_range(-amp..=amp)
}

pub fn draw_regime_shock<R: Rng>(rng: &mut R) -> f64 {
    1.0 + rng.random_range(-REGIME_SHOCK_AMPLITUDE..=REGIME_SHOCK_AMPLITUDE)
}

/// Uniform pick among up / down / stable.
pub fn draw_direction<R: Rng>(rng: &mut R) -> Direction {
    match rng.random_range(0..3u8) {
        0 => Direction::Up,
        1 => Direction::Down,
        _ => Direction::Stable,
    }
}

/// Price every purity of `metal` for one city from the reference table,
/// drawing an independent jitter per purity.
pub fn generate_set<R: Rng>(
    table: &ReferencePriceTable,
    metal: Metal,
    multiplier: f64,
    rng: &mut R,
) -> PurityPriceSet {
    metal
        .purities()
        .iter()
        .filter_map(|&purity| {
            let base = table.base(metal, purity)?;
            Some((purity, price_from_base(base, multiplier, draw_jitter(rng))))
        })
        .collect()
}

/// Fresh bundle for `profile` built with the from-base formula.
pub fn generate_bundle<R: Rng>(
    profile: &CityProfile,
    table: &ReferencePriceTable,
    trend: Trend,
    now_ms: u64,
    rng: &mut R,
) -> CityPriceBundle {
    CityPriceBundle {
        city: profile.city.clone(),
        gold: generate_set(table, Metal::Gold, profile.multiplier, rng),
        silver: generate_set(table, Metal::Silver, profile.multiplier, rng),
        last_updated: now_ms,
        trend,
    }
}

/// One random-walk step for every purity in `previous`.
pub fn walk_set<R: Rng>(
    previous: &PurityPriceSet,
    metal: Metal,
    rng: &mut R,
) -> PurityPriceSet {
    previous
        .iter()
        .map(|(purity, price)| (purity, walk_price(price, draw_walk_change(rng, metal))))
        .collect()
}
