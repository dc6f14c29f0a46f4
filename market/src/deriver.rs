//! Expands one exchange reference price into per-city purity prices.
//!
//! Gold grades scale by `fineness / REFERENCE_FINENESS`; silver 999 is the
//! reference itself and 925 is a fixed fraction of it. Both then scale by the
//! city multiplier. Pure and deterministic: no jitter, no I/O.

use crate::synthetic::round_price;
use crate::types::{Metal, Purity, PurityPriceSet};

/// Fineness the exchange quote is denominated in.
pub const REFERENCE_FINENESS: f64 = 999.0;
/// Sterling (925) silver relative to fine silver.
pub const STERLING_FRACTION: f64 = 0.925;

pub fn derive(metal: Metal, reference_price: f64, multiplier: f64) -> PurityPriceSet {
    match metal {
        Metal::Gold => metal
            .purities()
            .iter()
            .map(|&purity| {
                let ratio = purity.fineness() as f64 / REFERENCE_FINENESS;
                (purity, round_price(reference_price * ratio * multiplier))
            })
            .collect(),
        Metal::Silver => {
            let fine = reference_price * multiplier;
            [
                (Purity::Fine999, round_price(fine)),
                (Purity::Sterling925, round_price(fine * STERLING_FRACTION)),
            ]
            .into_iter()
            .collect()
        }
    }
}
