use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::synthetic::round_price;
use crate::types::{Metal, Purity, PurityPriceSet};

/// Base prices per metal and purity, the seed for synthetic generation.
///
/// Drifts slowly: each regime shift multiplies every entry by one
/// market-wide shock factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePriceTable(BTreeMap<Metal, PurityPriceSet>);

impl ReferencePriceTable {
    pub fn new(entries: BTreeMap<Metal, PurityPriceSet>) -> Self {
        Self(entries)
    }

    pub fn base(&self, metal: Metal, purity: Purity) -> Option<u64> {
        self.0.get(&metal).and_then(|set| set.get(purity))
    }

    pub fn prices(&self, metal: Metal) -> Option<&PurityPriceSet> {
        self.0.get(&metal)
    }

    /// Multiply every base price by `factor`, keeping each strictly positive.
    pub fn apply_shock(&mut self, factor: f64) {
        for set in self.0.values_mut() {
            *set = set
                .iter()
                .map(|(purity, price)| (purity, round_price(price as f64 * factor)))
                .collect();
        }
    }
}

impl Default for ReferencePriceTable {
    /// Gold per 10g, silver per kg (INR).
    fn default() -> Self {
        let gold = [
            (Purity::K24, 105_500),
            (Purity::K22, 96_700),
            (Purity::K18, 79_100),
        ];
        let silver = [(Purity::Fine999, 128_000), (Purity::Sterling925, 118_400)];

        Self(BTreeMap::from([
            (Metal::Gold, gold.into_iter().collect()),
            (Metal::Silver, silver.into_iter().collect()),
        ]))
    }
}
