use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cities::City;

/// Relative change (in percent) above which a move counts as up/down.
pub const TREND_THRESHOLD_PCT: f64 = 0.1;

/// Tracked commodities. Gold is the "light" metal with three grades, silver the
/// "heavy" one with two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Silver,
}

impl Metal {
    pub const ALL: [Metal; 2] = [Metal::Gold, Metal::Silver];

    pub fn purities(self) -> &'static [Purity] {
        match self {
            Metal::Gold => &[Purity::K24, Purity::K22, Purity::K18],
            Metal::Silver => &[Purity::Fine999, Purity::Sterling925],
        }
    }

    /// Purity used for averages, charts and significant-change detection.
    pub fn reference_purity(self) -> Purity {
        match self {
            Metal::Gold => Purity::K24,
            Metal::Silver => Purity::Fine999,
        }
    }

    /// Symbol prefix used by the upstream exchange feed.
    pub fn symbol(self) -> &'static str {
        match self {
            Metal::Gold => "GOLD",
            Metal::Silver => "SILVER",
        }
    }

    /// Half-width of the uniform per-tick random walk (fraction, not percent).
    pub fn walk_amplitude(self) -> f64 {
        match self {
            Metal::Gold => 0.002,
            Metal::Silver => 0.003,
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metal::Gold => f.write_str("gold"),
            Metal::Silver => f.write_str("silver"),
        }
    }
}

impl std::str::FromStr for Metal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" => Ok(Metal::Gold),
            "silver" => Ok(Metal::Silver),
            other => Err(format!("unknown metal: {other}")),
        }
    }
}

/// Fineness grade. Serialized with the label shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Purity {
    #[serde(rename = "24K")]
    K24,
    #[serde(rename = "22K")]
    K22,
    #[serde(rename = "18K")]
    K18,
    #[serde(rename = "999")]
    Fine999,
    #[serde(rename = "925")]
    Sterling925,
}

impl Purity {
    /// Fineness in parts per thousand.
    pub fn fineness(self) -> u32 {
        match self {
            Purity::K24 | Purity::Fine999 => 999,
            Purity::K22 => 916,
            Purity::K18 => 750,
            Purity::Sterling925 => 925,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Purity::K24 => "24K",
            Purity::K22 => "22K",
            Purity::K18 => "18K",
            Purity::Fine999 => "999",
            Purity::Sterling925 => "925",
        }
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Price movement marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Stable,
}

impl Direction {
    /// Map a percent change onto a direction using [`TREND_THRESHOLD_PCT`].
    pub fn from_change_percent(change_pct: f64) -> Self {
        if change_pct > TREND_THRESHOLD_PCT {
            Direction::Up
        } else if change_pct < -TREND_THRESHOLD_PCT {
            Direction::Down
        } else {
            Direction::Stable
        }
    }

    /// Thresholded direction between two prices.
    pub fn between(old: u64, new: u64) -> Self {
        if old == 0 {
            return Direction::Stable;
        }
        let change_pct = (new as f64 - old as f64) / old as f64 * 100.0;
        Self::from_change_percent(change_pct)
    }

    /// Unthresholded sign of `new - old`.
    pub fn sign(old: u64, new: u64) -> Self {
        match new.cmp(&old) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::Stable,
        }
    }
}

/// Purity -> integer price (INR; per 10g for gold, per kg for silver).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurityPriceSet(BTreeMap<Purity, u64>);

impl PurityPriceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, purity: Purity) -> Option<u64> {
        self.0.get(&purity).copied()
    }

    pub fn set(&mut self, purity: Purity, price: u64) {
        self.0.insert(purity, price);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Purity, u64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Purity, u64)> for PurityPriceSet {
    fn from_iter<I: IntoIterator<Item = (Purity, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub gold: Direction,
    pub silver: Direction,
}

impl Trend {
    pub fn get(&self, metal: Metal) -> Direction {
        match metal {
            Metal::Gold => self.gold,
            Metal::Silver => self.silver,
        }
    }

    pub fn set(&mut self, metal: Metal, direction: Direction) {
        match metal {
            Metal::Gold => self.gold = direction,
            Metal::Silver => self.silver = direction,
        }
    }
}

/// Full price record for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPriceBundle {
    pub city: City,
    pub gold: PurityPriceSet,
    pub silver: PurityPriceSet,
    /// ms since epoch
    pub last_updated: u64,
    pub trend: Trend,
}

impl CityPriceBundle {
    pub fn prices(&self, metal: Metal) -> &PurityPriceSet {
        match metal {
            Metal::Gold => &self.gold,
            Metal::Silver => &self.silver,
        }
    }

    pub fn prices_mut(&mut self, metal: Metal) -> &mut PurityPriceSet {
        match metal {
            Metal::Gold => &mut self.gold,
            Metal::Silver => &mut self.silver,
        }
    }

    pub fn price(&self, metal: Metal, purity: Purity) -> Option<u64> {
        self.prices(metal).get(purity)
    }

    /// Price of the metal's reference purity.
    pub fn reference_price(&self, metal: Metal) -> Option<u64> {
        self.price(metal, metal.reference_purity())
    }

    /// Every configured purity is present and strictly positive.
    pub fn is_valid(&self) -> bool {
        Metal::ALL.iter().all(|&metal| {
            metal
                .purities()
                .iter()
                .all(|&p| self.price(metal, p).is_some_and(|v| v > 0))
        })
    }
}

/// Complete store contents at one instant, as transmitted to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// Server time of the write that produced this snapshot (ms since epoch).
    pub updated_ms: u64,
    /// city id -> bundle
    pub prices: BTreeMap<String, CityPriceBundle>,
}

impl PriceSnapshot {
    pub fn get(&self, city_id: &str) -> Option<&CityPriceBundle> {
        self.prices.get(city_id)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Mean of `metal`'s reference purity across all cities in the snapshot.
    pub fn average_reference_price(&self, metal: Metal) -> Option<f64> {
        average_reference_price(self.prices.values(), metal)
    }
}

/// Mean of `metal`'s reference purity over `bundles`; `None` when nothing priced.
pub fn average_reference_price<'a, I>(bundles: I, metal: Metal) -> Option<f64>
where
    I: IntoIterator<Item = &'a CityPriceBundle>,
{
    let (sum, count) = bundles
        .into_iter()
        .filter_map(|b| b.reference_price(metal))
        .fold((0u64, 0u64), |(s, c), v| (s + v, c + 1));

    (count > 0).then(|| sum as f64 / count as f64)
}
