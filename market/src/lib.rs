//! Domain model and pricing logic shared by the price server and its clients.
//!
//! - `types`: metals, purities, per-city price bundles and snapshots.
//! - `cities`: the fixed city table with per-city price multipliers.
//! - `reference`: base price table used for synthetic generation.
//! - `deriver`: expands a reference quote into per-city purity prices.
//! - `synthetic`: from-base and random-walk price generation.
//! - `quote`: live exchange quotes and defensive payload parsing.
//! - `protocol`: push-channel events exchanged with subscribers.
pub mod cities;
pub mod deriver;
pub mod protocol;
pub mod quote;
pub mod reference;
pub mod synthetic;
pub mod time;
pub mod types;

pub use cities::{City, CityProfile, CityTable};
pub use reference::ReferencePriceTable;
pub use types::{CityPriceBundle, Direction, Metal, PriceSnapshot, Purity, PurityPriceSet, Trend};
