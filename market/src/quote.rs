//! Exchange quotes as returned by the live upstream feed.
//!
//! The upstream is untrusted: the payload must be a JSON array of records, but
//! inside a record any missing or non-numeric field simply reads as 0.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Direction, Metal};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub last_traded_price: f64,
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: f64,
}

impl Quote {
    /// A quote with no positive last traded price cannot seed derivation.
    pub fn is_usable(&self) -> bool {
        self.last_traded_price.is_finite() && self.last_traded_price > 0.0
    }

    pub fn direction(&self) -> Direction {
        Direction::from_change_percent(self.change_percent)
    }
}

/// Best-effort snapshot from the live feed; either metal may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveQuotes {
    pub gold: Option<Quote>,
    pub silver: Option<Quote>,
}

impl LiveQuotes {
    pub fn get(&self, metal: Metal) -> Option<&Quote> {
        match metal {
            Metal::Gold => self.gold.as_ref(),
            Metal::Silver => self.silver.as_ref(),
        }
    }

    /// Usable quote for `metal`, if any.
    pub fn usable(&self, metal: Metal) -> Option<&Quote> {
        self.get(metal).filter(|q| q.is_usable())
    }

    pub fn is_empty(&self) -> bool {
        self.gold.is_none() && self.silver.is_none()
    }

    /// At least one metal can be priced from these quotes.
    pub fn has_usable(&self) -> bool {
        Metal::ALL.iter().any(|&m| self.usable(m).is_some())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum QuoteParseError {
    #[error("expected a JSON array of quote records, got {0}")]
    NotAnArray(&'static str),

    #[error("payload contained no gold or silver records")]
    NoCommodities,
}

const SYMBOL_KEYS: [&str; 3] = ["symbol", "Symbol", "commodity"];

/// Parse the upstream payload into per-metal quotes.
///
/// Records whose symbol starts with `GOLD` / `SILVER` (case-insensitive) are
/// picked up; the first match per metal wins. Everything else is ignored.
pub fn parse_live_payload(payload: &Value) -> Result<LiveQuotes, QuoteParseError> {
    let records = payload
        .as_array()
        .ok_or_else(|| QuoteParseError::NotAnArray(json_kind(payload)))?;

    let mut quotes = LiveQuotes::default();

    for record in records.iter().filter_map(Value::as_object) {
        let Some(symbol) = symbol_of(record) else {
            continue;
        };
        let Some(metal) = metal_for_symbol(&symbol) else {
            continue;
        };

        let slot = match metal {
            Metal::Gold => &mut quotes.gold,
            Metal::Silver => &mut quotes.silver,
        };
        if slot.is_none() {
            *slot = Some(quote_from_record(record));
        }
    }

    if quotes.is_empty() {
        return Err(QuoteParseError::NoCommodities);
    }
    Ok(quotes)
}

fn symbol_of(record: &Map<String, Value>) -> Option<String> {
    SYMBOL_KEYS
        .iter()
        .find_map(|k| record.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_ascii_uppercase())
}

fn metal_for_symbol(symbol: &str) -> Option<Metal> {
    // mini contracts (GOLDM, SILVERM) count too
    Metal::ALL.into_iter().find(|m| symbol.starts_with(m.symbol()))
}

fn quote_from_record(record: &Map<String, Value>) -> Quote {
    Quote {
        last_traded_price: number_field(record, &["lastTradedPrice", "last_traded_price", "ltp"]),
        change_percent: number_field(record, &["changePercent", "change_percent", "chgPer"]),
        high: number_field(record, &["high"]),
        low: number_field(record, &["low"]),
        open: number_field(record, &["open"]),
        close: number_field(record, &["close"]),
        volume: number_field(record, &["volume"]),
        timestamp: number_field(record, &["timestamp"]),
    }
}

/// First present key wins. Numbers and numeric strings ("1,05,500.50") are
/// accepted; anything else reads as 0.
fn number_field(record: &Map<String, Value>, keys: &[&str]) -> f64 {
    let raw = keys.iter().find_map(|k| record.get(*k));
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
