//! Live / synthetic source selection.
//!
//! ```text
//!   Live ──fetch fails──▶ Cooldown { until_ms } ──now >= until_ms──▶ Live
//!   Synthetic (no live source configured; terminal)
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Live,
    Cooldown { until_ms: u64 },
    Synthetic,
}

impl SourceMode {
    pub fn initial(live_configured: bool) -> Self {
        if live_configured {
            SourceMode::Live
        } else {
            SourceMode::Synthetic
        }
    }

    /// Whether this tick should hit the live source. An expired cooldown
    /// flips back to `Live` here.
    pub fn should_fetch(&mut self, now_ms: u64) -> bool {
        match *self {
            SourceMode::Live => true,
            SourceMode::Cooldown { until_ms } if now_ms >= until_ms => {
                *self = SourceMode::Live;
                true
            }
            SourceMode::Cooldown { .. } | SourceMode::Synthetic => false,
        }
    }

    /// Record a failed live fetch.
    pub fn on_failure(&mut self, now_ms: u64, cooldown_ms: u64) {
        if *self == SourceMode::Live {
            *self = SourceMode::Cooldown {
                until_ms: now_ms.saturating_add(cooldown_ms),
            };
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, SourceMode::Live)
    }
}

/// Which path produced the most recent tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Synthetic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_enters_cooldown_until_expiry() {
        let mut mode = SourceMode::initial(true);
        assert!(mode.should_fetch(0));

        mode.on_failure(1_000, 300_000);
        assert_eq!(mode, SourceMode::Cooldown { until_ms: 301_000 });
        assert!(!mode.should_fetch(1_000));
        assert!(!mode.should_fetch(300_999));
        assert!(!mode.is_live());

        assert!(mode.should_fetch(301_000));
        assert!(mode.is_live());
    }

    #[test]
    fn failure_during_cooldown_does_not_extend_it() {
        let mut mode = SourceMode::Cooldown { until_ms: 50 };
        mode.on_failure(10, 1_000);
        assert_eq!(mode, SourceMode::Cooldown { until_ms: 50 });
    }

    #[test]
    fn synthetic_never_fetches() {
        let mut mode = SourceMode::initial(false);
        assert!(!mode.should_fetch(u64::MAX));
        mode.on_failure(0, 10);
        assert_eq!(mode, SourceMode::Synthetic);
    }
}
