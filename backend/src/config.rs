use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Interface the HTTP / WebSocket server binds to.
    pub bind: String,
    pub port: u16,

    // =========================
    // Update cadence
    // =========================
    /// Period of the fast tick.
    ///
    /// Each tick tries the live feed (when enabled) and otherwise random-walks
    /// every stored price, then publishes the full table to subscribers.
    pub tick_interval: Duration,

    /// Period of the regime shift.
    ///
    /// Shocks the reference table by one market-wide factor and regenerates
    /// every city from the new base. Independent of `tick_interval`.
    pub regime_interval: Duration,

    // =========================
    // Live source
    // =========================
    /// Upstream exchange endpoint. `None` => synthetic prices only.
    pub live_source_url: Option<String>,

    /// Hard timeout applied to every live fetch.
    pub live_source_timeout: Duration,

    /// How long the live source stays disabled after a failed fetch.
    ///
    /// Purpose:
    /// - avoid hammering an unstable upstream
    /// - keep ticks fast while it recovers
    pub live_source_cooldown: Duration,

    // =========================
    // Fan-out
    // =========================
    /// Upper bound on a single push to one subscriber. A subscriber that
    /// cannot accept a frame within this window is disconnected.
    pub subscriber_send_timeout: Duration,

    /// Depth of the broadcast channel. Subscribers lagging further behind
    /// skip straight to the newest snapshot.
    pub broadcast_capacity: usize,

    /// Emit JSON logs (production) instead of pretty output.
    pub json_logs: bool,
}

fn env_str(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env_str(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env_str(name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_str("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_u16("PORT", 3000),

            tick_interval: env_ms("TICK_INTERVAL_MS", 10_000),
            regime_interval: env_ms("REGIME_INTERVAL_MS", 300_000),

            live_source_url: env_str("LIVE_SOURCE_URL"),
            live_source_timeout: env_ms("LIVE_SOURCE_TIMEOUT_MS", 10_000),
            live_source_cooldown: env_ms("LIVE_SOURCE_COOLDOWN_MS", 300_000),

            subscriber_send_timeout: env_ms("SUBSCRIBER_SEND_TIMEOUT_MS", 2_000),
            broadcast_capacity: env_u64("BROADCAST_CAPACITY", 16).max(1) as usize,

            json_logs: env_str("APP_ENV").is_some_and(|v| v == "production"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for AppConfig {
    /// Reference cadence with the live source disabled.
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            tick_interval: Duration::from_secs(10),
            regime_interval: Duration::from_secs(300),
            live_source_url: None,
            live_source_timeout: Duration::from_secs(10),
            live_source_cooldown: Duration::from_secs(300),
            subscriber_send_timeout: Duration::from_secs(2),
            broadcast_capacity: 16,
            json_logs: false,
        }
    }
}
