use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Level, Span};

use super::TraceId;

/// Create a root span for one unit of work (a tick, a connection).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "root",
        name = %name,
        trace_id = %trace_id
    )
}

/// Create a child span (inherits trace_id from the enclosing root span)
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::INFO, "child", name = %name)
}

/// Await `fut` and emit a `performance` warning when it ran longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn warn_if_slow_passes_output_through() {
        let out = warn_if_slow("noop", Duration::from_millis(1), async { 41 + 1 }).await;
        assert_eq!(out, 42);
    }
}
