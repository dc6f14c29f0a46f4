use std::sync::Arc;

use market::PriceSnapshot;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Fans every published snapshot out to all connected subscribers.
///
/// Each push is a full-table replace. Publishing never waits on a subscriber:
/// the channel is bounded and a subscriber that falls behind skips ahead to
/// the newest snapshot instead of stalling the others.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Arc<PriceSnapshot>>,
    latest: Arc<RwLock<Arc<PriceSnapshot>>>,
    publish_lock: Arc<Mutex<()>>,
}

impl Broadcaster {
    pub fn new(initial: Arc<PriceSnapshot>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            latest: Arc::new(RwLock::new(initial)),
            publish_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Send `snapshot` to every current subscriber. Returns how many
    /// subscribers it was queued for (0 when nobody is connected).
    pub fn publish(&self, snapshot: Arc<PriceSnapshot>) -> usize {
        let _guard = self.publish_lock.lock();
        *self.latest.write() = Arc::clone(&snapshot);
        let delivered = self.tx.send(snapshot).unwrap_or(0);
        debug!(subscribers = delivered, "snapshot published");
        delivered
    }

    /// Register a subscriber. The returned subscription starts with the full
    /// current snapshot, followed by every later publish in order.
    pub fn subscribe(&self) -> Subscription {
        // Receiver first, then latest: a publish racing with us is seen at
        // least once and never lost.
        let rx = self.tx.subscribe();
        let initial = self.latest();
        Subscription {
            last_sent: Arc::clone(&initial),
            initial,
            rx,
        }
    }

    pub fn latest(&self) -> Arc<PriceSnapshot> {
        Arc::clone(&self.latest.read())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One subscriber's ordered view of the broadcast stream.
pub struct Subscription {
    initial: Arc<PriceSnapshot>,
    rx: broadcast::Receiver<Arc<PriceSnapshot>>,
    last_sent: Arc<PriceSnapshot>,
}

impl Subscription {
    /// Full snapshot to hand the subscriber on join.
    pub fn initial(&self) -> Arc<PriceSnapshot> {
        Arc::clone(&self.initial)
    }

    /// Record a snapshot handed to the subscriber outside of [`next`], e.g.
    /// an explicit resend. Later calls to `next` will not go back past it.
    ///
    /// [`next`]: Subscription::next
    pub fn mark_sent(&mut self, snapshot: &Arc<PriceSnapshot>) {
        if snapshot.updated_ms >= self.last_sent.updated_ms {
            self.last_sent = Arc::clone(snapshot);
        }
    }

    /// Whether `snapshot` is the one this subscriber was handed last.
    pub fn already_sent(&self, snapshot: &Arc<PriceSnapshot>) -> bool {
        Arc::ptr_eq(snapshot, &self.last_sent)
    }

    /// Next snapshot for this subscriber, or `None` once the broadcaster is
    /// gone. Never yields a snapshot older than one already yielded, nor the
    /// same one twice in a row.
    pub async fn next(&mut self) -> Option<Arc<PriceSnapshot>> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot)
                    if snapshot.updated_ms < self.last_sent.updated_ms
                        || Arc::ptr_eq(&snapshot, &self.last_sent) =>
                {
                    continue;
                }
                Ok(snapshot) => {
                    self.last_sent = Arc::clone(&snapshot);
                    return Some(snapshot);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagging; skipping to newest snapshot");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
