use std::collections::BTreeMap;
use std::sync::Arc;

use market::{CityPriceBundle, PriceSnapshot};
use parking_lot::{Mutex, RwLock};
use tracing::warn;

/// Process-wide table of the latest price bundle per city.
///
/// Readers get the most recently published `Arc<PriceSnapshot>` and never
/// wait on a writer's computation. Writers go through [`PriceStore::apply`],
/// which serializes mutation and swaps in a complete new snapshot.
#[derive(Clone)]
pub struct PriceStore {
    current: Arc<RwLock<Arc<PriceSnapshot>>>,
    write_lock: Arc<Mutex<()>>,
}

impl PriceStore {
    /// The store starts fully populated; there is no empty state visible to
    /// readers.
    pub fn new(initial: PriceSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Latest fully published snapshot.
    pub fn snapshot(&self) -> Arc<PriceSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn get(&self, city_id: &str) -> Option<CityPriceBundle> {
        self.current.read().get(city_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    pub fn last_update_ms(&self) -> u64 {
        self.current.read().updated_ms
    }

    /// The single mutation entry point.
    ///
    /// `mutate` works on a private copy; the result is published atomically.
    /// Store invariants are enforced on the way out:
    /// - the table never shrinks (dropped cities are restored)
    /// - invalid bundles (missing / zero price) are rejected in favour of the old one
    /// - `last_updated` per city never moves backwards
    /// - `updated_ms` strictly increases, so equal stamps mean the same snapshot
    pub fn apply<F>(&self, now_ms: u64, mutate: F) -> Arc<PriceSnapshot>
    where
        F: FnOnce(&mut BTreeMap<String, CityPriceBundle>),
    {
        let _guard = self.write_lock.lock();
        let previous = self.snapshot();

        let mut prices = previous.prices.clone();
        mutate(&mut prices);

        for (id, old) in &previous.prices {
            match prices.get_mut(id) {
                None => {
                    warn!(city = %id, "update dropped a city; keeping previous bundle");
                    prices.insert(id.clone(), old.clone());
                }
                Some(next) if !next.is_valid() => {
                    warn!(city = %id, "update produced an invalid bundle; keeping previous");
                    *next = old.clone();
                }
                Some(next) => {
                    next.last_updated = next.last_updated.max(old.last_updated);
                }
            }
        }

        let next = Arc::new(PriceSnapshot {
            updated_ms: now_ms.max(previous.updated_ms.saturating_add(1)),
            prices,
        });
        *self.current.write() = Arc::clone(&next);
        next
    }
}
