use std::sync::Arc;

use market::time::now_ms;
use market::{CityTable, ReferencePriceTable};
use rand::rngs::StdRng;

use crate::broadcast::Broadcaster;
use crate::config::AppConfig;
use crate::scheduler::{UpdateScheduler, bootstrap_snapshot};
use crate::source::PriceSource;
use crate::store::PriceStore;

/// Shared application state handed to every route via `State`.
pub struct AppState {
    pub config: AppConfig,
    pub cities: Arc<CityTable>,
    pub store: PriceStore,
    pub broadcaster: Broadcaster,
    pub scheduler: Arc<UpdateScheduler>,
}

impl AppState {
    /// Wire the store, broadcaster and scheduler around one fully populated
    /// initial snapshot.
    pub fn new(
        config: AppConfig,
        cities: CityTable,
        source: Option<Arc<dyn PriceSource>>,
        mut rng: StdRng,
    ) -> Arc<Self> {
        let cities = Arc::new(cities);
        let reference = ReferencePriceTable::default();

        let initial = bootstrap_snapshot(&cities, &reference, now_ms(), &mut rng);
        let store = PriceStore::new(initial);
        let broadcaster = Broadcaster::new(store.snapshot(), config.broadcast_capacity);

        let scheduler = Arc::new(UpdateScheduler::new(
            Arc::clone(&cities),
            store.clone(),
            broadcaster.clone(),
            reference,
            source,
            config.live_source_cooldown,
            rng,
        ));

        Arc::new(Self {
            config,
            cities,
            store,
            broadcaster,
            scheduler,
        })
    }
}
