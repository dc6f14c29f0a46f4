//! Client-side reconciliation of pushed snapshots.
//!
//! The model keeps its own copy of the server table. `previous` always holds
//! the state immediately before the last applied update and exists only for
//! deltas and change alerts.

use std::fmt;

use market::protocol::ServerEvent;
use market::time::clock_label;
use market::{City, CityPriceBundle, Direction, Metal, PriceSnapshot, Purity};

use crate::filter::FilterState;
use crate::series::{ChartPoint, ChartSeries, DEFAULT_SERIES_CAP};

/// Relative change (percent) on a reference purity that raises an alert.
pub const ALERT_THRESHOLD_PCT: f64 = 0.5;

/// A significant move on one city's reference purity between two updates.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub city_id: String,
    pub city_name: String,
    pub metal: Metal,
    pub purity: Purity,
    pub old_price: u64,
    pub new_price: u64,
    pub change_pct: f64,
}

impl PriceAlert {
    pub fn direction(&self) -> Direction {
        Direction::sign(self.old_price, self.new_price)
    }
}

impl fmt::Display for PriceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {:+.2}% ({} -> {})",
            self.city_name,
            self.metal,
            self.purity,
            self.change_pct,
            self.old_price,
            self.new_price
        )
    }
}

/// Outcome of feeding one event into the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Full snapshot adopted as both current and previous.
    Initial,
    Updated { alerts: Vec<PriceAlert> },
    /// Not newer than what is already applied (older, or a resend of the
    /// current snapshot); dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ClientModel {
    cities: Vec<City>,
    current: Option<PriceSnapshot>,
    previous: Option<PriceSnapshot>,
    gold_series: ChartSeries,
    silver_series: ChartSeries,
    filter: FilterState,
}

impl ClientModel {
    pub fn new(series_cap: usize) -> Self {
        Self {
            cities: Vec::new(),
            current: None,
            previous: None,
            gold_series: ChartSeries::new(series_cap),
            silver_series: ChartSeries::new(series_cap),
            filter: FilterState::default(),
        }
    }

    pub fn apply(&mut self, event: ServerEvent) -> Applied {
        match event {
            ServerEvent::InitialData(data) => self.on_initial(data.cities, data.snapshot),
            ServerEvent::PriceUpdate(snapshot) => self.on_update(snapshot),
        }
    }

    /// Start of a session (first connect or any reconnect). No deltas and no
    /// alerts are derived against whatever was held before.
    pub fn on_initial(&mut self, cities: Vec<City>, snapshot: PriceSnapshot) -> Applied {
        self.cities = cities;
        self.append_chart_points(&snapshot);
        self.previous = Some(snapshot.clone());
        self.current = Some(snapshot);
        Applied::Initial
    }

    pub fn on_update(&mut self, snapshot: PriceSnapshot) -> Applied {
        let Some(current) = self.current.take() else {
            // update before any initial data: adopt it as a session start
            let cities = snapshot.prices.values().map(|b| b.city.clone()).collect();
            return self.on_initial(cities, snapshot);
        };

        // server stamps strictly increase, so an equal stamp is a resend
        if snapshot.updated_ms <= current.updated_ms {
            self.current = Some(current);
            return Applied::Stale;
        }

        let alerts = significant_changes(&current, &snapshot);
        self.append_chart_points(&snapshot);
        self.previous = Some(current);
        self.current = Some(snapshot);

        Applied::Updated { alerts }
    }

    fn append_chart_points(&mut self, snapshot: &PriceSnapshot) {
        let label = clock_label(snapshot.updated_ms);
        for metal in Metal::ALL {
            let Some(value) = snapshot.average_reference_price(metal) else {
                continue;
            };
            self.series_mut(metal).push(ChartPoint {
                ts_ms: snapshot.updated_ms,
                label: label.clone(),
                value,
            });
        }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn current(&self) -> Option<&PriceSnapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&PriceSnapshot> {
        self.previous.as_ref()
    }

    pub fn series(&self, metal: Metal) -> &ChartSeries {
        match metal {
            Metal::Gold => &self.gold_series,
            Metal::Silver => &self.silver_series,
        }
    }

    fn series_mut(&mut self, metal: Metal) -> &mut ChartSeries {
        match metal {
            Metal::Gold => &mut self.gold_series,
            Metal::Silver => &mut self.silver_series,
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    /// Current bundles passing the filter.
    pub fn filtered_view(&self) -> Vec<&CityPriceBundle> {
        self.current
            .as_ref()
            .map(|snapshot| self.filter.apply(snapshot))
            .unwrap_or_default()
    }

    /// Direction of the last change of one price. `Stable` when either side
    /// is unknown.
    pub fn delta(&self, city_id: &str, metal: Metal, purity: Purity) -> Direction {
        let price_in = |snapshot: Option<&PriceSnapshot>| {
            snapshot
                .and_then(|s| s.get(city_id))
                .and_then(|b| b.price(metal, purity))
        };

        match (price_in(self.previous()), price_in(self.current())) {
            (Some(old), Some(new)) => Direction::sign(old, new),
            _ => Direction::Stable,
        }
    }
}

impl Default for ClientModel {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAP)
    }
}

/// At most one alert per city per metal, on the metal's reference purity.
pub fn significant_changes(previous: &PriceSnapshot, incoming: &PriceSnapshot) -> Vec<PriceAlert> {
    let mut alerts = Vec::new();

    for (id, bundle) in &incoming.prices {
        let Some(before) = previous.get(id) else {
            continue;
        };

        for metal in Metal::ALL {
            let (Some(old), Some(new)) = (before.reference_price(metal), bundle.reference_price(metal))
            else {
                continue;
            };
            if old == 0 {
                continue;
            }

            let change_pct = (new as f64 - old as f64) / old as f64 * 100.0;
            if change_pct.abs() > ALERT_THRESHOLD_PCT {
                alerts.push(PriceAlert {
                    city_id: id.clone(),
                    city_name: bundle.city.name.clone(),
                    metal,
                    purity: metal.reference_purity(),
                    old_price: old,
                    new_price: new,
                    change_pct,
                });
            }
        }
    }

    alerts
}
