//! Pure projection of the client model into display units.
//!
//! Output is a deterministic function of the filtered view, the previous
//! snapshot, and the selected metals. Every call rebuilds the full list.

use std::fmt;

use market::time::clock_label;
use market::types::average_reference_price;
use market::{CityPriceBundle, Direction, Metal, PriceSnapshot, Purity};

use crate::model::ClientModel;
use crate::series::{ChartSeries, Timeframe};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCell {
    pub purity: Purity,
    pub price: u64,
    /// sign(current - previous)
    pub delta: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetalPanel {
    pub metal: Metal,
    pub trend: Direction,
    pub cells: Vec<PriceCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityCard {
    pub city_id: String,
    pub city_name: String,
    pub state: String,
    pub updated_label: String,
    pub panels: Vec<MetalPanel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetalSummary {
    pub metal: Metal,
    pub average: Option<f64>,
    pub rising: usize,
    pub falling: usize,
}

/// Header line over the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub shown: usize,
    pub metals: Vec<MetalSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub metal: Metal,
    pub timeframe: Timeframe,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub summary: Summary,
    pub cards: Vec<CityCard>,
}

fn arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "▲",
        Direction::Down => "▼",
        Direction::Stable => "•",
    }
}

/// Project `view` into cards sorted by display name (case-insensitive, id as
/// tie-break).
pub fn render_cards(
    view: &[&CityPriceBundle],
    previous: Option<&PriceSnapshot>,
    metals: &[Metal],
) -> Vec<CityCard> {
    let mut cards: Vec<CityCard> = view
        .iter()
        .map(|bundle| {
            let before = previous.and_then(|p| p.get(&bundle.city.id));
            CityCard {
                city_id: bundle.city.id.clone(),
                city_name: bundle.city.name.clone(),
                state: bundle.city.state.clone(),
                updated_label: clock_label(bundle.last_updated),
                panels: metals.iter().map(|&m| panel(bundle, before, m)).collect(),
            }
        })
        .collect();

    cards.sort_by(|a, b| {
        a.city_name
            .to_lowercase()
            .cmp(&b.city_name.to_lowercase())
            .then_with(|| a.city_id.cmp(&b.city_id))
    });
    cards
}

fn panel(bundle: &CityPriceBundle, before: Option<&CityPriceBundle>, metal: Metal) -> MetalPanel {
    let cells = bundle
        .prices(metal)
        .iter()
        .map(|(purity, price)| {
            let delta = before
                .and_then(|b| b.price(metal, purity))
                .map(|old| Direction::sign(old, price))
                .unwrap_or_default();
            PriceCell {
                purity,
                price,
                delta,
            }
        })
        .collect();

    MetalPanel {
        metal,
        trend: bundle.trend.get(metal),
        cells,
    }
}

pub fn summarize(view: &[&CityPriceBundle], metals: &[Metal]) -> Summary {
    let metals = metals
        .iter()
        .map(|&metal| {
            let count = |d: Direction| view.iter().filter(|b| b.trend.get(metal) == d).count();
            MetalSummary {
                metal,
                average: average_reference_price(view.iter().copied(), metal),
                rising: count(Direction::Up),
                falling: count(Direction::Down),
            }
        })
        .collect();

    Summary {
        shown: view.len(),
        metals,
    }
}

pub fn chart_dataset(series: &ChartSeries, metal: Metal, timeframe: Timeframe) -> ChartDataset {
    let (labels, values) = series
        .window(timeframe)
        .map(|p| (p.label.clone(), p.value))
        .unzip();

    ChartDataset {
        metal,
        timeframe,
        labels,
        values,
    }
}

/// Full rebuild of the visible grid for the model's current filter.
pub fn render(model: &ClientModel) -> View {
    let view = model.filtered_view();
    let metals = model.filter().metals();

    View {
        summary: summarize(&view, &metals),
        cards: render_cards(&view, model.previous(), &metals),
    }
}

impl fmt::Display for CityCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})  updated {}", self.city_name, self.state, self.updated_label)?;
        for panel in &self.panels {
            write!(f, "  {:<6} {}", panel.metal, arrow(panel.trend))?;
            for cell in &panel.cells {
                write!(f, "  {} {} {}", cell.purity, cell.price, arrow(cell.delta))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cities", self.shown)?;
        for m in &self.metals {
            match m.average {
                Some(avg) => write!(f, " | {} avg {:.0}", m.metal, avg)?,
                None => write!(f, " | {} avg -", m.metal)?,
            }
            write!(f, " ({} up, {} down)", m.rising, m.falling)?;
        }
        Ok(())
    }
}
