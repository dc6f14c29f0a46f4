use std::collections::VecDeque;

use clap::ValueEnum;

pub const DEFAULT_SERIES_CAP: usize = 60;

/// One chart sample: the cross-city average at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub ts_ms: u64,
    /// `HH:MM:SS` axis label
    pub label: String,
    pub value: f64,
}

/// Fixed-size sliding window of chart samples. Appends at the tail, evicts
/// from the head once `cap` is exceeded; history is never rewritten.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    points: VecDeque<ChartPoint>,
    cap: usize,
}

impl ChartSeries {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            points: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append `point`; returns how many old points were evicted.
    pub fn push(&mut self, point: ChartPoint) -> usize {
        self.points.push_back(point);

        let mut evicted = 0;
        while self.points.len() > self.cap {
            self.points.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// Last `n` points, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().skip(self.points.len().saturating_sub(n))
    }

    pub fn window(&self, timeframe: Timeframe) -> impl Iterator<Item = &ChartPoint> {
        self.tail(timeframe.points())
    }
}

impl Default for ChartSeries {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAP)
    }
}

/// Chart range. A pure tail slice by point count, never a requery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Timeframe {
    #[default]
    #[value(name = "1h")]
    OneHour,
    #[value(name = "6h")]
    SixHours,
    #[value(name = "24h")]
    OneDay,
}

impl Timeframe {
    pub fn points(self) -> usize {
        match self {
            Timeframe::OneHour => 60,
            Timeframe::SixHours => 36,
            Timeframe::OneDay => 24,
        }
    }
}
