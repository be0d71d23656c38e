//! Chart data types
//!
//! Points, presentation options, and the read-only snapshots handed to
//! anything outside the feed task.

use serde::{Deserialize, Serialize};

/// A plotted point: epoch milliseconds on x, captured flags on y
///
/// Serialized as `[x, y]`, the pair form line-chart widgets take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint(pub i64, pub u64);

impl ChartPoint {
    pub fn new(x: i64, y: u64) -> Self {
        Self(x, y)
    }

    pub fn x(&self) -> i64 {
        self.0
    }

    pub fn y(&self) -> u64 {
        self.1
    }
}

/// Presentation settings for the flags chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Captured Flags".to_string(),
            x_axis_title: "Time".to_string(),
            y_axis_title: "Flags Captured".to_string(),
        }
    }
}

impl ChartOptions {
    /// Tooltip text for a point on `series`
    pub fn tooltip(&self, series: &str, y: u64) -> String {
        format!("{}: {} flag(s)", series, y)
    }
}

/// One series as it currently stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub name: String,
    pub data: Vec<ChartPoint>,
}

impl SeriesSnapshot {
    /// Most recent point, if any
    pub fn latest(&self) -> Option<ChartPoint> {
        self.data.last().copied()
    }
}

/// Immutable copy of the whole chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub options: ChartOptions,
    /// Bumped on every redraw
    pub revision: u64,
    pub series: Vec<SeriesSnapshot>,
}

impl ChartSnapshot {
    /// Find a series by team name
    pub fn series(&self, name: &str) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| s.name == name)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}
