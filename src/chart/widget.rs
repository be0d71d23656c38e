//! Chart Widget
//!
//! The seam between the adapter and whatever actually draws the chart.
//! [`SeriesChart`] is the in-process widget: it owns the series buffers and
//! counts redraws, and can hand out [`ChartSnapshot`]s.

use std::collections::VecDeque;

use super::types::{ChartOptions, ChartPoint, ChartSnapshot, SeriesSnapshot};

/// Opaque reference to a series inside a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesHandle(usize);

impl SeriesHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Operations a line-chart widget must support
pub trait ChartWidget {
    /// Add a named series preloaded with `data`
    fn add_series(&mut self, name: &str, data: Vec<ChartPoint>, redraw: bool) -> SeriesHandle;

    /// Append a point; with `shift` the oldest point is dropped first
    fn add_point(&mut self, series: SeriesHandle, point: ChartPoint, redraw: bool, shift: bool);

    /// Number of points currently held by `series`
    fn series_len(&self, series: SeriesHandle) -> usize;

    fn series_count(&self) -> usize;

    /// Drop every series. Previously issued handles become invalid.
    fn remove_all(&mut self);

    fn redraw(&mut self);
}

#[derive(Debug, Clone)]
struct Series {
    name: String,
    data: VecDeque<ChartPoint>,
}

/// In-memory line chart
#[derive(Debug, Clone, Default)]
pub struct SeriesChart {
    options: ChartOptions,
    series: Vec<Series>,
    revision: u64,
}

impl SeriesChart {
    pub fn new(options: ChartOptions) -> Self {
        Self {
            options,
            series: Vec::new(),
            revision: 0,
        }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Number of redraws so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Points of `series`, oldest first
    pub fn points(&self, series: SeriesHandle) -> Option<Vec<ChartPoint>> {
        self.series
            .get(series.0)
            .map(|s| s.data.iter().copied().collect())
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            options: self.options.clone(),
            revision: self.revision,
            series: self
                .series
                .iter()
                .map(|s| SeriesSnapshot {
                    name: s.name.clone(),
                    data: s.data.iter().copied().collect(),
                })
                .collect(),
        }
    }
}

impl ChartWidget for SeriesChart {
    fn add_series(&mut self, name: &str, data: Vec<ChartPoint>, redraw: bool) -> SeriesHandle {
        let handle = SeriesHandle(self.series.len());
        self.series.push(Series {
            name: name.to_string(),
            data: data.into(),
        });
        if redraw {
            self.redraw();
        }
        handle
    }

    fn add_point(&mut self, series: SeriesHandle, point: ChartPoint, redraw: bool, shift: bool) {
        let Some(target) = self.series.get_mut(series.0) else {
            tracing::warn!(series = series.0, "Point added to unknown series, ignored");
            return;
        };

        if shift {
            target.data.pop_front();
        }
        target.data.push_back(point);

        if redraw {
            self.redraw();
        }
    }

    fn series_len(&self, series: SeriesHandle) -> usize {
        self.series.get(series.0).map(|s| s.data.len()).unwrap_or(0)
    }

    fn series_count(&self) -> usize {
        self.series.len()
    }

    fn remove_all(&mut self) {
        self.series.clear();
    }

    fn redraw(&mut self) {
        self.revision += 1;
    }
}
