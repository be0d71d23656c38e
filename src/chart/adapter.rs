//! Chart Adapter
//!
//! Turns scoreboard history and updates into widget mutations. The adapter
//! owns its widget and keeps a `team -> series` index so each team maps to
//! exactly one series.

use std::collections::HashMap;

use super::types::ChartPoint;
use super::widget::{ChartWidget, SeriesHandle};
use crate::scoreboard::{HistoryDataset, UpdateEvent};

/// Points kept per series before the oldest is evicted
pub const DEFAULT_WINDOW: usize = 30;

/// What a single update did to the chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Points appended to existing series
    pub appended: usize,
    /// Series created for newly seen teams
    pub created: usize,
    /// Teams skipped because their entry was malformed
    pub skipped: usize,
}

impl UpdateSummary {
    /// True if the chart changed
    pub fn mutated(&self) -> bool {
        self.appended + self.created > 0
    }
}

/// Keeps a chart widget in step with the scoreboard
pub struct ChartAdapter<W: ChartWidget> {
    widget: W,
    index: HashMap<String, SeriesHandle>,
    window: usize,
}

impl<W: ChartWidget> ChartAdapter<W> {
    pub fn new(widget: W) -> Self {
        Self::with_window(widget, DEFAULT_WINDOW)
    }

    /// Create an adapter with a custom sliding window (at least one point)
    pub fn with_window(widget: W, window: usize) -> Self {
        Self {
            widget,
            index: HashMap::new(),
            window: window.max(1),
        }
    }

    /// Load a full history dataset, one series per team
    ///
    /// Any series already on the chart are replaced. Returns the number of
    /// series created.
    pub fn initialize(&mut self, history: &HistoryDataset) -> usize {
        if self.widget.series_count() > 0 {
            tracing::info!(
                series = self.widget.series_count(),
                "Replacing existing chart series"
            );
            self.widget.remove_all();
            self.index.clear();
        }

        for (team, entries) in history.teams() {
            let data = entries
                .iter()
                .map(|e| ChartPoint::new(e.timestamp().to_millis(), e.flags()))
                .collect();
            let handle = self.widget.add_series(team, data, false);
            self.index.insert(team.clone(), handle);
        }
        self.widget.redraw();

        tracing::info!(
            teams = self.index.len(),
            skipped = history.skipped(),
            "Chart initialized from history"
        );
        self.index.len()
    }

    /// Plot one scoreboard tick
    ///
    /// Each team either gains a point on its series or gets a new series.
    /// Malformed team entries are logged and skipped without affecting the
    /// rest of the batch.
    pub fn apply_update(&mut self, update: &UpdateEvent) -> UpdateSummary {
        let x = update.timestamp.to_millis();
        let mut summary = UpdateSummary::default();

        for (team, entry) in &update.scoreboard {
            let Some(flags) = entry.flag_count() else {
                tracing::warn!(team = %team, "Skipping malformed scoreboard entry");
                summary.skipped += 1;
                continue;
            };
            let point = ChartPoint::new(x, flags as u64);

            match self.index.get(team) {
                Some(&handle) => {
                    let shift = self.widget.series_len(handle) >= self.window;
                    self.widget.add_point(handle, point, true, shift);
                    summary.appended += 1;
                }
                None => {
                    tracing::debug!(team = %team, "Creating series for new team");
                    let handle = self.widget.add_series(team, vec![point], true);
                    self.index.insert(team.clone(), handle);
                    summary.created += 1;
                }
            }
        }

        tracing::debug!(
            timestamp = x,
            appended = summary.appended,
            created = summary.created,
            skipped = summary.skipped,
            "Applied scoreboard update"
        );
        summary
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Handle of the series plotting `team`, if one exists
    pub fn series_handle(&self, team: &str) -> Option<SeriesHandle> {
        self.index.get(team).copied()
    }

    pub fn series_count(&self) -> usize {
        self.index.len()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
