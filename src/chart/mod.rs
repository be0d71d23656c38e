//! Flags Chart
//!
//! The live "flags captured per team" line chart.
//!
//! - [`ChartWidget`]: what a drawing backend has to support
//! - [`SeriesChart`]: in-memory widget, the source of [`ChartSnapshot`]s
//! - [`ChartAdapter`]: applies history and updates to a widget

mod adapter;
mod types;
mod widget;

pub use adapter::{ChartAdapter, UpdateSummary, DEFAULT_WINDOW};
pub use types::{ChartOptions, ChartPoint, ChartSnapshot, SeriesSnapshot};
pub use widget::{ChartWidget, SeriesChart, SeriesHandle};
