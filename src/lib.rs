//! # Flagboard
//!
//! Live "flags captured per team" chart for a competition scoreboard.
//! The chart is seeded from a history dataset and then kept current from the
//! scoreboard's WebSocket push feed.
//!
//! ## Modules
//!
//! - [`scoreboard`]: Feed message formats, decoded once at the boundary
//! - [`chart`]: Chart widget, snapshots, and the adapter that mutates them
//! - [`listener`]: WebSocket client, reconnect loop, and message dispatch
//! - [`api`]: Read-only status API with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flagboard::chart::{ChartAdapter, SeriesChart};
//! use flagboard::listener::{feed_endpoint, Dispatcher, ReconnectPolicy, ScoreboardListener, GAME_HISTORY_PATH};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = ChartAdapter::new(SeriesChart::default());
//!     let (dispatcher, snapshots) = Dispatcher::new(adapter);
//!
//!     let endpoint = feed_endpoint("ws://localhost:8888", GAME_HISTORY_PATH)?;
//!     let listener = ScoreboardListener::new(endpoint, ReconnectPolicy::default(), dispatcher);
//!     tokio::spawn(listener.run());
//!
//!     println!("{} series", snapshots.borrow().series_count());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod listener;
pub mod scoreboard;

// Re-export top-level types for convenience
pub use chart::{
    ChartAdapter, ChartOptions, ChartPoint, ChartSnapshot, ChartWidget, SeriesChart,
    SeriesHandle, SeriesSnapshot, UpdateSummary, DEFAULT_WINDOW,
};

pub use scoreboard::{
    EpochSeconds, HistoryDataset, HistoryEntry, InboundMessage, ProtocolError, ProtocolResult,
    TeamEntry, TeamRecord, UpdateEvent, UpdateTimestamp,
};

pub use listener::{
    feed_endpoint, ConnectionState, DispatchOutcome, Dispatcher, ListenerError, ListenerResult,
    ReconnectPolicy, ScoreboardListener, GAME_HISTORY_PATH,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{generate_default_config, Config, ConfigError, LoadReport, LoggingConfig};
