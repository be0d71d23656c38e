//! Application State
//!
//! Shared state accessible by all API handlers. Handlers only ever see
//! published snapshots, never the live chart.

use std::time::Instant;
use tokio::sync::watch;

use crate::chart::ChartSnapshot;
use crate::listener::ConnectionState;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Latest chart published by the feed dispatcher
    pub snapshots: watch::Receiver<ChartSnapshot>,
    /// Feed connection state
    pub connection: watch::Receiver<ConnectionState>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        snapshots: watch::Receiver<ChartSnapshot>,
        connection: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self {
            snapshots,
            connection,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Clone of the latest snapshot
    pub fn snapshot(&self) -> ChartSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
