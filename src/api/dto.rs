//! Response bodies for the status API

use serde::Serialize;

use crate::listener::ConnectionState;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when the feed is connected, `degraded` otherwise
    pub status: String,
    pub connection: ConnectionState,
    /// Series currently on the chart
    pub series: usize,
    /// Chart redraw counter
    pub revision: u64,
    pub uptime_seconds: u64,
    pub version: String,
}
