//! Listener error types

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors from the scoreboard feed connection
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Feed URL could not be parsed or is not a WebSocket URL
    #[error("Invalid feed URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connect or read failure on the socket
    #[error("WebSocket error: {0}")]
    Socket(#[from] tungstenite::Error),

    /// Reconnect budget spent
    #[error("Gave up after {attempts} reconnect attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Result type alias for listener operations
pub type ListenerResult<T> = Result<T, ListenerError>;
