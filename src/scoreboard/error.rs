//! Protocol error types
//!
//! Everything that can go wrong while decoding a frame from the scoreboard
//! feed. None of these are fatal: the listener logs them and moves on.

use thiserror::Error;

/// Errors raised while decoding inbound scoreboard messages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Frame was not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Frame was JSON but not an object
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A recognized opcode carried a payload of the wrong shape
    #[error("Malformed {kind} payload: {error}")]
    MalformedPayload { kind: &'static str, error: String },

    /// Object carried none of the known opcodes
    #[error("Unrecognized message, no opcode among keys {keys:?}")]
    UnknownOpcode { keys: Vec<String> },

    /// Binary frames are never sent by the scoreboard server
    #[error("Binary frames are not supported")]
    BinaryFrame,
}

/// Result type alias for protocol decoding
pub type ProtocolResult<T> = Result<T, ProtocolError>;
