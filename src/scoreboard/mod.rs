//! Scoreboard Feed Protocol
//!
//! Frames pushed by the scoreboard server on `/scoreboard/wsocket/game_history`.
//! Every frame is a JSON object carrying exactly one opcode:
//!
//! - `{"error": <any>}` - server-side problem, logged only
//! - `{"history": {<team>: [[seconds, flags], ...]}}` - full dataset
//! - `{"update": {"timestamp": <seconds>, "scoreboard": {<team>: {"flags": [...]}}}}`
//!
//! Frames are decoded once into [`InboundMessage`]; nothing downstream looks
//! at raw JSON.

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    EpochSeconds, HistoryDataset, HistoryEntry, InboundMessage, TeamEntry, TeamRecord,
    UpdateEvent, UpdateTimestamp,
};
