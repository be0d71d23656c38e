//! Scoreboard Feed Listener
//!
//! ## Architecture
//!
//! - **ScoreboardListener**: owns the socket and the reconnect loop
//! - **Dispatcher**: decodes frames and drives the chart adapter
//!
//! Frames are handled one at a time, each to completion, on the listener
//! task. The chart is only ever touched from there; the rest of the process
//! sees `ChartSnapshot`s published on a watch channel.

mod client;
mod dispatch;
mod error;

pub use client::{
    feed_endpoint, ConnectionState, ReconnectPolicy, ScoreboardListener, GAME_HISTORY_PATH,
};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{ListenerError, ListenerResult};
