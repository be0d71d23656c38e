//! Message Dispatch
//!
//! Routes decoded feed frames to the chart adapter and publishes a fresh
//! snapshot after every mutation. The dispatcher is the only owner of the
//! adapter; everyone else reads snapshots off the watch channel.

use serde_json::Value;
use tokio::sync::watch;

use crate::chart::{ChartAdapter, ChartSnapshot, SeriesChart, UpdateSummary};
use crate::scoreboard::{HistoryDataset, InboundMessage, ProtocolError};

/// What handling one frame amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Server sent an error payload; chart untouched
    ServerError(Value),
    /// History loaded, `series` series on the chart
    Initialized { series: usize },
    /// Update applied
    Updated(UpdateSummary),
    /// Frame could not be decoded; chart untouched
    Rejected(ProtocolError),
}

/// Feeds inbound frames into a [`ChartAdapter`]
pub struct Dispatcher {
    adapter: ChartAdapter<SeriesChart>,
    snapshots: watch::Sender<ChartSnapshot>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiver its snapshots are published on
    pub fn new(adapter: ChartAdapter<SeriesChart>) -> (Self, watch::Receiver<ChartSnapshot>) {
        let (snapshots, rx) = watch::channel(adapter.widget().snapshot());
        (Self { adapter, snapshots }, rx)
    }

    /// Load render-time history before the feed connects
    pub fn seed(&mut self, history: &HistoryDataset) -> usize {
        let series = self.adapter.initialize(history);
        self.publish();
        series
    }

    /// Decode and handle a text frame
    pub fn handle_text(&mut self, text: &str) -> DispatchOutcome {
        match InboundMessage::decode(text) {
            Ok(message) => self.handle(message),
            Err(e) => {
                tracing::warn!(error = %e, "Protocol error on scoreboard feed");
                DispatchOutcome::Rejected(e)
            }
        }
    }

    pub fn handle(&mut self, message: InboundMessage) -> DispatchOutcome {
        match message {
            InboundMessage::Error(payload) => {
                tracing::warn!(payload = %payload, "Scoreboard server reported an error");
                DispatchOutcome::ServerError(payload)
            }
            InboundMessage::History(history) => {
                let series = self.seed(&history);
                DispatchOutcome::Initialized { series }
            }
            InboundMessage::Update(update) => {
                let summary = self.adapter.apply_update(&update);
                if summary.mutated() {
                    self.publish();
                }
                DispatchOutcome::Updated(summary)
            }
        }
    }

    /// Another receiver for the snapshot channel
    pub fn subscribe(&self) -> watch::Receiver<ChartSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn adapter(&self) -> &ChartAdapter<SeriesChart> {
        &self.adapter
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.adapter.widget().snapshot());
    }
}
