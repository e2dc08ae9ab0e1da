use std::sync::Arc;

use haggle_models::negotiation::TradeRecord;
use haggle_models::transcript::TranscriptEntry;
use haggle_store::TranscriptLog;
use tracing::warn;
use uuid::Uuid;

/// Writes one game's transcript. Write failures are logged, never raised.
#[derive(Clone)]
pub struct Recorder {
    game_id: Uuid,
    log: Option<Arc<TranscriptLog>>,
}

impl Recorder {
    pub fn new(game_id: Uuid, log: Option<Arc<TranscriptLog>>) -> Self {
        Self { game_id, log }
    }

    /// A recorder that keeps nothing.
    pub fn disabled() -> Self {
        Self::new(Uuid::new_v4(), None)
    }

    /// A fresh game backed by an in-memory transcript.
    pub fn in_memory() -> Self {
        match TranscriptLog::open_in_memory() {
            Ok(log) => Self::new(Uuid::new_v4(), Some(Arc::new(log))),
            Err(e) => {
                warn!(error = %e, "In-memory transcript unavailable, recording disabled");
                Self::disabled()
            }
        }
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn log(&self) -> Option<&Arc<TranscriptLog>> {
        self.log.as_ref()
    }

    pub fn exchange(&self, participant: &str, prompt: &str, response: &str) {
        if let Some(log) = &self.log {
            if let Err(e) = log.append_exchange(self.game_id, participant, prompt, response) {
                warn!(participant, error = %e, "Failed to record exchange");
            }
        }
    }

    pub fn outcome(&self, record: &TradeRecord) {
        if let Some(log) = &self.log {
            if let Err(e) = log.append_outcome(self.game_id, record) {
                warn!(session = %record.session_id, error = %e, "Failed to record trade outcome");
            }
        }
    }

    /// Everything recorded for this game so far. Empty when disabled or unreadable.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        let Some(log) = &self.log else {
            return Vec::new();
        };
        log.entries(self.game_id).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read transcript");
            Vec::new()
        })
    }
}
