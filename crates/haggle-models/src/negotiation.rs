use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trade_offer::TradeOffer;

/// Default cap on COUNTER rounds in one negotiation.
pub const DEFAULT_MAX_COUNTERS: u32 = 3;

/// Terminal result of a negotiation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NegotiationOutcome {
    /// Both sides agreed and the committer applied `offer`.
    Accepted { offer: TradeOffer },
    /// The responder declined, or answered with something unusable.
    Rejected,
    /// The counter cap was reached. Treated as a rejection for execution.
    Expired,
    /// The opening proposal failed structural validation.
    Invalid { reason: String },
    /// Agreed, but the commit-time re-check failed and nothing was applied.
    CommitFailed { offer: TradeOffer, reason: String },
}

impl NegotiationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            NegotiationOutcome::Accepted { .. } => "accepted",
            NegotiationOutcome::Rejected => "rejected",
            NegotiationOutcome::Expired => "expired",
            NegotiationOutcome::Invalid { .. } => "invalid",
            NegotiationOutcome::CommitFailed { .. } => "commit_failed",
        }
    }

    /// Only `Accepted` changes game state.
    pub fn is_executed(&self) -> bool {
        matches!(self, NegotiationOutcome::Accepted { .. })
    }
}

/// Summary of one finished negotiation, kept for the game report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradeRecord {
    pub session_id: Uuid,
    pub initiator: String,
    pub counterparty: String,
    pub opening_offer: TradeOffer,
    pub counters: u32,
    pub outcome: NegotiationOutcome,
    pub decided_at: DateTime<Utc>,
}
