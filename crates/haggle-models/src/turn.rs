use serde::{Deserialize, Serialize};

use crate::negotiation::NegotiationOutcome;
use crate::trade_offer::TradeOffer;

/// Default batching cadence: a strategy request every 3rd turn, starting at turn 1.
pub const DEFAULT_STRATEGY_CADENCE: u32 = 3;

/// Default cap on improvement entries taken from one response.
pub const DEFAULT_MAX_IMPROVEMENTS: usize = 5;

/// Parsed intent from one combined strategy request. Consumed within the turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnStrategyResult {
    pub trade: Option<TradeOffer>,
    /// Asset names in the order the agent listed them.
    pub improvements: Vec<String>,
}

/// Why no strategy request was issued this turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OffCadence,
    TooFewAssets,
    NothingToDo,
    Eliminated,
}

/// Result of asking the scheduler for a turn strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum StrategyDecision {
    Requested { result: TurnStrategyResult },
    Skipped { reason: SkipReason },
}

impl StrategyDecision {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StrategyDecision::Skipped { .. })
    }
}

/// What happened during one participant turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnReport {
    pub participant: String,
    pub turn: u32,
    pub decision: StrategyDecision,
    pub trade_outcome: Option<NegotiationOutcome>,
    /// Assets actually improved, in order.
    pub improved: Vec<String>,
    /// Improvement entries skipped, with the reason text.
    pub skipped_improvements: Vec<(String, String)>,
}
