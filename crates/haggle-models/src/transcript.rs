use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of record in the per-game transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptKind {
    /// A prompt/response pair with an external agent.
    Exchange,
    /// The final outcome of a negotiation.
    TradeOutcome,
}

impl TranscriptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptKind::Exchange => "exchange",
            TranscriptKind::TradeOutcome => "trade_outcome",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exchange" => Some(TranscriptKind::Exchange),
            "trade_outcome" => Some(TranscriptKind::TradeOutcome),
            _ => None,
        }
    }
}

/// The append-only transcript table.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS transcript_entries (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     game_id     TEXT NOT NULL,
///     participant TEXT NOT NULL,
///     kind        TEXT NOT NULL,
///     prompt      TEXT NOT NULL,
///     response    TEXT NOT NULL,
///     created_at  TEXT NOT NULL
/// );
/// ```
pub const TRANSCRIPT_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS transcript_entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id     TEXT NOT NULL,
    participant TEXT NOT NULL,
    kind        TEXT NOT NULL,
    prompt      TEXT NOT NULL,
    response    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transcript_game ON transcript_entries(game_id);
";

/// One transcript row.
///
/// For `TradeOutcome` rows, `prompt` holds the opening offer and `response`
/// the outcome JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub game_id: Uuid,
    pub participant: String,
    pub kind: TranscriptKind,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}
