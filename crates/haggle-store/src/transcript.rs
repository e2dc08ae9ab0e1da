use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use haggle_models::negotiation::TradeRecord;
use haggle_models::transcript::{TranscriptEntry, TranscriptKind, TRANSCRIPT_TABLE_DDL};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::StoreError;

/// Append-only per-game transcript of agent exchanges and trade outcomes.
///
/// SQLite access is synchronized via `Mutex` since `rusqlite::Connection` is not `Sync`.
pub struct TranscriptLog {
    conn: Mutex<Connection>,
}

impl TranscriptLog {
    /// Open (or create) a transcript database on disk. Enables WAL.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(TRANSCRIPT_TABLE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(TRANSCRIPT_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("SQLite mutex poisoned: {e}")))
    }

    pub fn append(&self, entry: &TranscriptEntry) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO transcript_entries \
             (game_id, participant, kind, prompt, response, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.game_id.to_string(),
                entry.participant,
                entry.kind.as_str(),
                entry.prompt,
                entry.response,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Record one prompt/response pair with a participant's agent.
    pub fn append_exchange(
        &self,
        game_id: Uuid,
        participant: &str,
        prompt: &str,
        response: &str,
    ) -> Result<(), StoreError> {
        self.append(&TranscriptEntry {
            game_id,
            participant: participant.to_string(),
            kind: TranscriptKind::Exchange,
            prompt: prompt.to_string(),
            response: response.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Record how a negotiation ended, filed under the initiator.
    pub fn append_outcome(&self, game_id: Uuid, record: &TradeRecord) -> Result<(), StoreError> {
        self.append(&TranscriptEntry {
            game_id,
            participant: record.initiator.clone(),
            kind: TranscriptKind::TradeOutcome,
            prompt: record.opening_offer.to_string(),
            response: serde_json::to_string(record)?,
            created_at: record.decided_at,
        })
    }

    /// All entries for a game in insertion order.
    pub fn entries(&self, game_id: Uuid) -> Result<Vec<TranscriptEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT game_id, participant, kind, prompt, response, created_at \
             FROM transcript_entries WHERE game_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![game_id.to_string()], |row| {
                Ok(RawRow {
                    game_id: row.get(0)?,
                    participant: row.get(1)?,
                    kind: row.get(2)?,
                    prompt: row.get(3)?,
                    response: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRow::into_entry).collect()
    }

    pub fn count(&self, game_id: Uuid) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transcript_entries WHERE game_id = ?1",
            rusqlite::params![game_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Plain-text log of a game, one block per record.
    pub fn render_text(&self, game_id: Uuid) -> Result<String, StoreError> {
        let mut out = String::new();
        for entry in self.entries(game_id)? {
            let stamp = entry.created_at.format("%Y-%m-%d %H:%M:%S");
            match entry.kind {
                TranscriptKind::Exchange => {
                    let _ = writeln!(out, "[{stamp}] {} asked:", entry.participant);
                    let _ = writeln!(out, "{}", entry.prompt.trim_end());
                    let _ = writeln!(out, "[{stamp}] {} answered:", entry.participant);
                    let _ = writeln!(out, "{}", entry.response.trim_end());
                }
                TranscriptKind::TradeOutcome => {
                    let label = serde_json::from_str::<TradeRecord>(&entry.response)
                        .map(|r| r.outcome.label().to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    let _ = writeln!(out, "[{stamp}] TRADE {label}: {}", entry.prompt);
                }
            }
            out.push('\n');
        }
        Ok(out)
    }
}

struct RawRow {
    game_id: String,
    participant: String,
    kind: String,
    prompt: String,
    response: String,
    created_at: String,
}

impl RawRow {
    fn into_entry(self) -> Result<TranscriptEntry, StoreError> {
        let game_id = Uuid::parse_str(&self.game_id)
            .map_err(|e| StoreError::Corrupt(format!("game_id {}: {e}", self.game_id)))?;
        let kind = TranscriptKind::parse(&self.kind)
            .ok_or_else(|| StoreError::Corrupt(format!("kind {}", self.kind)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt(format!("created_at {}: {e}", self.created_at)))?
            .with_timezone(&Utc);
        Ok(TranscriptEntry {
            game_id,
            participant: self.participant,
            kind,
            prompt: self.prompt,
            response: self.response,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_models::negotiation::NegotiationOutcome;
    use haggle_models::trade_offer::TradeOffer;

    fn record(outcome: NegotiationOutcome) -> TradeRecord {
        TradeRecord {
            session_id: Uuid::new_v4(),
            initiator: "Alice".to_string(),
            counterparty: "Bob".to_string(),
            opening_offer: TradeOffer::new("Alice", "Bob", ["Park Place"], Vec::<String>::new(), 300),
            counters: 0,
            outcome,
            decided_at: Utc::now(),
        }
    }

    #[test]
    fn entries_come_back_in_order() {
        let log = TranscriptLog::open_in_memory().unwrap();
        let game = Uuid::new_v4();
        log.append_exchange(game, "Alice", "first?", "NO_TRADE").unwrap();
        log.append_exchange(game, "Bob", "second?", "TRADE_REJECT").unwrap();

        let entries = log.entries(game).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].participant, "Alice");
        assert_eq!(entries[1].response, "TRADE_REJECT");
        assert_eq!(entries[1].kind, TranscriptKind::Exchange);
    }

    #[test]
    fn games_are_kept_apart() {
        let log = TranscriptLog::open_in_memory().unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        log.append_exchange(a, "Alice", "p", "r").unwrap();
        log.append_exchange(b, "Alice", "p", "r").unwrap();
        log.append_exchange(b, "Bob", "p", "r").unwrap();

        assert_eq!(log.count(a).unwrap(), 1);
        assert_eq!(log.count(b).unwrap(), 2);
        assert!(log.entries(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn outcome_row_holds_record_json() {
        let log = TranscriptLog::open_in_memory().unwrap();
        let game = Uuid::new_v4();
        let rec = record(NegotiationOutcome::Expired);
        log.append_outcome(game, &rec).unwrap();

        let entry = &log.entries(game).unwrap()[0];
        assert_eq!(entry.kind, TranscriptKind::TradeOutcome);
        let back: TradeRecord = serde_json::from_str(&entry.response).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn render_text_labels_outcomes() {
        let log = TranscriptLog::open_in_memory().unwrap();
        let game = Uuid::new_v4();
        log.append_exchange(game, "Bob", "Accept the offer?", "TRADE_ACCEPT").unwrap();
        log.append_outcome(game, &record(NegotiationOutcome::Rejected)).unwrap();

        let text = log.render_text(game).unwrap();
        assert!(text.contains("Bob asked:"));
        assert!(text.contains("TRADE_ACCEPT"));
        assert!(text.contains("TRADE rejected: Alice gives [Park Place]"));
    }

    #[test]
    fn corrupt_row_is_reported() {
        let log = TranscriptLog::open_in_memory().unwrap();
        let game = Uuid::new_v4();
        log.lock()
            .unwrap()
            .execute(
                "INSERT INTO transcript_entries \
                 (game_id, participant, kind, prompt, response, created_at) \
                 VALUES (?1, 'Alice', 'chat', '', '', '2024-01-01T00:00:00Z')",
                rusqlite::params![game.to_string()],
            )
            .unwrap();
        assert!(matches!(log.entries(game), Err(StoreError::Corrupt(_))));
    }
}
