use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("{asset} is already owned by {owner}")]
    AlreadyOwned { asset: String, owner: String },

    #[error("{participant} needs ${needed} but has ${available}")]
    InsufficientCash {
        participant: String,
        needed: i64,
        available: i64,
    },

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    #[error("Corrupt transcript row: {0}")]
    Corrupt(String),

    #[error("Transcript not available: {0}")]
    Unavailable(String),
}
