use serde::{Deserialize, Serialize};

use crate::negotiation::DEFAULT_MAX_COUNTERS;
use crate::turn::{DEFAULT_MAX_IMPROVEMENTS, DEFAULT_STRATEGY_CADENCE};

/// Top-level configuration for haggle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HaggleConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

/// Knobs for the negotiation and turn-strategy engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// A strategy request is issued on turns 1, 1 + cadence, 1 + 2*cadence, ...
    pub strategy_cadence: u32,
    /// COUNTER rounds allowed before a negotiation expires.
    pub max_counters: u32,
    /// Improvement entries honored from one response.
    pub max_improvements: usize,
    /// Cash a participant must keep after building or buying.
    pub cash_reserve: i64,
    /// Exchanges of conversation history shown to the agent.
    pub history_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy_cadence: DEFAULT_STRATEGY_CADENCE,
            max_counters: DEFAULT_MAX_COUNTERS,
            max_improvements: DEFAULT_MAX_IMPROVEMENTS,
            cash_reserve: 0,
            history_window: 10,
        }
    }
}

/// Configuration for the external decision agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Executable invoked for each request.
    pub cli_path: String,
    pub model: String,
    /// Per-request timeout in seconds. A timeout counts as an unusable answer.
    pub timeout_seconds: u64,
    /// Replaces the built-in protocol system prompt when set.
    pub system_prompt_override: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cli_path: "claude".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            timeout_seconds: 45,
            system_prompt_override: None,
        }
    }
}

/// Where transcripts are persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptConfig {
    /// SQLite file holding the append-only transcript table.
    pub sqlite_path: String,
    /// When set, a plain-text transcript per game is written here at the end.
    pub text_dir: Option<String>,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/haggle_transcripts.db".to_string(),
            text_dir: None,
        }
    }
}
