//! haggle - negotiation and turn-strategy engine for agent-driven property-trading games
//!
//! Seats one decision agent per participant, batches each participant's
//! trade and improvement decisions into a single request every few turns,
//! and runs bounded multi-round negotiations whose outcome is committed
//! atomically to the board.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use haggle::models::config::HaggleConfig;
//! use haggle::models::scenario::ScenarioConfig;
//! use haggle::{Game, load_config, load_scenario};
//! use tokio_util::sync::CancellationToken;
//! ```

pub use haggle_agents as agents;
pub use haggle_models as models;
pub use haggle_store as store;

pub mod game;

pub use game::{Game, GameSummary, Landing, Standing};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use haggle_agents::{ClaudeAgent, DecisionAgent, PassiveAgent, Seats};
use haggle_models::config::{AgentConfig, HaggleConfig};
use haggle_models::scenario::{AgentKind, ScenarioConfig};
use haggle_store::TranscriptLog;
use uuid::Uuid;

/// Read a [`HaggleConfig`] from a TOML file. Missing sections take their defaults.
pub fn load_config(path: &str) -> Result<HaggleConfig, anyhow::Error> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config: {path}"))
}

/// Read a starting board from a TOML file.
pub fn load_scenario(path: &str) -> Result<ScenarioConfig, anyhow::Error> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read scenario: {path}"))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse scenario: {path}"))
}

/// Seat the agent each participant asked for.
pub fn build_seats(scenario: &ScenarioConfig, agent: &AgentConfig, history_window: usize) -> Seats {
    let mut seats = Seats::new();
    for p in &scenario.participants {
        let seated: Arc<dyn DecisionAgent> = match p.agent {
            AgentKind::Claude => Arc::new(ClaudeAgent::new(p.name.clone(), agent, history_window)),
            AgentKind::Passive => Arc::new(PassiveAgent::new(p.name.clone())),
        };
        seats.insert(p.name.clone(), seated);
    }
    seats
}

/// Open the transcript database, creating its directory first.
pub fn open_transcript(path: &str) -> Result<TranscriptLog, anyhow::Error> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create transcript directory: {}", parent.display()))?;
    }
    TranscriptLog::open(path).with_context(|| format!("Failed to open transcript DB: {path}"))
}

/// Write `<dir>/<game_id>.txt` with the game's plain-text transcript.
pub fn write_text_transcript(log: &TranscriptLog, game_id: Uuid, dir: &str) -> Result<PathBuf, anyhow::Error> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create transcript dir: {dir}"))?;
    let text = log
        .render_text(game_id)
        .context("Failed to render transcript")?;
    let path = Path::new(dir).join(format!("{game_id}.txt"));
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
