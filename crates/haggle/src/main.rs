use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use haggle::agents::Recorder;
use haggle::store::GameState;
use haggle::Game;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "haggle",
    about = "Runs agent-driven trading and building rounds on a property board"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/haggle.toml")]
    config: String,

    /// Path to the starting board
    #[arg(short, long, default_value = "scenarios/classic.toml")]
    scenario: String,

    /// Rounds to play
    #[arg(short, long, default_value_t = 12)]
    turns: u32,

    /// Seed for simulated landings on unowned assets. Omit to disable purchases.
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = haggle::load_config(&cli.config)?;
    let scenario = haggle::load_scenario(&cli.scenario)?;
    let state = GameState::from_scenario(&scenario).context("Invalid scenario")?;

    let log = Arc::new(haggle::open_transcript(&config.transcript.sqlite_path)?);
    let recorder = Recorder::new(Uuid::new_v4(), Some(Arc::clone(&log)));
    let seats = haggle::build_seats(&scenario, &config.agent, config.engine.history_window);
    let mut game = Game::new(state, config.engine.clone(), seats, recorder, cli.seed);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping after the current turn");
            cancel.cancel();
        });
    }

    let summary = game.run(cli.turns, cancel).await;

    if let Some(dir) = &config.transcript.text_dir {
        let path = haggle::write_text_transcript(&log, summary.game_id, dir)?;
        tracing::info!(path = %path.display(), "Wrote text transcript");
    }

    let output = if cli.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{output}");

    Ok(())
}
