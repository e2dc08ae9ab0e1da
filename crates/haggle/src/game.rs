use std::sync::Arc;

use haggle_agents::{PurchaseDecision, Recorder, Scheduler, Seats};
use haggle_models::config::EngineConfig;
use haggle_models::negotiation::TradeRecord;
use haggle_models::turn::TurnReport;
use haggle_store::GameState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// An unowned asset a participant was offered after a simulated landing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Landing {
    pub round: u32,
    pub participant: String,
    pub asset: String,
    pub decision: PurchaseDecision,
}

/// Where a participant finished.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    pub cash: i64,
    pub assets: Vec<String>,
    pub net_worth: i64,
    pub eliminated: bool,
}

/// Printed at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSummary {
    pub game_id: Uuid,
    pub rounds_played: u32,
    pub cancelled: bool,
    pub standings: Vec<Standing>,
    pub trades: Vec<TradeRecord>,
    pub turns: Vec<TurnReport>,
    pub landings: Vec<Landing>,
}

/// A board plus the scheduler driving its seats. There is no dice or rent:
/// a round is one `run_turn` per active participant, optionally followed by
/// a seeded landing on a random asset.
pub struct Game {
    state: GameState,
    scheduler: Scheduler,
    rng: Option<StdRng>,
    turns: Vec<TurnReport>,
    landings: Vec<Landing>,
}

impl Game {
    /// `seed` turns on simulated landings. Without it, assets never change
    /// hands except through trades.
    pub fn new(state: GameState, config: EngineConfig, seats: Seats, recorder: Recorder, seed: Option<u64>) -> Self {
        Self {
            state,
            scheduler: Scheduler::new(config, Arc::new(seats), recorder),
            rng: seed.map(StdRng::seed_from_u64),
            turns: Vec::new(),
            landings: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn game_id(&self) -> Uuid {
        self.scheduler.recorder().game_id()
    }

    /// Play up to `rounds` rounds. Cancellation is honored between turns.
    /// Stops early once fewer than two participants remain.
    pub async fn run(&mut self, rounds: u32, cancel: CancellationToken) -> GameSummary {
        info!(game = %self.game_id(), rounds, "Game starting");
        let mut rounds_played = 0;

        'rounds: for round in 1..=rounds {
            if self.state.active_participants().count() < 2 {
                info!(round, "Fewer than two participants left");
                break;
            }
            let seats: Vec<String> = self
                .state
                .active_participants()
                .map(|p| p.name.clone())
                .collect();

            for name in seats {
                if cancel.is_cancelled() {
                    info!(round, "Game cancelled");
                    break 'rounds;
                }
                let report = self.scheduler.run_turn(&mut self.state, &name).await;
                self.turns.push(report);
                self.land(round, &name).await;
            }
            rounds_played = round;
        }

        let summary = self.summary(rounds_played, cancel.is_cancelled());
        info!(
            game = %summary.game_id,
            rounds = summary.rounds_played,
            trades = summary.trades.len(),
            "Game finished"
        );
        summary
    }

    async fn land(&mut self, round: u32, participant: &str) {
        let Some(rng) = self.rng.as_mut() else {
            return;
        };
        let assets = self.state.assets();
        if assets.is_empty() {
            return;
        }
        let landed = &assets[rng.gen_range(0..assets.len())];
        if landed.owner.is_some() {
            return;
        }
        let asset = landed.name.clone();

        let decision = self
            .scheduler
            .offer_purchase(&mut self.state, participant, &asset)
            .await;
        self.landings.push(Landing {
            round,
            participant: participant.to_string(),
            asset,
            decision,
        });
    }

    pub fn summary(&self, rounds_played: u32, cancelled: bool) -> GameSummary {
        let standings = self
            .state
            .participants()
            .iter()
            .map(|p| Standing {
                name: p.name.clone(),
                cash: p.cash,
                assets: p.assets.iter().cloned().collect(),
                net_worth: self.state.net_worth(&p.name).unwrap_or(p.cash),
                eliminated: p.eliminated,
            })
            .collect();
        GameSummary {
            game_id: self.game_id(),
            rounds_played,
            cancelled,
            standings,
            trades: self.scheduler.trade_records().to_vec(),
            turns: self.turns.clone(),
            landings: self.landings.clone(),
        }
    }
}
