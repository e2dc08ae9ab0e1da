use std::sync::Arc;

use haggle_models::agent_message::Conversations;
use haggle_models::board::names_match;
use haggle_models::command::Command;
use haggle_models::config::EngineConfig;
use haggle_models::negotiation::TradeRecord;
use haggle_models::trade_offer::TradeOffer;
use haggle_models::turn::{SkipReason, StrategyDecision, TurnReport, TurnStrategyResult};
use haggle_store::{execute_improvements, improvable_assets, GameState};
use tracing::{debug, info, warn};

use crate::agent::{consult, Seats};
use crate::negotiation::Negotiator;
use crate::parser::{parse_combined, KnownNames};
use crate::prompts::strategy_prompt;
use crate::purchase::{PurchaseAdvisor, PurchaseDecision};
use crate::recorder::Recorder;

/// Drives each participant's turn: at most one combined strategy request,
/// then the resulting negotiation and improvements.
///
/// Owns every participant's conversation history.
pub struct Scheduler {
    config: EngineConfig,
    seats: Arc<Seats>,
    conversations: Conversations,
    recorder: Recorder,
    negotiator: Negotiator,
    purchases: PurchaseAdvisor,
    trade_records: Vec<TradeRecord>,
}

impl Scheduler {
    pub fn new(config: EngineConfig, seats: Arc<Seats>, recorder: Recorder) -> Self {
        let negotiator = Negotiator::new(Arc::clone(&seats), recorder.clone(), config.max_counters);
        let purchases = PurchaseAdvisor::new(Arc::clone(&seats), recorder.clone(), config.cash_reserve);
        Self {
            config,
            seats,
            conversations: Conversations::new(),
            recorder,
            negotiator,
            purchases,
            trade_records: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Every negotiation run so far, oldest first.
    pub fn trade_records(&self) -> &[TradeRecord] {
        &self.trade_records
    }

    /// Whether `participant` gets a strategy request on turn `turn`.
    pub fn eligibility(&self, state: &GameState, participant: &str, turn: u32) -> Result<(), SkipReason> {
        let p = state
            .participant(participant)
            .filter(|p| !p.eliminated)
            .ok_or(SkipReason::Eliminated)?;

        if p.assets.len() < 2 {
            return Err(SkipReason::TooFewAssets);
        }
        let cadence = self.config.strategy_cadence.max(1);
        if turn == 0 || (turn - 1) % cadence != 0 {
            return Err(SkipReason::OffCadence);
        }

        let has_target = state
            .active_participants()
            .any(|other| !names_match(&other.name, &p.name) && !other.assets.is_empty());
        let can_build = !improvable_assets(state, &p.name, self.config.cash_reserve).is_empty();
        if !has_target && !can_build {
            return Err(SkipReason::NothingToDo);
        }
        Ok(())
    }

    /// Issue the combined strategy request if `participant` is eligible this turn.
    ///
    /// A section that cannot be parsed, or a failed request, yields that
    /// section's no-op.
    pub async fn maybe_request_strategy(
        &mut self,
        state: &GameState,
        participant: &str,
        turn: u32,
    ) -> StrategyDecision {
        if let Err(reason) = self.eligibility(state, participant, turn) {
            debug!(participant, turn, reason = ?reason, "Strategy request skipped");
            return StrategyDecision::Skipped { reason };
        }
        let name = state
            .canonical_participant(participant)
            .unwrap_or(participant)
            .to_string();

        let prompt = strategy_prompt(state, &name, turn, self.config.cash_reserve);
        let text = match consult(&self.seats, &mut self.conversations, &self.recorder, &name, &prompt).await {
            Ok(text) => text,
            Err(_) => {
                return StrategyDecision::Requested {
                    result: TurnStrategyResult::default(),
                }
            }
        };

        let combined = parse_combined(&text, &KnownNames::from_state(state));
        let trade = match combined.trade {
            Ok(Command::TradePropose {
                target,
                give,
                receive,
                cash,
            }) if !names_match(&target, &name) => Some(TradeOffer {
                proposer: name.clone(),
                target,
                give,
                receive,
                cash,
            }),
            Ok(Command::TradePropose { .. }) => {
                debug!(participant = %name, "Ignoring trade proposed to self");
                None
            }
            Ok(_) => None,
            Err(e) => {
                debug!(participant = %name, reason = %e, "Trade section unusable");
                None
            }
        };
        let improvements = match combined.improvement {
            Ok(Command::Improve { assets }) => assets
                .into_iter()
                .take(self.config.max_improvements)
                .collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                debug!(participant = %name, reason = %e, "Improvement section unusable");
                Vec::new()
            }
        };

        StrategyDecision::Requested {
            result: TurnStrategyResult {
                trade,
                improvements,
            },
        }
    }

    /// Play one turn for `participant`: count it, maybe ask for a strategy,
    /// negotiate any proposed trade, then build what was asked for.
    pub async fn run_turn(&mut self, state: &mut GameState, participant: &str) -> TurnReport {
        let name = state
            .canonical_participant(participant)
            .unwrap_or(participant)
            .to_string();
        let turn = match state.begin_turn(&name) {
            Ok(turn) => turn,
            Err(e) => {
                warn!(participant = %name, error = %e, "Cannot run turn");
                return TurnReport {
                    participant: name,
                    turn: 0,
                    decision: StrategyDecision::Skipped {
                        reason: SkipReason::Eliminated,
                    },
                    trade_outcome: None,
                    improved: Vec::new(),
                    skipped_improvements: Vec::new(),
                };
            }
        };

        let decision = self.maybe_request_strategy(state, &name, turn).await;
        let mut report = TurnReport {
            participant: name.clone(),
            turn,
            decision: decision.clone(),
            trade_outcome: None,
            improved: Vec::new(),
            skipped_improvements: Vec::new(),
        };

        if let StrategyDecision::Requested { result } = decision {
            if let Some(offer) = result.trade {
                let record = self
                    .negotiator
                    .negotiate(offer, state, &mut self.conversations)
                    .await;
                report.trade_outcome = Some(record.outcome.clone());
                self.trade_records.push(record);
            }

            if !result.improvements.is_empty() {
                let built = execute_improvements(
                    state,
                    &name,
                    &result.improvements,
                    self.config.max_improvements,
                    self.config.cash_reserve,
                );
                report.improved = built.built.into_iter().map(|b| b.asset).collect();
                report.skipped_improvements = built
                    .skipped
                    .into_iter()
                    .map(|(asset, reason)| (asset, reason.to_string()))
                    .collect();
            }
        }

        info!(
            participant = %name,
            turn,
            skipped = report.decision.is_skipped(),
            outcome = report.trade_outcome.as_ref().map_or("none", |o| o.label()),
            improved = report.improved.len(),
            "Turn finished"
        );
        report
    }

    /// Offer an unowned asset the participant landed on.
    pub async fn offer_purchase(
        &mut self,
        state: &mut GameState,
        participant: &str,
        asset: &str,
    ) -> PurchaseDecision {
        self.purchases
            .offer_purchase(state, &mut self.conversations, participant, asset)
            .await
    }
}
