use std::sync::Arc;

use haggle_models::agent_message::Conversations;
use haggle_models::command::{Command, CommandKind};
use haggle_store::GameState;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::{consult, Seats};
use crate::parser::{parse_one_of, KnownNames};
use crate::prompts::purchase_prompt;
use crate::recorder::Recorder;

/// What came of landing on an asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "purchase", rename_all = "snake_case")]
pub enum PurchaseDecision {
    Bought { price: i64 },
    Passed,
    /// Buying would leave less than the cash reserve. The agent was not asked.
    Unaffordable,
    /// Unknown or already owned. The agent was not asked.
    NotForSale,
}

/// Asks a participant whether to buy an unowned asset.
#[derive(Clone)]
pub struct PurchaseAdvisor {
    seats: Arc<Seats>,
    recorder: Recorder,
    reserve: i64,
}

impl PurchaseAdvisor {
    pub fn new(seats: Arc<Seats>, recorder: Recorder, reserve: i64) -> Self {
        Self {
            seats,
            recorder,
            reserve,
        }
    }

    /// Offer `asset` to `participant` at list price. Anything but a clear BUY passes.
    pub async fn offer_purchase(
        &self,
        state: &mut GameState,
        conversations: &mut Conversations,
        participant: &str,
        asset: &str,
    ) -> PurchaseDecision {
        let (Some(buyer), Some(target)) = (state.participant(participant), state.asset(asset)) else {
            return PurchaseDecision::NotForSale;
        };
        if target.owner.is_some() {
            return PurchaseDecision::NotForSale;
        }
        if buyer.cash - target.price < self.reserve {
            return PurchaseDecision::Unaffordable;
        }
        let (buyer, asset) = (buyer.name.clone(), target.name.clone());

        let prompt = purchase_prompt(state, &buyer, &asset);
        let names = KnownNames::from_state(state);
        let command = match consult(&self.seats, conversations, &self.recorder, &buyer, &prompt).await {
            Ok(text) => parse_one_of(&text, &names, &[CommandKind::Buy, CommandKind::Pass]).ok(),
            Err(_) => None,
        };
        if command != Some(Command::Buy) {
            return PurchaseDecision::Passed;
        }

        match state.purchase(&buyer, &asset, self.reserve) {
            Ok(price) => {
                info!(participant = %buyer, asset = %asset, price, "Asset bought");
                PurchaseDecision::Bought { price }
            }
            Err(e) => {
                warn!(participant = %buyer, asset = %asset, error = %e, "Purchase failed");
                PurchaseDecision::Passed
            }
        }
    }
}
