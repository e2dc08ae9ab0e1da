//! Bounded two-party trade negotiation.
//!
//! A session opens on a proposal and alternates responders until someone
//! accepts, rejects, or the counter cap runs out:
//!
//! ```text
//! open ──infeasible──▶ Invalid
//!   │
//!   ▼
//! AwaitingResponse ──ACCEPT──▶ Accepted
//!   │  ▲             ──REJECT / unusable──▶ Rejected
//!   │  └─COUNTER (slot left, feasible)
//!   └────COUNTER (no slot left)──▶ Expired
//! ```

use std::sync::Arc;

use chrono::Utc;
use haggle_models::agent_message::Conversations;
use haggle_models::command::Command;
use haggle_models::negotiation::{NegotiationOutcome, TradeRecord};
use haggle_models::trade_offer::TradeOffer;
use haggle_store::{commit, validate_structure, GameState};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{consult, Seats};
use crate::parser::{parse_command, KnownNames, Unparseable};
use crate::prompts::negotiation_prompt;
use crate::recorder::Recorder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// `responder` must answer `offer`. `counters` rounds have been used.
    AwaitingResponse {
        responder: String,
        offer: TradeOffer,
        counters: u32,
    },
    Closed {
        outcome: NegotiationOutcome,
        counters: u32,
    },
}

impl NegotiationState {
    pub fn is_closed(&self) -> bool {
        matches!(self, NegotiationState::Closed { .. })
    }
}

/// One negotiation between two participants. Holds at most one live offer.
#[derive(Debug, Clone)]
pub struct NegotiationSession {
    pub id: Uuid,
    pub opening_offer: TradeOffer,
    pub max_counters: u32,
    state: NegotiationState,
}

impl NegotiationSession {
    /// Start a negotiation. An offer that fails the structural checks closes
    /// the session immediately as `Invalid`.
    pub fn open(offer: TradeOffer, state: &GameState, max_counters: u32) -> Self {
        let session_state = match validate_structure(state, &offer) {
            Ok(()) => NegotiationState::AwaitingResponse {
                responder: offer.target.clone(),
                offer: offer.clone(),
                counters: 0,
            },
            Err(e) => NegotiationState::Closed {
                outcome: NegotiationOutcome::Invalid {
                    reason: e.to_string(),
                },
                counters: 0,
            },
        };
        Self {
            id: Uuid::new_v4(),
            opening_offer: offer,
            max_counters,
            state: session_state,
        }
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn counters(&self) -> u32 {
        match &self.state {
            NegotiationState::AwaitingResponse { counters, .. }
            | NegotiationState::Closed { counters, .. } => *counters,
        }
    }

    pub fn outcome(&self) -> Option<&NegotiationOutcome> {
        match &self.state {
            NegotiationState::Closed { outcome, .. } => Some(outcome),
            NegotiationState::AwaitingResponse { .. } => None,
        }
    }

    /// Feed the current responder's parsed answer. A closed session ignores input.
    ///
    /// A response that tried to counter but could not be parsed always
    /// rejects, using up a counter slot if one is left.
    pub fn apply(
        &mut self,
        response: Result<Command, Unparseable>,
        state: &GameState,
    ) -> &NegotiationState {
        let NegotiationState::AwaitingResponse {
            offer, counters, ..
        } = &self.state
        else {
            return &self.state;
        };
        let (offer, counters) = (offer.clone(), *counters);
        let slot_left = counters < self.max_counters;

        let close = |outcome, counters| NegotiationState::Closed { outcome, counters };
        self.state = match response {
            Ok(Command::TradeAccept) => close(NegotiationOutcome::Accepted { offer }, counters),
            Ok(Command::TradeCounter { .. }) if !slot_left => {
                close(NegotiationOutcome::Expired, counters)
            }
            Ok(Command::TradeCounter {
                give,
                receive,
                cash,
            }) => {
                let countered = offer.countered(give, receive, cash);
                match validate_structure(state, &countered) {
                    Ok(()) => NegotiationState::AwaitingResponse {
                        responder: offer.proposer.clone(),
                        offer: countered,
                        counters: counters + 1,
                    },
                    Err(e) => {
                        debug!(session = %self.id, reason = %e, "Counter-offer infeasible");
                        close(NegotiationOutcome::Rejected, counters + 1)
                    }
                }
            }
            Err(Unparseable {
                attempted_counter: true,
                reason,
            }) => {
                debug!(session = %self.id, reason = %reason, "Malformed counter-offer");
                let used = if slot_left { counters + 1 } else { counters };
                close(NegotiationOutcome::Rejected, used)
            }
            Ok(_) | Err(_) => close(NegotiationOutcome::Rejected, counters),
        };
        &self.state
    }
}

/// Runs negotiations against the seated agents and commits agreed trades.
#[derive(Clone)]
pub struct Negotiator {
    seats: Arc<Seats>,
    recorder: Recorder,
    max_counters: u32,
}

impl Negotiator {
    pub fn new(seats: Arc<Seats>, recorder: Recorder, max_counters: u32) -> Self {
        Self {
            seats,
            recorder,
            max_counters,
        }
    }

    /// Negotiate `offer` to a terminal outcome.
    ///
    /// Game state changes only when both sides agree and the commit-time
    /// re-check passes. Agent failures count as a rejection.
    pub async fn negotiate(
        &self,
        offer: TradeOffer,
        state: &mut GameState,
        conversations: &mut Conversations,
    ) -> TradeRecord {
        let mut session = NegotiationSession::open(offer, state, self.max_counters);
        let names = KnownNames::from_state(state);
        info!(
            session = %session.id,
            offer = %session.opening_offer,
            "Negotiation opened"
        );

        while let NegotiationState::AwaitingResponse {
            responder,
            offer,
            counters,
        } = session.state().clone()
        {
            let prompt =
                negotiation_prompt(state, &responder, &offer, self.max_counters - counters);
            let answer =
                consult(&self.seats, conversations, &self.recorder, &responder, &prompt).await;
            let response = match answer {
                Ok(text) => parse_command(&text, &names),
                Err(e) => Err(Unparseable {
                    reason: e.to_string(),
                    attempted_counter: false,
                }),
            };
            if let Err(e) = &response {
                debug!(session = %session.id, participant = %responder, reason = %e, "Unusable negotiation response");
            }
            session.apply(response, state);
        }

        let outcome = match session.outcome().cloned() {
            Some(NegotiationOutcome::Accepted { offer }) => match commit(state, &offer) {
                Ok(receipt) => {
                    debug!(session = %session.id, bonus_changed = ?receipt.bonus_changed, "Trade applied");
                    NegotiationOutcome::Accepted { offer }
                }
                Err(e) => {
                    warn!(session = %session.id, error = %e, "Agreed trade failed commit-time check");
                    NegotiationOutcome::CommitFailed {
                        offer,
                        reason: e.to_string(),
                    }
                }
            },
            Some(other) => other,
            None => NegotiationOutcome::Rejected,
        };

        let record = TradeRecord {
            session_id: session.id,
            initiator: session.opening_offer.proposer.clone(),
            counterparty: session.opening_offer.target.clone(),
            opening_offer: session.opening_offer.clone(),
            counters: session.counters(),
            outcome,
            decided_at: Utc::now(),
        };
        info!(
            session = %record.session_id,
            participant = %record.initiator,
            counters = record.counters,
            outcome = record.outcome.label(),
            "Negotiation finished"
        );
        self.recorder.outcome(&record);
        record
    }
}
