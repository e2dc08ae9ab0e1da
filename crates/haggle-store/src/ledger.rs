//! Trade validation and atomic commit.
//!
//! Checks run in a fixed order and the first failure is reported:
//!
//! 1. every asset in `give` is owned by the proposer
//! 2. every asset in `receive` is owned by the target
//! 3. `give` and `receive` are disjoint
//! 4. whoever pays cash can cover it without going negative
//!
//! [`commit`] re-runs all four checks against the state at commit time,
//! stages every change, and applies them together. Nothing is applied when
//! any check fails.

use std::collections::BTreeSet;

use haggle_models::board::names_match;
use haggle_models::trade_offer::TradeOffer;
use thiserror::Error;
use tracing::{debug, info};

use crate::state::GameState;

/// Why an offer cannot be executed against the current holdings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Infeasible {
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("{0} cannot trade with themselves")]
    SelfTrade(String),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("{participant} does not own {asset}")]
    GiveNotOwned { participant: String, asset: String },

    #[error("{participant} does not own {asset}")]
    ReceiveNotOwned { participant: String, asset: String },

    #[error("{0} appears on both sides of the offer")]
    Overlap(String),

    #[error("{participant} cannot pay ${amount} (has ${available})")]
    InsufficientCash {
        participant: String,
        amount: i64,
        available: i64,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error("offer no longer holds at commit time: {0}")]
    Stale(#[from] Infeasible),
}

/// What a successful commit changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub offer: TradeOffer,
    /// Canonical names moved proposer -> target.
    pub to_target: Vec<String>,
    /// Canonical names moved target -> proposer.
    pub to_proposer: Vec<String>,
    /// Participants who gained or lost a full group in this trade.
    pub bonus_changed: Vec<String>,
}

/// Ownership checks only (1-3). Used before an offer is shown to the other side.
pub fn validate_structure(state: &GameState, offer: &TradeOffer) -> Result<(), Infeasible> {
    let proposer = state
        .canonical_participant(&offer.proposer)
        .ok_or_else(|| Infeasible::UnknownParticipant(offer.proposer.clone()))?;
    let target = state
        .canonical_participant(&offer.target)
        .ok_or_else(|| Infeasible::UnknownParticipant(offer.target.clone()))?;
    if names_match(proposer, target) {
        return Err(Infeasible::SelfTrade(proposer.to_string()));
    }

    check_owned(state, &offer.give, proposer, |participant, asset| {
        Infeasible::GiveNotOwned { participant, asset }
    })?;
    check_owned(state, &offer.receive, target, |participant, asset| {
        Infeasible::ReceiveNotOwned { participant, asset }
    })?;

    if let Some(asset) = offer
        .give
        .iter()
        .find(|g| offer.receive.iter().any(|r| names_match(g, r)))
    {
        return Err(Infeasible::Overlap(asset.clone()));
    }

    Ok(())
}

/// Full feasibility check (1-4).
pub fn validate(state: &GameState, offer: &TradeOffer) -> Result<(), Infeasible> {
    validate_structure(state, offer)?;

    if let Some((payer, amount)) = offer.payer() {
        // validate_structure already resolved both names
        let available = state.participant(payer).map(|p| p.cash).unwrap_or_default();
        if available < amount {
            return Err(Infeasible::InsufficientCash {
                participant: payer.to_string(),
                amount,
                available,
            });
        }
    }

    Ok(())
}

fn check_owned(
    state: &GameState,
    assets: &BTreeSet<String>,
    owner: &str,
    not_owned: impl Fn(String, String) -> Infeasible,
) -> Result<(), Infeasible> {
    for name in assets {
        let asset = state
            .asset(name)
            .ok_or_else(|| Infeasible::UnknownAsset(name.clone()))?;
        if !asset.is_owned_by(owner) {
            return Err(not_owned(owner.to_string(), asset.name.clone()));
        }
    }
    Ok(())
}

/// Apply an accepted offer: ownership both ways, the cash leg, then group bonuses.
pub fn commit(state: &mut GameState, offer: &TradeOffer) -> Result<CommitReceipt, CommitError> {
    validate(state, offer)?;

    let (mut proposer, mut target) = match (
        state.participant(&offer.proposer).cloned(),
        state.participant(&offer.target).cloned(),
    ) {
        (Some(p), Some(t)) => (p, t),
        (None, _) => return Err(Infeasible::UnknownParticipant(offer.proposer.clone()).into()),
        (_, None) => return Err(Infeasible::UnknownParticipant(offer.target.clone()).into()),
    };

    let canonical = |names: &BTreeSet<String>| -> Vec<String> {
        names
            .iter()
            .filter_map(|n| state.canonical_asset(n).map(str::to_string))
            .collect()
    };
    let to_target = canonical(&offer.give);
    let to_proposer = canonical(&offer.receive);

    // Stage on copies of both seats.
    for asset in &to_target {
        proposer.assets.remove(asset);
        target.assets.insert(asset.clone());
    }
    for asset in &to_proposer {
        target.assets.remove(asset);
        proposer.assets.insert(asset.clone());
    }
    proposer.cash = proposer.cash.saturating_sub(offer.cash);
    target.cash = target.cash.saturating_add(offer.cash);

    if proposer.cash < 0 || target.cash < 0 {
        let (who, seat) = if proposer.cash < 0 {
            (&offer.proposer, &proposer)
        } else {
            (&offer.target, &target)
        };
        return Err(Infeasible::InsufficientCash {
            participant: who.clone(),
            amount: offer.cash.saturating_abs(),
            available: seat.cash.saturating_add(offer.cash.saturating_abs()),
        }
        .into());
    }

    let touched_groups: BTreeSet<String> = to_target
        .iter()
        .chain(&to_proposer)
        .filter_map(|a| state.asset(a).map(|a| a.group.clone()))
        .collect();
    let owners_before: Vec<Option<String>> = touched_groups
        .iter()
        .map(|g| state.full_group_owner(g))
        .collect();

    // Apply. Every precondition was re-checked above, so nothing below can fail.
    for asset in &to_target {
        if let Some(a) = state.asset_mut(asset) {
            a.owner = Some(target.name.clone());
        }
    }
    for asset in &to_proposer {
        if let Some(a) = state.asset_mut(asset) {
            a.owner = Some(proposer.name.clone());
        }
    }
    let (proposer_name, target_name) = (proposer.name.clone(), target.name.clone());
    if let Some(seat) = state.participant_mut(&proposer_name) {
        *seat = proposer;
    }
    if let Some(seat) = state.participant_mut(&target_name) {
        *seat = target;
    }

    let mut bonus_changed = BTreeSet::new();
    for (group, before) in touched_groups.iter().zip(owners_before) {
        let after = state.recalculate_group(group);
        if before != after {
            debug!(group = %group, before = ?before, after = ?after, "Group bonus changed");
            bonus_changed.extend(before);
            bonus_changed.extend(after);
        }
    }

    info!(
        proposer = %proposer_name,
        target = %target_name,
        to_target = ?to_target,
        to_proposer = ?to_proposer,
        cash = offer.cash,
        "Trade committed"
    );

    Ok(CommitReceipt {
        offer: offer.clone(),
        to_target,
        to_proposer,
        bonus_changed: bonus_changed.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_board;

    fn none() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn valid_offer_passes() {
        let state = sample_board();
        let offer = TradeOffer::new("Alice", "Bob", ["Park Place"], ["Oriental Avenue"], 100);
        assert_eq!(validate(&state, &offer), Ok(()));
    }

    #[test]
    fn give_must_be_owned_by_proposer() {
        let state = sample_board();
        let offer = TradeOffer::new("Alice", "Bob", ["Vermont Avenue"], none(), 0);
        assert_eq!(
            validate(&state, &offer),
            Err(Infeasible::GiveNotOwned {
                participant: "Alice".to_string(),
                asset: "Vermont Avenue".to_string()
            })
        );
    }

    #[test]
    fn receive_must_be_owned_by_target() {
        let state = sample_board();
        let offer = TradeOffer::new("Alice", "Bob", none(), ["Reading Railroad"], 0);
        assert!(matches!(
            validate(&state, &offer),
            Err(Infeasible::ReceiveNotOwned { .. })
        ));
    }

    #[test]
    fn overlap_is_reported_after_ownership() {
        let state = sample_board();
        // Park Place is Alice's, so check 2 fails first for receive
        let offer = TradeOffer::new("Alice", "Bob", ["Park Place"], ["park place"], 0);
        assert!(matches!(
            validate(&state, &offer),
            Err(Infeasible::ReceiveNotOwned { .. })
        ));
    }

    #[test]
    fn payer_cannot_go_negative() {
        let state = sample_board();
        let offer = TradeOffer::new("Carol", "Bob", none(), ["Oriental Avenue"], 201);
        assert_eq!(
            validate(&state, &offer),
            Err(Infeasible::InsufficientCash {
                participant: "Carol".to_string(),
                amount: 201,
                available: 200
            })
        );

        let exact = TradeOffer::new("Carol", "Bob", none(), ["Oriental Avenue"], 200);
        assert_eq!(validate(&state, &exact), Ok(()));
    }

    #[test]
    fn negative_cash_checks_the_target() {
        let state = sample_board();
        let offer = TradeOffer::new("Alice", "Carol", ["Park Place"], none(), -500);
        assert!(matches!(
            validate(&state, &offer),
            Err(Infeasible::InsufficientCash { participant, .. }) if participant == "Carol"
        ));
    }

    #[test]
    fn unknown_names_are_infeasible() {
        let state = sample_board();
        let offer = TradeOffer::new("Alice", "Zed", none(), none(), 0);
        assert_eq!(
            validate(&state, &offer),
            Err(Infeasible::UnknownParticipant("Zed".to_string()))
        );

        let offer = TradeOffer::new("Alice", "Bob", ["Atlantis"], none(), 0);
        assert_eq!(
            validate(&state, &offer),
            Err(Infeasible::UnknownAsset("Atlantis".to_string()))
        );

        let offer = TradeOffer::new("Alice", "alice", none(), none(), 0);
        assert!(matches!(validate(&state, &offer), Err(Infeasible::SelfTrade(_))));
    }

    #[test]
    fn commit_moves_assets_and_cash_zero_sum() {
        let mut state = sample_board();
        let before_total: i64 = state.participants().iter().map(|p| p.cash).sum();

        let offer = TradeOffer::new("Alice", "Bob", ["Park Place"], ["Oriental Avenue"], 300);
        let receipt = commit(&mut state, &offer).unwrap();

        assert_eq!(receipt.to_target, vec!["Park Place"]);
        assert_eq!(receipt.to_proposer, vec!["Oriental Avenue"]);
        assert!(state.asset("Park Place").unwrap().is_owned_by("Bob"));
        assert!(state.asset("Oriental Avenue").unwrap().is_owned_by("Alice"));
        assert!(state.participant("Bob").unwrap().owns("Park Place"));
        assert!(!state.participant("Alice").unwrap().owns("Park Place"));

        assert_eq!(state.participant("Alice").unwrap().cash, 1200);
        assert_eq!(state.participant("Bob").unwrap().cash, 1300);
        let after_total: i64 = state.participants().iter().map(|p| p.cash).sum();
        assert_eq!(before_total, after_total);
    }

    #[test]
    fn commit_recomputes_group_bonus() {
        let mut state = sample_board();
        let offer = TradeOffer::new("Alice", "Bob", ["Boardwalk"], none(), 0);
        let receipt = commit(&mut state, &offer).unwrap();

        assert_eq!(receipt.bonus_changed, vec!["Alice"]);
        assert_eq!(state.asset("Park Place").unwrap().group_multiplier, 1);
        assert_eq!(state.asset("Boardwalk").unwrap().group_multiplier, 1);
    }

    #[test]
    fn commit_completing_a_group_flags_new_owner() {
        let mut state = sample_board();
        state.purchase("Alice", "Connecticut Avenue", 0).unwrap();
        let offer = TradeOffer::new("Alice", "Bob", ["Connecticut Avenue"], none(), -120);
        let receipt = commit(&mut state, &offer).unwrap();

        assert_eq!(receipt.bonus_changed, vec!["Bob"]);
        assert_eq!(state.asset("Connecticut Avenue").unwrap().group_multiplier, 2);
    }

    #[test]
    fn stale_commit_applies_nothing() {
        let mut state = sample_board();
        let offer = TradeOffer::new("Alice", "Bob", ["Park Place"], ["Oriental Avenue"], 100);

        // Oriental Avenue leaves Bob between acceptance and commit
        let side_deal = TradeOffer::new("Bob", "Carol", ["Oriental Avenue"], none(), 0);
        commit(&mut state, &side_deal).unwrap();
        let snapshot_alice = state.participant("Alice").unwrap().clone();
        let snapshot_bob = state.participant("Bob").unwrap().clone();

        let err = commit(&mut state, &offer).unwrap_err();
        assert!(matches!(err, CommitError::Stale(Infeasible::ReceiveNotOwned { .. })));
        assert_eq!(state.participant("Alice").unwrap(), &snapshot_alice);
        assert_eq!(state.participant("Bob").unwrap(), &snapshot_bob);
        assert!(state.asset("Park Place").unwrap().is_owned_by("Alice"));
    }
}
