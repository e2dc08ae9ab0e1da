use haggle_models::board::{Asset, HOTEL_LEVEL, MAX_IMPROVEMENT_LEVEL};
use thiserror::Error;
use tracing::{debug, info};

use crate::state::GameState;

/// Why a requested improvement was not built. Skips never abort a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImprovementSkip {
    #[error("unknown asset")]
    UnknownAsset,

    #[error("not owned by {0}")]
    NotOwned(String),

    #[error("group {0} cannot be built on")]
    GroupNotImprovable(String),

    #[error("group {0} is not fully owned")]
    GroupIncomplete(String),

    #[error("already at the improvement cap")]
    AtCap,

    #[error("must build evenly across the group first")]
    Uneven,

    #[error("bank has no {0} left")]
    NoSupply(&'static str),

    #[error("costs ${cost}, leaving less than the ${reserve} reserve (has ${available})")]
    InsufficientCash {
        cost: i64,
        available: i64,
        reserve: i64,
    },
}

/// One building added to an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Improvement {
    pub asset: String,
    pub new_level: u8,
    pub cost: i64,
}

/// Outcome of one improvement batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImprovementReport {
    pub built: Vec<Improvement>,
    pub skipped: Vec<(String, ImprovementSkip)>,
}

/// Check whether `participant` may add one level to `asset_name` right now.
pub fn check_improvement<'a>(
    state: &'a GameState,
    participant: &str,
    asset_name: &str,
    reserve: i64,
) -> Result<&'a Asset, ImprovementSkip> {
    let asset = state.asset(asset_name).ok_or(ImprovementSkip::UnknownAsset)?;
    if !asset.is_owned_by(participant) {
        return Err(ImprovementSkip::NotOwned(participant.to_string()));
    }

    let improvable = state.group(&asset.group).is_some_and(|g| g.improvable);
    if !improvable {
        return Err(ImprovementSkip::GroupNotImprovable(asset.group.clone()));
    }
    if !state.owns_full_group(participant, &asset.group) {
        return Err(ImprovementSkip::GroupIncomplete(asset.group.clone()));
    }
    if asset.improvements >= MAX_IMPROVEMENT_LEVEL {
        return Err(ImprovementSkip::AtCap);
    }
    if state
        .group_assets(&asset.group)
        .any(|other| other.improvements < asset.improvements)
    {
        return Err(ImprovementSkip::Uneven);
    }

    let supply = state.supply();
    if asset.improvements + 1 == HOTEL_LEVEL {
        if supply.hotels == 0 {
            return Err(ImprovementSkip::NoSupply("hotels"));
        }
    } else if supply.houses == 0 {
        return Err(ImprovementSkip::NoSupply("houses"));
    }

    let available = state.participant(participant).map(|p| p.cash).unwrap_or_default();
    if available - asset.improvement_cost < reserve {
        return Err(ImprovementSkip::InsufficientCash {
            cost: asset.improvement_cost,
            available,
            reserve,
        });
    }

    Ok(asset)
}

/// Assets `participant` could improve by one level right now.
pub fn improvable_assets<'a>(state: &'a GameState, participant: &str, reserve: i64) -> Vec<&'a Asset> {
    let Some(p) = state.participant(participant) else {
        return Vec::new();
    };
    p.assets
        .iter()
        .filter_map(|name| check_improvement(state, participant, name, reserve).ok())
        .collect()
}

/// Validate and build one level on an asset.
pub fn improve(
    state: &mut GameState,
    participant: &str,
    asset_name: &str,
    reserve: i64,
) -> Result<Improvement, ImprovementSkip> {
    let asset = check_improvement(state, participant, asset_name, reserve)?;
    let (name, cost, new_level) = (
        asset.name.clone(),
        asset.improvement_cost,
        asset.improvements + 1,
    );

    {
        let supply = state.supply_mut();
        if new_level == HOTEL_LEVEL {
            supply.hotels -= 1;
            supply.houses += u32::from(HOTEL_LEVEL - 1);
        } else {
            supply.houses -= 1;
        }
    }
    if let Some(a) = state.asset_mut(&name) {
        a.improvements = new_level;
    }
    if let Some(p) = state.participant_mut(participant) {
        p.cash -= cost;
    }

    debug!(participant, asset = %name, level = new_level, cost, "Improvement built");
    Ok(Improvement {
        asset: name,
        new_level,
        cost,
    })
}

/// Build the requested improvements in list order, at most `max` entries.
///
/// Entries past `max` are dropped. Each entry is checked against the state
/// left by the entries before it; failures are recorded and the batch goes on.
pub fn execute_improvements(
    state: &mut GameState,
    participant: &str,
    requested: &[String],
    max: usize,
    reserve: i64,
) -> ImprovementReport {
    let mut report = ImprovementReport::default();

    for name in requested.iter().take(max) {
        match improve(state, participant, name, reserve) {
            Ok(built) => report.built.push(built),
            Err(reason) => {
                debug!(participant, asset = %name, reason = %reason, "Improvement skipped");
                report.skipped.push((name.clone(), reason));
            }
        }
    }

    if !report.built.is_empty() {
        info!(
            participant,
            built = report.built.len(),
            skipped = report.skipped.len(),
            "Improvements executed"
        );
    }
    report
}
