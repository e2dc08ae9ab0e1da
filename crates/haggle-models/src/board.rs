use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Highest improvement level an asset can reach. Levels 1-4 are houses, 5 is a hotel.
pub const MAX_IMPROVEMENT_LEVEL: u8 = 5;

/// Level at which the last house is traded in for a hotel.
pub const HOTEL_LEVEL: u8 = MAX_IMPROVEMENT_LEVEL;

/// Case-insensitive comparison used for every asset and participant name.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// A player seat: cash, holdings, and turn count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    /// Signed currency units.
    pub cash: i64,
    /// Canonical asset names. Ordered so transfers log deterministically.
    pub assets: BTreeSet<String>,
    pub turns_taken: u32,
    pub eliminated: bool,
}

impl Participant {
    pub fn new(name: impl Into<String>, cash: i64) -> Self {
        Self {
            name: name.into(),
            cash,
            assets: BTreeSet::new(),
            turns_taken: 0,
            eliminated: false,
        }
    }

    pub fn owns(&self, asset: &str) -> bool {
        self.assets.iter().any(|a| names_match(a, asset))
    }
}

/// A tradable, improvable board asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub owner: Option<String>,
    /// 0..=MAX_IMPROVEMENT_LEVEL
    pub improvements: u8,
    pub group: String,
    pub price: i64,
    pub improvement_cost: i64,
    /// 2 while a single participant owns the whole group, otherwise 1.
    pub group_multiplier: u8,
}

impl Asset {
    pub fn new(name: impl Into<String>, group: impl Into<String>, price: i64, improvement_cost: i64) -> Self {
        Self {
            name: name.into(),
            owner: None,
            improvements: 0,
            group: group.into(),
            price,
            improvement_cost,
            group_multiplier: 1,
        }
    }

    pub fn is_owned_by(&self, participant: &str) -> bool {
        self.owner
            .as_deref()
            .is_some_and(|owner| names_match(owner, participant))
    }

    pub fn has_hotel(&self) -> bool {
        self.improvements >= HOTEL_LEVEL
    }

    /// Short status used in prompts and logs, e.g. `Alice:3H` or `None`.
    pub fn status(&self) -> String {
        let owner = self.owner.as_deref().unwrap_or("None");
        match self.improvements {
            0 => owner.to_string(),
            level if level >= HOTEL_LEVEL => format!("{owner}:HOTEL"),
            level => format!("{owner}:{level}H"),
        }
    }
}

/// A color group (or railroad/utility set) of assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    /// Railroad and utility style groups cannot be built on.
    pub improvable: bool,
    pub assets: Vec<String>,
}

/// Bank stock of buildings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildingSupply {
    pub houses: u32,
    pub hotels: u32,
}

impl Default for BuildingSupply {
    fn default() -> Self {
        Self {
            houses: 32,
            hotels: 12,
        }
    }
}
