use serde::{Deserialize, Serialize};

use crate::board::BuildingSupply;

/// Which decision agent drives a participant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// The `claude` CLI.
    Claude,
    /// Always answers with the safe no-op.
    #[default]
    Passive,
}

/// Starting board for one game, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub participants: Vec<ParticipantSetup>,
    pub groups: Vec<GroupSetup>,
    #[serde(default)]
    pub supply: BuildingSupply,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantSetup {
    pub name: String,
    pub cash: i64,
    #[serde(default)]
    pub agent: AgentKind,
    /// Assets owned at game start.
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSetup {
    pub name: String,
    #[serde(default = "default_true")]
    pub improvable: bool,
    pub assets: Vec<AssetSetup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSetup {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub improvement_cost: i64,
    #[serde(default)]
    pub improvements: u8,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_scenario() {
        let toml_str = r#"
[[participants]]
name = "Hero"
cash = 1500
agent = "claude"
assets = ["Park Place", "Boardwalk"]

[[participants]]
name = "Villain"
cash = 1200

[[groups]]
name = "dark_blue"
assets = [
    { name = "Park Place", price = 350, improvement_cost = 200 },
    { name = "Boardwalk", price = 400, improvement_cost = 200 },
]

[[groups]]
name = "railroads"
improvable = false
assets = [{ name = "Reading Railroad", price = 200 }]
"#;
        let scenario: ScenarioConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(scenario.participants.len(), 2);
        assert_eq!(scenario.participants[0].agent, AgentKind::Claude);
        assert_eq!(scenario.participants[1].agent, AgentKind::Passive);
        assert!(scenario.participants[1].assets.is_empty());
        assert!(scenario.groups[0].improvable);
        assert!(!scenario.groups[1].improvable);
        assert_eq!(scenario.groups[1].assets[0].improvement_cost, 0);
        assert_eq!(scenario.supply, BuildingSupply::default());
    }
}
