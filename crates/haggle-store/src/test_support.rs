//! Shared board fixture for tests across the workspace.

use haggle_models::board::BuildingSupply;
use haggle_models::scenario::{AgentKind, AssetSetup, GroupSetup, ParticipantSetup, ScenarioConfig};

use crate::state::GameState;

fn asset(name: &str, price: i64, improvement_cost: i64) -> AssetSetup {
    AssetSetup {
        name: name.to_string(),
        price,
        improvement_cost,
        improvements: 0,
    }
}

fn seat(name: &str, cash: i64, assets: &[&str]) -> ParticipantSetup {
    ParticipantSetup {
        name: name.to_string(),
        cash,
        agent: AgentKind::Passive,
        assets: assets.iter().map(|a| a.to_string()).collect(),
    }
}

/// Three seats on a small classic board:
/// - Alice ($1500) owns all of dark blue (Park Place, Boardwalk).
/// - Bob ($1000) owns Oriental and Vermont; Connecticut is unowned.
/// - Carol ($200) owns Reading Railroad; B&O is unowned.
pub fn sample_scenario() -> ScenarioConfig {
    ScenarioConfig {
        participants: vec![
            seat("Alice", 1500, &["Park Place", "Boardwalk"]),
            seat("Bob", 1000, &["Oriental Avenue", "Vermont Avenue"]),
            seat("Carol", 200, &["Reading Railroad"]),
        ],
        groups: vec![
            GroupSetup {
                name: "dark_blue".to_string(),
                improvable: true,
                assets: vec![asset("Park Place", 350, 200), asset("Boardwalk", 400, 200)],
            },
            GroupSetup {
                name: "light_blue".to_string(),
                improvable: true,
                assets: vec![
                    asset("Oriental Avenue", 100, 50),
                    asset("Vermont Avenue", 100, 50),
                    asset("Connecticut Avenue", 120, 50),
                ],
            },
            GroupSetup {
                name: "railroads".to_string(),
                improvable: false,
                assets: vec![
                    asset("Reading Railroad", 200, 0),
                    asset("B&O Railroad", 200, 0),
                ],
            },
        ],
        supply: BuildingSupply::default(),
    }
}

/// [`sample_scenario`] loaded into a board.
pub fn sample_board() -> GameState {
    GameState::from_scenario(&sample_scenario()).unwrap_or_default()
}
