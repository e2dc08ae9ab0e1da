use haggle_models::board::{names_match, Asset, BuildingSupply, Group, Participant};
use haggle_models::scenario::ScenarioConfig;
use tracing::debug;

use crate::error::StoreError;

/// In-memory board state shared by the engine.
///
/// The engine reads holdings through this store and writes only through the
/// ledger, the improvement executor, and [`GameState::purchase`]. Participants
/// keep seat order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    participants: Vec<Participant>,
    assets: Vec<Asset>,
    groups: Vec<Group>,
    supply: BuildingSupply,
}

impl GameState {
    pub fn new(supply: BuildingSupply) -> Self {
        Self {
            participants: Vec::new(),
            assets: Vec::new(),
            groups: Vec::new(),
            supply,
        }
    }

    /// Build a board from a scenario file: groups first, then seats and starting holdings.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, StoreError> {
        let mut state = Self::new(scenario.supply);

        for group in &scenario.groups {
            let assets = group
                .assets
                .iter()
                .map(|a| {
                    let mut asset =
                        Asset::new(a.name.clone(), group.name.clone(), a.price, a.improvement_cost);
                    asset.improvements = a.improvements;
                    asset
                })
                .collect();
            state.add_group(&group.name, group.improvable, assets)?;
        }

        for setup in &scenario.participants {
            state.add_participant(Participant::new(setup.name.clone(), setup.cash))?;
            for asset in &setup.assets {
                state
                    .assign(asset, &setup.name)
                    .map_err(|e| StoreError::Scenario(format!("{}: {e}", setup.name)))?;
            }
        }

        if state.participants.len() < 2 {
            return Err(StoreError::Scenario(
                "a game needs at least two participants".to_string(),
            ));
        }

        Ok(state)
    }

    pub fn add_participant(&mut self, participant: Participant) -> Result<(), StoreError> {
        if self.participant(&participant.name).is_some() {
            return Err(StoreError::DuplicateName(participant.name));
        }
        self.participants.push(participant);
        Ok(())
    }

    pub fn add_group(
        &mut self,
        name: &str,
        improvable: bool,
        assets: Vec<Asset>,
    ) -> Result<(), StoreError> {
        if self.group(name).is_some() {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        let mut members: Vec<String> = Vec::with_capacity(assets.len());
        for asset in &assets {
            if self.asset(&asset.name).is_some() || members.iter().any(|m| names_match(m, &asset.name)) {
                return Err(StoreError::DuplicateName(asset.name.clone()));
            }
            members.push(asset.name.clone());
        }
        self.assets.extend(assets.into_iter().map(|mut asset| {
            asset.group = name.to_string();
            asset
        }));
        self.groups.push(Group {
            name: name.to_string(),
            improvable,
            assets: members,
        });
        Ok(())
    }

    /// Hand an unowned asset to a participant at no cost (starting holdings).
    pub fn assign(&mut self, asset: &str, participant: &str) -> Result<(), StoreError> {
        let owner = self
            .canonical_participant(participant)
            .ok_or_else(|| StoreError::UnknownParticipant(participant.to_string()))?
            .to_string();
        let asset = self
            .asset_mut(asset)
            .ok_or_else(|| StoreError::UnknownAsset(asset.to_string()))?;
        if let Some(current) = &asset.owner {
            return Err(StoreError::AlreadyOwned {
                asset: asset.name.clone(),
                owner: current.clone(),
            });
        }
        asset.owner = Some(owner.clone());
        let (name, group) = (asset.name.clone(), asset.group.clone());

        if let Some(p) = self.participant_mut(&owner) {
            p.assets.insert(name);
        }
        self.recalculate_group(&group);
        Ok(())
    }

    /// Buy an unowned asset at list price.
    ///
    /// `reserve` is the cash the buyer must still hold afterwards.
    pub fn purchase(&mut self, participant: &str, asset: &str, reserve: i64) -> Result<i64, StoreError> {
        let buyer = self
            .participant(participant)
            .ok_or_else(|| StoreError::UnknownParticipant(participant.to_string()))?;
        let target = self
            .asset(asset)
            .ok_or_else(|| StoreError::UnknownAsset(asset.to_string()))?;
        if let Some(owner) = &target.owner {
            return Err(StoreError::AlreadyOwned {
                asset: target.name.clone(),
                owner: owner.clone(),
            });
        }
        if buyer.cash - target.price < reserve {
            return Err(StoreError::InsufficientCash {
                participant: buyer.name.clone(),
                needed: target.price + reserve,
                available: buyer.cash,
            });
        }

        let price = target.price;
        let buyer_name = buyer.name.clone();
        self.assign(asset, &buyer_name)?;
        if let Some(p) = self.participant_mut(&buyer_name) {
            p.cash -= price;
        }
        debug!(participant = %buyer_name, asset, price, "Asset purchased");
        Ok(price)
    }

    /// Mark a participant as out of the game. Their holdings stay as the board simulation left them.
    pub fn eliminate(&mut self, participant: &str) -> Result<(), StoreError> {
        let p = self
            .participant_mut(participant)
            .ok_or_else(|| StoreError::UnknownParticipant(participant.to_string()))?;
        p.eliminated = true;
        Ok(())
    }

    /// Count a new turn for `participant` and return its number (1-based).
    pub fn begin_turn(&mut self, participant: &str) -> Result<u32, StoreError> {
        let p = self
            .participant_mut(participant)
            .ok_or_else(|| StoreError::UnknownParticipant(participant.to_string()))?;
        p.turns_taken += 1;
        Ok(p.turns_taken)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.eliminated)
    }

    pub fn participant(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| names_match(&p.name, name))
    }

    pub(crate) fn participant_mut(&mut self, name: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| names_match(&p.name, name))
    }

    pub fn canonical_participant(&self, name: &str) -> Option<&str> {
        self.participant(name).map(|p| p.name.as_str())
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| names_match(&a.name, name))
    }

    pub(crate) fn asset_mut(&mut self, name: &str) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| names_match(&a.name, name))
    }

    pub fn canonical_asset(&self, name: &str) -> Option<&str> {
        self.asset(name).map(|a| a.name.as_str())
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| names_match(&g.name, name))
    }

    pub fn group_assets<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Asset> + 'a {
        self.assets.iter().filter(move |a| names_match(&a.group, group))
    }

    pub fn supply(&self) -> BuildingSupply {
        self.supply
    }

    pub(crate) fn supply_mut(&mut self) -> &mut BuildingSupply {
        &mut self.supply
    }

    /// The participant owning every asset of `group`, if there is one.
    pub fn full_group_owner(&self, group: &str) -> Option<String> {
        let mut owners = self.group_assets(group).map(|a| a.owner.as_deref());
        let first = owners.next()??;
        owners
            .all(|o| o.is_some_and(|o| names_match(o, first)))
            .then(|| first.to_string())
    }

    pub fn owns_full_group(&self, participant: &str, group: &str) -> bool {
        self.full_group_owner(group)
            .is_some_and(|owner| names_match(&owner, participant))
    }

    /// Recompute the group bonus for every asset in `group`. Returns the full-group owner.
    pub fn recalculate_group(&mut self, group: &str) -> Option<String> {
        let owner = self.full_group_owner(group);
        let multiplier = if owner.is_some() { 2 } else { 1 };
        for asset in self.assets.iter_mut().filter(|a| names_match(&a.group, group)) {
            asset.group_multiplier = multiplier;
        }
        owner
    }

    /// Cash plus list price and building cost of everything owned.
    pub fn net_worth(&self, participant: &str) -> Option<i64> {
        let p = self.participant(participant)?;
        let holdings: i64 = p
            .assets
            .iter()
            .filter_map(|name| self.asset(name))
            .map(|a| a.price + a.improvement_cost * i64::from(a.improvements))
            .sum();
        Some(p.cash + holdings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_board;
    use haggle_models::scenario::{AgentKind, AssetSetup, GroupSetup, ParticipantSetup};

    fn asset(name: &str, price: i64, cost: i64) -> AssetSetup {
        AssetSetup {
            name: name.to_string(),
            price,
            improvement_cost: cost,
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

    #[test]
    fn scenario_builds_ownership_both_ways() {
        let state = sample_board();
        let alice = state.participant("alice").unwrap();
        assert!(alice.owns("Park Place"));
        assert!(state.asset("park place").unwrap().is_owned_by("Alice"));
        assert!(state.asset("Connecticut Avenue").unwrap().owner.is_none());
    }

    #[test]
    fn group_bonus_set_on_full_ownership() {
        let state = sample_board();
        assert_eq!(state.asset("Boardwalk").unwrap().group_multiplier, 2);
        assert_eq!(state.asset("Oriental Avenue").unwrap().group_multiplier, 1);
        assert_eq!(state.full_group_owner("dark_blue").as_deref(), Some("Alice"));
        assert!(state.owns_full_group("ALICE", "dark_blue"));
        assert!(!state.owns_full_group("Bob", "light_blue"));
    }

    #[test]
    fn duplicate_participant_rejected() {
        let mut state = sample_board();
        let err = state
            .add_participant(Participant::new("alice", 10))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
    }

    #[test]
    fn scenario_rejects_double_ownership() {
        let scenario = ScenarioConfig {
            participants: vec![seat("A", 100, &["X"]), seat("B", 100, &["X"])],
            groups: vec![GroupSetup {
                name: "g".to_string(),
                improvable: true,
                assets: vec![asset("X", 10, 5)],
            }],
            supply: BuildingSupply::default(),
        };
        let err = GameState::from_scenario(&scenario).unwrap_err();
        assert!(matches!(err, StoreError::Scenario(_)));
    }

    #[test]
    fn group_members_are_recorded_and_unique() {
        let state = sample_board();
        let light_blue = state.group("light_blue").unwrap();
        assert_eq!(
            light_blue.assets,
            vec!["Oriental Avenue", "Vermont Avenue", "Connecticut Avenue"]
        );

        let mut state = GameState::default();
        let err = state
            .add_group(
                "brown",
                true,
                vec![
                    Asset::new("Baltic Avenue", "", 60, 50),
                    Asset::new("baltic avenue", "", 60, 50),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
        assert!(state.group("brown").is_none());
        assert!(state.asset("Baltic Avenue").is_none());
    }

    #[test]
    fn purchase_completes_group() {
        let mut state = sample_board();
        let price = state.purchase("Bob", "connecticut avenue", 0).unwrap();
        assert_eq!(price, 120);
        assert_eq!(state.participant("Bob").unwrap().cash, 880);
        assert!(state.participant("Bob").unwrap().owns("Connecticut Avenue"));
        assert_eq!(state.asset("Vermont Avenue").unwrap().group_multiplier, 2);
    }

    #[test]
    fn purchase_respects_reserve_and_ownership() {
        let mut state = sample_board();
        let err = state.purchase("Carol", "B&O Railroad", 50).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientCash { .. }));

        let err = state.purchase("Bob", "Boardwalk", 0).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyOwned { .. }));
        assert_eq!(state.participant("Bob").unwrap().cash, 1000);
    }

    #[test]
    fn net_worth_counts_holdings() {
        let state = sample_board();
        assert_eq!(state.net_worth("Alice"), Some(1500 + 350 + 400));
        assert_eq!(state.net_worth("Nobody"), None);
    }

    #[test]
    fn turns_are_counted_per_participant() {
        let mut state = sample_board();
        assert_eq!(state.begin_turn("Alice").unwrap(), 1);
        assert_eq!(state.begin_turn("alice").unwrap(), 2);
        assert_eq!(state.begin_turn("Bob").unwrap(), 1);
        assert!(state.begin_turn("Nobody").is_err());
    }

    #[test]
    fn eliminated_participants_are_not_active() {
        let mut state = sample_board();
        state.eliminate("Carol").unwrap();
        let active: Vec<_> = state.active_participants().map(|p| p.name.as_str()).collect();
        assert_eq!(active, vec!["Alice", "Bob"]);
    }
}
