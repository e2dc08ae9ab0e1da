use std::fmt::Write as _;

use haggle_models::board::HOTEL_LEVEL;
use haggle_models::trade_offer::TradeOffer;
use haggle_store::{improvable_assets, GameState};

/// Other participants' holdings listed by name before falling back to a count.
const LISTED_ASSETS: usize = 5;

/// Protocol description sent as the system prompt to every agent.
pub fn system_prompt() -> String {
    "You are a participant in a property-trading board game. Every message shows \
     the current board followed by one decision. Reply with ONLY the command \
     keywords below, no explanations.\n\n\
     ## COMMANDS\n\n\
     Turn strategy, two sections:\n\
     A) NO_TRADE or TRADE_PROPOSE:<target>:<assets you give>:<assets you want>:<cash>\n\
     B) NO_IMPROVEMENT or IMPROVE:<asset>,<asset>,... (at most 5, built in order)\n\n\
     Answering a trade offer:\n\
     TRADE_ACCEPT, TRADE_REJECT, or TRADE_COUNTER:<assets you give>:<assets you want>:<cash>\n\n\
     Buying an unowned asset: BUY or PASS\n\n\
     ## FIELD RULES\n\n\
     - Asset lists are comma separated. Leave a list empty for nothing: \
     TRADE_PROPOSE:Bob:Park Place::300\n\
     - Cash is a whole number. Positive means you pay, negative means you are paid.\n\
     - Use asset and player names exactly as shown on the board.\n\
     - Anything that does not follow these rules is treated as a refusal."
        .to_string()
}

/// Board context from `viewer`'s point of view: the other active players, then every group.
pub fn board_context(state: &GameState, viewer: &str) -> String {
    let mut out = String::from("Players:\n");

    let others: Vec<_> = state
        .active_participants()
        .filter(|p| !p.name.eq_ignore_ascii_case(viewer))
        .collect();
    if others.is_empty() {
        out.push_str("(none)\n");
    }
    for p in others {
        let mut listed: Vec<String> = p.assets.iter().take(LISTED_ASSETS).cloned().collect();
        if p.assets.len() > LISTED_ASSETS {
            listed.push(format!("({} total)", p.assets.len()));
        }

        let owned = p.assets.iter().filter_map(|name| state.asset(name));
        let (houses, hotels) = owned.fold((0u32, 0u32), |(h, t), a| {
            if a.has_hotel() {
                (h, t + 1)
            } else {
                (h + u32::from(a.improvements), t)
            }
        });
        let improvements = if houses + hotels > 0 {
            format!(",{houses}H,{hotels}hotels")
        } else {
            String::new()
        };

        let _ = writeln!(
            out,
            "{}:${},{}props({}){improvements}",
            p.name,
            p.cash,
            p.assets.len(),
            listed.join(",")
        );
    }

    out.push_str("\nBoard:\n");
    let mut groups: Vec<_> = state.groups().iter().collect();
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    for group in groups {
        let statuses: Vec<String> = state
            .group_assets(&group.name)
            .map(|a| format!("{}:{}", a.name, a.status()))
            .collect();
        let _ = writeln!(out, "{}:{}", group.name, statuses.join("|"));
    }

    out
}

fn own_position(state: &GameState, participant: &str) -> String {
    let Some(p) = state.participant(participant) else {
        return String::new();
    };
    let holdings: Vec<String> = p
        .assets
        .iter()
        .filter_map(|name| state.asset(name))
        .map(|a| match a.improvements {
            0 => a.name.clone(),
            level if level >= HOTEL_LEVEL => format!("{}:HOTEL", a.name),
            level => format!("{}:{level}H", a.name),
        })
        .collect();
    format!(
        "You are {}. Cash: ${}. You own: {}.",
        p.name,
        p.cash,
        if holdings.is_empty() {
            "nothing".to_string()
        } else {
            holdings.join(", ")
        }
    )
}

/// Combined turn-strategy request: a trade intent and an improvement list in one reply.
pub fn strategy_prompt(state: &GameState, participant: &str, turn: u32, reserve: i64) -> String {
    let improvable: Vec<String> = improvable_assets(state, participant, reserve)
        .into_iter()
        .map(|a| format!("{} (${})", a.name, a.improvement_cost))
        .collect();

    let mut out = board_context(state, participant);
    let _ = writeln!(out, "\nTurn {turn}. {}", own_position(state, participant));
    if improvable.is_empty() {
        out.push_str("You cannot build on anything right now.\n");
    } else {
        let _ = writeln!(out, "You can build on: {}", improvable.join(", "));
    }
    if reserve > 0 {
        let _ = writeln!(out, "Keep at least ${reserve} in cash after building.");
    }
    out.push_str(
        "\nAnswer both questions, one line each:\n\
         A) Do you want to propose a trade? NO_TRADE or TRADE_PROPOSE:<target>:<give>:<receive>:<cash>\n\
         B) Do you want to build? NO_IMPROVEMENT or IMPROVE:<asset>,<asset>,...",
    );
    out
}

/// Ask `responder` to answer an offer someone else made to them.
pub fn negotiation_prompt(
    state: &GameState,
    responder: &str,
    offer: &TradeOffer,
    counters_left: u32,
) -> String {
    let describe = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "nothing".to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    let cash_line = match offer.cash {
        0 => "No cash changes hands.".to_string(),
        c if c > 0 => format!("{} also pays you ${c}.", offer.proposer),
        c => format!("You would also pay {} ${}.", offer.proposer, c.unsigned_abs()),
    };

    let mut out = board_context(state, responder);
    let _ = writeln!(out, "\n{}", own_position(state, responder));
    let _ = writeln!(
        out,
        "\n{} offers you a trade.\nYou receive: {}\nYou give: {}\n{cash_line}",
        offer.proposer,
        describe(&offer.give),
        describe(&offer.receive),
    );
    if counters_left > 0 {
        let _ = write!(
            out,
            "\nCounter-offers left in this negotiation: {counters_left}.\n\
             Reply TRADE_ACCEPT, TRADE_REJECT, or TRADE_COUNTER:<give>:<receive>:<cash>"
        );
    } else {
        out.push_str(
            "\nNo counter-offers are left; a counter ends the negotiation.\n\
             Reply TRADE_ACCEPT or TRADE_REJECT",
        );
    }
    out
}

/// Ask whether to buy an unowned asset the participant has landed on.
pub fn purchase_prompt(state: &GameState, participant: &str, asset_name: &str) -> String {
    let mut out = board_context(state, participant);
    let _ = writeln!(out, "\n{}", own_position(state, participant));

    if let (Some(asset), Some(buyer)) = (state.asset(asset_name), state.participant(participant)) {
        let group_size = state.group_assets(&asset.group).count();
        let owned_in_group = state
            .group_assets(&asset.group)
            .filter(|a| a.is_owned_by(participant))
            .count();
        let _ = write!(
            out,
            "\nYou landed on {} ({} group). Cost ${}. Cash after buying: ${}.\n\
             You own {owned_in_group} of {group_size} in this group.\n\
             Reply BUY or PASS",
            asset.name,
            asset.group,
            asset.price,
            buyer.cash - asset.price,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_board;

    #[test]
    fn system_prompt_lists_every_token() {
        let prompt = system_prompt();
        for kind in haggle_models::command::CommandKind::ALL {
            assert!(prompt.contains(kind.token()), "Missing {}", kind.token());
        }
    }

    #[test]
    fn context_hides_viewer_and_shows_groups() {
        let state = sample_board();
        let context = board_context(&state, "Alice");
        assert!(!context.contains("Alice:$"));
        assert!(context.contains("Bob:$1000,2props(Oriental Avenue,Vermont Avenue)"));
        assert!(context.contains("dark_blue:Park Place:Alice|Boardwalk:Alice"));
        assert!(context.contains("Connecticut Avenue:None"));
    }

    #[test]
    fn strategy_prompt_has_both_sections() {
        let state = sample_board();
        let prompt = strategy_prompt(&state, "Alice", 4, 0);
        assert!(prompt.contains("Turn 4. You are Alice. Cash: $1500."));
        assert!(prompt.contains("You can build on: Boardwalk ($200), Park Place ($200)"));
        assert!(prompt.contains("A) "));
        assert!(prompt.contains("B) "));
    }

    #[test]
    fn negotiation_prompt_is_from_responder_view() {
        let state = sample_board();
        let offer = TradeOffer::new("Alice", "Bob", ["Park Place"], Vec::<String>::new(), 300);
        let prompt = negotiation_prompt(&state, "Bob", &offer, 3);
        assert!(prompt.contains("You receive: Park Place"));
        assert!(prompt.contains("You give: nothing"));
        assert!(prompt.contains("Alice also pays you $300."));
        assert!(prompt.contains("Counter-offers left in this negotiation: 3."));

        let last = negotiation_prompt(&state, "Bob", &offer, 0);
        assert!(last.contains("No counter-offers are left"));
    }

    #[test]
    fn purchase_prompt_shows_cash_after() {
        let state = sample_board();
        let prompt = purchase_prompt(&state, "Bob", "Connecticut Avenue");
        assert!(prompt.contains("Cost $120. Cash after buying: $880."));
        assert!(prompt.contains("You own 2 of 3 in this group."));
    }
}
