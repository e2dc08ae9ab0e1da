use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Leading tokens of the agent text protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    NoTrade,
    TradePropose,
    TradeAccept,
    TradeReject,
    TradeCounter,
    NoImprovement,
    Improve,
    Buy,
    Pass,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::NoTrade,
        CommandKind::TradePropose,
        CommandKind::TradeAccept,
        CommandKind::TradeReject,
        CommandKind::TradeCounter,
        CommandKind::NoImprovement,
        CommandKind::Improve,
        CommandKind::Buy,
        CommandKind::Pass,
    ];

    pub fn token(self) -> &'static str {
        match self {
            CommandKind::NoTrade => "NO_TRADE",
            CommandKind::TradePropose => "TRADE_PROPOSE",
            CommandKind::TradeAccept => "TRADE_ACCEPT",
            CommandKind::TradeReject => "TRADE_REJECT",
            CommandKind::TradeCounter => "TRADE_COUNTER",
            CommandKind::NoImprovement => "NO_IMPROVEMENT",
            CommandKind::Improve => "IMPROVE",
            CommandKind::Buy => "BUY",
            CommandKind::Pass => "PASS",
        }
    }

    /// Case-insensitive token lookup.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.token().eq_ignore_ascii_case(token))
    }
}

/// A validated command parsed from agent text.
///
/// Names inside commands are canonical (as registered on the board), not as
/// the agent typed them, except for `Improve` entries that matched nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    NoTrade,
    TradePropose {
        target: String,
        give: BTreeSet<String>,
        receive: BTreeSet<String>,
        cash: i64,
    },
    TradeAccept,
    TradeReject,
    TradeCounter {
        give: BTreeSet<String>,
        receive: BTreeSet<String>,
        cash: i64,
    },
    NoImprovement,
    Improve {
        assets: Vec<String>,
    },
    Buy,
    Pass,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::NoTrade => CommandKind::NoTrade,
            Command::TradePropose { .. } => CommandKind::TradePropose,
            Command::TradeAccept => CommandKind::TradeAccept,
            Command::TradeReject => CommandKind::TradeReject,
            Command::TradeCounter { .. } => CommandKind::TradeCounter,
            Command::NoImprovement => CommandKind::NoImprovement,
            Command::Improve { .. } => CommandKind::Improve,
            Command::Buy => CommandKind::Buy,
            Command::Pass => CommandKind::Pass,
        }
    }
}

fn list(set: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    set.into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders the command in wire form, e.g. `TRADE_COUNTER:Boardwalk:Park Place:500`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.kind().token();
        match self {
            Command::TradePropose {
                target,
                give,
                receive,
                cash,
            } => write!(f, "{token}:{target}:{}:{}:{cash}", list(give), list(receive)),
            Command::TradeCounter {
                give,
                receive,
                cash,
            } => write!(f, "{token}:{}:{}:{cash}", list(give), list(receive)),
            Command::Improve { assets } => write!(f, "{token}:{}", list(assets)),
            _ => f.write_str(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lookup_is_case_insensitive() {
        assert_eq!(CommandKind::from_token("trade_accept"), Some(CommandKind::TradeAccept));
        assert_eq!(CommandKind::from_token(" NO_TRADE "), Some(CommandKind::NoTrade));
        assert_eq!(CommandKind::from_token("TRADE"), None);
    }

    #[test]
    fn every_kind_round_trips_its_token() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_token(kind.token()), Some(kind));
        }
    }

    #[test]
    fn wire_rendering() {
        let propose = Command::TradePropose {
            target: "Bob".to_string(),
            give: ["Park Place".to_string()].into(),
            receive: BTreeSet::new(),
            cash: 300,
        };
        assert_eq!(propose.to_string(), "TRADE_PROPOSE:Bob:Park Place::300");

        let improve = Command::Improve {
            assets: vec!["Park Place".to_string(), "Boardwalk".to_string()],
        };
        assert_eq!(improve.to_string(), "IMPROVE:Park Place,Boardwalk");
        assert_eq!(Command::TradeReject.to_string(), "TRADE_REJECT");
    }

    #[test]
    fn command_serializes_tagged() {
        let json = serde_json::to_value(Command::TradeAccept).unwrap();
        assert_eq!(json, serde_json::json!({"command": "trade_accept"}));
    }
}
