//! Parser for the agent text protocol.
//!
//! Agents answer with a leading token, optionally followed by colon-separated
//! fields (`TRADE_PROPOSE:Bob:Park Place::300`). Real responses often carry
//! chatter around the command, so parsing:
//! - removes markdown emphasis and backticks,
//! - strips lead-ins such as `Decision:` or `My decision is:`,
//! - takes the first line that *starts* with a recognized token.
//!
//! Parsing never panics. Anything that cannot be turned into a command is an
//! [`Unparseable`], which callers treat as the safe no-op for their context.

use std::collections::BTreeSet;

use haggle_models::board::names_match;
use haggle_models::command::{Command, CommandKind};
use haggle_store::GameState;
use thiserror::Error;

const LEAD_INS: &[&str] = &[
    "my decision is:",
    "my decision:",
    "final answer:",
    "i choose:",
    "i will:",
    "decision:",
    "action:",
    "response:",
    "answer:",
];

const TRADE_KINDS: &[CommandKind] = &[CommandKind::NoTrade, CommandKind::TradePropose];
const IMPROVEMENT_KINDS: &[CommandKind] = &[CommandKind::NoImprovement, CommandKind::Improve];

/// Agent text that could not be turned into a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct Unparseable {
    pub reason: String,
    /// A line started with `TRADE_COUNTER` but its fields did not parse.
    pub attempted_counter: bool,
}

impl Unparseable {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempted_counter: false,
        }
    }
}

/// Both halves of a combined strategy answer, parsed independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedResponse {
    pub trade: Result<Command, Unparseable>,
    pub improvement: Result<Command, Unparseable>,
}

/// Canonical participant and asset names used to resolve what the agent typed.
#[derive(Debug, Clone, Default)]
pub struct KnownNames {
    participants: Vec<String>,
    assets: Vec<String>,
}

impl KnownNames {
    pub fn new<P, A>(participants: P, assets: A) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            participants: participants.into_iter().map(Into::into).collect(),
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_state(state: &GameState) -> Self {
        Self::new(
            state.participants().iter().map(|p| p.name.clone()),
            state.assets().iter().map(|a| a.name.clone()),
        )
    }

    pub fn participant(&self, name: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| names_match(p, name))
            .map(String::as_str)
    }

    pub fn asset(&self, name: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| names_match(a, name))
            .map(String::as_str)
    }
}

/// Parse the first recognized command in `raw`.
pub fn parse_command(raw: &str, names: &KnownNames) -> Result<Command, Unparseable> {
    parse_one_of(raw, names, &CommandKind::ALL)
}

/// Parse the first command in `raw` whose token is one of `allowed`.
///
/// Lines starting with other recognized tokens are passed over.
pub fn parse_one_of(
    raw: &str,
    names: &KnownNames,
    allowed: &[CommandKind],
) -> Result<Command, Unparseable> {
    let mut passed_over: Option<CommandKind> = None;

    for line in raw.lines() {
        let line = clean_line(line);
        let Some((kind, fields)) = leading_token(&line) else {
            continue;
        };
        if !allowed.contains(&kind) {
            passed_over.get_or_insert(kind);
            continue;
        }
        return parse_fields(kind, fields, names).map_err(|mut e| {
            e.attempted_counter = kind == CommandKind::TradeCounter;
            e
        });
    }

    let reason = if raw.trim().is_empty() {
        "empty response".to_string()
    } else if let Some(kind) = passed_over {
        format!("expected one of {}, got {}", tokens(allowed), kind.token())
    } else {
        "no recognized command".to_string()
    };
    Err(Unparseable::new(reason))
}

/// Parse a combined strategy answer with sections `A)` (trade) and `B)` (improvements).
///
/// Without both section markers, each half is looked up in the whole text.
pub fn parse_combined(raw: &str, names: &KnownNames) -> CombinedResponse {
    let (trade_text, improvement_text) = match split_sections(raw) {
        Some((a, b)) => (a, b),
        None => (raw.to_string(), raw.to_string()),
    };
    CombinedResponse {
        trade: parse_one_of(&trade_text, names, TRADE_KINDS),
        improvement: parse_one_of(&improvement_text, names, IMPROVEMENT_KINDS),
    }
}

fn tokens(kinds: &[CommandKind]) -> String {
    kinds
        .iter()
        .map(|k| k.token())
        .collect::<Vec<_>>()
        .join("/")
}

fn clean_line(line: &str) -> String {
    let stripped: String = line.chars().filter(|c| !matches!(c, '*' | '`')).collect();
    let mut rest = stripped
        .trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '-' | '>') || c.is_whitespace());

    loop {
        let before = rest.len();
        for lead in LEAD_INS {
            if rest
                .get(..lead.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(lead))
            {
                rest = rest[lead.len()..].trim_start();
            }
        }
        if rest.len() == before {
            break;
        }
    }
    rest.to_string()
}

/// A recognized token at the very start of `line`, and the text after its colon.
fn leading_token(line: &str) -> Option<(CommandKind, &str)> {
    let end = line
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
        .unwrap_or(line.len());
    let kind = CommandKind::from_token(&line[..end])?;
    let fields = line[end..]
        .trim_start()
        .strip_prefix(':')
        .map(str::trim)
        .unwrap_or("");
    Some((kind, fields))
}

/// `A)` or `B)` at the start of a line; returns what follows the marker.
fn section_marker(line: &str, letter: char) -> Option<&str> {
    let line = line.trim_start_matches(|c: char| matches!(c, '*' | '#') || c.is_whitespace());
    let mut chars = line.chars();
    let first = chars.next()?;
    if first.eq_ignore_ascii_case(&letter) && chars.next() == Some(')') {
        Some(&line[2..])
    } else {
        None
    }
}

fn split_sections(raw: &str) -> Option<(String, String)> {
    let mut a: Option<String> = None;
    let mut b: Option<String> = None;

    for line in raw.lines() {
        if let Some(rest) = section_marker(line, 'A') {
            a = Some(format!("{rest}\n"));
            continue;
        }
        if let Some(rest) = section_marker(line, 'B') {
            b = Some(format!("{rest}\n"));
            continue;
        }
        // continuation lines belong to the most recently opened section
        let current = if b.is_some() { b.as_mut() } else { a.as_mut() };
        if let Some(section) = current {
            section.push_str(line);
            section.push('\n');
        }
    }

    a.zip(b)
}

fn parse_fields(kind: CommandKind, fields: &str, names: &KnownNames) -> Result<Command, Unparseable> {
    match kind {
        CommandKind::NoTrade => Ok(Command::NoTrade),
        CommandKind::TradeAccept => Ok(Command::TradeAccept),
        CommandKind::TradeReject => Ok(Command::TradeReject),
        CommandKind::NoImprovement => Ok(Command::NoImprovement),
        CommandKind::Buy => Ok(Command::Buy),
        CommandKind::Pass => Ok(Command::Pass),
        CommandKind::TradePropose => {
            let parts: Vec<&str> = fields.split(':').collect();
            if fields.is_empty() || parts.len() < 3 {
                return Err(Unparseable::new(format!(
                    "TRADE_PROPOSE needs target, give and receive fields, got '{fields}'"
                )));
            }
            let target = names
                .participant(clean_name(parts[0]))
                .ok_or_else(|| Unparseable::new(format!("unknown participant '{}'", parts[0].trim())))?;
            Ok(Command::TradePropose {
                target: target.to_string(),
                give: asset_set(parts[1], names)?,
                receive: asset_set(parts[2], names)?,
                cash: parse_cash(parts.get(3).copied()),
            })
        }
        CommandKind::TradeCounter => {
            let parts: Vec<&str> = fields.split(':').collect();
            if fields.is_empty() || parts.len() < 2 {
                return Err(Unparseable::new(format!(
                    "TRADE_COUNTER needs give and receive fields, got '{fields}'"
                )));
            }
            Ok(Command::TradeCounter {
                give: asset_set(parts[0], names)?,
                receive: asset_set(parts[1], names)?,
                cash: parse_cash(parts.get(2).copied()),
            })
        }
        CommandKind::Improve => {
            let assets: Vec<String> = split_list(fields)
                .map(|name| {
                    names
                        .asset(name)
                        .map(str::to_string)
                        .unwrap_or_else(|| name.to_string())
                })
                .collect();
            if assets.is_empty() {
                return Err(Unparseable::new("IMPROVE without any asset names"));
            }
            Ok(Command::Improve { assets })
        }
    }
}

fn clean_name(name: &str) -> &str {
    name.trim().trim_end_matches('.').trim_end()
}

fn split_list(field: &str) -> impl Iterator<Item = &str> {
    field.split(',').map(clean_name).filter(|s| !s.is_empty())
}

fn asset_set(field: &str, names: &KnownNames) -> Result<BTreeSet<String>, Unparseable> {
    split_list(field)
        .map(|name| {
            names
                .asset(name)
                .map(str::to_string)
                .ok_or_else(|| Unparseable::new(format!("unknown asset '{name}'")))
        })
        .collect()
}

/// Leading signed integer of the field; anything else is 0, including values
/// whose negation does not fit.
fn parse_cash(field: Option<&str>) -> i64 {
    let Some(field) = field else {
        return 0;
    };
    let compact: String = field
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_') && !c.is_whitespace())
        .collect();
    let sign_len = usize::from(compact.starts_with(|c| c == '-' || c == '+'));
    let digits_end = compact[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(compact.len(), |i| i + sign_len);
    compact[..digits_end]
        .parse::<i64>()
        .ok()
        .filter(|c| c.checked_neg().is_some())
        .unwrap_or(0)
}
