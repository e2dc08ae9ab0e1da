use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One prompt sent to a decision agent and the text it returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
    pub at: DateTime<Utc>,
}

/// Running history for one participant's agent.
///
/// Passed explicitly to the agent boundary; agents hold no session state of
/// their own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub exchanges: Vec<Exchange>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.exchanges.push(Exchange {
            prompt: prompt.into(),
            response: response.into(),
            at: Utc::now(),
        });
    }

    /// The last `window` exchanges, oldest first.
    pub fn recent(&self, window: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(window);
        &self.exchanges[start..]
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

/// Conversation per participant name. Lookups ignore ASCII case and
/// surrounding whitespace, like every other participant name on the board.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Conversations {
    by_participant: HashMap<String, Conversation>,
}

impl Conversations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, participant: &str) -> Option<&Conversation> {
        self.by_participant.get(&key(participant))
    }

    pub fn entry(&mut self, participant: &str) -> &mut Conversation {
        self.by_participant.entry(key(participant)).or_default()
    }
}

fn key(participant: &str) -> String {
    participant.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_window_returns_tail() {
        let mut convo = Conversation::new();
        for i in 0..5 {
            convo.push(format!("prompt {i}"), format!("reply {i}"));
        }

        let tail = convo.recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].prompt, "prompt 3");
        assert_eq!(tail[1].response, "reply 4");

        assert_eq!(convo.recent(50).len(), 5);
        assert!(convo.recent(0).is_empty());
    }

    #[test]
    fn conversations_are_per_participant() {
        let mut all = Conversations::new();
        all.entry("Alice").push("hi", "NO_TRADE");
        all.entry("Alice").push("again", "TRADE_REJECT");
        all.entry("Bob").push("hello", "PASS");

        assert_eq!(all.get("Alice").map(Conversation::len), Some(2));
        assert_eq!(all.get("Bob").map(Conversation::len), Some(1));
        assert!(all.get("Carol").is_none());
    }

    #[test]
    fn name_spelling_shares_one_history() {
        let mut all = Conversations::new();
        all.entry("bob").push("hello", "PASS");
        all.entry(" BOB ").push("again", "BUY");

        assert_eq!(all.get("Bob").map(Conversation::len), Some(2));
        assert_eq!(all.get("bob"), all.get("Bob"));
    }

    #[test]
    fn roundtrip_conversation() {
        let mut convo = Conversation::new();
        convo.push("A) trade? B) improve?", "A) NO_TRADE\nB) NO_IMPROVEMENT");
        let json = serde_json::to_string(&convo).unwrap();
        let parsed: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(convo, parsed);
    }
}
