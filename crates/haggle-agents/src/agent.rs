use std::sync::Arc;

use async_trait::async_trait;
use haggle_models::agent_message::{Conversation, Conversations};
use haggle_models::board::names_match;
use haggle_models::config::AgentConfig;
use tracing::{debug, warn};

use crate::claude_cli::{invoke_claude, ClaudeCliConfig};
use crate::error::AgentError;
use crate::prompts::system_prompt;
use crate::recorder::Recorder;

/// Answer that declines everything: no trade, no building, reject, pass.
///
/// Valid in every prompt context because each parser takes the first line
/// carrying a token it expects.
pub const SAFE_RESPONSE: &str = "A) NO_TRADE\nB) NO_IMPROVEMENT\nTRADE_REJECT\nPASS";

/// The decision-maker behind one participant. Mockable for testing.
///
/// Agents are stateless: the engine owns each participant's history and
/// passes it in with every request.
#[async_trait]
pub trait DecisionAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn ask(&self, prompt: &str, conversation: &Conversation) -> Result<String, AgentError>;
}

/// An agent backed by the `claude` CLI.
pub struct ClaudeAgent {
    pub name: String,
    pub cli_config: ClaudeCliConfig,
    pub system_prompt: String,
    /// Exchanges of history replayed into each prompt.
    pub history_window: usize,
}

impl ClaudeAgent {
    pub fn new(name: impl Into<String>, config: &AgentConfig, history_window: usize) -> Self {
        Self {
            name: name.into(),
            cli_config: ClaudeCliConfig::from(config),
            system_prompt: config
                .system_prompt_override
                .clone()
                .unwrap_or_else(system_prompt),
            history_window,
        }
    }

    /// The user prompt actually sent: recent history, then the new request.
    pub fn render_prompt(&self, prompt: &str, conversation: &Conversation) -> String {
        let recent = conversation.recent(self.history_window);
        if recent.is_empty() {
            return prompt.to_string();
        }

        let mut out = String::from("Earlier in this game (oldest first):\n");
        for exchange in recent {
            out.push_str("\n[asked]\n");
            out.push_str(exchange.prompt.trim_end());
            out.push_str("\n[you answered]\n");
            out.push_str(exchange.response.trim_end());
            out.push('\n');
        }
        out.push_str("\n---\n\n");
        out.push_str(prompt);
        out
    }
}

#[async_trait]
impl DecisionAgent for ClaudeAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, prompt: &str, conversation: &Conversation) -> Result<String, AgentError> {
        let user_prompt = self.render_prompt(prompt, conversation);
        invoke_claude(&self.system_prompt, &user_prompt, &self.cli_config).await
    }
}

/// Declines every decision. Used for seats without an external agent.
pub struct PassiveAgent {
    pub name: String,
}

impl PassiveAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl DecisionAgent for PassiveAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, _prompt: &str, _conversation: &Conversation) -> Result<String, AgentError> {
        Ok(SAFE_RESPONSE.to_string())
    }
}

/// The agent seated for each participant.
#[derive(Default, Clone)]
pub struct Seats {
    agents: Vec<(String, Arc<dyn DecisionAgent>)>,
}

impl Seats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat `agent` for `participant`, replacing any agent already there.
    pub fn insert(&mut self, participant: impl Into<String>, agent: Arc<dyn DecisionAgent>) {
        let participant = participant.into();
        match self.agents.iter_mut().find(|(name, _)| names_match(name, &participant)) {
            Some(slot) => slot.1 = agent,
            None => self.agents.push((participant, agent)),
        }
    }

    pub fn get(&self, participant: &str) -> Option<&Arc<dyn DecisionAgent>> {
        self.agents
            .iter()
            .find(|(name, _)| names_match(name, participant))
            .map(|(_, agent)| agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Ask `participant`'s agent one question.
///
/// On success the exchange is appended to the participant's conversation and
/// to the transcript. Failures are recorded in the transcript only.
pub async fn consult(
    seats: &Seats,
    conversations: &mut Conversations,
    recorder: &Recorder,
    participant: &str,
    prompt: &str,
) -> Result<String, AgentError> {
    let agent = seats
        .get(participant)
        .ok_or_else(|| AgentError::NoSeat(participant.to_string()))?;

    debug!(participant, agent = agent.name(), prompt = %prompt, "Consulting agent");
    let conversation = conversations.entry(participant);
    match agent.ask(prompt, conversation).await {
        Ok(text) => {
            conversation.push(prompt, text.as_str());
            recorder.exchange(participant, prompt, &text);
            Ok(text)
        }
        Err(e) => {
            warn!(participant, error = %e, "Agent request failed");
            recorder.exchange(participant, prompt, &format!("ERROR: {e}"));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_combined, parse_command, parse_one_of, KnownNames};
    use crate::test_support::{FailingAgent, ScriptedAgent};
    use haggle_models::command::{Command, CommandKind};

    fn agent(window: usize) -> ClaudeAgent {
        ClaudeAgent::new("Alice", &AgentConfig::default(), window)
    }

    #[test]
    fn empty_history_sends_prompt_as_is() {
        let rendered = agent(10).render_prompt("Your move", &Conversation::new());
        assert_eq!(rendered, "Your move");
    }

    #[test]
    fn history_is_windowed() {
        let mut conversation = Conversation::new();
        for i in 0..5 {
            conversation.push(format!("question {i}"), format!("answer {i}"));
        }
        let rendered = agent(2).render_prompt("Your move", &conversation);
        assert!(!rendered.contains("question 2"));
        assert!(rendered.contains("question 3"));
        assert!(rendered.contains("answer 4"));
        assert!(rendered.ends_with("Your move"));
    }

    #[test]
    fn override_replaces_system_prompt() {
        let config = AgentConfig {
            system_prompt_override: Some("Be terse.".to_string()),
            ..AgentConfig::default()
        };
        let agent = ClaudeAgent::new("Bob", &config, 3);
        assert_eq!(agent.system_prompt, "Be terse.");
        assert!(ClaudeAgent::new("Bob", &AgentConfig::default(), 3)
            .system_prompt
            .contains("TRADE_PROPOSE"));
    }

    #[tokio::test]
    async fn passive_answer_is_a_no_op_everywhere() {
        let passive = PassiveAgent::new("Carol");
        let text = passive.ask("anything", &Conversation::new()).await.unwrap();
        let names = KnownNames::default();

        let combined = parse_combined(&text, &names);
        assert_eq!(combined.trade.unwrap(), Command::NoTrade);
        assert_eq!(combined.improvement.unwrap(), Command::NoImprovement);
        assert_eq!(parse_command(&text, &names).unwrap(), Command::TradeReject);
        assert_eq!(
            parse_one_of(&text, &names, &[CommandKind::Buy, CommandKind::Pass]).unwrap(),
            Command::Pass
        );
    }

    #[test]
    fn seats_resolve_case_insensitively() {
        let mut seats = Seats::new();
        seats.insert("Alice", Arc::new(PassiveAgent::new("Alice")));
        seats.insert("ALICE", Arc::new(PassiveAgent::new("replacement")));
        assert_eq!(seats.len(), 1);
        assert_eq!(seats.get("alice").unwrap().name(), "replacement");
        assert!(seats.get("Bob").is_none());
    }

    #[tokio::test]
    async fn consult_records_successful_exchange() {
        let mut seats = Seats::new();
        let scripted = Arc::new(ScriptedAgent::new("Bob", ["TRADE_ACCEPT"]));
        seats.insert("Bob", scripted.clone());
        let mut conversations = Conversations::new();
        let recorder = Recorder::in_memory();

        let text = consult(&seats, &mut conversations, &recorder, "Bob", "Deal?")
            .await
            .unwrap();
        assert_eq!(text, "TRADE_ACCEPT");
        assert_eq!(conversations.get("Bob").unwrap().len(), 1);
        assert_eq!(recorder.entries().len(), 1);
    }

    #[tokio::test]
    async fn consult_failure_leaves_conversation_untouched() {
        let mut seats = Seats::new();
        seats.insert("Bob", Arc::new(FailingAgent::new("Bob")));
        let mut conversations = Conversations::new();
        let recorder = Recorder::in_memory();

        let result = consult(&seats, &mut conversations, &recorder, "Bob", "Deal?").await;
        assert!(result.is_err());
        assert!(conversations.get("Bob").map_or(true, |c| c.is_empty()));
        assert!(recorder.entries()[0].response.starts_with("ERROR:"));

        let missing = consult(&seats, &mut conversations, &recorder, "Zed", "Deal?").await;
        assert!(matches!(missing, Err(AgentError::NoSeat(_))));
    }
}
