//! Test doubles for the agent boundary. The board fixture is re-exported
//! from the store.
//!
//! `ScriptedAgent` replays queued answers in order and remembers every
//! prompt it was shown, so tests can assert on both sides of the exchange.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use haggle_models::agent_message::Conversation;
pub use haggle_store::test_support::{sample_board, sample_scenario};

use crate::agent::{DecisionAgent, SAFE_RESPONSE};
use crate::error::AgentError;

/// Answers from a fixed queue. Once the queue is empty it declines everything.
pub struct ScriptedAgent {
    pub name: String,
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    history_lengths: Mutex<Vec<usize>>,
    calls: AtomicUsize,
}

impl ScriptedAgent {
    pub fn new<I>(name: &str, responses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.to_string(),
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            history_lengths: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Conversation length seen with each prompt.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.history_lengths
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl DecisionAgent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, prompt: &str, conversation: &Conversation) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Ok(mut lengths) = self.history_lengths.lock() {
            lengths.push(conversation.len());
        }
        let next = self
            .responses
            .lock()
            .map_err(|e| AgentError::Unavailable(format!("script poisoned: {e}")))?
            .pop_front();
        Ok(next.unwrap_or_else(|| SAFE_RESPONSE.to_string()))
    }
}

/// Fails every request, like a CLI that is missing or timing out.
pub struct FailingAgent {
    pub name: String,
    calls: AtomicUsize,
}

impl FailingAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionAgent for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ask(&self, _prompt: &str, _conversation: &Conversation) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AgentError::Timeout(45))
    }
}
