//! Integration tests that invoke the real Claude CLI.
//!
//! These tests are `#[ignore]` by default. They require:
//! - The `claude` CLI installed and on PATH
//! - Valid Anthropic credentials configured
//!
//! Run explicitly with:
//! ```bash
//! cargo test -p haggle-agents --test cli_integration -- --ignored
//! ```

use std::time::Duration;

use haggle_agents::claude_cli::{check_cli_available, invoke_claude, ClaudeCliConfig};
use haggle_agents::parser::{parse_combined, parse_command, KnownNames};
use haggle_agents::prompts::system_prompt;
use haggle_agents::test_support::sample_board;
use haggle_agents::{ClaudeAgent, DecisionAgent};
use haggle_models::agent_message::Conversation;
use haggle_models::command::Command;
use haggle_models::config::AgentConfig;

#[tokio::test]
#[ignore]
async fn cli_is_available() {
    assert!(
        check_cli_available().await,
        "claude CLI not found on PATH"
    );
}

/// The CLI's plain-text output must still reach the command parser intact.
#[tokio::test]
#[ignore]
async fn cli_output_parses_as_a_command() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let config = ClaudeCliConfig {
        model: "claude-3-5-haiku-latest".to_string(),
        timeout: Duration::from_secs(30),
        ..ClaudeCliConfig::default()
    };
    let raw = invoke_claude(&system_prompt(), "Reply with exactly: NO_TRADE", &config)
        .await
        .expect("Claude CLI invocation failed");

    let names = KnownNames::from_state(&sample_board());
    let cmd = parse_command(&raw, &names).unwrap_or_else(|e| {
        panic!("CLI output no longer parses ({e}).\nRaw output:\n---\n{raw}\n---")
    });
    assert_eq!(cmd, Command::NoTrade);
}

/// A real strategy answer should yield both sections, whatever they decide.
#[tokio::test]
#[ignore]
async fn claude_agent_answers_a_strategy_prompt() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let state = sample_board();
    let agent = ClaudeAgent::new("Alice", &AgentConfig::default(), 10);
    let prompt = haggle_agents::prompts::strategy_prompt(&state, "Alice", 1, 0);
    let raw = agent
        .ask(&prompt, &Conversation::new())
        .await
        .expect("strategy request failed");

    let combined = parse_combined(&raw, &KnownNames::from_state(&state));
    assert!(
        combined.trade.is_ok() || combined.improvement.is_ok(),
        "Neither section parsed. Raw output:\n---\n{raw}\n---"
    );
}

#[tokio::test]
#[ignore]
async fn cli_reports_errors_for_invalid_model() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let config = ClaudeCliConfig {
        model: "nonexistent-model-12345".to_string(),
        timeout: Duration::from_secs(15),
        ..ClaudeCliConfig::default()
    };

    let result = invoke_claude("You are a test.", "hello", &config).await;

    assert!(
        result.is_err(),
        "Expected error for invalid model, got: {:?}",
        result.unwrap()
    );
}
