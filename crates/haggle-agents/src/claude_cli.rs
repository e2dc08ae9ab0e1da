use std::time::Duration;

use haggle_models::config::AgentConfig;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Longest stderr excerpt carried into an error.
const STDERR_EXCERPT: usize = 400;

/// How one participant's requests reach the `claude` CLI.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub program: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for ClaudeCliConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            program: config.cli_path.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

impl ClaudeCliConfig {
    /// Arguments for a single non-interactive, plain-text request.
    pub fn args<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str) -> [&'a str; 8] {
        [
            "-p",
            user_prompt,
            "--system-prompt",
            system_prompt,
            "--model",
            self.model.as_str(),
            "--output-format",
            "text",
        ]
    }
}

/// Ask the CLI once and return its stdout.
///
/// The child is killed if the timeout fires or the future is dropped.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, AgentError> {
    debug!(program = %config.program, model = %config.model, prompt_len = user_prompt.len(), "Invoking claude CLI");

    let output = tokio::time::timeout(
        config.timeout,
        Command::new(&config.program)
            .args(config.args(system_prompt, user_prompt))
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
    .map_err(|e| AgentError::Unavailable(format!("Failed to spawn {}: {e}", config.program)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
        warn!(status = %output.status, stderr = %excerpt, "Claude CLI failed");
        return Err(AgentError::Cli(format!("{} exited {}: {excerpt}", config.program, output.status)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if stdout.trim().is_empty() {
        return Err(AgentError::Cli("empty response".to_string()));
    }
    Ok(stdout)
}

/// Whether the default `claude` executable answers `--version`.
pub async fn check_cli_available() -> bool {
    program_available(&AgentConfig::default().cli_path).await
}

pub async fn program_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}
