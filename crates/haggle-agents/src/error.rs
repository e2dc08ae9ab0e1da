use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Agent timed out after {0} seconds")]
    Timeout(u64),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("No agent seated for {0}")]
    NoSeat(String),
}
