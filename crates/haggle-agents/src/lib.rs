pub mod agent;
pub mod claude_cli;
pub mod error;
pub mod negotiation;
pub mod parser;
pub mod prompts;
pub mod purchase;
pub mod recorder;
pub mod scheduler;

pub mod test_support;

pub use agent::{consult, ClaudeAgent, DecisionAgent, PassiveAgent, Seats, SAFE_RESPONSE};
pub use error::AgentError;
pub use negotiation::{NegotiationSession, NegotiationState, Negotiator};
pub use parser::{parse_combined, parse_command, parse_one_of, CombinedResponse, KnownNames, Unparseable};
pub use purchase::{PurchaseAdvisor, PurchaseDecision};
pub use recorder::Recorder;
pub use scheduler::Scheduler;
