pub mod agent_message;
pub mod board;
pub mod command;
pub mod config;
pub mod negotiation;
pub mod scenario;
pub mod trade_offer;
pub mod transcript;
pub mod turn;

pub use agent_message::{Conversation, Conversations, Exchange};
pub use board::{names_match, Asset, BuildingSupply, Group, Participant, MAX_IMPROVEMENT_LEVEL};
pub use command::{Command, CommandKind};
pub use config::{AgentConfig, EngineConfig, HaggleConfig, TranscriptConfig};
pub use negotiation::{NegotiationOutcome, TradeRecord};
pub use scenario::{AgentKind, AssetSetup, GroupSetup, ParticipantSetup, ScenarioConfig};
pub use trade_offer::TradeOffer;
pub use transcript::{TranscriptEntry, TranscriptKind};
pub use turn::{SkipReason, StrategyDecision, TurnReport, TurnStrategyResult};
