pub mod error;
pub mod improve;
pub mod ledger;
pub mod state;
pub mod transcript;

pub mod test_support;

pub use error::StoreError;
pub use improve::{
    check_improvement, execute_improvements, improvable_assets, improve, Improvement,
    ImprovementReport, ImprovementSkip,
};
pub use ledger::{commit, validate, validate_structure, CommitError, CommitReceipt, Infeasible};
pub use state::GameState;
pub use transcript::TranscriptLog;
