//! Skin analysis backends: a simulated analyzer and a remote vision model.

pub mod backend;
pub mod extraction;
pub mod prompts;
pub mod remote;
pub mod simulated;
pub mod types;

pub use backend::{AnalysisBackend, Backend};
pub use extraction::{parse_analysis_text, ParsedAnalysis};
pub use remote::RemoteBackend;
pub use simulated::SimulatedBackend;
pub use types::*;
