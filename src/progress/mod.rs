pub mod tracker;
pub mod types;

pub use tracker::ProgressTracker;
pub use types::{GoalStatus, ProgressData, ProgressGoal, ScoreBand, ScoreDataPoint};
