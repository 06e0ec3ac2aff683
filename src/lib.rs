pub mod analyzer;
pub mod app;
pub mod config;
pub mod credentials;
mod error;
pub mod history;
pub mod ingredients;
pub mod progress;
pub mod scan;
pub mod storage;
pub mod user;

pub use analyzer::{AnalysisBackend, Backend, ConditionScore, ScanResult, SkinCondition};
pub use app::SkinTrack;
pub use config::SkinTrackConfig;
pub use error::{AnalysisError, AppError};
pub use history::{ScanHistory, ScanHistoryItem, SharedHistory};
pub use ingredients::{FavoritesStore, Ingredient, IngredientCatalog};
pub use progress::{ProgressData, ProgressGoal, ProgressTracker};
pub use scan::{ScanOrchestrator, ScanOutcome};
pub use user::UserContext;

/// Install the global `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
