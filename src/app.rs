//! Composition root: wires config, storage, backend and stores together.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use crate::analyzer::{Backend, ScanResult, SkinCondition};
use crate::config::SkinTrackConfig;
use crate::credentials;
use crate::error::AppError;
use crate::history::{ScanHistory, SharedHistory};
use crate::ingredients::{FavoritesStore, Ingredient, IngredientCatalog};
use crate::progress::{ProgressData, ProgressGoal, ProgressTracker};
use crate::scan::{ScanOrchestrator, ScanOutcome};
use crate::storage::{
    JsonFileRepository, KvRepository, KvStore, Repository, FAVORITE_INGREDIENTS_KEY,
    PROGRESS_GOALS_KEY, SCAN_HISTORY_KEY,
};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "skintrack.db";

pub struct SkinTrack {
    orchestrator: ScanOrchestrator<Backend>,
    history: SharedHistory,
    progress: Mutex<ProgressTracker>,
    catalog: IngredientCatalog,
    favorites: Mutex<FavoritesStore>,
}

impl SkinTrack {
    /// Open the app with its database under the configured data directory and
    /// the API key from the environment or keychain.
    pub fn open(config: &SkinTrackConfig) -> Result<Self, AppError> {
        let data_dir = config
            .resolve_data_dir()
            .ok_or_else(|| AppError::Config("Could not determine data directory".to_string()))?;
        let db_path = data_dir.join(DB_FILE_NAME);

        let store = KvStore::open(&db_path).map_err(|e| AppError::Storage(format!("{:#}", e)))?;
        Self::with_store(config, Arc::new(store), credentials::resolve_api_key())
    }

    /// Open against a throwaway in-memory database.
    pub fn in_memory(config: &SkinTrackConfig, api_key: Option<String>) -> Result<Self, AppError> {
        let store = KvStore::open_in_memory().map_err(|e| AppError::Storage(format!("{:#}", e)))?;
        Self::with_store(config, Arc::new(store), api_key)
    }

    pub fn with_store(
        config: &SkinTrackConfig,
        store: Arc<KvStore>,
        api_key: Option<String>,
    ) -> Result<Self, AppError> {
        let backend = Backend::from_config(&config.analysis, &config.user, api_key)?;

        let history = ScanHistory::load(KvRepository::new(store.clone(), SCAN_HISTORY_KEY)).into_shared();
        let progress = ProgressTracker::load(KvRepository::new(store.clone(), PROGRESS_GOALS_KEY));
        let favorites = FavoritesStore::load(KvRepository::new(store, FAVORITE_INGREDIENTS_KEY));

        let orchestrator = ScanOrchestrator::new(backend, history.clone())
            .with_timeout(config.analysis.scan_timeout());

        info!("SkinTrack ready");
        Ok(Self {
            orchestrator,
            history,
            progress: Mutex::new(progress),
            catalog: IngredientCatalog::builtin(),
            favorites: Mutex::new(favorites),
        })
    }

    pub fn orchestrator(&self) -> &ScanOrchestrator<Backend> {
        &self.orchestrator
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub async fn scan(&self, image_bytes: &[u8]) -> ScanOutcome {
        self.orchestrator.run_analysis(image_bytes).await
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    pub fn progress_data(&self) -> ProgressData {
        let progress = self.lock_progress();
        let history = self.lock_history();
        progress.generate_progress_data(&history)
    }

    pub fn goals(&self) -> Vec<ProgressGoal> {
        self.lock_progress().goals().to_vec()
    }

    pub fn add_goal(&self, goal: ProgressGoal) {
        self.lock_progress().add_goal(goal);
    }

    pub fn update_goal(&self, goal: ProgressGoal) -> bool {
        self.lock_progress().update_goal(goal)
    }

    pub fn delete_goal(&self, id: Uuid) {
        self.lock_progress().delete_goal(id);
    }

    /// Write the scan history to a standalone JSON file.
    pub fn export_history(&self, path: &Path) -> anyhow::Result<usize> {
        let results = self.lock_history().results().to_vec();
        JsonFileRepository::<Vec<ScanResult>>::new(path)
            .save(&results)
            .with_context(|| format!("Failed to export history to {:?}", path))?;
        info!("Exported {} scans to {:?}", results.len(), path);
        Ok(results.len())
    }

    pub fn catalog(&self) -> &IngredientCatalog {
        &self.catalog
    }

    /// Catalog entries for a result's recommended ingredients.
    pub fn recommended_ingredients(&self, result: &ScanResult) -> Vec<&Ingredient> {
        self.catalog.resolve(&result.recommended_ingredients)
    }

    pub fn ingredients_for(&self, condition: SkinCondition) -> Vec<&Ingredient> {
        self.catalog.for_condition(condition)
    }

    /// Returns true if the ingredient is now a favorite.
    pub fn toggle_favorite(&self, name: &str) -> bool {
        self.lock_favorites().toggle(name)
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.lock_favorites().is_favorite(name)
    }

    pub fn favorite_ingredients(&self) -> Vec<String> {
        self.lock_favorites().names().map(str::to_string).collect()
    }

    fn lock_favorites(&self) -> MutexGuard<'_, FavoritesStore> {
        self.favorites.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_history(&self) -> MutexGuard<'_, ScanHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_progress(&self) -> MutexGuard<'_, ProgressTracker> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
