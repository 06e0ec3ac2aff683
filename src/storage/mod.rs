//! Persistence for the scan history, goal list and favorite ingredients.
//!
//! Each store persists one value through a `Repository`. Reads and writes
//! report errors, but callers treat them as best-effort: in-memory state stays
//! authoritative for the session.

pub mod file;
pub mod kv;
pub mod memory;

use anyhow::Result;

pub use file::JsonFileRepository;
pub use kv::{KvRepository, KvStore};
pub use memory::MemoryRepository;

/// Key for the persisted scan history blob.
pub const SCAN_HISTORY_KEY: &str = "scan_history";

/// Key for the persisted goal list blob.
pub const PROGRESS_GOALS_KEY: &str = "progress_goals";

/// Key for the persisted favorite ingredient names.
pub const FAVORITE_INGREDIENTS_KEY: &str = "favorite_ingredients";

/// Load and save a single value.
pub trait Repository<T>: Send {
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<T>>;

    fn save(&self, value: &T) -> Result<()>;
}
