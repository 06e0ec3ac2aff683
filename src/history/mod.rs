pub mod store;
pub mod types;

pub use store::{ScanHistory, SharedHistory, MAX_HISTORY_SIZE, RECENT_SCANS_LIMIT};
pub use types::ScanHistoryItem;
