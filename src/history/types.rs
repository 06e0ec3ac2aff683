use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzer::SkinCondition;

/// Display summary of one scan for list views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryItem {
    pub date: DateTime<Utc>,
    /// First-score confidence scaled to 0-100, truncated.
    pub score: i32,
    /// Highest-confidence condition, if the scan had any scores.
    pub primary_concern: Option<SkinCondition>,
    /// Score difference against the next older scan (0 when none).
    pub improvement_from_last: i32,
}

impl ScanHistoryItem {
    /// Raw condition value, or "General" for scans without scores.
    pub fn primary_concern_label(&self) -> &'static str {
        self.primary_concern
            .as_ref()
            .map(SkinCondition::as_str)
            .unwrap_or("General")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_concern_label() {
        let mut item = ScanHistoryItem {
            date: Utc::now(),
            score: 50,
            primary_concern: Some(SkinCondition::DarkSpots),
            improvement_from_last: 0,
        };
        assert_eq!(item.primary_concern_label(), "darkSpots");

        item.primary_concern = None;
        assert_eq!(item.primary_concern_label(), "General");
    }
}
