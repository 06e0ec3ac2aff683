use std::sync::{Arc, Mutex};

use chrono::{Days, Local, NaiveDate};
use tracing::{info, warn};

use super::types::ScanHistoryItem;
use crate::analyzer::ScanResult;
use crate::storage::Repository;

/// Maximum number of scans kept in history.
pub const MAX_HISTORY_SIZE: usize = 50;

/// Number of scans summarized by `recent_scans`.
pub const RECENT_SCANS_LIMIT: usize = 10;

/// History shared between the orchestrator (writer) and progress views.
pub type SharedHistory = Arc<Mutex<ScanHistory>>;

/// Bounded, newest-first log of completed scans.
///
/// Every mutation is persisted immediately. Persistence is best-effort:
/// failures are logged and the in-memory list stays authoritative.
pub struct ScanHistory {
    results: Vec<ScanResult>,
    last_result: Option<ScanResult>,
    repo: Box<dyn Repository<Vec<ScanResult>>>,
}

impl ScanHistory {
    /// Restore history from `repo`. Unreadable data yields an empty history.
    pub fn load(repo: impl Repository<Vec<ScanResult>> + 'static) -> Self {
        let results = match repo.load() {
            Ok(Some(results)) => {
                info!("Loaded {} scans from history", results.len());
                results
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load scan history, starting empty: {:#}", e);
                Vec::new()
            }
        };

        Self {
            last_result: results.first().cloned(),
            results,
            repo: Box::new(repo),
        }
    }

    pub fn into_shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    /// Insert `result` as the newest scan, evicting beyond `MAX_HISTORY_SIZE`.
    pub fn add(&mut self, result: ScanResult) {
        self.last_result = Some(result.clone());
        self.results.insert(0, result);
        self.results.truncate(MAX_HISTORY_SIZE);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.last_result = None;
        self.persist();
    }

    /// All stored scans, newest first.
    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    pub fn total_scans(&self) -> usize {
        self.results.len()
    }

    /// Mean of each scan's first-score confidence, scaled to 0-100.
    ///
    /// Scans without scores add nothing to the sum but still count toward
    /// the denominator.
    pub fn average_score(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .results
            .iter()
            .filter_map(|r| r.primary_score().map(|s| s.confidence()))
            .sum();
        total / self.results.len() as f64 * 100.0
    }

    /// Summaries of the newest scans.
    ///
    /// The score reads the first score while the concern reads the most
    /// confident one; they intentionally look at different entries.
    pub fn recent_scans(&self) -> Vec<ScanHistoryItem> {
        self.results
            .iter()
            .take(RECENT_SCANS_LIMIT)
            .enumerate()
            .map(|(index, result)| {
                let score = result.display_score();
                let improvement_from_last = self
                    .results
                    .get(index + 1)
                    .map(|older| score - older.display_score())
                    .unwrap_or(0);

                ScanHistoryItem {
                    date: result.captured_at,
                    score,
                    primary_concern: result.highest_score().map(|s| s.condition),
                    improvement_from_last,
                }
            })
            .collect()
    }

    /// Consecutive days with at least one scan, ending today (local time).
    pub fn current_streak(&self) -> usize {
        self.current_streak_on(Local::now().date_naive())
    }

    /// Streak ending on `today`.
    ///
    /// Walks newest-first with a day cursor: a scan on the cursor day counts
    /// and moves the cursor back a day, a scan before the cursor ends the
    /// walk, and anything after the cursor (extra scans on an already counted
    /// day) is skipped.
    pub fn current_streak_on(&self, today: NaiveDate) -> usize {
        let mut streak = 0;
        let mut cursor = today;

        for result in &self.results {
            let scan_day = result.captured_at.with_timezone(&Local).date_naive();
            if scan_day == cursor {
                streak += 1;
                cursor = match cursor.checked_sub_days(Days::new(1)) {
                    Some(previous) => previous,
                    None => break,
                };
            } else if scan_day < cursor {
                break;
            }
        }

        streak
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.results) {
            warn!("Failed to persist scan history: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{ConditionScore, SkinCondition};
    use crate::storage::MemoryRepository;
    use chrono::{DateTime, TimeZone, Utc};

    fn result_with(confidences: &[(SkinCondition, f64)]) -> ScanResult {
        ScanResult::new(
            confidences
                .iter()
                .map(|(c, v)| ConditionScore::new(*c, *v))
                .collect(),
        )
    }

    fn primary(confidence: f64) -> ScanResult {
        result_with(&[(SkinCondition::Acne, confidence)])
    }

    /// Noon local time on `day`, as UTC.
    fn local_noon(day: NaiveDate) -> DateTime<Utc> {
        Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn days_before(day: NaiveDate, n: u64) -> NaiveDate {
        day.checked_sub_days(Days::new(n)).unwrap()
    }

    fn empty_history() -> (ScanHistory, MemoryRepository<Vec<ScanResult>>) {
        let repo = MemoryRepository::new();
        (ScanHistory::load(repo.clone()), repo)
    }

    #[test]
    fn test_add_inserts_newest_first_and_persists() {
        let (mut history, repo) = empty_history();
        let first = primary(0.1);
        let second = primary(0.2);

        history.add(first.clone());
        history.add(second.clone());

        assert_eq!(history.total_scans(), 2);
        assert_eq!(history.results()[0].id, second.id);
        assert_eq!(history.results()[1].id, first.id);
        assert_eq!(history.last_result().unwrap().id, second.id);

        let stored: Vec<ScanResult> = repo.load().unwrap().unwrap();
        assert_eq!(stored, history.results());
    }

    #[test]
    fn test_add_evicts_oldest_beyond_cap() {
        let (mut history, repo) = empty_history();
        let added: Vec<ScanResult> = (0..51).map(|i| primary(i as f64 / 100.0)).collect();
        for r in &added {
            history.add(r.clone());
        }

        assert_eq!(history.total_scans(), MAX_HISTORY_SIZE);
        let expected: Vec<_> = added.iter().rev().take(50).map(|r| r.id).collect();
        let actual: Vec<_> = history.results().iter().map(|r| r.id).collect();
        assert_eq!(actual, expected);
        assert!(!actual.contains(&added[0].id));

        let stored: Vec<ScanResult> = repo.load().unwrap().unwrap();
        assert_eq!(stored.len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_clear() {
        let (mut history, repo) = empty_history();
        history.add(primary(0.5));
        history.clear();

        assert_eq!(history.total_scans(), 0);
        assert!(history.last_result().is_none());
        assert_eq!(repo.raw().as_deref(), Some("[]"));
    }

    #[test]
    fn test_load_restores_and_sets_last_result() {
        let repo = MemoryRepository::new();
        let older = primary(0.3);
        let newer = primary(0.6);
        repo.save(&vec![newer.clone(), older.clone()]).unwrap();

        let history = ScanHistory::load(repo);
        assert_eq!(history.total_scans(), 2);
        assert_eq!(history.last_result().unwrap(), &newer);
    }

    #[test]
    fn test_load_corrupt_data_starts_empty() {
        let history = ScanHistory::load(MemoryRepository::<Vec<ScanResult>>::with_raw("{oops"));
        assert_eq!(history.total_scans(), 0);
        assert!(history.last_result().is_none());
    }

    #[test]
    fn test_average_score() {
        let (mut history, _repo) = empty_history();
        assert_eq!(history.average_score(), 0.0);

        history.add(primary(0.5));
        history.add(result_with(&[
            (SkinCondition::Redness, 0.25),
            (SkinCondition::Acne, 0.9),
        ]));
        assert!((history.average_score() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_average_counts_scans_without_scores() {
        let (mut history, _repo) = empty_history();
        history.add(primary(0.8));
        history.add(ScanResult::new(vec![]));
        assert!((history.average_score() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_scans_scores_and_concerns() {
        let (mut history, _repo) = empty_history();
        history.add(result_with(&[
            (SkinCondition::Acne, 0.40),
            (SkinCondition::Dryness, 0.70),
        ]));
        history.add(result_with(&[
            (SkinCondition::Acne, 0.55),
            (SkinCondition::Redness, 0.90),
        ]));
        history.add(ScanResult::new(vec![]));

        let recent = history.recent_scans();
        assert_eq!(recent.len(), 3);

        assert_eq!(recent[0].score, 0);
        assert_eq!(recent[0].primary_concern, None);
        assert_eq!(recent[0].improvement_from_last, -55);

        assert_eq!(recent[1].score, 55);
        assert_eq!(recent[1].primary_concern, Some(SkinCondition::Redness));
        assert_eq!(recent[1].improvement_from_last, 15);

        assert_eq!(recent[2].score, 40);
        assert_eq!(recent[2].primary_concern, Some(SkinCondition::Dryness));
        assert_eq!(recent[2].improvement_from_last, 0);
    }

    #[test]
    fn test_recent_scans_limit_uses_full_history_for_improvement() {
        let (mut history, _repo) = empty_history();
        for i in 0..12 {
            history.add(primary(0.10 + i as f64 * 0.05));
        }

        let recent = history.recent_scans();
        assert_eq!(recent.len(), RECENT_SCANS_LIMIT);
        // The tenth item still has an older neighbour outside the window.
        let last = recent.last().unwrap();
        assert_eq!(last.score, history.results()[9].display_score());
        assert_eq!(
            last.improvement_from_last,
            history.results()[9].display_score() - history.results()[10].display_score()
        );
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let (mut history, _repo) = empty_history();
        history.add(primary(0.5).with_captured_at(local_noon(days_before(today, 3))));
        history.add(primary(0.5).with_captured_at(local_noon(days_before(today, 1))));
        history.add(primary(0.5).with_captured_at(local_noon(today)));

        assert_eq!(history.current_streak_on(today), 2);
    }

    #[test]
    fn test_same_day_scans_count_once() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let (mut history, _repo) = empty_history();
        history.add(primary(0.5).with_captured_at(local_noon(today)));
        history.add(primary(0.6).with_captured_at(local_noon(today)));

        assert_eq!(history.current_streak_on(today), 1);
    }

    #[test]
    fn test_streak_with_repeats_on_consecutive_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let (mut history, _repo) = empty_history();
        for n in [2, 1, 1, 0, 0] {
            history.add(primary(0.5).with_captured_at(local_noon(days_before(today, n))));
        }

        // today, today, yesterday, yesterday, 2 days ago
        assert_eq!(history.current_streak_on(today), 3);
    }

    #[test]
    fn test_streak_zero_without_scan_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let (mut history, _repo) = empty_history();
        history.add(primary(0.5).with_captured_at(local_noon(days_before(today, 1))));

        assert_eq!(history.current_streak_on(today), 0);
        assert_eq!(empty_history().0.current_streak_on(today), 0);
    }

    #[test]
    fn test_history_round_trip() {
        let repo = MemoryRepository::new();
        let mut history = ScanHistory::load(repo.clone());
        history.add(
            result_with(&[(SkinCondition::Pores, 0.33), (SkinCondition::Texture, 0.8)])
                .with_analysis(Some("Fine texture".to_string()))
                .with_ingredients(vec!["Retinol".to_string()]),
        );
        history.add(primary(0.7));

        let reloaded = ScanHistory::load(repo);
        assert_eq!(reloaded.results(), history.results());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        struct FailingRepo;
        impl Repository<Vec<ScanResult>> for FailingRepo {
            fn load(&self) -> anyhow::Result<Option<Vec<ScanResult>>> {
                Ok(None)
            }
            fn save(&self, _value: &Vec<ScanResult>) -> anyhow::Result<()> {
                anyhow::bail!("disk full")
            }
        }

        let mut history = ScanHistory::load(FailingRepo);
        history.add(primary(0.4));
        assert_eq!(history.total_scans(), 1);
    }

    #[test]
    fn test_streak_uses_local_calendar_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let local_at = |day: NaiveDate, h: u32, m: u32| {
            Local
                .from_local_datetime(&day.and_hms_opt(h, m, 0).unwrap())
                .earliest()
                .unwrap()
                .with_timezone(&Utc)
        };

        // Less than an hour apart, but on consecutive local days
        let (mut history, _repo) = empty_history();
        history.add(primary(0.5).with_captured_at(local_at(days_before(today, 1), 23, 30)));
        history.add(primary(0.5).with_captured_at(local_at(today, 0, 15)));

        assert_eq!(history.current_streak_on(today), 2);
    }

    #[test]
    fn test_current_streak_counts_scan_taken_now() {
        let (mut history, _repo) = empty_history();
        history.add(primary(0.5));
        let scan_day = history.results()[0]
            .captured_at
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(history.current_streak_on(scan_day), 1);
    }
}
