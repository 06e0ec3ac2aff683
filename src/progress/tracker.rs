use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{ProgressData, ProgressGoal, ScoreDataPoint};
use crate::history::ScanHistory;
use crate::storage::Repository;

/// Owns the goal list and builds progress snapshots from history.
pub struct ProgressTracker {
    goals: Vec<ProgressGoal>,
    repo: Box<dyn Repository<Vec<ProgressGoal>>>,
}

impl ProgressTracker {
    /// Restore goals from `repo`, seeding sample goals on first run or when
    /// the stored list cannot be decoded.
    pub fn load(repo: impl Repository<Vec<ProgressGoal>> + 'static) -> Self {
        let stored = match repo.load() {
            Ok(goals) => goals,
            Err(e) => {
                warn!("Failed to load goals, reseeding defaults: {:#}", e);
                None
            }
        };

        let mut tracker = Self {
            goals: Vec::new(),
            repo: Box::new(repo),
        };
        match stored {
            Some(goals) => tracker.goals = goals,
            None => {
                tracker.goals = default_goals();
                info!("Seeded {} default goals", tracker.goals.len());
                tracker.persist();
            }
        }
        tracker
    }

    pub fn goals(&self) -> &[ProgressGoal] {
        &self.goals
    }

    pub fn active_goals(&self) -> Vec<&ProgressGoal> {
        self.goals.iter().filter(|g| !g.is_completed).collect()
    }

    pub fn completed_goals_count(&self) -> usize {
        self.goals.iter().filter(|g| g.is_completed).count()
    }

    pub fn add_goal(&mut self, goal: ProgressGoal) {
        self.goals.push(goal);
        self.persist();
    }

    /// Replace the goal with the same id. Returns false if there is none.
    pub fn update_goal(&mut self, goal: ProgressGoal) -> bool {
        match self.goals.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => {
                *existing = goal;
                self.persist();
                true
            }
            None => false,
        }
    }

    pub fn delete_goal(&mut self, id: Uuid) {
        self.goals.retain(|g| g.id != id);
        self.persist();
    }

    /// Chart points for every stored scan, oldest first.
    pub fn score_history(&self, history: &ScanHistory) -> Vec<ScoreDataPoint> {
        history
            .results()
            .iter()
            .rev()
            .map(|r| ScoreDataPoint {
                date: r.captured_at,
                score: r.primary_confidence() * 100.0,
            })
            .collect()
    }

    pub fn generate_progress_data(&self, history: &ScanHistory) -> ProgressData {
        ProgressData {
            total_scans: history.total_scans(),
            average_score: history.average_score(),
            current_streak: history.current_streak(),
            completed_goals: self.completed_goals_count(),
            recent_scans: history.recent_scans(),
            score_history: self.score_history(history),
            goals: self.goals.clone(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.goals) {
            warn!("Failed to persist goals: {:#}", e);
        }
    }
}

fn default_goals() -> Vec<ProgressGoal> {
    let now = Utc::now();
    vec![
        ProgressGoal::new(
            "Reduce Acne",
            "Clear skin in 30 days",
            0.3,
            now + Duration::days(23),
        ),
        ProgressGoal::new(
            "Improve Hydration",
            "Better moisture levels",
            0.6,
            now + Duration::days(45),
        ),
        ProgressGoal::new(
            "Even Skin Tone",
            "Reduce dark spots",
            1.0,
            now - Duration::days(5),
        )
        .completed(),
    ]
}
