use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::analyzer::clamp_confidence;
use crate::history::ScanHistoryItem;

/// A user-defined skincare goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressGoal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Fraction in [0,1].
    #[serde(deserialize_with = "deserialize_progress")]
    progress: f64,
    pub target_date: DateTime<Utc>,
    pub is_completed: bool,
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_confidence)
}

/// Coarse progress level of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalStatus {
    Completed,
    OnTrack,
    InProgress,
    Behind,
}

impl ProgressGoal {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        progress: f64,
        target_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            progress: clamp_confidence(progress),
            target_date,
            is_completed: false,
        }
    }

    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = clamp_confidence(progress);
    }

    pub fn status(&self) -> GoalStatus {
        if self.is_completed {
            GoalStatus::Completed
        } else if self.progress >= 0.7 {
            GoalStatus::OnTrack
        } else if self.progress >= 0.4 {
            GoalStatus::InProgress
        } else {
            GoalStatus::Behind
        }
    }
}

/// One point of the score chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDataPoint {
    pub date: DateTime<Utc>,
    /// Primary confidence scaled to 0-100.
    pub score: f64,
}

/// Band of a 0-100 display score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: i32) -> Self {
        match score {
            80..=100 => ScoreBand::Good,
            60..=79 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }
}

/// Snapshot of scan history and goals for the progress screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    pub total_scans: usize,
    pub average_score: f64,
    pub current_streak: usize,
    pub completed_goals: usize,
    pub recent_scans: Vec<ScanHistoryItem>,
    pub score_history: Vec<ScoreDataPoint>,
    pub goals: Vec<ProgressGoal>,
}

impl ProgressData {
    /// Mean of the newest five recent scores minus the mean of the five
    /// before them, both in integer arithmetic.
    pub fn improvement_trend(&self) -> i32 {
        if self.recent_scans.len() < 2 {
            return 0;
        }
        let newer: Vec<i32> = self.recent_scans.iter().take(5).map(|s| s.score).collect();
        let older: Vec<i32> = self
            .recent_scans
            .iter()
            .skip(5)
            .take(5)
            .map(|s| s.score)
            .collect();

        let newer_avg = integer_mean(&newer);
        let older_avg = if older.is_empty() {
            newer_avg
        } else {
            integer_mean(&older)
        };
        newer_avg - older_avg
    }

    pub fn improvement_label(&self) -> String {
        format!("{:+}%", self.improvement_trend())
    }

    pub fn average_score_label(&self) -> String {
        format!("{:.0}%", self.average_score)
    }

    pub fn streak_label(&self) -> String {
        format!("{} days", self.current_streak)
    }
}

fn integer_mean(values: &[i32]) -> i32 {
    values.iter().sum::<i32>() / values.len() as i32
}
