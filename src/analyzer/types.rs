//! Type definitions for skin analysis results.
//!
//! A `ScanResult` is produced once by an analysis backend and is treated as
//! immutable by everything downstream (history, progress).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Fixed set of skin concerns a backend can report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkinCondition {
    Acne,
    Redness,
    DarkSpots,
    Wrinkles,
    Pigmentation,
    Dryness,
    Oiliness,
    Sensitivity,
    Dullness,
    Dehydration,
    SunDamage,
    Pores,
    Texture,
}

impl SkinCondition {
    /// Every condition in declaration order.
    pub const ALL: [SkinCondition; 13] = [
        SkinCondition::Acne,
        SkinCondition::Redness,
        SkinCondition::DarkSpots,
        SkinCondition::Wrinkles,
        SkinCondition::Pigmentation,
        SkinCondition::Dryness,
        SkinCondition::Oiliness,
        SkinCondition::Sensitivity,
        SkinCondition::Dullness,
        SkinCondition::Dehydration,
        SkinCondition::SunDamage,
        SkinCondition::Pores,
        SkinCondition::Texture,
    ];

    /// Raw value used in persisted JSON (camelCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinCondition::Acne => "acne",
            SkinCondition::Redness => "redness",
            SkinCondition::DarkSpots => "darkSpots",
            SkinCondition::Wrinkles => "wrinkles",
            SkinCondition::Pigmentation => "pigmentation",
            SkinCondition::Dryness => "dryness",
            SkinCondition::Oiliness => "oiliness",
            SkinCondition::Sensitivity => "sensitivity",
            SkinCondition::Dullness => "dullness",
            SkinCondition::Dehydration => "dehydration",
            SkinCondition::SunDamage => "sunDamage",
            SkinCondition::Pores => "pores",
            SkinCondition::Texture => "texture",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SkinCondition::Acne => "Acne",
            SkinCondition::Redness => "Redness",
            SkinCondition::DarkSpots => "Dark Spots",
            SkinCondition::Wrinkles => "Wrinkles",
            SkinCondition::Pigmentation => "Pigmentation",
            SkinCondition::Dryness => "Dryness",
            SkinCondition::Oiliness => "Oiliness",
            SkinCondition::Sensitivity => "Sensitivity",
            SkinCondition::Dullness => "Dullness",
            SkinCondition::Dehydration => "Dehydration",
            SkinCondition::SunDamage => "Sun Damage",
            SkinCondition::Pores => "Pores",
            SkinCondition::Texture => "Texture",
        }
    }

    /// Match a free-form condition name from model output.
    ///
    /// Case-insensitive, whitespace is ignored: "Dark Spots", "darkspots"
    /// and "darkSpots" all resolve to `DarkSpots`.
    pub fn from_name(name: &str) -> Option<SkinCondition> {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        SkinCondition::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().to_lowercase() == key)
    }
}

impl std::fmt::Display for SkinCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rectangle in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected-condition measurement.
///
/// `confidence` is always within [0, 1]: it is clamped by `new` and again
/// when deserializing persisted data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionScore {
    pub id: Uuid,
    pub condition: SkinCondition,
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f64,
    #[serde(default)]
    pub affected_regions: Vec<Region>,
}

impl ConditionScore {
    pub fn new(condition: SkinCondition, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            condition,
            confidence: clamp_confidence(confidence),
            affected_regions: Vec::new(),
        }
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.affected_regions = regions;
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Clamp a raw confidence into [0, 1]. NaN is treated as 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_confidence(raw))
}

/// Where a result's scores came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreSource {
    /// Scores reported by the backend.
    #[default]
    Measured,
    /// The model returned no usable scores and every condition was filled
    /// with zero confidence.
    Fallback,
}

/// Result of one completed skin analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    /// Opaque reference to the captured image; the bytes are not retained.
    pub image_identifier: String,
    /// Scores in detection order (not sorted by confidence).
    pub scores: Vec<ConditionScore>,
    pub skin_analysis: Option<String>,
    #[serde(default)]
    pub recommended_ingredients: Vec<String>,
    #[serde(default)]
    pub score_source: ScoreSource,
}

impl ScanResult {
    /// Create a result captured now with a fresh id and image identifier.
    pub fn new(scores: Vec<ConditionScore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            image_identifier: Uuid::new_v4().to_string(),
            scores,
            skin_analysis: None,
            recommended_ingredients: Vec::new(),
            score_source: ScoreSource::Measured,
        }
    }

    pub fn with_analysis(mut self, analysis: Option<String>) -> Self {
        self.skin_analysis = analysis;
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<String>) -> Self {
        self.recommended_ingredients = ingredients;
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// The first score as emitted by the backend.
    pub fn primary_score(&self) -> Option<&ConditionScore> {
        self.scores.first()
    }

    /// Confidence of the primary score, 0 when there are no scores.
    pub fn primary_confidence(&self) -> f64 {
        self.primary_score().map(|s| s.confidence()).unwrap_or(0.0)
    }

    /// Primary confidence scaled to 0-100 and truncated.
    pub fn display_score(&self) -> i32 {
        (self.primary_confidence() * 100.0) as i32
    }

    /// The most confident score. On ties the earliest entry wins.
    pub fn highest_score(&self) -> Option<&ConditionScore> {
        self.scores.iter().fold(None, |best, score| match best {
            Some(b) if score.confidence() <= b.confidence() => Some(b),
            _ => Some(score),
        })
    }

    pub fn is_fallback(&self) -> bool {
        self.score_source == ScoreSource::Fallback
    }
}
