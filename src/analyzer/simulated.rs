//! Local backend that fabricates plausible results without any API key.
//!
//! Used for development and whenever no remote credentials are configured.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{info, warn};

use super::backend::AnalysisBackend;
use super::types::{ConditionScore, ScanResult, SkinCondition};
use crate::error::AnalysisError;

pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_secs(2);

/// Failure probability when error simulation is enabled.
pub const SIMULATED_FAILURE_RATE: f64 = 0.1;

/// Range each simulated confidence is drawn from.
const MIN_SIMULATED_CONFIDENCE: f64 = 0.15;
const MAX_SIMULATED_CONFIDENCE: f64 = 0.85;

const CANNED_ANALYSES: [&str; 5] = [
    "Your skin appears to have good overall health with some areas that could benefit from targeted care. The analysis shows balanced hydration levels with minor concerns in specific areas that can be addressed with the right skincare routine.",
    "Analysis reveals healthy skin with good moisture balance. Some minor texture irregularities are present but overall complexion appears even and well-maintained.",
    "Your skin shows signs of excellent care with strong barrier function. Hydration levels are optimal and pore size is minimal. Continue your current routine.",
    "Mild concerns detected in the T-zone area with slight oiliness. Overall skin health is good with room for improvement in specific targeted areas.",
    "Skin appears well-hydrated with good elasticity. Minor areas of unevenness detected but overall texture and tone are balanced and healthy.",
];

const CANNED_INGREDIENT_SETS: [[&str; 3]; 5] = [
    ["Niacinamide", "Hyaluronic Acid", "Vitamin C"],
    ["Salicylic Acid", "Retinol", "Ceramides"],
    ["Peptides", "Alpha Arbutin", "Centella Asiatica"],
    ["Azelaic Acid", "Glycolic Acid", "Vitamin E"],
    ["Squalane", "Panthenol", "Green Tea Extract"],
];

/// Backend that waits, then returns randomized scores.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
    failure_rate: f64,
}

impl SimulatedBackend {
    /// `simulate_errors` makes roughly one call in ten fail.
    pub fn new(delay: Duration, simulate_errors: bool) -> Self {
        info!("Simulated analyzer initialized with {:?} delay", delay);
        Self {
            delay,
            failure_rate: if simulate_errors {
                SIMULATED_FAILURE_RATE
            } else {
                0.0
            },
        }
    }

    /// Override the failure probability (clamped to [0, 1]).
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn should_fail(&self) -> bool {
        self.failure_rate > 0.0 && rand::rng().random_bool(self.failure_rate)
    }

    fn generate_result(&self) -> ScanResult {
        let mut rng = rand::rng();

        let scores = SkinCondition::ALL
            .iter()
            .map(|c| {
                let confidence =
                    rng.random_range(MIN_SIMULATED_CONFIDENCE..=MAX_SIMULATED_CONFIDENCE);
                ConditionScore::new(*c, confidence)
            })
            .collect();

        let analysis = CANNED_ANALYSES
            .choose(&mut rng)
            .copied()
            .unwrap_or(CANNED_ANALYSES[0]);
        let ingredients = CANNED_INGREDIENT_SETS
            .choose(&mut rng)
            .unwrap_or(&CANNED_INGREDIENT_SETS[0]);

        ScanResult::new(scores)
            .with_analysis(Some(analysis.to_string()))
            .with_ingredients(ingredients.iter().map(|s| s.to_string()).collect())
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY, false)
    }
}

#[async_trait]
impl AnalysisBackend for SimulatedBackend {
    async fn analyze(&self, _image_bytes: &[u8]) -> Result<ScanResult, AnalysisError> {
        info!("Simulated analyzer: starting skin analysis");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.should_fail() {
            warn!("Simulated analyzer: simulating error for testing");
            return Err(AnalysisError::Simulated);
        }

        let result = self.generate_result();
        info!(
            "Simulated analyzer: analysis completed with {} condition scores",
            result.scores.len()
        );
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_result_shape() {
        let backend = SimulatedBackend::new(Duration::ZERO, false);
        let result = backend.analyze(&[]).await.unwrap();

        assert_eq!(result.scores.len(), SkinCondition::ALL.len());
        for (score, condition) in result.scores.iter().zip(SkinCondition::ALL) {
            assert_eq!(score.condition, condition);
            assert!(score.confidence() >= MIN_SIMULATED_CONFIDENCE);
            assert!(score.confidence() <= MAX_SIMULATED_CONFIDENCE);
        }

        let analysis = result.skin_analysis.as_deref().unwrap();
        assert!(CANNED_ANALYSES.contains(&analysis));
        assert_eq!(result.recommended_ingredients.len(), 3);
        assert!(CANNED_INGREDIENT_SETS
            .iter()
            .any(|set| set.iter().zip(&result.recommended_ingredients).all(|(a, b)| *a == b.as_str())));
        assert!(!result.is_fallback());
    }

    #[tokio::test]
    async fn test_always_failing() {
        let backend = SimulatedBackend::new(Duration::ZERO, true).with_failure_rate(1.0);
        let err = backend.analyze(&[]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Simulated));
        assert_eq!(err.to_string(), "Simulated error for testing purposes");
    }

    #[tokio::test]
    async fn test_errors_disabled_never_fail() {
        let backend = SimulatedBackend::new(Duration::ZERO, false);
        for _ in 0..50 {
            assert!(backend.analyze(&[]).await.is_ok());
        }
    }

    #[test]
    fn test_failure_rate_setting() {
        assert_eq!(SimulatedBackend::new(Duration::ZERO, true).failure_rate, 0.1);
        assert_eq!(SimulatedBackend::new(Duration::ZERO, false).failure_rate, 0.0);
        assert_eq!(
            SimulatedBackend::default().with_failure_rate(7.0).failure_rate,
            1.0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_configured_delay() {
        let backend = SimulatedBackend::new(Duration::from_secs(2), false);
        let start = tokio::time::Instant::now();
        backend.analyze(&[]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
