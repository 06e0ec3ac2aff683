//! The analysis backend contract and the startup-selected implementation.

use async_trait::async_trait;
use tracing::info;

use super::remote::RemoteBackend;
use super::simulated::SimulatedBackend;
use super::types::ScanResult;
use crate::config::{AnalysisConfig, BackendKind};
use crate::error::{AnalysisError, AppError};
use crate::user::UserContext;

/// Turns captured image bytes into a `ScanResult`.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Analyze one photo. `image_bytes` is raw JPEG data.
    async fn analyze(&self, image_bytes: &[u8]) -> Result<ScanResult, AnalysisError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// The backend chosen once at startup.
pub enum Backend {
    Simulated(SimulatedBackend),
    Remote(RemoteBackend),
}

impl Backend {
    /// Pick a backend from config and the resolved API key.
    ///
    /// `Auto` prefers the remote model when a key is available. An explicit
    /// `Remote` without a key is a configuration error.
    pub fn from_config(
        config: &AnalysisConfig,
        user: &UserContext,
        api_key: Option<String>,
    ) -> Result<Self, AppError> {
        let use_remote = match (config.backend, &api_key) {
            (BackendKind::Simulated, _) => false,
            (BackendKind::Remote, None) => {
                return Err(AppError::Config(
                    "Remote backend selected but no Gemini API key is configured".to_string(),
                ))
            }
            (BackendKind::Remote, Some(_)) => true,
            (BackendKind::Auto, key) => key.is_some(),
        };

        let backend = match api_key {
            Some(key) if use_remote => {
                let remote = RemoteBackend::with_timeout(key, config.request_timeout())
                    .map_err(|e| AppError::Config(e.to_string()))?
                    .with_endpoint(config.endpoint.clone(), config.model.clone())
                    .with_user_context(user.clone());
                Backend::Remote(remote)
            }
            _ => Backend::Simulated(SimulatedBackend::new(
                config.simulated_delay(),
                config.simulate_errors,
            )),
        };

        info!("Using {} analysis backend", backend.name());
        Ok(backend)
    }
}

#[async_trait]
impl AnalysisBackend for Backend {
    async fn analyze(&self, image_bytes: &[u8]) -> Result<ScanResult, AnalysisError> {
        match self {
            Backend::Simulated(b) => b.analyze(image_bytes).await,
            Backend::Remote(b) => b.analyze(image_bytes).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::Simulated(b) => b.name(),
            Backend::Remote(b) => b.name(),
        }
    }
}
