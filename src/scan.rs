//! Single-flight driver that runs one analysis at a time and records the
//! outcome in history.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::analyzer::{AnalysisBackend, ScanResult};
use crate::error::AnalysisError;
use crate::history::SharedHistory;

/// What happened to a `run_analysis` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Completed(ScanResult),
    Failed(String),
    /// Another analysis was already running; the request was dropped.
    Skipped,
}

#[derive(Debug, Default)]
struct ScanState {
    in_flight: bool,
    last_result: Option<ScanResult>,
    last_error: Option<String>,
}

/// Clears `in_flight` when the analysis ends, however it ends.
struct InFlightGuard<'a> {
    state: &'a Mutex<ScanState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).in_flight = false;
    }
}

fn lock(state: &Mutex<ScanState>) -> MutexGuard<'_, ScanState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ScanOrchestrator<B> {
    backend: B,
    history: SharedHistory,
    state: Mutex<ScanState>,
    timeout: Option<Duration>,
}

impl<B: AnalysisBackend> ScanOrchestrator<B> {
    pub fn new(backend: B, history: SharedHistory) -> Self {
        Self {
            backend,
            history,
            state: Mutex::new(ScanState::default()),
            timeout: None,
        }
    }

    /// Fail analyses that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub async fn run_analysis(&self, image_bytes: &[u8]) -> ScanOutcome {
        let _guard = {
            let mut state = lock(&self.state);
            if state.in_flight {
                warn!("Analysis already in progress, ignoring request");
                return ScanOutcome::Skipped;
            }
            state.in_flight = true;
            state.last_error = None;
            InFlightGuard { state: &self.state }
        };

        info!(
            "Starting analysis with {} backend ({} bytes)",
            self.backend.name(),
            image_bytes.len()
        );

        match self.analyze(image_bytes).await {
            Ok(result) => {
                info!(
                    "Analysis complete: {} scores, primary confidence {:.2}",
                    result.scores.len(),
                    result.primary_confidence()
                );
                lock(&self.state).last_result = Some(result.clone());
                self.history
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .add(result.clone());
                ScanOutcome::Completed(result)
            }
            Err(e) => {
                let message = e.to_string();
                error!("Analysis failed: {}", message);
                lock(&self.state).last_error = Some(message.clone());
                ScanOutcome::Failed(message)
            }
        }
    }

    async fn analyze(&self, image_bytes: &[u8]) -> Result<ScanResult, AnalysisError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.backend.analyze(image_bytes))
                .await
                .unwrap_or_else(|_| {
                    Err(AnalysisError::Transport(format!(
                        "Analysis timed out after {}s",
                        limit.as_secs()
                    )))
                }),
            None => self.backend.analyze(image_bytes).await,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        lock(&self.state).in_flight
    }

    pub fn last_result(&self) -> Option<ScanResult> {
        lock(&self.state).last_result.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    /// Forget the last result and error. History is untouched.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.last_result = None;
        state.last_error = None;
    }
}
