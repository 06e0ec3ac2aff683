//! API key storage in the OS keychain, with an environment override.

use keyring::Entry;
use tracing::{info, warn};

use crate::error::AppError;

/// Environment variable checked before the keychain.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const KEYCHAIN_SERVICE: &str = "skintrack-gemini-api";
const KEYCHAIN_USER: &str = "skintrack";

fn entry() -> Result<Entry, AppError> {
    Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER).map_err(|e| {
        warn!("Failed to create keyring entry for {}: {}", KEYCHAIN_SERVICE, e);
        AppError::Keychain(e.to_string())
    })
}

pub fn set_api_key(key: &str) -> Result<(), AppError> {
    info!("Setting API key for service: {}", KEYCHAIN_SERVICE);
    entry()?.set_password(key).map_err(|e| {
        warn!("Failed to set password for {}: {}", KEYCHAIN_SERVICE, e);
        AppError::Keychain(e.to_string())
    })
}

pub fn get_api_key() -> Result<Option<String>, AppError> {
    match entry()?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            info!("No API key found for service: {}", KEYCHAIN_SERVICE);
            Ok(None)
        }
        Err(e) => {
            warn!("Failed to get password for {}: {}", KEYCHAIN_SERVICE, e);
            Err(AppError::Keychain(e.to_string()))
        }
    }
}

pub fn delete_api_key() -> Result<(), AppError> {
    info!("Deleting API key for service: {}", KEYCHAIN_SERVICE);
    entry()?.delete_credential().map_err(|e| {
        warn!("Failed to delete credential for {}: {}", KEYCHAIN_SERVICE, e);
        AppError::Keychain(e.to_string())
    })
}

/// Find the Gemini API key: `GEMINI_API_KEY` first, then the keychain.
///
/// Keychain failures are logged and treated as "no key", so a missing
/// keychain backend simply selects the simulated analyzer.
pub fn resolve_api_key() -> Option<String> {
    let from_env = std::env::var(API_KEY_ENV).ok();
    pick_api_key(from_env, || get_api_key().ok().flatten())
}

/// Blank keys count as absent; the keychain is only consulted when the
/// environment has nothing.
fn pick_api_key(from_env: Option<String>, keychain: impl FnOnce() -> Option<String>) -> Option<String> {
    let non_blank = |k: String| {
        let trimmed = k.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };

    from_env.and_then(non_blank).or_else(|| keychain().and_then(non_blank))
}
