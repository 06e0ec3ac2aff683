use thiserror::Error;

/// Failures an analysis backend can report.
///
/// Malformed JSON inside the model's text is not represented here: the
/// remote backend degrades to an empty score set instead of failing.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing Gemini API key")]
    MissingApiKey,

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Simulated error for testing purposes")]
    Simulated,
}

impl From<AnalysisError> for String {
    fn from(err: AnalysisError) -> Self {
        err.to_string()
    }
}

/// Failures while assembling the application from config and storage.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Keychain error: {0}")]
    Keychain(String),
}

impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_message_verbatim() {
        let err = AnalysisError::Api {
            status: 403,
            message: "API key not valid. Please pass a valid API key.".to_string(),
        };
        assert_eq!(err.to_string(), "API key not valid. Please pass a valid API key.");
    }

    #[test]
    fn test_into_string() {
        let msg: String = AnalysisError::MissingApiKey.into();
        assert_eq!(msg, "Missing Gemini API key");

        let msg: String = AppError::Config("bad toml".to_string()).into();
        assert_eq!(msg, "Config error: bad toml");
    }
}
