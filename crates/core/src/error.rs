//! Error types for the text-to-deck pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a deck.
///
/// Each pipeline stage raises only its own kind; nothing is recovered
/// between stages.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid template configuration or credentials.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The generation backend could not be reached or answered with a failure.
    #[error("Provider error{}: {message}", format_status(.status))]
    ProviderError {
        /// HTTP status, if the backend answered at all.
        status: Option<u16>,
        /// Transport or backend message.
        message: String,
    },

    /// The model reply did not contain a usable outline.
    #[error("Outline extraction error: {0}")]
    ExtractionError(String),

    /// The deck template lacks required structure, or the deck could not be written.
    #[error("Render error: {0}")]
    RenderError(String),

    /// A serialized deck could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Build a provider error from an optional HTTP status and a message.
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            status,
            message: message.into(),
        }
    }

    /// Whether re-issuing the same request could succeed.
    ///
    /// Only backend failures qualify; the gateway itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderError { .. })
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display_with_status() {
        let err = Error::provider(Some(503), "service unavailable");
        assert_eq!(
            err.to_string(),
            "Provider error (HTTP 503): service unavailable"
        );
    }

    #[test]
    fn test_provider_error_display_without_status() {
        let err = Error::provider(None, "connection refused");
        assert_eq!(err.to_string(), "Provider error: connection refused");
    }

    #[test]
    fn test_only_provider_errors_are_retryable() {
        assert!(Error::provider(Some(500), "boom").is_retryable());
        assert!(!Error::ConfigError("no key".into()).is_retryable());
        assert!(!Error::ExtractionError("no json".into()).is_retryable());
        assert!(!Error::RenderError("no layout".into()).is_retryable());
    }
}
