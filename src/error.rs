// src/error.rs

//! Unified error handling for the quake watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for quakewatch operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Locality argument missing or empty
    #[error("No locality given: a country or region name is required")]
    NoLocality,

    /// Feed payload could not be turned into any event record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Every candidate feed source failed
    #[error("Fetch failed for all {} source(s): {}", .attempts.len(), FetchAttempts(.attempts))]
    Fetch { attempts: Vec<FetchAttempt> },

    /// Notifier rejected the announcement
    #[error("Notify error: {0}")]
    Notify(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event store query failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// One failed attempt against a candidate feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    pub url: String,
    pub reason: String,
}

struct FetchAttempts<'a>(&'a [FetchAttempt]);

impl fmt::Display for FetchAttempts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no source URLs configured");
        }
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} ({})", attempt.url, attempt.reason)?;
        }
        Ok(())
    }
}

impl AppError {
    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create a notifier error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a later scheduled run may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Http(_) | Self::Parse(_) | Self::Notify(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_lists_every_attempt() {
        let err = AppError::Fetch {
            attempts: vec![
                FetchAttempt {
                    url: "https://a.example/feed".into(),
                    reason: "timed out".into(),
                },
                FetchAttempt {
                    url: "https://b.example/feed".into(),
                    reason: "HTTP 503".into(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("Fetch failed for all 2 source(s)"));
        assert!(message.contains("https://a.example/feed (timed out)"));
        assert!(message.contains("https://b.example/feed (HTTP 503)"));
    }

    #[test]
    fn test_fetch_error_without_sources() {
        let err = AppError::Fetch { attempts: vec![] };
        assert!(err.to_string().contains("no source URLs configured"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::parse("bad feed").is_transient());
        assert!(!AppError::NoLocality.is_transient());
        assert!(!AppError::config("missing").is_transient());
    }
}
