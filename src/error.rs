//! Error handling for Gridboard
//!
//! This module defines the crate error type and a Result alias used
//! throughout the application.

use thiserror::Error;

/// Main error type for Gridboard operations
#[derive(Error, Debug)]
pub enum GridboardError {
    /// Errors returned by the server API (persistence, telemetry, commands)
    #[error("API error: {0}")]
    Api(String),

    /// Errors related to the streaming channel
    #[error("Streaming error: {0}")]
    Streaming(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// Errors related to the dashboard document
    #[error("Document error: {0}")]
    Document(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<GridboardError>,
    },
}

impl GridboardError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        GridboardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<reqwest::Error> for GridboardError {
    fn from(err: reqwest::Error) -> Self {
        GridboardError::Api(err.to_string())
    }
}

/// Result type alias for Gridboard operations
pub type Result<T> = std::result::Result<T, GridboardError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridboardError::Document("widget not found".to_string());
        assert_eq!(err.to_string(), "Document error: widget not found");
    }

    #[test]
    fn test_error_with_context() {
        let err = GridboardError::Api("503".to_string());
        let with_ctx = err.with_context("Failed to save dashboard");
        assert!(with_ctx.to_string().contains("Failed to save dashboard"));
    }

    #[test]
    fn test_result_context() {
        let res: Result<()> = Err(GridboardError::Config("missing".to_string()));
        let err = res.context("loading app state").unwrap_err();
        assert!(err.to_string().contains("loading app state"));
    }
}
