//! Domain-specific error types for weird-ideator

use thiserror::Error;

/// Main error type for the ideation pipeline and its renderers
#[derive(Error, Debug)]
pub enum IdeatorError {
    /// Missing credential, malformed stage graph, missing stage context or
    /// an unusable configuration value. Always raised before any generation call.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The generation capability failed for a stage. Never retried.
    #[error("Generation failed at stage '{stage}': {message}")]
    ExternalCall { stage: String, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl IdeatorError {
    pub fn config(message: impl Into<String>) -> Self {
        IdeatorError::Config {
            message: message.into(),
        }
    }

    pub fn external(stage: impl Into<String>, message: impl Into<String>) -> Self {
        IdeatorError::ExternalCall {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        IdeatorError::Render {
            message: message.into(),
        }
    }

    /// True for the two error kinds that stop a run with a diagnostic
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            IdeatorError::Config { .. } | IdeatorError::ExternalCall { .. }
        )
    }
}

impl From<serde_json::Error> for IdeatorError {
    fn from(err: serde_json::Error) -> Self {
        IdeatorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for IdeatorError {
    fn from(err: toml::de::Error) -> Self {
        IdeatorError::Config {
            message: format!("Invalid TOML: {}", err),
        }
    }
}

impl From<std::io::Error> for IdeatorError {
    fn from(err: std::io::Error) -> Self {
        IdeatorError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for ideator operations
pub type Result<T> = std::result::Result<T, IdeatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_stage() {
        let err = IdeatorError::external("amplified_1", "HTTP 502");
        assert_eq!(
            err.to_string(),
            "Generation failed at stage 'amplified_1': HTTP 502"
        );
        assert!(err.is_fatal_for_run());
    }

    #[test]
    fn test_render_errors_are_not_fatal_for_run() {
        assert!(!IdeatorError::render("bad block").is_fatal_for_run());
        assert!(IdeatorError::config("missing key").is_fatal_for_run());
    }
}
