//! Error taxonomy for the analysis core.
//!
//! Only `InvalidConfig` is allowed to surface as a failed run. Parse errors
//! are recovered per file, and the soft signals (pattern timeout, path
//! truncation, budget exhaustion) are not errors at all; they are carried
//! in result types, never thrown.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed source in one file. Recorded in metrics; the run continues
    /// with the remaining files.
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// The configuration object is structurally unusable. This is the only
    /// variant that turns into `success: false` at the agent boundary.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A file reached the extractor despite an unsupported extension.
    #[error("unsupported language for {file}")]
    UnsupportedLanguage { file: String },
}

impl AnalysisError {
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
