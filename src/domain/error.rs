//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for inrlab.
#[derive(Debug, thiserror::Error)]
pub enum FxError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("parse error in {file} at line {line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("export failed at {failed} after writing [{}]: {reason}", .written.join(", "))]
    ExportFailed {
        written: Vec<String>,
        failed: String,
        reason: String,
    },

    #[error("invalid request: {reason}")]
    Validation { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to fetch rate for {date}: {reason}")]
    Fetch { date: NaiveDate, reason: String },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FxError {
    pub fn parse(file: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        FxError::Parse {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        FxError::Validation {
            reason: reason.into(),
        }
    }
}

impl From<&FxError> for std::process::ExitCode {
    fn from(err: &FxError) -> Self {
        let code: u8 = match err {
            FxError::Io(_) | FxError::ExportFailed { .. } => 1,
            FxError::ConfigParse { .. }
            | FxError::ConfigMissing { .. }
            | FxError::ConfigInvalid { .. }
            | FxError::Validation { .. } => 2,
            FxError::Parse { .. } => 3,
            FxError::Fetch { .. } => 4,
            FxError::NotFound { .. } | FxError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
