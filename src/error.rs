// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything the library can fail with. Startup errors (`DataSource`,
/// `Validation`) are fatal; the rest surface as HTTP error responses.
#[derive(Debug, Error)]
pub enum Error {
    #[error("dataset source {}: {reason}", .path.display())]
    DataSource { path: PathBuf, reason: String },

    #[error("dataset missing required columns: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("unknown filter field '{0}'")]
    UnknownField(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotConfigured(String),

    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn data_source(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DataSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_column() {
        let err = Error::Validation {
            missing: vec!["ISO3".into(), "Unit".into()],
        };
        assert_eq!(
            err.to_string(),
            "dataset missing required columns: ISO3, Unit"
        );
    }

    #[test]
    fn data_source_message_names_path() {
        let err = Error::data_source("data/missing.csv", "file not found");
        assert_eq!(
            err.to_string(),
            "dataset source data/missing.csv: file not found"
        );
    }
}
