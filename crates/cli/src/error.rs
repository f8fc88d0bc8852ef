//! CLI error types.

use std::fmt;

use error_stack::Report;
use prebid_privacy_common::error::PrivacyError;

#[derive(Debug)]
pub enum CliError {
    /// Settings could not be loaded or compiled
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Bid request JSON error
    Json(String),
    /// Logger setup error
    Logging(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Json(msg) => write!(f, "JSON error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Json(err.to_string())
    }
}

impl From<Report<PrivacyError>> for CliError {
    fn from(report: Report<PrivacyError>) -> Self {
        CliError::Config(format!("{report:?}"))
    }
}

impl From<log::SetLoggerError> for CliError {
    fn from(err: log::SetLoggerError) -> Self {
        CliError::Logging(err.to_string())
    }
}
