//! Error types for the privacy engine.
//!
//! Errors only surface while configuration is loaded and activity plans are
//! built. Evaluating an activity or scrubbing a request never fails.

use derive_more::Display;

/// Errors raised while loading privacy configuration.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum PrivacyError {
    /// Settings could not be parsed or deserialized.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// A component condition in an activity rule could not be parsed.
    #[display("unable to parse component: {condition}")]
    InvalidComponent { condition: String },

    /// A rule listed an empty component condition.
    #[display("unable to parse empty condition")]
    EmptyComponent,

    /// IP masking bit counts are out of range.
    #[display("{message}")]
    InvalidIpMasking { message: String },
}

impl core::error::Error for PrivacyError {}
