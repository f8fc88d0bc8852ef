//! Common functionality for the Prebid privacy engine.
//!
//! This crate decides which privacy-sensitive activities a bidder, analytics
//! adapter or other component may perform, and redacts OpenRTB bid requests
//! accordingly. It is shared by the `pbs-privacy` CLI and by any server that
//! embeds the engine.
//!
//! # Modules
//!
//! - [`account`]: Account privacy configuration and IP masking settings
//! - [`error`]: Error types and error handling utilities
//! - [`openrtb`]: Minimal OpenRTB bid request model
//! - [`privacy`]: Activity controls, enforcement and scrubbing
//! - [`registry`]: Per-account activity controls built from settings
//! - [`settings`]: Configuration loading with environment overrides
//! - [`test_support`]: Testing utilities and fixtures

pub mod account;
pub mod error;
pub mod openrtb;
pub mod privacy;
pub mod registry;
pub mod settings;
