//! Settings loading and validation commands.
//!
//! Settings are loaded from TOML files and merged with environment variables
//! prefixed with `PREBID_PRIVACY__`. For example,
//! `PREBID_PRIVACY__PRIVACY__IPV4__ANON_KEEP_BITS` overrides
//! `privacy.ipv4.anon_keep_bits` in the TOML file.

use std::fs;
use std::path::Path;

use prebid_privacy_common::registry::PrivacyRegistry;
use prebid_privacy_common::settings::Settings;

use crate::error::CliError;

/// Outcome of checking a settings file.
#[derive(Debug)]
pub struct ValidationReport {
    /// Number of configured accounts.
    pub accounts: usize,
    /// IP masking problems. These fall back to defaults at runtime.
    pub ip_masking_errors: Vec<String>,
}

/// Load and merge settings from a TOML file with environment variables.
pub(crate) fn load_settings(file: &Path) -> Result<Settings, CliError> {
    let content = fs::read_to_string(file)?;

    log::debug!("Loading settings from: {}", file.display());
    log::debug!("Environment variables with PREBID_PRIVACY__ prefix will be merged");

    let settings = Settings::from_toml(&content)?;
    Ok(settings)
}

/// Load settings and compile them into a registry.
pub(crate) fn load_registry(file: &Path) -> Result<PrivacyRegistry, CliError> {
    let settings = load_settings(file)?;
    let registry = PrivacyRegistry::new(&settings)?;
    Ok(registry)
}

/// Parse the settings file and compile every account's activity controls.
pub fn check(file: &Path) -> Result<ValidationReport, CliError> {
    let settings = load_settings(file)?;

    let ip_masking_errors = settings
        .validate_privacy()
        .iter()
        .map(ToString::to_string)
        .collect();

    PrivacyRegistry::new(&settings)?;

    Ok(ValidationReport {
        accounts: settings.accounts.len(),
        ip_masking_errors,
    })
}

/// Validate a settings file and print the result.
pub fn validate(file: &Path, verbose: bool) -> Result<(), CliError> {
    let report = check(file)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Accounts: {}", report.accounts);

    if !report.ip_masking_errors.is_empty() {
        println!("\nIP masking (defaults will be used):");
        for err in &report.ip_masking_errors {
            println!("  - {}", err);
        }
    }

    if verbose {
        let settings = load_settings(file)?;
        let canonical = settings.to_canonical_toml()?;
        println!("\nMerged configuration:");
        println!("---");
        println!("{}", canonical.trim_end());
        println!("---");
    }

    Ok(())
}
