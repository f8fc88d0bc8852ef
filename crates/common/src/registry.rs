//! Per-account activity controls built from settings.

use std::collections::HashMap;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use log::{debug, warn};

use crate::account::AccountPrivacy;
use crate::error::PrivacyError;
use crate::privacy::ActivityControl;
use crate::settings::Settings;

#[derive(Default)]
struct PrivacyRegistryInner {
    default_control: Arc<ActivityControl>,
    accounts: HashMap<String, Arc<ActivityControl>>,
}

/// Compiled activity controls for the host default and every configured
/// account.
///
/// Cloning is cheap and shares the same controls.
#[derive(Clone, Default)]
pub struct PrivacyRegistry {
    inner: Arc<PrivacyRegistryInner>,
}

impl PrivacyRegistry {
    /// Build a registry from the provided settings.
    ///
    /// Out-of-range IP masking falls back to the default bit counts with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::Configuration`] when an activity rule carries
    /// a malformed component name.
    pub fn new(settings: &Settings) -> Result<Self, Report<PrivacyError>> {
        let default_control = Arc::new(build_control("host default", &settings.privacy)?);

        let mut accounts = HashMap::with_capacity(settings.accounts.len());
        for (id, account) in &settings.accounts {
            let control = match &account.privacy {
                Some(privacy) => Arc::new(build_control(id, privacy)?),
                None => Arc::clone(&default_control),
            };
            accounts.insert(id.to_lowercase(), control);
        }

        debug!(
            "Privacy registry built with {} account(s)",
            accounts.len()
        );

        Ok(Self {
            inner: Arc::new(PrivacyRegistryInner {
                default_control,
                accounts,
            }),
        })
    }

    /// Control for `account_id`, or the host default for unknown accounts.
    #[must_use]
    pub fn control_for(&self, account_id: &str) -> Arc<ActivityControl> {
        self.inner
            .accounts
            .get(&account_id.to_lowercase())
            .map_or_else(
                || Arc::clone(&self.inner.default_control),
                Arc::clone,
            )
    }

    /// Whether `account_id` has its own entry.
    #[must_use]
    pub fn has_account(&self, account_id: &str) -> bool {
        self.inner
            .accounts
            .contains_key(&account_id.to_lowercase())
    }
}

fn build_control(
    scope: &str,
    privacy: &AccountPrivacy,
) -> Result<ActivityControl, Report<PrivacyError>> {
    let mut privacy = privacy.clone();
    for err in privacy.sanitize_ip_masking() {
        warn!("Invalid IP masking for {scope}, using defaults: {err}");
    }

    ActivityControl::new(Some(&privacy)).change_context(PrivacyError::Configuration {
        message: format!("Invalid activity controls for {scope}"),
    })
}
