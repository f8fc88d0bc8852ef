use std::collections::HashMap;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::account::AccountPrivacy;
use crate::error::PrivacyError;

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "PREBID_PRIVACY";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

/// Per-account overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Account {
    /// Privacy block of the account. Absent means the host default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<AccountPrivacy>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Host default used for accounts without their own privacy block.
    #[serde(default)]
    pub privacy: AccountPrivacy,
    #[serde(default)]
    pub accounts: HashMap<String, Account>,
}

impl Settings {
    /// Loads the embedded `prebid-privacy.toml` merged with environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::Configuration`] when the settings cannot be
    /// parsed.
    pub fn new() -> Result<Self, Report<PrivacyError>> {
        let toml_str = include_str!("../../../prebid-privacy.toml");

        Self::from_toml(toml_str)
    }

    /// Parses a TOML document and applies `PREBID_PRIVACY__` environment
    /// overrides on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::Configuration`] when the document or an
    /// override cannot be parsed or deserialized.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<PrivacyError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR)
            .try_parsing(true);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(PrivacyError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        config
            .try_deserialize()
            .change_context(PrivacyError::Configuration {
                message: "Failed to deserialize configuration".to_string(),
            })
    }

    /// IP masking errors of the host default and every account.
    ///
    /// Accounts are visited in id order.
    #[must_use]
    pub fn validate_privacy(&self) -> Vec<PrivacyError> {
        let mut errs = self.privacy.validate_ip_masking();

        let mut ids: Vec<&String> = self.accounts.keys().collect();
        ids.sort();
        for id in ids {
            if let Some(privacy) = self.accounts.get(id).and_then(|a| a.privacy.as_ref()) {
                errs.extend(privacy.validate_ip_masking());
            }
        }
        errs
    }

    /// Settings serialized back to TOML after environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::Configuration`] when serialization fails.
    pub fn to_canonical_toml(&self) -> Result<String, Report<PrivacyError>> {
        toml::to_string(self).change_context(PrivacyError::Configuration {
            message: "Failed to serialize configuration".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Ipv4Config, Ipv6Config};
    use crate::privacy::Activity;
    use crate::test_support::tests::{
        create_test_settings, crate_test_settings_str, without_env_overrides,
    };

    #[test]
    fn test_settings_new() {
        let settings = without_env_overrides(Settings::new)
            .expect("Settings should load from embedded TOML");

        assert_eq!(settings.privacy.ipv4, Ipv4Config::default());
        assert_eq!(settings.privacy.ipv6, Ipv6Config::default());
        assert!(settings.validate_privacy().is_empty());
    }

    #[test]
    fn test_settings_from_valid_toml() {
        let settings = without_env_overrides(create_test_settings);

        let fetch_bids = settings
            .privacy
            .allow_activities
            .as_ref()
            .expect("should have host activities")
            .get(Activity::FetchBids);
        assert_eq!(fetch_bids.default, Some(true));
        assert_eq!(fetch_bids.rules.len(), 1);
        assert_eq!(fetch_bids.rules[0].condition.component_name, vec!["bidderX"]);

        let strict = settings
            .accounts
            .get("pub-strict")
            .and_then(|a| a.privacy.as_ref())
            .expect("should have strict account privacy");
        assert_eq!(strict.ipv4.anon_keep_bits, 16);
        assert_eq!(strict.ipv6, Ipv6Config::default());
        assert_eq!(
            strict
                .allow_activities
                .as_ref()
                .map(|a| a.get(Activity::TransmitUserFpd).default),
            Some(Some(false))
        );

        let open = settings.accounts.get("pub-open").expect("should have open account");
        assert_eq!(open.privacy, None);
    }

    #[test]
    fn test_settings_empty_toml() {
        let settings = without_env_overrides(|| Settings::from_toml(""))
            .expect("empty settings should load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_invalid_toml() {
        let result = without_env_overrides(|| Settings::from_toml("[privacy\nipv4 = "));
        let err = result.expect_err("should reject invalid toml");
        assert!(matches!(
            err.current_context(),
            PrivacyError::Configuration { .. }
        ));
    }

    #[test]
    fn test_settings_wrong_type() {
        let result = without_env_overrides(|| {
            Settings::from_toml(
                r#"
                [privacy.ipv4]
                anon_keep_bits = "lots"
                "#,
            )
        });
        assert!(result.is_err(), "non-numeric bits should fail");
    }

    #[test]
    fn test_settings_env_override() {
        temp_env::with_var(
            "PREBID_PRIVACY__PRIVACY__IPV4__ANON_KEEP_BITS",
            Some("16"),
            || {
                let settings = Settings::from_toml(&crate_test_settings_str())
                    .expect("Settings should parse");
                assert_eq!(settings.privacy.ipv4.anon_keep_bits, 16);
                assert_eq!(settings.privacy.ipv6.anon_keep_bits, 56);
            },
        );
    }

    #[test]
    fn test_settings_env_override_out_of_range() {
        temp_env::with_var(
            "PREBID_PRIVACY__PRIVACY__IPV6__ANON_KEEP_BITS",
            Some("200"),
            || {
                let settings = Settings::from_toml(&crate_test_settings_str())
                    .expect("Settings should parse");
                assert_eq!(
                    settings.validate_privacy(),
                    vec![PrivacyError::InvalidIpMasking {
                        message: "bits cannot exceed 128 in ipv6 address, or be less than 0"
                            .to_string()
                    }]
                );
            },
        );
    }

    #[test]
    fn test_validate_privacy_covers_accounts() {
        let settings = without_env_overrides(|| {
            Settings::from_toml(
                r#"
            [privacy.ipv4]
            anon_keep_bits = -1

            [accounts.b.privacy.ipv6]
            anon_keep_bits = 129

            [accounts.a.privacy.ipv4]
            anon_keep_bits = 33
            "#,
            )
        })
        .expect("Settings should parse");

        let messages: Vec<String> = settings
            .validate_privacy()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "bits cannot exceed 32 in ipv4 address, or be less than 0",
                "bits cannot exceed 32 in ipv4 address, or be less than 0",
                "bits cannot exceed 128 in ipv6 address, or be less than 0",
            ]
        );
    }

    #[test]
    fn test_to_canonical_toml_round_trips() {
        without_env_overrides(|| {
            let settings = create_test_settings();

            let canonical = settings
                .to_canonical_toml()
                .expect("should serialize settings");
            let reparsed =
                Settings::from_toml(&canonical).expect("canonical toml should parse");

            assert_eq!(reparsed, settings);
        });
    }
}
