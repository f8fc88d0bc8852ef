//! Account-level privacy configuration.
//!
//! These types mirror the `privacy` block of an account configuration. They
//! deserialize from JSON (camelCase keys as publishers author them) and from
//! TOML through the `config` crate, which may hand keys over lowercased, so
//! every camelCase key also accepts its lowercase spelling.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::PrivacyError;
use crate::privacy::Activity;

/// Bits in an IPv4 address.
pub const IPV4_BITS: u32 = 32;
/// Bits in an IPv6 address.
pub const IPV6_BITS: u32 = 128;
/// Leading IPv4 bits kept when no valid value is configured.
pub const IPV4_DEFAULT_MASKING_BIT_SIZE: i32 = 24;
/// Leading IPv6 bits kept when no valid value is configured.
pub const IPV6_DEFAULT_MASKING_BIT_SIZE: i32 = 56;

/// Privacy section of an account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AccountPrivacy {
    #[serde(
        default,
        alias = "allowactivities",
        alias = "allowActivities",
        skip_serializing_if = "Option::is_none"
    )]
    pub allow_activities: Option<AllowActivities>,
    #[serde(default)]
    pub ipv4: Ipv4Config,
    #[serde(default)]
    pub ipv6: Ipv6Config,
}

impl AccountPrivacy {
    /// Collects IP masking validation errors for both address families.
    #[must_use]
    pub fn validate_ip_masking(&self) -> Vec<PrivacyError> {
        let mut errs = self.ipv4.validation_errors();
        errs.extend(self.ipv6.validation_errors());
        errs
    }

    /// Replaces out-of-range IP masking values with the defaults.
    ///
    /// Returns the validation errors that triggered a replacement so the
    /// caller can report them.
    pub fn sanitize_ip_masking(&mut self) -> Vec<PrivacyError> {
        let ipv4_errs = self.ipv4.validation_errors();
        if !ipv4_errs.is_empty() {
            self.ipv4 = Ipv4Config::default();
        }
        let ipv6_errs = self.ipv6.validation_errors();
        if !ipv6_errs.is_empty() {
            self.ipv6 = Ipv6Config::default();
        }
        ipv4_errs.into_iter().chain(ipv6_errs).collect()
    }
}

/// Per-activity configuration for every entry of the activity catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AllowActivities {
    #[serde(default, rename = "syncUser", alias = "syncuser")]
    pub sync_user: ActivityConfig,
    #[serde(default, rename = "fetchBids", alias = "fetchbids")]
    pub fetch_bids: ActivityConfig,
    #[serde(default, rename = "enrichUfpd", alias = "enrichufpd")]
    pub enrich_ufpd: ActivityConfig,
    #[serde(default, rename = "reportAnalytics", alias = "reportanalytics")]
    pub report_analytics: ActivityConfig,
    #[serde(default, rename = "transmitUfpd", alias = "transmitufpd")]
    pub transmit_ufpd: ActivityConfig,
    #[serde(default, rename = "transmitPreciseGeo", alias = "transmitprecisegeo")]
    pub transmit_precise_geo: ActivityConfig,
    #[serde(
        default,
        rename = "transmitUniqueRequestIds",
        alias = "transmituniquerequestids"
    )]
    pub transmit_unique_request_ids: ActivityConfig,
    #[serde(default, rename = "transmitTid", alias = "transmittid")]
    pub transmit_tids: ActivityConfig,
}

impl AllowActivities {
    /// Configuration block for `activity`.
    #[must_use]
    pub fn get(&self, activity: Activity) -> &ActivityConfig {
        match activity {
            Activity::SyncUser => &self.sync_user,
            Activity::FetchBids => &self.fetch_bids,
            Activity::EnrichUserFpd => &self.enrich_ufpd,
            Activity::ReportAnalytics => &self.report_analytics,
            Activity::TransmitUserFpd => &self.transmit_ufpd,
            Activity::TransmitPreciseGeo => &self.transmit_precise_geo,
            Activity::TransmitUniqueRequestIds => &self.transmit_unique_request_ids,
            Activity::TransmitTids => &self.transmit_tids,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActivityConfig {
    /// Result when no rule decides. Absent means allow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(default)]
    pub rules: Vec<ActivityRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActivityRule {
    #[serde(default)]
    pub condition: ActivityCondition,
    #[serde(default)]
    pub allow: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActivityCondition {
    #[serde(
        default,
        rename = "componentName",
        alias = "componentname",
        alias = "component_name"
    )]
    pub component_name: Vec<String>,
    #[serde(
        default,
        rename = "componentType",
        alias = "componenttype",
        alias = "component_type"
    )]
    pub component_type: Vec<String>,
    #[serde(default, rename = "gppSid", alias = "gppsid", alias = "gpp_sid")]
    pub gpp_sid: Vec<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpc: Option<String>,
}

/// IPv4 anonymization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Ipv4Config {
    #[serde(default = "default_ipv4_anon_keep_bits", alias = "anon-keep-bits")]
    #[validate(range(
        min = 0,
        max = 32,
        message = "bits cannot exceed 32 in ipv4 address, or be less than 0"
    ))]
    pub anon_keep_bits: i32,
}

impl Default for Ipv4Config {
    fn default() -> Self {
        Self {
            anon_keep_bits: default_ipv4_anon_keep_bits(),
        }
    }
}

impl Ipv4Config {
    #[must_use]
    pub fn validation_errors(&self) -> Vec<PrivacyError> {
        self.validate()
            .err()
            .map(|errs| collect_messages(&errs))
            .unwrap_or_default()
    }

    /// Leading bits to keep, falling back to the default when out of range.
    #[must_use]
    pub fn keep_bits(&self) -> u32 {
        checked_keep_bits(self.anon_keep_bits, IPV4_BITS, IPV4_DEFAULT_MASKING_BIT_SIZE)
    }
}

/// IPv6 anonymization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Ipv6Config {
    #[serde(default = "default_ipv6_anon_keep_bits", alias = "anon-keep-bits")]
    #[validate(range(
        min = 0,
        max = 128,
        message = "bits cannot exceed 128 in ipv6 address, or be less than 0"
    ))]
    pub anon_keep_bits: i32,
}

impl Default for Ipv6Config {
    fn default() -> Self {
        Self {
            anon_keep_bits: default_ipv6_anon_keep_bits(),
        }
    }
}

impl Ipv6Config {
    #[must_use]
    pub fn validation_errors(&self) -> Vec<PrivacyError> {
        self.validate()
            .err()
            .map(|errs| collect_messages(&errs))
            .unwrap_or_default()
    }

    /// Leading bits to keep, falling back to the default when out of range.
    #[must_use]
    pub fn keep_bits(&self) -> u32 {
        checked_keep_bits(self.anon_keep_bits, IPV6_BITS, IPV6_DEFAULT_MASKING_BIT_SIZE)
    }
}

fn default_ipv4_anon_keep_bits() -> i32 {
    IPV4_DEFAULT_MASKING_BIT_SIZE
}

fn default_ipv6_anon_keep_bits() -> i32 {
    IPV6_DEFAULT_MASKING_BIT_SIZE
}

fn checked_keep_bits(bits: i32, max: u32, default: i32) -> u32 {
    u32::try_from(bits)
        .ok()
        .filter(|b| *b <= max)
        .or_else(|| u32::try_from(default).ok())
        .unwrap_or(max)
}

fn collect_messages(errs: &ValidationErrors) -> Vec<PrivacyError> {
    errs.field_errors()
        .values()
        .flat_map(|field_errs| field_errs.iter())
        .map(|err| PrivacyError::InvalidIpMasking {
            message: err
                .message
                .as_ref()
                .map_or_else(|| err.code.to_string(), ToString::to_string),
        })
        .collect()
}
