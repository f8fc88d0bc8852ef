use std::fmt;
use std::str::FromStr;

use crate::error::PrivacyError;

/// Privacy-relevant operations that account rules can gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    SyncUser,
    FetchBids,
    EnrichUserFpd,
    ReportAnalytics,
    TransmitUserFpd,
    TransmitPreciseGeo,
    TransmitUniqueRequestIds,
    TransmitTids,
}

impl Activity {
    /// Every activity, in catalog order.
    pub const ALL: [Activity; 8] = [
        Activity::SyncUser,
        Activity::FetchBids,
        Activity::EnrichUserFpd,
        Activity::ReportAnalytics,
        Activity::TransmitUserFpd,
        Activity::TransmitPreciseGeo,
        Activity::TransmitUniqueRequestIds,
        Activity::TransmitTids,
    ];

    /// Name used in account configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Activity::SyncUser => "syncUser",
            Activity::FetchBids => "fetchBids",
            Activity::EnrichUserFpd => "enrichUfpd",
            Activity::ReportAnalytics => "reportAnalytics",
            Activity::TransmitUserFpd => "transmitUfpd",
            Activity::TransmitPreciseGeo => "transmitPreciseGeo",
            Activity::TransmitUniqueRequestIds => "transmitUniqueRequestIds",
            Activity::TransmitTids => "transmitTid",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = PrivacyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activity::ALL
            .into_iter()
            .find(|activity| activity.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PrivacyError::Configuration {
                message: format!("unknown activity: {s}"),
            })
    }
}
