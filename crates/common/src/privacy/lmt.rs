//! Limit Ad Tracking derived from iOS app signals.
//!
//! From iOS 14 the `device.lmt` flag is no longer sent reliably by apps, so it
//! is derived from other device fields:
//!
//! - iOS 14.0 and 14.1: an empty or all-zero advertising id means tracking is
//!   limited.
//! - iOS 14.2 and later: the App Tracking Transparency status in
//!   `device.ext.atts` decides. Restricted (1) and denied (2) limit tracking,
//!   not determined (0) and authorized (3) do not. Any other value keeps the
//!   flag the request already carries.

use std::borrow::Cow;

use log::trace;

use crate::openrtb::{BidRequest, Device};

const IOS: &str = "ios";
const ZERO_IFA: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IosVersion {
    /// 14.0 or 14.1
    Ios14X,
    Ios142OrGreater,
    Unknown,
}

/// Returns the request with `device.lmt` derived from iOS signals.
///
/// Requests that are not iOS app requests, or whose flag is already what the
/// signals imply, are returned borrowed.
#[must_use]
pub fn modify_for_ios(request: &BidRequest) -> Cow<'_, BidRequest> {
    let current = request.device.as_ref().and_then(|device| device.lmt);
    let derived = effective_lmt(request);
    if derived == current {
        return Cow::Borrowed(request);
    }

    let mut request = request.clone();
    if let Some(device) = request.device.as_mut() {
        device.lmt = derived;
    }
    Cow::Owned(request)
}

/// The `device.lmt` value the request should be treated as carrying.
#[must_use]
pub fn effective_lmt(request: &BidRequest) -> Option<i8> {
    let device = request.device.as_ref()?;
    if !is_request_for_ios(request) {
        return device.lmt;
    }

    let version = classify_version(device.osv.as_deref().unwrap_or_default());
    let derived = match version {
        IosVersion::Ios14X => Some(lmt_for_ios_14x(device)),
        IosVersion::Ios142OrGreater => lmt_for_ios_142_or_greater(device).or(device.lmt),
        IosVersion::Unknown => device.lmt,
    };
    trace!("iOS {:?} request treated as lmt={:?}", version, derived);
    derived
}

fn is_request_for_ios(request: &BidRequest) -> bool {
    request.app.is_some()
        && request
            .device
            .as_ref()
            .and_then(|device| device.os.as_deref())
            .is_some_and(|os| os.eq_ignore_ascii_case(IOS))
}

/// Accepts `major.minor` or `major.minor.patch`.
fn classify_version(osv: &str) -> IosVersion {
    let parts: Vec<&str> = osv.split('.').collect();
    if !(2..=3).contains(&parts.len()) {
        return IosVersion::Unknown;
    }

    let numbers: Option<Vec<u32>> = parts.iter().map(|part| part.parse().ok()).collect();
    match numbers.as_deref() {
        Some([14, 0, ..] | [14, 1, ..]) => IosVersion::Ios14X,
        Some([major, minor, ..]) if *major > 14 || (*major == 14 && *minor >= 2) => {
            IosVersion::Ios142OrGreater
        }
        _ => IosVersion::Unknown,
    }
}

fn lmt_for_ios_14x(device: &Device) -> i8 {
    match device.ifa.as_deref() {
        None | Some("" | ZERO_IFA) => 1,
        Some(_) => 0,
    }
}

fn lmt_for_ios_142_or_greater(device: &Device) -> Option<i8> {
    let atts = device.ext.as_ref()?.get("atts")?.as_u64()?;
    match atts {
        1 | 2 => Some(1),
        0 | 3 => Some(0),
        _ => None,
    }
}
