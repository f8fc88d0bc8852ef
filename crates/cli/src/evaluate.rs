//! Activity decisions and request scrubbing for a single component.

use std::fs;
use std::path::Path;

use prebid_privacy_common::openrtb::BidRequest;
use prebid_privacy_common::privacy::lmt;
use prebid_privacy_common::privacy::{Activity, ActivityRequest, Component, Enforcement, Policies};

use crate::config::load_registry;
use crate::error::CliError;

/// Component and account a command evaluates.
#[derive(Debug, Clone)]
pub struct Target {
    pub account: String,
    pub component: Component,
}

/// Consent-derived flags supplied on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyFlags {
    pub gdpr_id: bool,
    pub gdpr_geo: bool,
    pub ccpa: bool,
}

fn read_bid_request(path: &Path) -> Result<BidRequest, CliError> {
    let content = fs::read_to_string(path)?;
    let request = serde_json::from_str(&content)?;
    Ok(request)
}

/// Evaluate one activity for a component.
///
/// Request signals come from `request` when given, otherwise from
/// `policies`.
pub fn decide(
    settings: &Path,
    target: &Target,
    activity: Activity,
    request: Option<&Path>,
    policies: &Policies,
) -> Result<bool, CliError> {
    let registry = load_registry(settings)?;
    let control = registry.control_for(&target.account);

    let bid_request = request.map(read_bid_request).transpose()?;
    let activity_request = match &bid_request {
        Some(bid_request) => ActivityRequest::from_bid_request(bid_request),
        None => ActivityRequest::from_policies(policies),
    };

    Ok(control.allow(activity, &target.component, activity_request))
}

/// Redact a bid request for a component.
///
/// iOS app requests first get `device.lmt` derived from their tracking
/// signals.
pub fn scrub(
    settings: &Path,
    target: &Target,
    request: &Path,
    flags: LegacyFlags,
) -> Result<BidRequest, CliError> {
    let registry = load_registry(settings)?;
    let control = registry.control_for(&target.account);
    let bid_request = read_bid_request(request)?;
    let mut bid_request = lmt::modify_for_ios(&bid_request).into_owned();

    let enforcement = Enforcement {
        gdpr_id: flags.gdpr_id,
        gdpr_geo: flags.gdpr_geo,
        ccpa: flags.ccpa,
        ..Enforcement::from_request_signals(&bid_request)
    }
    .with_activity_decisions(
        &control,
        &target.component,
        ActivityRequest::from_bid_request(&bid_request),
    );

    log::debug!("Enforcement for {}: {:?}", target.component, enforcement);

    enforcement.apply_with(Some(&mut bid_request), &control.scrubber());
    Ok(bid_request)
}

/// Print `allow` or `deny` for one activity.
pub fn allow(
    settings: &Path,
    target: &Target,
    activity: Activity,
    request: Option<&Path>,
    policies: &Policies,
) -> Result<(), CliError> {
    let allowed = decide(settings, target, activity, request, policies)?;
    println!("{}", if allowed { "allow" } else { "deny" });
    Ok(())
}

/// Print the redacted bid request as JSON.
pub fn scrub_and_print(
    settings: &Path,
    target: &Target,
    request: &Path,
    flags: LegacyFlags,
) -> Result<(), CliError> {
    let scrubbed = scrub(settings, target, request, flags)?;
    println!("{}", serde_json::to_string_pretty(&scrubbed)?);
    Ok(())
}
