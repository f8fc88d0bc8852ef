use std::collections::HashMap;

use error_stack::Report;
use log::{debug, trace};

use crate::account::{AccountPrivacy, ActivityConfig, Ipv4Config, Ipv6Config};
use crate::error::PrivacyError;
use crate::privacy::rule::{ActivityResult, ConditionRule, Rule};
use crate::privacy::{Activity, ActivityRequest, Component, IpScrubber};

/// Result of a plan whose configuration leaves `default` unset.
const DEFAULT_ACTIVITY_RESULT: bool = true;

/// Ordered rules for one activity plus the fallback result.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPlan {
    default_result: bool,
    rules: Vec<Rule>,
}

impl ActivityPlan {
    #[must_use]
    pub fn new(default_result: bool, rules: Vec<Rule>) -> Self {
        Self {
            default_result,
            rules,
        }
    }

    /// Builds the plan for one activity, keeping rule order.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::InvalidComponent`] when a rule carries a
    /// malformed component name.
    pub fn from_config(config: &ActivityConfig) -> Result<Self, Report<PrivacyError>> {
        let rules = config
            .rules
            .iter()
            .map(|rule| ConditionRule::from_config(rule).map(Rule::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            activity_default_to_default_result(config.default),
            rules,
        ))
    }

    /// First rule that does not abstain decides; otherwise the default.
    #[must_use]
    pub fn evaluate(&self, target: &Component, request: ActivityRequest<'_>) -> bool {
        for rule in &self.rules {
            match rule.evaluate(target, request) {
                ActivityResult::Allow => return true,
                ActivityResult::Deny => return false,
                ActivityResult::Abstain => {}
            }
        }
        self.default_result
    }
}

#[must_use]
pub fn activity_default_to_default_result(default: Option<bool>) -> bool {
    default.unwrap_or(DEFAULT_ACTIVITY_RESULT)
}

/// Compiled activity rules and IP masking settings for one account.
///
/// Built once when configuration is loaded and only read afterwards, so a
/// single instance can be shared across threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityControl {
    plans: HashMap<Activity, ActivityPlan>,
    ipv4: Ipv4Config,
    ipv6: Ipv6Config,
}

impl ActivityControl {
    /// Compiles the account's privacy configuration.
    ///
    /// Without configuration, or without `allow_activities`, every activity
    /// is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::InvalidComponent`] when any rule carries a
    /// malformed component name.
    pub fn new(privacy: Option<&AccountPrivacy>) -> Result<Self, Report<PrivacyError>> {
        let Some(privacy) = privacy else {
            return Ok(Self::default());
        };

        let mut plans = HashMap::new();
        if let Some(activities) = &privacy.allow_activities {
            for activity in Activity::ALL {
                let plan = ActivityPlan::from_config(activities.get(activity))?;
                debug!(
                    "Built {} plan with {} rule(s), default {}",
                    activity,
                    plan.rules.len(),
                    plan.default_result
                );
                plans.insert(activity, plan);
            }
        }

        Ok(Self {
            plans,
            ipv4: privacy.ipv4,
            ipv6: privacy.ipv6,
        })
    }

    /// Whether `target` may perform `activity` in the given request context.
    #[must_use]
    pub fn allow(
        &self,
        activity: Activity,
        target: &Component,
        request: ActivityRequest<'_>,
    ) -> bool {
        let allowed = self
            .plans
            .get(&activity)
            .is_none_or(|plan| plan.evaluate(target, request));
        trace!(
            "Activity {} for {}: {}",
            activity,
            target,
            if allowed { "allow" } else { "deny" }
        );
        allowed
    }

    #[must_use]
    pub fn ipv4_config(&self) -> &Ipv4Config {
        &self.ipv4
    }

    #[must_use]
    pub fn ipv6_config(&self) -> &Ipv6Config {
        &self.ipv6
    }

    /// Scrubber using this account's IP masking.
    #[must_use]
    pub fn scrubber(&self) -> IpScrubber {
        IpScrubber::new(self.ipv4, self.ipv6)
    }
}
