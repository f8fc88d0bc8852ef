use error_stack::Report;

use crate::account::ActivityRule;
use crate::error::PrivacyError;
use crate::privacy::{ActivityRequest, Component, ComponentMatcher};

/// Outcome of evaluating a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityResult {
    /// The rule does not apply to the target.
    Abstain,
    Allow,
    Deny,
}

impl ActivityResult {
    #[must_use]
    pub fn from_allow(allow: bool) -> Self {
        if allow {
            ActivityResult::Allow
        } else {
            ActivityResult::Deny
        }
    }
}

/// A rule inside an activity plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Condition(ConditionRule),
}

impl Rule {
    #[must_use]
    pub fn evaluate(&self, target: &Component, request: ActivityRequest<'_>) -> ActivityResult {
        match self {
            Rule::Condition(rule) => rule.evaluate(target, request),
        }
    }
}

impl From<ConditionRule> for Rule {
    fn from(rule: ConditionRule) -> Self {
        Rule::Condition(rule)
    }
}

/// Rule that applies when every configured clause matches.
///
/// Empty clauses impose no constraint. A rule with no clauses at all always
/// returns its result.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRule {
    result: ActivityResult,
    component_name: Vec<ComponentMatcher>,
    component_type: Vec<String>,
    gpp_sid: Vec<i8>,
    gpc: Option<String>,
}

impl ConditionRule {
    #[must_use]
    pub fn new(allow: bool) -> Self {
        Self {
            result: ActivityResult::from_allow(allow),
            component_name: Vec::new(),
            component_type: Vec::new(),
            gpp_sid: Vec::new(),
            gpc: None,
        }
    }

    /// Builds a rule from its account configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::InvalidComponent`] when a `componentName`
    /// entry cannot be parsed.
    pub fn from_config(rule: &ActivityRule) -> Result<Self, Report<PrivacyError>> {
        let component_name = rule
            .condition
            .component_name
            .iter()
            .map(|name| ComponentMatcher::parse(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            result: ActivityResult::from_allow(rule.allow),
            component_name,
            component_type: rule.condition.component_type.clone(),
            gpp_sid: rule.condition.gpp_sid.clone(),
            gpc: rule.condition.gpc.clone(),
        })
    }

    #[must_use]
    pub fn with_component_names(mut self, names: Vec<ComponentMatcher>) -> Self {
        self.component_name = names;
        self
    }

    #[must_use]
    pub fn with_component_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component_type = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_gpp_sid(mut self, gpp_sid: Vec<i8>) -> Self {
        self.gpp_sid = gpp_sid;
        self
    }

    #[must_use]
    pub fn with_gpc(mut self, gpc: impl Into<String>) -> Self {
        self.gpc = Some(gpc.into());
        self
    }

    #[must_use]
    pub fn evaluate(&self, target: &Component, request: ActivityRequest<'_>) -> ActivityResult {
        if !evaluate_component_name(target, &self.component_name) {
            return ActivityResult::Abstain;
        }
        if !evaluate_component_type(target, &self.component_type) {
            return ActivityResult::Abstain;
        }
        if !evaluate_gpp_sid(&self.gpp_sid, request) {
            return ActivityResult::Abstain;
        }
        if !evaluate_gpc(self.gpc.as_deref(), request) {
            return ActivityResult::Abstain;
        }
        self.result
    }
}

fn evaluate_component_name(target: &Component, names: &[ComponentMatcher]) -> bool {
    names.is_empty() || names.iter().any(|matcher| matcher.matches(target))
}

fn evaluate_component_type(target: &Component, types: &[String]) -> bool {
    types.is_empty() || types.iter().any(|kind| target.matches_type(kind))
}

fn evaluate_gpp_sid(condition: &[i8], request: ActivityRequest<'_>) -> bool {
    if condition.is_empty() {
        return true;
    }
    let requested = request.gpp_sid();
    condition.iter().any(|sid| requested.contains(sid))
}

fn evaluate_gpc(condition: Option<&str>, request: ActivityRequest<'_>) -> bool {
    match condition {
        None | Some("") => true,
        Some(expected) => request.gpc().is_some_and(|gpc| gpc == expected),
    }
}
