use std::fmt;

use error_stack::Report;

use crate::error::PrivacyError;

pub const COMPONENT_TYPE_BIDDER: &str = "bidder";
pub const COMPONENT_TYPE_ANALYTICS: &str = "analytics";
pub const COMPONENT_TYPE_REAL_TIME_DATA: &str = "rtd";
pub const COMPONENT_TYPE_GENERAL: &str = "general";
pub const COMPONENT_TYPE_USER_ID: &str = "userid";

/// Scopes accepted as the prefix of a scoped component name. Any other
/// prefix scopes the name to `general`.
const KNOWN_SCOPES: [&str; 5] = [
    COMPONENT_TYPE_BIDDER,
    COMPONENT_TYPE_ANALYTICS,
    COMPONENT_TYPE_REAL_TIME_DATA,
    COMPONENT_TYPE_GENERAL,
    COMPONENT_TYPE_USER_ID,
];

const WILDCARD: &str = "*";

/// An actor whose data flow is governed by activity rules.
///
/// Equality ignores case on both the kind and the name, so `Bidder/AppNexus`
/// and `bidder/appnexus` identify the same component.
#[derive(Debug, Clone)]
pub struct Component {
    pub kind: String,
    pub name: String,
}

impl Component {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn bidder(name: impl Into<String>) -> Self {
        Self::new(COMPONENT_TYPE_BIDDER, name)
    }

    pub fn analytics(name: impl Into<String>) -> Self {
        Self::new(COMPONENT_TYPE_ANALYTICS, name)
    }

    pub fn rtd(name: impl Into<String>) -> Self {
        Self::new(COMPONENT_TYPE_REAL_TIME_DATA, name)
    }

    pub fn general(name: impl Into<String>) -> Self {
        Self::new(COMPONENT_TYPE_GENERAL, name)
    }

    #[must_use]
    pub fn matches_name(&self, v: &str) -> bool {
        equal_fold(&self.name, v)
    }

    #[must_use]
    pub fn matches_type(&self, v: &str) -> bool {
        equal_fold(&self.kind, v)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.matches_type(&other.kind) && self.matches_name(&other.name)
    }
}

impl Eq for Component {}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

/// One entry of a rule's `componentName` list.
///
/// Entries are either a bare name (`bidderA`), which matches a component of
/// any kind, or a scoped name (`bidder.bidderA`), which also pins the kind.
/// The name `*` matches every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMatcher {
    kind: Option<String>,
    name: String,
}

impl ComponentMatcher {
    /// Parses a `componentName` entry.
    ///
    /// A scope prefix outside `bidder`, `analytics`, `rtd`, `general` and
    /// `userid` is replaced by `general`.
    ///
    /// # Errors
    ///
    /// Returns [`PrivacyError::EmptyComponent`] for an empty entry and
    /// [`PrivacyError::InvalidComponent`] for an empty segment or more than
    /// one `.` separator.
    pub fn parse(condition: &str) -> Result<Self, Report<PrivacyError>> {
        if condition.is_empty() {
            return Err(Report::new(PrivacyError::EmptyComponent));
        }

        let invalid = || {
            Report::new(PrivacyError::InvalidComponent {
                condition: condition.to_string(),
            })
        };

        let mut parts = condition.split('.');
        let first = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let matcher = match (parts.next(), parts.next()) {
            (None, _) => Self::name(first),
            (Some(name), None) if !name.is_empty() => {
                let scope = if KNOWN_SCOPES.iter().any(|known| equal_fold(known, first)) {
                    first
                } else {
                    COMPONENT_TYPE_GENERAL
                };
                Self::scoped(scope, name)
            }
            _ => return Err(invalid()),
        };
        Ok(matcher)
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            kind: None,
            name: name.into(),
        }
    }

    pub fn scoped(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, target: &Component) -> bool {
        let kind_matches = self
            .kind
            .as_deref()
            .is_none_or(|kind| target.matches_type(kind));
        kind_matches && (self.name == WILDCARD || target.matches_name(&self.name))
    }
}

/// Unicode case-insensitive comparison without allocating.
fn equal_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
