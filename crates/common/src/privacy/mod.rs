//! Activity controls and PII scrubbing.
//!
//! [`ActivityControl`] answers whether a component may perform an
//! [`Activity`]. [`Enforcement`] collects the regimes in force for a request
//! and applies them through a [`Scrubber`].

pub mod activity;
pub mod component;
pub mod control;
pub mod enforcement;
pub mod ip_masking;
pub mod lmt;
pub mod request;
pub mod rule;
pub mod scrubber;

pub use activity::Activity;
pub use component::{
    Component, ComponentMatcher, COMPONENT_TYPE_ANALYTICS, COMPONENT_TYPE_BIDDER,
    COMPONENT_TYPE_GENERAL, COMPONENT_TYPE_REAL_TIME_DATA, COMPONENT_TYPE_USER_ID,
};
pub use control::{ActivityControl, ActivityPlan};
pub use enforcement::Enforcement;
pub use request::{ActivityRequest, Policies};
pub use rule::{ActivityResult, ConditionRule, Rule};
pub use scrubber::{
    IpScrubber, ScrubStrategyDeviceId, ScrubStrategyGeo, ScrubStrategyIpv4, ScrubStrategyIpv6,
    ScrubStrategyUser, Scrubber,
};
