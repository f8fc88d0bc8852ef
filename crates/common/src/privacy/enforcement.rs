use crate::account::AccountPrivacy;
use crate::openrtb::BidRequest;
use crate::privacy::lmt::effective_lmt;
use crate::privacy::{
    Activity, ActivityControl, ActivityRequest, Component, IpScrubber, ScrubStrategyDeviceId,
    ScrubStrategyGeo, ScrubStrategyIpv4, ScrubStrategyIpv6, ScrubStrategyUser, Scrubber,
};

/// Privacy regimes in force for one request and one component.
///
/// The first five flags come from regulations and consent signals; the
/// remaining four come from activity decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enforcement {
    pub ccpa: bool,
    pub coppa: bool,
    pub gdpr_geo: bool,
    pub gdpr_id: bool,
    pub lmt: bool,

    pub ufpd: bool,
    pub eids: bool,
    pub precise_geo: bool,
    pub tid: bool,
}

impl Enforcement {
    /// Reads the flags that come straight from the request: COPPA
    /// (`regs.coppa == 1`) and LMT (`device.lmt == 1`, or the value derived
    /// from iOS app signals, see [`crate::privacy::lmt`]).
    #[must_use]
    pub fn from_request_signals(request: &BidRequest) -> Self {
        Self {
            coppa: request.regs.as_ref().and_then(|regs| regs.coppa) == Some(1),
            lmt: effective_lmt(request) == Some(1),
            ..Default::default()
        }
    }

    /// Sets the activity flags for `component` from `control`'s decisions.
    #[must_use]
    pub fn with_activity_decisions(
        mut self,
        control: &ActivityControl,
        component: &Component,
        request: ActivityRequest<'_>,
    ) -> Self {
        let denied = |activity| !control.allow(activity, component, request);

        if denied(Activity::TransmitUserFpd) {
            self.ufpd = true;
            self.eids = true;
        }
        if denied(Activity::TransmitPreciseGeo) {
            self.precise_geo = true;
        }
        if denied(Activity::TransmitTids) {
            self.tid = true;
        }
        self
    }

    #[must_use]
    pub fn any(&self) -> bool {
        self.any_legacy() || self.any_activities()
    }

    #[must_use]
    pub fn any_legacy(&self) -> bool {
        self.ccpa || self.coppa || self.gdpr_geo || self.gdpr_id || self.lmt
    }

    #[must_use]
    pub fn any_activities(&self) -> bool {
        self.ufpd || self.eids || self.precise_geo || self.tid
    }

    #[must_use]
    pub fn device_id_scrub_strategy(&self) -> ScrubStrategyDeviceId {
        if self.coppa || self.gdpr_id || self.ccpa || self.lmt {
            ScrubStrategyDeviceId::All
        } else {
            ScrubStrategyDeviceId::None
        }
    }

    #[must_use]
    pub fn ipv4_scrub_strategy(&self) -> ScrubStrategyIpv4 {
        if self.coppa || self.gdpr_geo || self.ccpa || self.lmt {
            ScrubStrategyIpv4::Subnet
        } else {
            ScrubStrategyIpv4::None
        }
    }

    #[must_use]
    pub fn ipv6_scrub_strategy(&self) -> ScrubStrategyIpv6 {
        if self.gdpr_geo || self.ccpa || self.lmt || self.coppa {
            ScrubStrategyIpv6::Subnet
        } else {
            ScrubStrategyIpv6::None
        }
    }

    /// COPPA removes geo entirely; the other regimes only reduce precision.
    #[must_use]
    pub fn geo_scrub_strategy(&self) -> ScrubStrategyGeo {
        if self.coppa {
            ScrubStrategyGeo::Full
        } else if self.gdpr_geo || self.ccpa || self.lmt {
            ScrubStrategyGeo::ReducedPrecision
        } else {
            ScrubStrategyGeo::None
        }
    }

    #[must_use]
    pub fn user_scrub_strategy(&self) -> ScrubStrategyUser {
        if self.coppa || self.ccpa || self.lmt || self.gdpr_id {
            ScrubStrategyUser::IdAndDemographic
        } else {
            ScrubStrategyUser::None
        }
    }

    /// Redacts `request` in place using the account's IP masking.
    pub fn apply(&self, request: Option<&mut BidRequest>, privacy: &AccountPrivacy) {
        self.apply_with(request, &IpScrubber::from_privacy(privacy));
    }

    /// Redacts `request` in place with `scrubber`.
    ///
    /// Activity flags and legacy flags are applied independently: the first
    /// runs [`Scrubber::scrub_request`], the second replaces the user and the
    /// device.
    pub fn apply_with<S: Scrubber + ?Sized>(&self, request: Option<&mut BidRequest>, scrubber: &S) {
        let Some(request) = request else {
            return;
        };

        if self.any_activities() {
            *request = scrubber.scrub_request(request, self);
        }

        if self.any_legacy() {
            let geo = self.geo_scrub_strategy();
            request.user =
                scrubber.scrub_user(request.user.as_ref(), self.user_scrub_strategy(), geo);
            request.device = scrubber.scrub_device(
                request.device.as_ref(),
                self.device_id_scrub_strategy(),
                self.ipv4_scrub_strategy(),
                self.ipv6_scrub_strategy(),
                geo,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::account::{ActivityCondition, ActivityConfig, ActivityRule, AllowActivities};
    use crate::openrtb::{Device, Regs, User};
    use crate::test_support::tests::{test_device, test_user};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Request(Enforcement),
        User(ScrubStrategyUser, ScrubStrategyGeo),
        Device(
            ScrubStrategyDeviceId,
            ScrubStrategyIpv4,
            ScrubStrategyIpv6,
            ScrubStrategyGeo,
        ),
    }

    /// Records calls and returns recognizable replacements.
    #[derive(Default)]
    struct RecordingScrubber {
        calls: RefCell<Vec<Call>>,
    }

    impl RecordingScrubber {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl Scrubber for RecordingScrubber {
        fn scrub_request(&self, request: &BidRequest, enforcement: &Enforcement) -> BidRequest {
            self.calls.borrow_mut().push(Call::Request(*enforcement));
            BidRequest {
                id: "scrubbed".to_string(),
                ..request.clone()
            }
        }

        fn scrub_device(
            &self,
            _device: Option<&Device>,
            id: ScrubStrategyDeviceId,
            ipv4: ScrubStrategyIpv4,
            ipv6: ScrubStrategyIpv6,
            geo: ScrubStrategyGeo,
        ) -> Option<Device> {
            self.calls
                .borrow_mut()
                .push(Call::Device(id, ipv4, ipv6, geo));
            Some(Device {
                ip: Some("replaced".to_string()),
                ..Default::default()
            })
        }

        fn scrub_user(
            &self,
            _user: Option<&User>,
            strategy: ScrubStrategyUser,
            geo: ScrubStrategyGeo,
        ) -> Option<User> {
            self.calls.borrow_mut().push(Call::User(strategy, geo));
            Some(User {
                id: Some("replaced".to_string()),
                ..Default::default()
            })
        }
    }

    fn test_request() -> BidRequest {
        BidRequest {
            id: "req-1".to_string(),
            device: Some(test_device()),
            user: Some(test_user()),
            ..Default::default()
        }
    }

    #[test]
    fn test_any() {
        let cases = [
            ("none", Enforcement::default(), false, false),
            (
                "legacy",
                Enforcement {
                    lmt: true,
                    ..Default::default()
                },
                true,
                false,
            ),
            (
                "activities",
                Enforcement {
                    tid: true,
                    ..Default::default()
                },
                false,
                true,
            ),
            (
                "both",
                Enforcement {
                    gdpr_id: true,
                    eids: true,
                    ..Default::default()
                },
                true,
                true,
            ),
        ];

        for (name, enforcement, legacy, activities) in cases {
            assert_eq!(enforcement.any_legacy(), legacy, "case: {name}");
            assert_eq!(enforcement.any_activities(), activities, "case: {name}");
            assert_eq!(enforcement.any(), legacy || activities, "case: {name}");
        }
    }

    #[test]
    fn test_scrub_strategies() {
        let cases = [
            (
                "none",
                Enforcement::default(),
                ScrubStrategyDeviceId::None,
                ScrubStrategyIpv4::None,
                ScrubStrategyIpv6::None,
                ScrubStrategyGeo::None,
                ScrubStrategyUser::None,
            ),
            (
                "coppa",
                Enforcement {
                    coppa: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::All,
                ScrubStrategyIpv4::Subnet,
                ScrubStrategyIpv6::Subnet,
                ScrubStrategyGeo::Full,
                ScrubStrategyUser::IdAndDemographic,
            ),
            (
                "ccpa",
                Enforcement {
                    ccpa: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::All,
                ScrubStrategyIpv4::Subnet,
                ScrubStrategyIpv6::Subnet,
                ScrubStrategyGeo::ReducedPrecision,
                ScrubStrategyUser::IdAndDemographic,
            ),
            (
                "lmt",
                Enforcement {
                    lmt: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::All,
                ScrubStrategyIpv4::Subnet,
                ScrubStrategyIpv6::Subnet,
                ScrubStrategyGeo::ReducedPrecision,
                ScrubStrategyUser::IdAndDemographic,
            ),
            (
                "gdpr-id-only",
                Enforcement {
                    gdpr_id: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::All,
                ScrubStrategyIpv4::None,
                ScrubStrategyIpv6::None,
                ScrubStrategyGeo::None,
                ScrubStrategyUser::IdAndDemographic,
            ),
            (
                "gdpr-geo-only",
                Enforcement {
                    gdpr_geo: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::None,
                ScrubStrategyIpv4::Subnet,
                ScrubStrategyIpv6::Subnet,
                ScrubStrategyGeo::ReducedPrecision,
                ScrubStrategyUser::None,
            ),
            (
                "coppa-and-gdpr-geo",
                Enforcement {
                    coppa: true,
                    gdpr_geo: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::All,
                ScrubStrategyIpv4::Subnet,
                ScrubStrategyIpv6::Subnet,
                ScrubStrategyGeo::Full,
                ScrubStrategyUser::IdAndDemographic,
            ),
            (
                "activities-only",
                Enforcement {
                    ufpd: true,
                    eids: true,
                    precise_geo: true,
                    tid: true,
                    ..Default::default()
                },
                ScrubStrategyDeviceId::None,
                ScrubStrategyIpv4::None,
                ScrubStrategyIpv6::None,
                ScrubStrategyGeo::None,
                ScrubStrategyUser::None,
            ),
        ];

        for (name, enforcement, device_id, ipv4, ipv6, geo, user) in cases {
            assert_eq!(enforcement.device_id_scrub_strategy(), device_id, "case: {name}");
            assert_eq!(enforcement.ipv4_scrub_strategy(), ipv4, "case: {name}");
            assert_eq!(enforcement.ipv6_scrub_strategy(), ipv6, "case: {name}");
            assert_eq!(enforcement.geo_scrub_strategy(), geo, "case: {name}");
            assert_eq!(enforcement.user_scrub_strategy(), user, "case: {name}");
        }
    }

    #[test]
    fn test_apply_gates_are_independent() {
        let legacy_calls = vec![
            Call::User(ScrubStrategyUser::IdAndDemographic, ScrubStrategyGeo::ReducedPrecision),
            Call::Device(
                ScrubStrategyDeviceId::All,
                ScrubStrategyIpv4::Subnet,
                ScrubStrategyIpv6::Subnet,
                ScrubStrategyGeo::ReducedPrecision,
            ),
        ];
        let activities_only = Enforcement {
            ufpd: true,
            ..Default::default()
        };
        let legacy_only = Enforcement {
            ccpa: true,
            ..Default::default()
        };
        let both = Enforcement {
            ccpa: true,
            ufpd: true,
            ..Default::default()
        };

        let cases = [
            ("none", Enforcement::default(), Vec::new()),
            (
                "activities-only",
                activities_only,
                vec![Call::Request(activities_only)],
            ),
            ("legacy-only", legacy_only, legacy_calls.clone()),
            (
                "both",
                both,
                std::iter::once(Call::Request(both))
                    .chain(legacy_calls.clone())
                    .collect(),
            ),
        ];

        for (name, enforcement, expected) in cases {
            let scrubber = RecordingScrubber::default();
            let mut request = test_request();

            enforcement.apply_with(Some(&mut request), &scrubber);

            assert_eq!(scrubber.calls(), expected, "case: {name}");
        }
    }

    #[test]
    fn test_apply_replaces_request_parts() {
        let scrubber = RecordingScrubber::default();
        let mut request = test_request();
        let enforcement = Enforcement {
            tid: true,
            lmt: true,
            ..Default::default()
        };

        enforcement.apply_with(Some(&mut request), &scrubber);

        assert_eq!(request.id, "scrubbed");
        assert_eq!(
            request.user.as_ref().and_then(|u| u.id.as_deref()),
            Some("replaced")
        );
        assert_eq!(
            request.device.as_ref().and_then(|d| d.ip.as_deref()),
            Some("replaced")
        );
    }

    #[test]
    fn test_apply_none_request() {
        let scrubber = RecordingScrubber::default();
        let enforcement = Enforcement {
            coppa: true,
            ufpd: true,
            ..Default::default()
        };

        enforcement.apply_with(None, &scrubber);

        assert!(scrubber.calls().is_empty());
    }

    #[test]
    fn test_apply_with_account_ip_masking() {
        let mut request = test_request();
        let privacy = AccountPrivacy {
            ipv4: crate::account::Ipv4Config { anon_keep_bits: 16 },
            ..Default::default()
        };
        let enforcement = Enforcement {
            gdpr_geo: true,
            ..Default::default()
        };

        enforcement.apply(Some(&mut request), &privacy);

        let device = request.device.as_ref().expect("should keep device");
        assert_eq!(device.ip.as_deref(), Some("1.2.0.0"));
        assert_eq!(device.ipv6.as_deref(), Some("2001:1db8:2233:4400::"));
        assert_eq!(device.ifa.as_deref(), Some("anyIFA"), "gdpr geo keeps ids");
        let user = request.user.as_ref().expect("should keep user");
        assert_eq!(user.id.as_deref(), Some("anyUserID"));
        assert_eq!(user.geo.as_ref().and_then(|g| g.lat), Some(123.46));
    }

    #[test]
    fn test_apply_coppa_removes_geo() {
        let mut request = test_request();
        let enforcement = Enforcement {
            coppa: true,
            gdpr_geo: true,
            ..Default::default()
        };

        enforcement.apply(Some(&mut request), &AccountPrivacy::default());

        let user = request.user.as_ref().expect("should keep user");
        assert_eq!(user.geo, Some(crate::openrtb::Geo::default()));
        assert_eq!(user.id, None);
        let device = request.device.as_ref().expect("should keep device");
        assert_eq!(device.geo, Some(crate::openrtb::Geo::default()));
        assert_eq!(device.ifa, None);
    }

    #[test]
    fn test_from_request_signals() {
        let cases = [
            ("empty", BidRequest::default(), false, false),
            (
                "coppa",
                BidRequest {
                    regs: Some(Regs {
                        coppa: Some(1),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                true,
                false,
            ),
            (
                "coppa-zero",
                BidRequest {
                    regs: Some(Regs {
                        coppa: Some(0),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                false,
                false,
            ),
            (
                "lmt",
                BidRequest {
                    device: Some(Device {
                        lmt: Some(1),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                false,
                true,
            ),
            (
                "ios-14.0-without-ifa",
                BidRequest {
                    app: Some(serde_json::json!({})),
                    device: Some(Device {
                        os: Some("iOS".to_string()),
                        osv: Some("14.0".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                false,
                true,
            ),
            (
                "ios-14.2-authorized",
                BidRequest {
                    app: Some(serde_json::json!({})),
                    device: Some(Device {
                        os: Some("iOS".to_string()),
                        osv: Some("14.2".to_string()),
                        ext: Some(serde_json::json!({"atts": 3})),
                        lmt: Some(1),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                false,
                false,
            ),
        ];

        for (name, request, coppa, lmt) in cases {
            let enforcement = Enforcement::from_request_signals(&request);
            assert_eq!(enforcement.coppa, coppa, "case: {name}");
            assert_eq!(enforcement.lmt, lmt, "case: {name}");
            assert!(!enforcement.any_activities(), "case: {name}");
        }
    }

    #[test]
    fn test_with_activity_decisions() {
        let deny_bidder_x = ActivityConfig {
            default: Some(true),
            rules: vec![ActivityRule {
                allow: false,
                condition: ActivityCondition {
                    component_name: vec!["bidderX".to_string()],
                    ..Default::default()
                },
            }],
        };
        let privacy = AccountPrivacy {
            allow_activities: Some(AllowActivities {
                transmit_ufpd: deny_bidder_x.clone(),
                transmit_tids: deny_bidder_x,
                transmit_precise_geo: ActivityConfig {
                    default: Some(false),
                    rules: Vec::new(),
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let control = ActivityControl::new(Some(&privacy)).expect("should build control");

        let denied = Enforcement::default().with_activity_decisions(
            &control,
            &Component::bidder("bidderX"),
            ActivityRequest::Empty,
        );
        assert_eq!(
            denied,
            Enforcement {
                ufpd: true,
                eids: true,
                precise_geo: true,
                tid: true,
                ..Default::default()
            }
        );

        let allowed = Enforcement {
            ccpa: true,
            ..Default::default()
        }
        .with_activity_decisions(
            &control,
            &Component::bidder("bidderY"),
            ActivityRequest::Empty,
        );
        assert_eq!(
            allowed,
            Enforcement {
                ccpa: true,
                precise_geo: true,
                ..Default::default()
            }
        );
    }
}
