//! Field-level PII redaction for OpenRTB requests.
//!
//! Every operation clones its input and redacts the clone. `None` in gives
//! `None` out.

use serde_json::Value;

use crate::account::{AccountPrivacy, Ipv4Config, Ipv6Config, IPV4_BITS, IPV6_BITS};
use crate::openrtb::{BidRequest, Device, Geo, User};
use crate::privacy::ip_masking::{
    scrub_ip, scrub_ipv4_lowest8, scrub_ipv6_lowest16, scrub_ipv6_lowest32,
};
use crate::privacy::Enforcement;

/// How hardware and device identifiers are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrubStrategyDeviceId {
    #[default]
    None,
    /// Clears ifa and every MAC and device id hash.
    All,
}

/// How an IPv4 address is anonymized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrubStrategyIpv4 {
    #[default]
    None,
    Lowest8,
    /// Keeps the configured number of leading bits.
    Subnet,
}

/// How an IPv6 address is anonymized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrubStrategyIpv6 {
    #[default]
    None,
    Lowest16,
    Lowest32,
    /// Keeps the configured number of leading bits.
    Subnet,
}

/// How geographic data is anonymized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrubStrategyGeo {
    #[default]
    None,
    Full,
    /// Rounds latitude and longitude to two decimals.
    ReducedPrecision,
}

/// How user identity and demographics are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrubStrategyUser {
    #[default]
    None,
    /// Clears buyeruid, id, yob and gender, and drops `ext.eids`.
    IdAndDemographic,
}

/// Removes PII from parts of an OpenRTB request.
pub trait Scrubber {
    /// Redacts the fields covered by the activity flags of `enforcement`.
    fn scrub_request(&self, request: &BidRequest, enforcement: &Enforcement) -> BidRequest;

    fn scrub_device(
        &self,
        device: Option<&Device>,
        id: ScrubStrategyDeviceId,
        ipv4: ScrubStrategyIpv4,
        ipv6: ScrubStrategyIpv6,
        geo: ScrubStrategyGeo,
    ) -> Option<Device>;

    fn scrub_user(
        &self,
        user: Option<&User>,
        strategy: ScrubStrategyUser,
        geo: ScrubStrategyGeo,
    ) -> Option<User>;
}

/// [`Scrubber`] that masks addresses with an account's IP settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpScrubber {
    ipv4: Ipv4Config,
    ipv6: Ipv6Config,
}

impl IpScrubber {
    #[must_use]
    pub fn new(ipv4: Ipv4Config, ipv6: Ipv6Config) -> Self {
        Self { ipv4, ipv6 }
    }

    #[must_use]
    pub fn from_privacy(privacy: &AccountPrivacy) -> Self {
        Self::new(privacy.ipv4, privacy.ipv6)
    }

    fn mask_ipv4(&self, ip: &str) -> String {
        scrub_ip(ip, self.ipv4.keep_bits(), IPV4_BITS)
    }

    fn mask_ipv6(&self, ip: &str) -> String {
        scrub_ip(ip, self.ipv6.keep_bits(), IPV6_BITS)
    }
}

impl Scrubber for IpScrubber {
    fn scrub_request(&self, request: &BidRequest, enforcement: &Enforcement) -> BidRequest {
        let mut request = request.clone();

        if enforcement.ufpd {
            if let Some(device) = request.device.as_mut() {
                clear_device_ids(device);
            }
            if let Some(user) = request.user.as_mut() {
                user.data = None;
                user.id = None;
                user.buyeruid = None;
                user.yob = None;
                user.gender = None;
                user.keywords = None;
                user.kwarray = None;
                user.ext = scrub_ext_field(user.ext.as_ref(), "data");
            }
        }

        if enforcement.eids {
            if let Some(user) = request.user.as_mut() {
                user.eids = None;
                user.ext = scrub_ext_field(user.ext.as_ref(), "eids");
            }
        }

        if enforcement.tid {
            if let Some(source) = request.source.as_mut() {
                source.tid = None;
            }
            for imp in &mut request.imp {
                imp.ext = scrub_ext_field(imp.ext.as_ref(), "tid");
            }
        }

        if enforcement.precise_geo {
            if let Some(user) = request.user.as_mut() {
                user.geo = scrub_geo_precision(user.geo.as_ref());
            }
            if let Some(device) = request.device.as_mut() {
                device.geo = scrub_geo_precision(device.geo.as_ref());
                device.ip = device.ip.as_deref().map(|ip| self.mask_ipv4(ip));
                device.ipv6 = device.ipv6.as_deref().map(|ip| self.mask_ipv6(ip));
            }
        }

        request
    }

    fn scrub_device(
        &self,
        device: Option<&Device>,
        id: ScrubStrategyDeviceId,
        ipv4: ScrubStrategyIpv4,
        ipv6: ScrubStrategyIpv6,
        geo: ScrubStrategyGeo,
    ) -> Option<Device> {
        let mut device = device?.clone();

        if id == ScrubStrategyDeviceId::All {
            clear_device_ids(&mut device);
        }

        device.ip = device.ip.as_deref().map(|ip| match ipv4 {
            ScrubStrategyIpv4::None => ip.to_string(),
            ScrubStrategyIpv4::Lowest8 => scrub_ipv4_lowest8(ip),
            ScrubStrategyIpv4::Subnet => self.mask_ipv4(ip),
        });

        device.ipv6 = device.ipv6.as_deref().map(|ip| match ipv6 {
            ScrubStrategyIpv6::None => ip.to_string(),
            ScrubStrategyIpv6::Lowest16 => scrub_ipv6_lowest16(ip),
            ScrubStrategyIpv6::Lowest32 => scrub_ipv6_lowest32(ip),
            ScrubStrategyIpv6::Subnet => self.mask_ipv6(ip),
        });

        device.geo = scrub_geo(device.geo.as_ref(), geo);
        Some(device)
    }

    fn scrub_user(
        &self,
        user: Option<&User>,
        strategy: ScrubStrategyUser,
        geo: ScrubStrategyGeo,
    ) -> Option<User> {
        let mut user = user?.clone();

        if strategy == ScrubStrategyUser::IdAndDemographic {
            user.buyeruid = None;
            user.id = None;
            user.yob = None;
            user.gender = None;
            user.ext = scrub_ext_field(user.ext.as_ref(), "eids");
        }

        user.geo = scrub_geo(user.geo.as_ref(), geo);
        Some(user)
    }
}

fn clear_device_ids(device: &mut Device) {
    device.didmd5 = None;
    device.didsha1 = None;
    device.dpidmd5 = None;
    device.dpidsha1 = None;
    device.ifa = None;
    device.macmd5 = None;
    device.macsha1 = None;
}

fn scrub_geo(geo: Option<&Geo>, strategy: ScrubStrategyGeo) -> Option<Geo> {
    match strategy {
        ScrubStrategyGeo::None => geo.cloned(),
        ScrubStrategyGeo::Full => scrub_geo_full(geo),
        ScrubStrategyGeo::ReducedPrecision => scrub_geo_precision(geo),
    }
}

/// Replaces the geo with an empty one.
#[must_use]
pub fn scrub_geo_full(geo: Option<&Geo>) -> Option<Geo> {
    geo.map(|_| Geo::default())
}

/// Rounds latitude and longitude to two decimals, keeping everything else.
#[must_use]
pub fn scrub_geo_precision(geo: Option<&Geo>) -> Option<Geo> {
    let mut geo = geo?.clone();
    geo.lat = geo.lat.map(round_to_hundredths);
    geo.lon = geo.lon.map(round_to_hundredths);
    Some(geo)
}

fn round_to_hundredths(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Removes `field` from a JSON object extension.
///
/// Non-object extensions and objects without the field are returned as they
/// are.
#[must_use]
pub fn scrub_ext_field(ext: Option<&Value>, field: &str) -> Option<Value> {
    let mut ext = ext?.clone();
    if let Value::Object(map) = &mut ext {
        map.remove(field);
    }
    Some(ext)
}
