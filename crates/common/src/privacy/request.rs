use crate::openrtb::BidRequest;

/// Regulatory signals available to call sites that have no bid request at
/// hand, such as cookie sync.
///
/// Consent strings are carried opaquely; parsing them happens elsewhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policies {
    pub gpp_sid: Vec<i8>,
    pub gpc: Option<String>,
    pub gdpr_consent: Option<String>,
    pub us_privacy: Option<String>,
}

/// Request context an activity rule may inspect.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ActivityRequest<'a> {
    /// No request-level signals.
    #[default]
    Empty,
    Policies(&'a Policies),
    BidRequest(&'a BidRequest),
}

impl<'a> ActivityRequest<'a> {
    #[must_use]
    pub fn from_policies(policies: &'a Policies) -> Self {
        Self::Policies(policies)
    }

    #[must_use]
    pub fn from_bid_request(request: &'a BidRequest) -> Self {
        Self::BidRequest(request)
    }

    #[must_use]
    pub fn is_policies(&self) -> bool {
        matches!(self, Self::Policies(_))
    }

    #[must_use]
    pub fn is_bid_request(&self) -> bool {
        matches!(self, Self::BidRequest(_))
    }

    /// GPP section IDs carried by the request context.
    #[must_use]
    pub fn gpp_sid(&self) -> &'a [i8] {
        match *self {
            Self::Empty => &[],
            Self::Policies(policies) => &policies.gpp_sid,
            Self::BidRequest(request) => request
                .regs
                .as_ref()
                .map(|regs| regs.gpp_sid.as_slice())
                .unwrap_or_default(),
        }
    }

    /// Global Privacy Control signal carried by the request context.
    #[must_use]
    pub fn gpc(&self) -> Option<String> {
        match *self {
            Self::Empty => None,
            Self::Policies(policies) => policies.gpc.clone(),
            Self::BidRequest(request) => request.regs.as_ref().and_then(|regs| regs.gpc()),
        }
    }
}
