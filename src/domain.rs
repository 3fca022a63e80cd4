//! Aggregation keys derived from endpoint URLs

use std::fmt;
use url::{Host, Url};

/// Hostname an endpoint's statistics are grouped under
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DomainKey {
    Host(String),
    /// URL did not parse or carried no host
    NoHost,
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainKey::Host(host) => write!(f, "{}", host),
            DomainKey::NoHost => write!(f, "<no host>"),
        }
    }
}

/// Extract the hostname of `url`, dropping scheme, port, path and query.
///
/// Never fails: anything without a parseable host maps to [`DomainKey::NoHost`],
/// which is still a valid key to record against.
pub fn extract_domain(url: &str) -> DomainKey {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return DomainKey::NoHost;
    };

    match parsed.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => DomainKey::Host(domain.to_string()),
        Some(Host::Ipv4(addr)) => DomainKey::Host(addr.to_string()),
        Some(Host::Ipv6(addr)) => DomainKey::Host(addr.to_string()),
        _ => DomainKey::NoHost,
    }
}
