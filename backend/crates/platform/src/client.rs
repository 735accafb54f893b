//! Client identification utilities
//!
//! Resolves the identity a request is rate limited under from its HTTP
//! headers and the transport-level peer address.

use http::HeaderMap;
use http::header::HeaderName;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Header consulted for the originating client when running behind a proxy
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Canonical string form of a client IP address
///
/// IPv4-mapped IPv6 addresses are shown in dotted IPv4 form and the IPv6
/// loopback is folded onto `127.0.0.1`, so dual-stack listeners key the
/// same client identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn from_ip(ip: IpAddr) -> Self {
        Self(normalize(ip).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error when no client identity can be derived from a request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("No client IP in forwarded header or peer address {remote_addr:?}")]
    Unresolvable { remote_addr: String },
}

/// Extracts a [`ClientKey`] from an inbound request
///
/// Resolution order:
/// 1. First comma-separated entry of `X-Forwarded-For`, if it is an IP literal
/// 2. Host part of the peer address (`host:port` or `[v6]:port`)
#[derive(Debug, Clone)]
pub struct ClientIdentifier {
    trust_forwarded: bool,
}

impl Default for ClientIdentifier {
    fn default() -> Self {
        Self {
            trust_forwarded: true,
        }
    }
}

impl ClientIdentifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the forwarded header is consulted at all.
    ///
    /// Disable when the service is reachable without a trusted proxy in
    /// front, otherwise any client can pick its own key.
    pub fn trust_forwarded(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Resolve the client key for a request.
    ///
    /// ## Arguments
    /// * `headers` - HTTP request headers
    /// * `remote_addr` - Transport peer address in `host:port` form
    ///
    /// ## Returns
    /// * `Ok(ClientKey)` - Canonical client IP
    /// * `Err(IdentityError::Unresolvable)` - Neither source held an IP literal
    pub fn resolve(
        &self,
        headers: &HeaderMap,
        remote_addr: &str,
    ) -> Result<ClientKey, IdentityError> {
        if self.trust_forwarded
            && let Some(ip) = forwarded_ip(headers)
        {
            return Ok(ClientKey::from_ip(ip));
        }

        peer_ip(remote_addr)
            .map(ClientKey::from_ip)
            .ok_or_else(|| IdentityError::Unresolvable {
                remote_addr: remote_addr.to_string(),
            })
    }
}

/// First entry of the forwarded header, if it parses as an IP literal
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    match first.parse::<IpAddr>() {
        Ok(ip) => Some(ip),
        Err(_) => {
            tracing::trace!(forwarded_for = %value, "Ignoring unparseable X-Forwarded-For");
            None
        }
    }
}

fn peer_ip(remote_addr: &str) -> Option<IpAddr> {
    split_host(remote_addr)?.parse().ok()
}

/// Host part of `host:port`, `[host]:port`; `None` when the port is missing
fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        after.strip_prefix(':')?;
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    // Bare IPv6 without brackets is ambiguous
    if host.contains(':') {
        return None;
    }
    Some(host)
}

fn normalize(ip: IpAddr) -> IpAddr {
    match ip.to_canonical() {
        IpAddr::V6(v6) if v6 == Ipv6Addr::LOCALHOST => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other,
    }
}
