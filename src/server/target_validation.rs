//! Optional SSRF guard for proxy targets.
//!
//! Enabled with `BLOCK_PRIVATE_TARGETS=true`. When on, only `http`/`https`
//! targets are proxied and IP-literal hosts in private or reserved ranges are
//! refused. Hostnames are not resolved, so DNS rebinding is not covered.

use crate::error::ProxyError;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Check that `target` is safe to fetch.
///
/// # Errors
/// [`ProxyError::TargetNotAllowed`] for non-HTTP(S) schemes, missing hosts and
/// private/reserved IP literals.
pub fn validate_target(target: &Url) -> Result<(), ProxyError> {
    match target.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ProxyError::TargetNotAllowed(format!(
                "scheme '{scheme}' is not proxied"
            )));
        }
    }

    let host = target
        .host()
        .ok_or_else(|| ProxyError::TargetNotAllowed(format!("no host in {target}")))?;

    match host {
        Host::Ipv4(ip) if is_blocked_ipv4(ip) => Err(ProxyError::TargetNotAllowed(format!(
            "private or reserved IPv4 address {ip}"
        ))),
        Host::Ipv6(ip) if is_blocked_ipv6(ip) => Err(ProxyError::TargetNotAllowed(format!(
            "private or reserved IPv6 address {ip}"
        ))),
        _ => Ok(()),
    }
}

/// `0.0.0.0/8`, `10.0.0.0/8`, `127.0.0.0/8`, `169.254.0.0/16`,
/// `172.16.0.0/12`, `192.168.0.0/16`.
fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();

    a == 0
        || a == 10
        || a == 127
        || (a == 169 && b == 254)
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
}

/// `::1`, `fe80::/10`, `fc00::/7`, plus IPv4-mapped addresses in the blocked
/// IPv4 ranges.
fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_ipv4(v4);
    }

    let first = ip.segments()[0];

    ip.is_loopback() || (first & 0xffc0) == 0xfe80 || (first & 0xfe00) == 0xfc00
}
