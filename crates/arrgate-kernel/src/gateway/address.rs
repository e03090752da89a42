//! Target address classification and rewriting.
//!
//! When the gateway runs inside a container it cannot dial the host's
//! loopback interface; services the operator reaches as `localhost` must be
//! dialed through the container-to-host bridge hostname instead. Private LAN
//! addresses are reachable through host networking and pass through as-is.
//!
//! Targets are parsed with the same WHATWG parser the HTTP client uses, so
//! the host that is classified is the host that would be dialed. A
//! `localhost` inside a path or query string is left alone.

use std::fmt;
use tracing::debug;
use url::{Host, Url};

/// Hostname that resolves to the host machine from inside a Docker container.
pub const DEFAULT_BRIDGE_HOST: &str = "host.docker.internal";

// ─────────────────────────────────────────────────────────────────────────────
// Network mode
// ─────────────────────────────────────────────────────────────────────────────

/// Where the gateway process runs relative to the services it calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkMode {
    /// Same network namespace as the services; addresses are dialed verbatim.
    #[default]
    Direct,
    /// Network-isolated container; loopback targets go through the bridge.
    Isolated,
}

impl NetworkMode {
    pub fn from_isolated_flag(isolated: bool) -> Self {
        if isolated {
            NetworkMode::Isolated
        } else {
            NetworkMode::Direct
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host predicates
// ─────────────────────────────────────────────────────────────────────────────

/// Reachability class of a target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostClass {
    /// `localhost`, `127.0.0.0/8` or `::1`.
    Loopback,
    /// `10.0.0.0/8`, `172.16.0.0/12` or `192.168.0.0/16`.
    Private,
    /// Everything else, including unparseable targets.
    Public,
}

/// Classify an already-parsed host.
///
/// IPv4 literals arrive normalised (`127.1` and `0x7f000001` are both
/// `127.0.0.1`), so only the canonical ranges need checking.
pub fn classify_host<S: AsRef<str>>(host: &Host<S>) -> HostClass {
    match host {
        Host::Domain(name) if name.as_ref().eq_ignore_ascii_case("localhost") => {
            HostClass::Loopback
        }
        Host::Ipv4(ip) if ip.is_loopback() => HostClass::Loopback,
        Host::Ipv6(ip) if ip.is_loopback() => HostClass::Loopback,
        Host::Ipv4(ip) if ip.is_private() => HostClass::Private,
        _ => HostClass::Public,
    }
}

/// `true` for `localhost` (any casing), IPv4 loopback in any notation the
/// URL parser accepts, and `[::1]`.
pub fn is_loopback_host(host: &str) -> bool {
    Host::parse(host).is_ok_and(|h| classify_host(&h) == HostClass::Loopback)
}

/// `true` when `host` is an IPv4 literal in one of the three RFC 1918 ranges.
pub fn is_private_ipv4(host: &str) -> bool {
    Host::parse(host).is_ok_and(|h| classify_host(&h) == HostClass::Private)
}

/// Classify the host of a full target URL.
pub fn classify_target(target: &str) -> HostClass {
    Url::parse(target)
        .ok()
        .and_then(|url| url.host().map(|h| classify_host(&h)))
        .unwrap_or(HostClass::Public)
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// The address that is actually dialed for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    url: String,
    rewritten: bool,
}

impl ResolvedAddress {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Whether the resolver changed the caller's target.
    pub fn is_rewritten(&self) -> bool {
        self.rewritten
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Maps a requested target to the URL the gateway should dial.
///
/// The network mode is fixed at construction; `resolve` is a total, pure
/// function of its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressResolver {
    mode: NetworkMode,
    bridge_host: String,
}

impl AddressResolver {
    pub fn new(mode: NetworkMode) -> Self {
        Self {
            mode,
            bridge_host: DEFAULT_BRIDGE_HOST.to_string(),
        }
    }

    /// Builder: dial loopback targets through `bridge_host` instead of the
    /// Docker default.
    pub fn with_bridge_host(mut self, bridge_host: impl Into<String>) -> Self {
        self.bridge_host = bridge_host.into();
        self
    }

    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    pub fn bridge_host(&self) -> &str {
        &self.bridge_host
    }

    /// Rewrite `target` according to the network mode.
    ///
    /// In [`NetworkMode::Isolated`] a loopback host is replaced by the bridge
    /// host and the URL is re-serialised; scheme, userinfo, port, path, query
    /// and fragment are kept. Every other target is returned unchanged,
    /// byte for byte.
    pub fn resolve(&self, target: &str) -> ResolvedAddress {
        if self.mode == NetworkMode::Direct {
            return Self::unchanged(target);
        }

        let Ok(mut url) = Url::parse(target) else {
            return Self::unchanged(target);
        };
        if !url
            .host()
            .is_some_and(|h| classify_host(&h) == HostClass::Loopback)
        {
            return Self::unchanged(target);
        }

        match url.set_host(Some(&self.bridge_host)) {
            Ok(()) => ResolvedAddress {
                url: url.into(),
                rewritten: true,
            },
            Err(e) => {
                debug!(bridge_host = %self.bridge_host, error = %e, "bridge host rejected, dialing target as-is");
                Self::unchanged(target)
            }
        }
    }

    fn unchanged(target: &str) -> ResolvedAddress {
        ResolvedAddress {
            url: target.to_string(),
            rewritten: false,
        }
    }
}
