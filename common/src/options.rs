//! # Mode Options
//!
//! Typed, already validated settings for each enumeration mode.
//!
//! Values in here are produced by the validator in `burrow-core` and are read
//! only from then on. Plugins receive them by reference.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DNS_PORT: u16 = 53;
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(1);

/// Options of the selected mode, tagged by mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeOptions {
    Dns(DnsOptions),
}

impl ModeOptions {
    pub fn mode_name(&self) -> &'static str {
        match self {
            ModeOptions::Dns(_) => "dns",
        }
    }
}

/// Settings of the DNS subdomain mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsOptions {
    /// Zone the candidates are prefixed to, e.g. `example.com`.
    pub domain: String,
    pub show_ips: bool,
    /// Documented as conflicting with `show_ips`; IPs win when both are set.
    pub show_cname: bool,
    /// Keep going even when the zone answers for random names.
    pub wildcard_forced: bool,
    /// Upper bound for a single lookup.
    pub timeout: Duration,
    /// Custom DNS server. `None` means the system resolver.
    pub resolver: Option<ResolverAddr>,
}

impl DnsOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            show_ips: false,
            show_cname: false,
            wildcard_forced: false,
            timeout: DEFAULT_DNS_TIMEOUT,
            resolver: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverAddrError {
    #[error("resolver address is empty")]
    Empty,
    #[error("invalid resolver host '{0}'")]
    InvalidHost(String),
    #[error("invalid resolver port '{0}'")]
    InvalidPort(String),
}

/// Address of a custom DNS server, written as `host` or `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolverAddr {
    pub host: String,
    pub port: u16,
}

impl ResolverAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address when the host is a literal IP.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.host
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl fmt::Display for ResolverAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ResolverAddr {
    type Err = ResolverAddrError;

    /// Supported formats:
    /// * `8.8.8.8`, `dns.example.net` (port 53 implied)
    /// * `8.8.8.8:5353`, `dns.example.net:5353`
    /// * `2001:4860:4860::8888`, `[2001:4860:4860::8888]:53`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ResolverAddrError::Empty);
        }

        if let Ok(sock) = s.parse::<SocketAddr>() {
            return Ok(Self::new(sock.ip().to_string(), sock.port()));
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::new(ip.to_string(), DEFAULT_DNS_PORT));
        }

        if s.starts_with('[') {
            return Err(ResolverAddrError::InvalidHost(s.to_string()));
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| ResolverAddrError::InvalidPort(port_str.to_string()))?;
                (host, port)
            }
            None => (s, DEFAULT_DNS_PORT),
        };

        if !is_hostname(host) {
            return Err(ResolverAddrError::InvalidHost(host.to_string()));
        }

        Ok(Self::new(host, port))
    }
}

fn is_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}
