use std::collections::BTreeSet;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use burrow_protocols::dns::{self, DnsAnswer, RecordType};
use tokio::net::UdpSocket;
use tracing::debug;

use burrow_common::options::{DEFAULT_DNS_PORT, ResolverAddr};

const MAX_DATAGRAM: usize = 4096;
const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Name resolution as seen by the DNS mode.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Addresses of `host`. An empty list means the name does not exist.
    async fn lookup_ip(&self, host: &str) -> anyhow::Result<Vec<IpAddr>>;

    async fn lookup_cname(&self, host: &str) -> anyhow::Result<Option<String>>;

    fn describe(&self) -> String;
}

/// Lookups through the operating system resolver.
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn lookup_ip(&self, host: &str) -> anyhow::Result<Vec<IpAddr>> {
        let lookup = tokio::net::lookup_host((host, 0));
        match tokio::time::timeout(self.timeout, lookup).await {
            Err(_) => bail!("lookup of {host} timed out after {:?}", self.timeout),
            // The system resolver does not tell NXDOMAIN apart from other failures.
            Ok(Err(e)) => {
                debug!("system lookup of {host} failed: {e}");
                Ok(Vec::new())
            }
            Ok(Ok(addrs)) => {
                let unique: BTreeSet<IpAddr> = addrs.map(|addr| addr.ip()).collect();
                Ok(unique.into_iter().collect())
            }
        }
    }

    async fn lookup_cname(&self, _host: &str) -> anyhow::Result<Option<String>> {
        bail!("the system resolver cannot look up CNAME records")
    }

    fn describe(&self) -> String {
        String::from("system")
    }
}

/// Lookups sent straight to one DNS server over UDP.
pub struct UdpResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl UdpResolver {
    /// Resolves `addr` and makes sure a socket can be pointed at it.
    pub async fn connect(addr: &ResolverAddr, timeout: Duration) -> anyhow::Result<Self> {
        let server = match addr.socket_addr() {
            Some(server) => server,
            None => tokio::net::lookup_host((addr.host.as_str(), addr.port))
                .await
                .with_context(|| format!("resolving DNS server {addr}"))?
                .next()
                .with_context(|| format!("DNS server {addr} has no address"))?,
        };

        open_socket(server)
            .await
            .with_context(|| format!("opening a socket towards {server}"))?;

        Ok(Self { server, timeout })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    async fn query(&self, name: &str, record: RecordType) -> anyhow::Result<DnsAnswer> {
        match tokio::time::timeout(self.timeout, self.exchange(name, record)).await {
            Ok(answer) => answer,
            Err(_) => bail!(
                "no answer from {} for {name} within {:?}",
                self.server,
                self.timeout
            ),
        }
    }

    async fn exchange(&self, name: &str, record: RecordType) -> anyhow::Result<DnsAnswer> {
        let socket = open_socket(self.server).await?;
        let id = dns::next_transaction_id();
        let query = dns::create_query(name, record, id)?;
        socket.send(&query).await.context("sending DNS query")?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = socket.recv(&mut buf).await.context("receiving DNS answer")?;
            match dns::parse_answer(&buf[..len]) {
                Ok(answer) if answer.id == id => return Ok(answer),
                Ok(stale) => debug!("dropping answer with unexpected id {}", stale.id),
                Err(e) => debug!("dropping malformed answer from {}: {e}", self.server),
            }
        }
    }
}

#[async_trait]
impl Resolve for UdpResolver {
    async fn lookup_ip(&self, host: &str) -> anyhow::Result<Vec<IpAddr>> {
        let v4 = self.query(host, RecordType::A).await?;
        if v4.is_nxdomain() {
            return Ok(Vec::new());
        }
        let v6 = self.query(host, RecordType::Aaaa).await?;

        let unique: BTreeSet<IpAddr> = v4.addresses.into_iter().chain(v6.addresses).collect();
        Ok(unique.into_iter().collect())
    }

    async fn lookup_cname(&self, host: &str) -> anyhow::Result<Option<String>> {
        let answer = self.query(host, RecordType::Cname).await?;
        Ok(answer.cnames.into_iter().next())
    }

    fn describe(&self) -> String {
        self.server.to_string()
    }
}

async fn open_socket(server: SocketAddr) -> anyhow::Result<UdpSocket> {
    let local: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    Ok(socket)
}

/// First `nameserver` entry of the system resolver configuration.
pub fn system_nameserver() -> anyhow::Result<ResolverAddr> {
    read_nameserver(Path::new(RESOLV_CONF))
}

fn read_nameserver(path: &Path) -> anyhow::Result<ResolverAddr> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_nameserver(&contents)
        .with_context(|| format!("no usable nameserver entry in {}", path.display()))
}

fn parse_nameserver(contents: &str) -> Option<ResolverAddr> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| line.strip_prefix("nameserver"))
        .filter_map(|rest| rest.split_whitespace().next())
        // Scoped IPv6 entries (fe80::1%eth0) are not routable from a plain socket.
        .filter_map(|ip| ip.parse::<IpAddr>().ok())
        .map(|ip| ResolverAddr::new(ip.to_string(), DEFAULT_DNS_PORT))
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nameserver_skips_comments_and_scoped_entries() {
        let conf = "\
# generated
; legacy comment
search lan
nameserver fe80::1%eth0
nameserver 192.168.1.1
nameserver 1.1.1.1
";
        assert_eq!(
            parse_nameserver(conf),
            Some(ResolverAddr::new("192.168.1.1", DEFAULT_DNS_PORT))
        );
    }

    #[test]
    fn nameserver_missing() {
        assert_eq!(parse_nameserver("search lan\noptions ndots:1\n"), None);
        assert_eq!(parse_nameserver(""), None);
    }

    #[test]
    fn read_nameserver_reports_missing_file() {
        let err = read_nameserver(Path::new("/nonexistent/resolv.conf")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/resolv.conf"));
    }

    #[tokio::test]
    async fn system_resolver_resolves_localhost() {
        let resolver = SystemResolver::new(Duration::from_secs(5));
        let ips = resolver.lookup_ip("localhost").await.unwrap();
        assert!(ips.iter().any(|ip| ip.is_loopback()));
    }

    #[tokio::test]
    async fn system_resolver_has_no_cname_support() {
        let resolver = SystemResolver::new(Duration::from_secs(1));
        assert!(resolver.lookup_cname("localhost").await.is_err());
        assert_eq!(resolver.describe(), "system");
    }

    #[tokio::test]
    async fn udp_resolver_times_out_on_silent_server() {
        // Bound but never answering.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();
        let resolver = UdpResolver::connect(
            &ResolverAddr::new("127.0.0.1", addr.port()),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert_eq!(resolver.server(), addr);
        let err = resolver.lookup_ip("www.example.com").await.unwrap_err();
        assert!(err.to_string().contains("no answer"));
    }
}
