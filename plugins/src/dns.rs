//! # DNS Subdomain Mode
//!
//! Prefixes every candidate to the target domain and reports the names that
//! resolve.
//!
//! Before the first probe the plugin asks for a random, surely unregistered
//! name. If that resolves the zone has a wildcard record, every candidate would
//! look like a hit, and the run is refused unless the user forces it. When
//! forced, answers that only contain wildcard addresses are treated as misses.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::OnceLock;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use burrow_common::cancel::CancellationToken;
use burrow_common::config::GlobalOptions;
use burrow_common::options::DnsOptions;
use burrow_common::plugin::{Charset, Enumerator, Finding, ProbeResult, Rule, Ruleset};
use burrow_protocols::dns::MAX_NAME_LEN;

pub mod resolver;

use resolver::{Resolve, SystemResolver, UdpResolver};

pub const MODE_NAME: &str = "dns";

pub struct DnsPlugin {
    options: DnsOptions,
    quiet: bool,
    resolver: Box<dyn Resolve>,
    cname_resolver: Option<Box<dyn Resolve>>,
    wildcard_ips: OnceLock<BTreeSet<IpAddr>>,
}

impl DnsPlugin {
    /// Prepares resolvers for a run. No candidate is probed here.
    pub async fn connect(globals: &GlobalOptions, options: &DnsOptions) -> anyhow::Result<Self> {
        if options.show_ips && options.show_cname {
            warn!("--showips and --showcname are mutually exclusive, only IPs will be shown");
        }

        let (resolver, cname_resolver): (Box<dyn Resolve>, Option<Box<dyn Resolve>>) =
            match &options.resolver {
                Some(addr) => {
                    let udp = UdpResolver::connect(addr, options.timeout).await?;
                    (Box::new(udp) as Box<dyn Resolve>, None)
                }
                None => {
                    let system: Box<dyn Resolve> = Box::new(SystemResolver::new(options.timeout));
                    let cname: Option<Box<dyn Resolve>> = if options.show_cname && !options.show_ips {
                        let addr = resolver::system_nameserver()
                            .context("CNAME lookups need a DNS server, use --resolver")?;
                        Some(Box::new(UdpResolver::connect(&addr, options.timeout).await?))
                    } else {
                        None
                    };
                    (system, cname)
                }
            };

        Ok(Self::with_resolvers(
            options.clone(),
            globals.quiet,
            resolver,
            cname_resolver,
        ))
    }

    pub fn with_resolvers(
        options: DnsOptions,
        quiet: bool,
        resolver: Box<dyn Resolve>,
        cname_resolver: Option<Box<dyn Resolve>>,
    ) -> Self {
        Self {
            options,
            quiet,
            resolver,
            cname_resolver,
            wildcard_ips: OnceLock::new(),
        }
    }

    pub fn options(&self) -> &DnsOptions {
        &self.options
    }

    /// Addresses the zone hands out for names that do not exist.
    pub fn wildcard_ips(&self) -> Option<&BTreeSet<IpAddr>> {
        self.wildcard_ips.get()
    }

    fn fqdn(&self, candidate: &str) -> String {
        format!("{candidate}.{}", self.options.domain)
    }

    fn is_wildcard_answer(&self, ips: &[IpAddr]) -> bool {
        self.wildcard_ips
            .get()
            .is_some_and(|wildcard| ips.iter().all(|ip| wildcard.contains(ip)))
    }

    async fn details(&self, subject: &str, ips: &[IpAddr]) -> Vec<String> {
        if self.options.show_ips {
            return ips.iter().map(IpAddr::to_string).collect();
        }
        if !self.options.show_cname {
            return Vec::new();
        }

        let resolver = self.cname_resolver.as_deref().unwrap_or(self.resolver.as_ref());
        match resolver.lookup_cname(subject).await {
            Ok(Some(cname)) => vec![cname],
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!("CNAME lookup for {subject} failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn check_wildcard(&self) -> anyhow::Result<()> {
        let probe = self.fqdn(&random_label());
        let ips = self.resolver.lookup_ip(&probe).await.unwrap_or_default();
        if ips.is_empty() {
            return Ok(());
        }

        let listed = ips
            .iter()
            .map(IpAddr::to_string)
            .collect::<Vec<String>>()
            .join(", ");

        if !self.options.wildcard_forced {
            bail!(
                "the DNS server returned the same IP for every domain. IP address(es) returned: {listed}. \
                 To force processing of wildcard DNS, specify the '--wildcard' switch"
            );
        }

        if !self.quiet {
            warn!("Wildcard DNS found. IP address(es): {listed}");
        }
        let _ = self.wildcard_ips.set(ips.into_iter().collect());
        Ok(())
    }

    async fn check_domain(&self) {
        let resolved = matches!(self.resolver.lookup_ip(&self.options.domain).await, Ok(ips) if !ips.is_empty());
        if !resolved && !self.quiet {
            warn!("Unable to validate base domain: {}", self.options.domain);
        }
    }
}

#[async_trait]
impl Enumerator for DnsPlugin {
    fn name(&self) -> &str {
        MODE_NAME
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Mode", MODE_NAME.to_string()),
            ("Domain", self.options.domain.clone()),
            ("Resolver", self.resolver.describe()),
            ("Timeout", format!("{:?}", self.options.timeout)),
        ];
        if self.options.show_ips {
            lines.push(("Show IPs", "true".to_string()));
        }
        if self.options.show_cname {
            lines.push(("Show CNAME", "true".to_string()));
        }
        if self.options.wildcard_forced {
            lines.push(("Wildcard forced", "true".to_string()));
        }
        lines
    }

    async fn pre_run(&self, cancel: &CancellationToken) -> anyhow::Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            res = self.check_wildcard() => res?,
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = self.check_domain() => {}
        }
        info!("Baseline for {} established", self.options.domain);
        Ok(())
    }

    async fn probe_one(&self, cancel: &CancellationToken, candidate: &str) -> ProbeResult {
        let subject = self.fqdn(candidate);

        let lookup = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            lookup = self.resolver.lookup_ip(&subject) => Some(lookup),
        };
        let Some(lookup) = lookup else {
            return ProbeResult::Failed {
                subject,
                reason: "lookup cancelled".to_string(),
            };
        };

        match lookup {
            Ok(ips) if ips.is_empty() || self.is_wildcard_answer(&ips) => {
                ProbeResult::Missing { subject }
            }
            Ok(ips) => {
                let details = self.details(&subject, &ips).await;
                ProbeResult::Found(Finding::new(subject).with_details(details))
            }
            Err(e) => ProbeResult::Failed {
                subject,
                reason: format!("{e:#}"),
            },
        }
    }

    fn ruleset(&self) -> Ruleset {
        let room = MAX_NAME_LEN.saturating_sub(self.options.domain.len() + 1);
        Ruleset::default()
            .with(Rule::MaxLength(room))
            .with(Rule::Charset(Charset::Hostname))
    }
}

fn random_label() -> String {
    format!("{:016x}", rand::random::<u64>())
}
