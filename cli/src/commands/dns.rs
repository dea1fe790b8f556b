use burrow_core::flags::RawFlags;
use burrow_core::validator::flag;
use clap::Args;

pub const MODE: &str = "dns";

#[derive(Args)]
pub struct DnsArgs {
    /// The target domain
    #[arg(short, long)]
    pub domain: Option<String>,
    /// Show IP addresses
    #[arg(short = 'i', long = "showips")]
    pub show_ips: bool,
    /// Show CNAME records (cannot be used with '-i')
    #[arg(short = 'c', long = "showcname")]
    pub show_cname: bool,
    /// DNS resolver timeout [default: 1s]
    #[arg(long)]
    pub timeout: Option<String>,
    /// Force continued operation when wildcard found
    #[arg(long = "wildcard")]
    pub wildcard_forced: bool,
    /// Use custom DNS server (format server.com or server.com:port)
    #[arg(short, long)]
    pub resolver: Option<String>,
}

impl DnsArgs {
    pub fn lower_into(self, flags: &mut RawFlags) {
        if let Some(domain) = self.domain {
            flags.set(flag::DOMAIN, domain);
        }
        if let Some(timeout) = self.timeout {
            flags.set(flag::TIMEOUT, timeout);
        }
        if let Some(resolver) = self.resolver {
            flags.set(flag::RESOLVER, resolver);
        }
        flags.set_switch(flag::SHOW_IPS, self.show_ips);
        flags.set_switch(flag::SHOW_CNAME, self.show_cname);
        flags.set_switch(flag::WILDCARD, self.wildcard_forced);
    }
}
