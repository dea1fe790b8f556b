pub mod dns;

use burrow_core::flags::RawFlags;
use burrow_core::validator::flag;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "burrow", version)]
#[command(about = "Brute forces hidden names through pluggable modes.")]
pub struct CommandLine {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every mode. Values stay raw here and are checked by the
/// option validator.
#[derive(Args)]
pub struct GlobalArgs {
    /// Path to the wordlist, `-` reads from stdin
    #[arg(short, long, global = true)]
    pub wordlist: Option<String>,
    /// Number of concurrent workers [default: 10]
    #[arg(short, long, global = true)]
    pub threads: Option<String>,
    /// Also append findings to this file
    #[arg(short, long, global = true)]
    pub output: Option<String>,
    /// Don't print the banner and other noise
    #[arg(short, long, global = true)]
    pub quiet: bool,
    /// Don't display progress
    #[arg(short = 'z', long, global = true)]
    pub no_progress: bool,
    /// Verbose output (errors and misses)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Time each worker waits between requests (e.g. 1500ms)
    #[arg(long, global = true)]
    pub delay: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Uses DNS subdomain bruteforcing mode
    Dns(dns::DnsArgs),
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Mode name and the raw flags handed to the orchestrator.
    pub fn into_invocation(self) -> (&'static str, RawFlags) {
        let mut flags = self.globals.to_flags();
        match self.command {
            Commands::Dns(args) => {
                args.lower_into(&mut flags);
                (dns::MODE, flags)
            }
        }
    }
}

impl GlobalArgs {
    fn to_flags(&self) -> RawFlags {
        let mut flags = RawFlags::new();
        set_opt(&mut flags, flag::WORDLIST, &self.wordlist);
        set_opt(&mut flags, flag::THREADS, &self.threads);
        set_opt(&mut flags, flag::OUTPUT, &self.output);
        set_opt(&mut flags, flag::DELAY, &self.delay);
        flags.set_switch(flag::QUIET, self.quiet);
        flags.set_switch(flag::NO_PROGRESS, self.no_progress);
        flags.set_switch(flag::VERBOSE, self.verbose);
        flags
    }
}

fn set_opt(flags: &mut RawFlags, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        flags.set(name, value.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (&'static str, RawFlags) {
        CommandLine::try_parse_from(args).unwrap().into_invocation()
    }

    #[test]
    fn lowers_globals_and_dns_flags() {
        let (mode, flags) = parse(&[
            "burrow", "dns", "-d", "example.com", "-w", "words.txt", "-t", "20", "-i", "--timeout", "2s",
        ]);
        assert_eq!(mode, "dns");
        assert_eq!(flags.get("domain"), Some("example.com"));
        assert_eq!(flags.get("wordlist"), Some("words.txt"));
        assert_eq!(flags.get("threads"), Some("20"));
        assert_eq!(flags.get("showips"), Some("true"));
        assert_eq!(flags.get("timeout"), Some("2s"));
        assert!(!flags.contains("showcname"));
        assert!(!flags.contains("quiet"));
    }

    #[test]
    fn globals_work_before_the_subcommand() {
        let (_, flags) = parse(&["burrow", "-q", "-w", "-", "dns", "-d", "example.com", "-r", "1.1.1.1"]);
        assert_eq!(flags.get("quiet"), Some("true"));
        assert_eq!(flags.get("wordlist"), Some("-"));
        assert_eq!(flags.get("resolver"), Some("1.1.1.1"));
    }

    #[test]
    fn bad_values_are_left_to_the_validator() {
        let (_, flags) = parse(&["burrow", "dns", "-d", "example.com", "-t", "lots", "--timeout", "soon"]);
        assert_eq!(flags.get("threads"), Some("lots"));
        assert_eq!(flags.get("timeout"), Some("soon"));
    }
}
