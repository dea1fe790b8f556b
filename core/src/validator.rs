//! # Option Validation
//!
//! Pure functions from a [`RawFlags`] bag to typed options.
//!
//! Rules are applied in a fixed order so the first problem reported is the
//! most fundamental one:
//! 1. required fields,
//! 2. platform restrictions,
//! 3. value formats (durations, switches, numbers, addresses).
//!
//! An explicit value is never replaced by a default. Defaults only fill in
//! flags that were not given at all.

use std::path::PathBuf;
use std::time::Duration;

use burrow_common::config::{DEFAULT_THREADS, GlobalOptions, MAX_THREADS, Wordlist};
use burrow_common::duration;
use burrow_common::options::{DEFAULT_DNS_TIMEOUT, DnsOptions, ModeOptions, ResolverAddr};
use burrow_common::platform::Platform;

use crate::error::OptionError;
use crate::flags::RawFlags;
use crate::registry::OptionsValidator;

pub mod flag {
    pub const WORDLIST: &str = "wordlist";
    pub const THREADS: &str = "threads";
    pub const OUTPUT: &str = "output";
    pub const QUIET: &str = "quiet";
    pub const NO_PROGRESS: &str = "no-progress";
    pub const VERBOSE: &str = "verbose";
    pub const DELAY: &str = "delay";

    pub const DOMAIN: &str = "domain";
    pub const SHOW_IPS: &str = "showips";
    pub const SHOW_CNAME: &str = "showcname";
    pub const TIMEOUT: &str = "timeout";
    pub const WILDCARD: &str = "wildcard";
    pub const RESOLVER: &str = "resolver";
}

/// Validates the mode independent part of the flags.
pub fn validate_globals(flags: &RawFlags) -> Result<GlobalOptions, OptionError> {
    let wordlist = match required(flags, flag::WORDLIST)? {
        "-" => Wordlist::Stdin,
        path => Wordlist::File(PathBuf::from(path)),
    };

    let threads = match flags.get(flag::THREADS) {
        None => DEFAULT_THREADS,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) => return Err(OptionError::invalid(flag::THREADS, raw, "must be at least 1")),
            Ok(threads) if threads > MAX_THREADS => {
                return Err(OptionError::invalid(
                    flag::THREADS,
                    raw,
                    format!("must be at most {MAX_THREADS}"),
                ));
            }
            Ok(threads) => threads,
            Err(e) => return Err(OptionError::invalid(flag::THREADS, raw, e)),
        },
    };

    let output = match flags.get(flag::OUTPUT) {
        None => None,
        Some(raw) if raw.trim().is_empty() => {
            return Err(OptionError::invalid(flag::OUTPUT, raw, "path is empty"));
        }
        Some(raw) => Some(PathBuf::from(raw.trim())),
    };

    Ok(GlobalOptions {
        threads,
        wordlist,
        output,
        quiet: switch(flags, flag::QUIET)?,
        no_progress: switch(flags, flag::NO_PROGRESS)?,
        verbose: switch(flags, flag::VERBOSE)?,
        delay: duration_or(flags, flag::DELAY, Duration::ZERO)?,
    })
}

/// Validates the flags of the `dns` mode for `platform`.
pub fn validate_dns(flags: &RawFlags, platform: &Platform) -> Result<DnsOptions, OptionError> {
    let domain = required(flags, flag::DOMAIN)?;

    let resolver_raw = flags.get(flag::RESOLVER).map(str::trim).filter(|r| !r.is_empty());
    if resolver_raw.is_some() && !platform.supports_resolver_override {
        return Err(OptionError::UnsupportedOnPlatform {
            field: flag::RESOLVER,
            platform: platform.name,
            reason: "a custom DNS resolver can not be set here, lookups always go through the system resolver"
                .to_string(),
        });
    }

    let timeout = duration_or(flags, flag::TIMEOUT, DEFAULT_DNS_TIMEOUT)?;

    let resolver = resolver_raw
        .map(|raw| {
            raw.parse::<ResolverAddr>()
                .map_err(|e| OptionError::invalid(flag::RESOLVER, raw, e))
        })
        .transpose()?;

    Ok(DnsOptions {
        domain: domain.trim_end_matches('.').to_string(),
        show_ips: switch(flags, flag::SHOW_IPS)?,
        show_cname: switch(flags, flag::SHOW_CNAME)?,
        wildcard_forced: switch(flags, flag::WILDCARD)?,
        timeout,
        resolver,
    })
}

/// [`OptionsValidator`] of the `dns` mode.
pub struct DnsValidator;

impl OptionsValidator for DnsValidator {
    fn validate(&self, flags: &RawFlags, platform: &Platform) -> Result<ModeOptions, OptionError> {
        validate_dns(flags, platform).map(ModeOptions::Dns)
    }
}

fn required<'a>(flags: &'a RawFlags, field: &'static str) -> Result<&'a str, OptionError> {
    flags
        .get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(OptionError::MissingRequiredOption { field })
}

fn switch(flags: &RawFlags, field: &'static str) -> Result<bool, OptionError> {
    let Some(raw) = flags.get(field) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Ok(true),
        "false" | "f" | "0" | "no" => Ok(false),
        _ => Err(OptionError::invalid(field, raw, "expected true or false")),
    }
}

fn duration_or(
    flags: &RawFlags,
    field: &'static str,
    default: Duration,
) -> Result<Duration, OptionError> {
    match flags.get(field) {
        None => Ok(default),
        Some(raw) => duration::parse(raw).map_err(|e| OptionError::invalid(field, raw, e)),
    }
}
