//! # Plugin Contract
//!
//! The capability set every enumeration mode implements.
//!
//! The runner and the orchestrator only ever hold a `dyn Enumerator`; they
//! never look at the concrete mode behind it. Adding a mode means adding an
//! implementation of this trait, nothing in the core changes.

use std::fmt;

use async_trait::async_trait;

use crate::cancel::CancellationToken;

/// A candidate that produced a positive answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The fully qualified thing that was found, e.g. `www.example.com`.
    pub subject: String,
    /// Extra facts shown next to the subject (addresses, aliases).
    pub details: Vec<String>,
}

impl Finding {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.subject)
        } else {
            write!(f, "{} [{}]", self.subject, self.details.join(","))
        }
    }
}

/// Result of probing a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Found(Finding),
    Missing { subject: String },
    Failed { subject: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Letters, digits, `-`, `_` and `.`.
    Hostname,
}

impl Charset {
    fn allows(&self, c: char) -> bool {
        match self {
            Charset::Hostname => c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    NonEmpty,
    /// Lines starting with `#` are skipped.
    SkipComments,
    MaxLength(usize),
    Charset(Charset),
}

impl Rule {
    fn accepts(&self, candidate: &str) -> bool {
        match self {
            Rule::NonEmpty => !candidate.is_empty(),
            Rule::SkipComments => !candidate.starts_with('#'),
            Rule::MaxLength(max) => candidate.len() <= *max,
            Rule::Charset(charset) => candidate.chars().all(|c| charset.allows(c)),
        }
    }
}

/// Filters deciding which wordlist entries are worth a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            rules: vec![Rule::NonEmpty, Rule::SkipComments],
        }
    }
}

impl Ruleset {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Strips surrounding whitespace. Rules are applied to the result.
    pub fn normalize<'a>(&self, raw: &'a str) -> &'a str {
        raw.trim()
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        self.rules.iter().all(|rule| rule.accepts(candidate))
    }

    /// Normalizes `raw` and returns it when every rule accepts it.
    pub fn admit<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let candidate = self.normalize(raw);
        self.accepts(candidate).then_some(candidate)
    }
}

/// A pluggable enumerator.
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Mode name used in diagnostics.
    fn name(&self) -> &str;

    /// Configuration lines shown before a run starts.
    fn summary(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Preparation that has to happen before the first probe, such as
    /// establishing a baseline.
    async fn pre_run(&self, cancel: &CancellationToken) -> anyhow::Result<()>;

    /// Probes one candidate. This is the unit of work the runner schedules.
    async fn probe_one(&self, cancel: &CancellationToken, candidate: &str) -> ProbeResult;

    fn ruleset(&self) -> Ruleset;
}
