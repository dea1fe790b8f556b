use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_THREADS: usize = 10;
/// Upper bound on concurrent workers.
pub const MAX_THREADS: usize = 4096;

/// Where candidate words are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wordlist {
    Stdin,
    File(PathBuf),
}

impl fmt::Display for Wordlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wordlist::Stdin => write!(f, "stdin"),
            Wordlist::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Mode independent settings of a single invocation.
///
/// Built once by the validator and never mutated afterwards; the runner only
/// ever sees a shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    /// Number of concurrent probe workers.
    pub threads: usize,
    pub wordlist: Wordlist,
    /// Findings are appended to this file in addition to the terminal.
    pub output: Option<PathBuf>,
    /// Hides the banner, headers and the interrupt notice.
    pub quiet: bool,
    pub no_progress: bool,
    /// Also logs candidates that did not resolve.
    pub verbose: bool,
    /// Pause applied by each worker between two probes.
    pub delay: Duration,
}

impl GlobalOptions {
    pub fn new(wordlist: Wordlist) -> Self {
        Self {
            threads: DEFAULT_THREADS,
            wordlist,
            output: None,
            quiet: false,
            no_progress: false,
            verbose: false,
            delay: Duration::ZERO,
        }
    }
}
