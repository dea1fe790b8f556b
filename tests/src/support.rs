use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use burrow_common::cancel::CancellationToken;
use burrow_common::config::GlobalOptions;
use burrow_common::options::ModeOptions;
use burrow_common::platform::Platform;
use burrow_common::plugin::{Enumerator, Finding, ProbeResult, Ruleset};
use burrow_core::bridge::{InterruptNotifier, SignalSource};
use burrow_core::registry::{Mode, ModeRegistry, PluginFactory};
use burrow_core::runner::{RunReport, Runner};
use burrow_core::validator::DnsValidator;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const LINUX: Platform = Platform {
    name: "linux",
    supports_resolver_override: true,
};

pub const WINDOWS: Platform = Platform {
    name: "windows",
    supports_resolver_override: false,
};

/// Ordered log of what happened across the seams.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    pub fn push(&self, entry: &'static str) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

/// Plugin that answers "found" for every candidate listed in `hits`.
pub struct StubPlugin {
    pub hits: Vec<&'static str>,
}

#[async_trait]
impl Enumerator for StubPlugin {
    fn name(&self) -> &str {
        "dns"
    }

    async fn pre_run(&self, _cancel: &CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }

    async fn probe_one(&self, _cancel: &CancellationToken, candidate: &str) -> ProbeResult {
        let subject = format!("{candidate}.example.com");
        if self.hits.iter().any(|hit| *hit == candidate) {
            ProbeResult::Found(Finding::new(subject))
        } else {
            ProbeResult::Missing { subject }
        }
    }

    fn ruleset(&self) -> Ruleset {
        Ruleset::default()
    }
}

/// Factory that records every call and the options it was given.
#[derive(Clone, Default)]
pub struct SpyFactory {
    pub calls: Arc<AtomicUsize>,
    pub options: Arc<Mutex<Vec<ModeOptions>>>,
    pub fail: bool,
    pub hits: Vec<&'static str>,
}

impl SpyFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginFactory for SpyFactory {
    async fn create(
        &self,
        _globals: &GlobalOptions,
        options: &ModeOptions,
    ) -> anyhow::Result<Box<dyn Enumerator>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options.clone());
        if self.fail {
            anyhow::bail!("resolver socket could not be opened");
        }
        Ok(Box::new(StubPlugin {
            hits: self.hits.clone(),
        }))
    }
}

/// Registry whose `dns` mode uses the real validator and `factory`.
pub fn registry_with(factory: SpyFactory) -> ModeRegistry {
    let mut registry = ModeRegistry::new();
    registry.register(Mode::new(
        "dns",
        "DNS subdomain mode under test",
        Box::new(DnsValidator),
        Box::new(factory),
    ));
    registry
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Complete,
    /// Announces itself on `started` and waits for cancellation.
    WaitForCancel,
    /// Waits for cancellation and then gives up with an error.
    FailOnCancel,
    Fail,
}

pub struct RecordingRunner {
    pub behaviour: Behaviour,
    pub calls: AtomicUsize,
    pub plugins: Mutex<Vec<String>>,
    pub started: Arc<Notify>,
    pub journal: Journal,
    pub observed_cancel: Mutex<Option<CancellationToken>>,
}

impl RecordingRunner {
    pub fn new(behaviour: Behaviour, journal: Journal) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            plugins: Mutex::new(Vec::new()),
            started: Arc::new(Notify::new()),
            journal,
            observed_cancel: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runner for RecordingRunner {
    async fn run(
        &self,
        _globals: &GlobalOptions,
        plugin: Arc<dyn Enumerator>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RunReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.plugins.lock().unwrap().push(plugin.name().to_string());
        *self.observed_cancel.lock().unwrap() = Some(cancel.clone());
        self.journal.push("run");

        match self.behaviour {
            Behaviour::Complete => Ok(RunReport {
                attempted: 3,
                found: 1,
                ..RunReport::default()
            }),
            Behaviour::Fail => anyhow::bail!("wordlist vanished"),
            Behaviour::FailOnCancel => {
                self.started.notify_one();
                tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
                    .await
                    .map_err(|_| anyhow::anyhow!("cancellation never arrived"))?;
                anyhow::bail!("context canceled")
            }
            Behaviour::WaitForCancel => {
                self.started.notify_one();
                tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
                    .await
                    .map_err(|_| anyhow::anyhow!("cancellation never arrived"))?;
                Ok(RunReport {
                    attempted: 1,
                    interrupted: cancel.is_cancelled(),
                    ..RunReport::default()
                })
            }
        }
    }
}

/// Signal source that presses Ctrl+C `presses` times once `trigger` fires.
pub struct ScriptedSignals {
    pub presses: usize,
    pub trigger: Arc<Notify>,
    pub journal: Journal,
}

impl ScriptedSignals {
    pub fn silent(journal: Journal) -> Self {
        Self {
            presses: 0,
            trigger: Arc::new(Notify::new()),
            journal,
        }
    }
}

impl SignalSource for ScriptedSignals {
    fn attach(&self, notifier: InterruptNotifier) -> JoinHandle<()> {
        self.journal.push("armed");
        let presses = self.presses;
        let trigger = self.trigger.clone();
        tokio::spawn(async move {
            if presses == 0 {
                return;
            }
            trigger.notified().await;
            for _ in 0..presses {
                if !notifier.notify().await {
                    break;
                }
            }
        })
    }
}
