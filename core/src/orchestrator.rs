//! # Execution Orchestrator
//!
//! Sequences one invocation: validate, construct, arm, run, translate.
//!
//! Every step that can fail does so before the next one starts, so a bad flag
//! never constructs a plugin and a failed construction never starts a run.
//! There are no retries at this level.

use std::sync::Arc;

use burrow_common::cancel::CancellationToken;
use burrow_common::config::GlobalOptions;
use burrow_common::platform::Platform;
use burrow_common::plugin::Enumerator;
use tracing::debug;

use crate::bridge::{CancellationBridge, SignalSource};
use crate::error::RunError;
use crate::flags::RawFlags;
use crate::registry::ModeRegistry;
use crate::runner::{RunReport, Runner};
use crate::validator;

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(RunReport),
    /// The user interrupted the run and the runner wound down cleanly.
    Cancelled(RunReport),
}

impl Outcome {
    pub fn report(&self) -> &RunReport {
        match self {
            Outcome::Completed(report) | Outcome::Cancelled(report) => report,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled(_))
    }
}

/// A validated invocation with its plugin, ready to run.
pub struct Prepared {
    pub mode: &'static str,
    pub globals: GlobalOptions,
    pub plugin: Box<dyn Enumerator>,
}

pub struct Orchestrator<'a> {
    registry: &'a ModeRegistry,
    runner: &'a dyn Runner,
    signals: &'a dyn SignalSource,
    platform: Platform,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a ModeRegistry,
        runner: &'a dyn Runner,
        signals: &'a dyn SignalSource,
    ) -> Self {
        Self {
            registry,
            runner,
            signals,
            platform: Platform::current(),
        }
    }

    /// Validates against `platform` instead of the host.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Runs `mode` with `flags` from start to finish.
    pub async fn execute(&self, mode: &str, flags: &RawFlags) -> Result<Outcome, RunError> {
        let prepared = self.prepare(mode, flags).await?;
        self.run(prepared).await
    }

    /// Validates the flags and constructs the plugin without running it.
    pub async fn prepare(&self, mode: &str, flags: &RawFlags) -> Result<Prepared, RunError> {
        let entry = self
            .registry
            .get(mode)
            .ok_or_else(|| RunError::UnknownMode(mode.to_string()))?;

        let options = entry.validate(flags, &self.platform)?;
        let globals = validator::validate_globals(flags)?;
        debug!("options for {} validated", entry.name());

        let plugin = entry
            .create(&globals, &options)
            .await
            .map_err(|source| RunError::PluginConstruction {
                mode: entry.name().to_string(),
                source,
            })?;

        Ok(Prepared {
            mode: entry.name(),
            globals,
            plugin,
        })
    }

    /// Arms the interrupt bridge and hands the plugin to the runner.
    pub async fn run(&self, prepared: Prepared) -> Result<Outcome, RunError> {
        let Prepared {
            mode,
            globals,
            plugin,
        } = prepared;

        let token = CancellationToken::new();
        let mut bridge = CancellationBridge::arm(token.clone(), globals.quiet);
        bridge.attach(self.signals);

        let plugin: Arc<dyn Enumerator> = Arc::from(plugin);
        let result = self.runner.run(&globals, plugin, &token).await;

        let bridge_report = bridge.disarm().await;
        debug!("interrupt bridge ended in {:?}", bridge_report.state);

        match result {
            Ok(report) if report.interrupted || token.is_cancelled() => Ok(Outcome::Cancelled(report)),
            Ok(report) => Ok(Outcome::Completed(report)),
            // A runner may give up with an error once it notices the token.
            Err(source) if token.is_cancelled() => {
                debug!("{mode} runner stopped on cancellation: {source:#}");
                Ok(Outcome::Cancelled(RunReport {
                    interrupted: true,
                    ..RunReport::default()
                }))
            }
            Err(source) => Err(RunError::Runner {
                mode: mode.to_string(),
                source,
            }),
        }
    }
}
