//! # Mode Registry
//!
//! The table of available modes. It is built once at start-up and handed by
//! reference to whatever dispatches on a mode name; there is no process wide
//! registration.
//!
//! Each entry pairs the validator for the mode's flags with the factory that
//! builds its plugin. The core only talks to the two traits below.

use std::collections::BTreeMap;

use async_trait::async_trait;
use burrow_common::config::GlobalOptions;
use burrow_common::options::ModeOptions;
use burrow_common::platform::Platform;
use burrow_common::plugin::Enumerator;
use burrow_plugins::dns::{self, DnsPlugin};

use crate::error::OptionError;
use crate::flags::RawFlags;
use crate::validator::DnsValidator;

/// Turns raw flags into the options of one mode. Must be free of side effects.
pub trait OptionsValidator: Send + Sync {
    fn validate(&self, flags: &RawFlags, platform: &Platform) -> Result<ModeOptions, OptionError>;
}

/// Builds a ready-to-run plugin from validated options.
///
/// May allocate resources (sockets, resolvers) but must not start enumerating.
#[async_trait]
pub trait PluginFactory: Send + Sync {
    async fn create(
        &self,
        globals: &GlobalOptions,
        options: &ModeOptions,
    ) -> anyhow::Result<Box<dyn Enumerator>>;
}

/// One selectable mode.
pub struct Mode {
    name: &'static str,
    about: &'static str,
    validator: Box<dyn OptionsValidator>,
    factory: Box<dyn PluginFactory>,
}

impl Mode {
    pub fn new(
        name: &'static str,
        about: &'static str,
        validator: Box<dyn OptionsValidator>,
        factory: Box<dyn PluginFactory>,
    ) -> Self {
        Self {
            name,
            about,
            validator,
            factory,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn about(&self) -> &'static str {
        self.about
    }

    pub fn validate(&self, flags: &RawFlags, platform: &Platform) -> Result<ModeOptions, OptionError> {
        self.validator.validate(flags, platform)
    }

    pub async fn create(
        &self,
        globals: &GlobalOptions,
        options: &ModeOptions,
    ) -> anyhow::Result<Box<dyn Enumerator>> {
        self.factory.create(globals, options).await
    }
}

#[derive(Default)]
pub struct ModeRegistry {
    modes: BTreeMap<&'static str, Mode>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every mode shipped with the tool.
    pub fn with_builtin_modes() -> Self {
        let mut registry = Self::new();
        registry.register(Mode::new(
            dns::MODE_NAME,
            "Uses DNS subdomain bruteforcing mode",
            Box::new(DnsValidator),
            Box::new(DnsFactory),
        ));
        registry
    }

    /// Adds `mode`, returning the entry it replaced.
    pub fn register(&mut self, mode: Mode) -> Option<Mode> {
        self.modes.insert(mode.name, mode)
    }

    pub fn get(&self, name: &str) -> Option<&Mode> {
        self.modes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modes.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

/// Factory of the `dns` mode.
pub struct DnsFactory;

#[async_trait]
impl PluginFactory for DnsFactory {
    async fn create(
        &self,
        globals: &GlobalOptions,
        options: &ModeOptions,
    ) -> anyhow::Result<Box<dyn Enumerator>> {
        match options {
            ModeOptions::Dns(dns_options) => {
                Ok(Box::new(DnsPlugin::connect(globals, dns_options).await?))
            }
        }
    }
}
