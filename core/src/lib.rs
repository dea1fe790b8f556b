//! # Burrow Core
//!
//! The pipeline every mode goes through:
//!
//! 1. [`validator`] turns a [`flags::RawFlags`] bag into typed options.
//! 2. [`registry`] looks up the mode and builds its plugin.
//! 3. [`orchestrator`] arms the [`bridge`] and hands the plugin to a [`runner::Runner`].
//!
//! High-level callers only need [`orchestrator::Orchestrator`] and a
//! [`registry::ModeRegistry`]; everything else is exposed for tests and for
//! alternative front ends.

pub mod bridge;
pub mod error;
pub mod flags;
pub mod orchestrator;
pub mod registry;
pub mod runner;
pub mod validator;
