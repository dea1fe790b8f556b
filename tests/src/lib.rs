//! End-to-end checks of the validate -> construct -> run pipeline, driven
//! through [`burrow_core::orchestrator::Orchestrator`] with test doubles on the
//! plugin, runner and signal seams.

#[cfg(test)]
mod support;

#[cfg(test)]
mod orchestration;
