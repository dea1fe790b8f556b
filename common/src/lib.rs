//! # Burrow Common
//!
//! Types shared by every crate in the workspace: the option model, the plugin
//! capability contract and the cancellation token that ties a run together.
//!
//! Nothing in here performs I/O on its own. The crates built on top of it decide
//! where bytes come from and where they go.

pub mod cancel;
pub mod config;
pub mod duration;
pub mod options;
pub mod platform;
pub mod plugin;

#[doc(hidden)]
pub use tracing as __tracing;

/// Logs a positive result. Rendered with its own marker by the CLI formatter.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "burrow::success", $($arg)*)
    };
}
