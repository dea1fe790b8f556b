use thiserror::Error;

/// Rejection of a raw option value. Always names the offending flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("required option '--{field}' is missing")]
    MissingRequiredOption { field: &'static str },

    #[error("invalid value '{value}' for '--{field}': {reason}")]
    InvalidOptionValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("'--{field}' is not supported on {platform}: {reason}")]
    UnsupportedOnPlatform {
        field: &'static str,
        platform: &'static str,
        reason: String,
    },
}

impl OptionError {
    pub fn field(&self) -> &'static str {
        match self {
            OptionError::MissingRequiredOption { field }
            | OptionError::InvalidOptionValue { field, .. }
            | OptionError::UnsupportedOnPlatform { field, .. } => field,
        }
    }

    pub(crate) fn invalid(field: &'static str, value: &str, reason: impl ToString) -> Self {
        OptionError::InvalidOptionValue {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Anything that ends an invocation without a result.
///
/// A user interrupt is not in here: it is a regular
/// [`Outcome::Cancelled`](crate::orchestrator::Outcome::Cancelled).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    #[error("error on parsing arguments: {0}")]
    Options(#[from] OptionError),

    #[error("error on creating {mode} plugin: {source:#}")]
    PluginConstruction {
        mode: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("error on running {mode}: {source:#}")]
    Runner {
        mode: String,
        #[source]
        source: anyhow::Error,
    },
}
