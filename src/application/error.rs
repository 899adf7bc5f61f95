//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, LayoutError};

/// Application errors wrap domain errors and add rule-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Invalid rule configuration, raised once while the rule is built.
    #[error("configuration error in {field}: {message}")]
    Configuration { field: String, message: String },

    /// Tree failure while rewriting the node at `path`.
    #[error("error applying rewrite to {path}")]
    Rewrite {
        path: String,
        #[source]
        source: DomainError,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Path of the node a rewrite failed on, if this is a rewrite failure.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Rewrite { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<LayoutError> for ApplicationError {
    fn from(e: LayoutError) -> Self {
        Self::configuration("column_widths", e.to_string())
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
