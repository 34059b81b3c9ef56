//! Error types for Blockscribe.
//!
//! Library crates use [`BlockscribeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Blockscribe operations.
#[derive(Debug, thiserror::Error)]
pub enum BlockscribeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure: connection, timeout, or unreadable body.
    #[error("network error: {0}")]
    Network(String),

    /// The document API answered with a non-success status.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Response payload could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The caller's cancellation token fired while a request was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// An error annotated with the operation and identifier it occurred in.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BlockscribeError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlockscribeError>;

impl BlockscribeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Annotate this error with the operation that produced it.
    ///
    /// `Cancelled` is returned unchanged so it stays recognisable at every
    /// level of a recursive fetch.
    pub fn context(self, context: impl Into<String>) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            other => Self::Context {
                context: context.into(),
                source: Box::new(other),
            },
        }
    }

    /// Whether this error means the caller asked the operation to stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status of the underlying API error, looking through context layers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Context { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BlockscribeError::config("missing token");
        assert_eq!(err.to_string(), "config error: missing token");

        let err = BlockscribeError::Api {
            status: 404,
            code: "object_not_found".into(),
            message: "Could not find block".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error 404 (object_not_found): Could not find block"
        );
    }

    #[test]
    fn context_chains_into_display() {
        let err = BlockscribeError::Network("connection reset".into())
            .context("fetch children of block b1")
            .context("resolve page p1");
        assert_eq!(
            err.to_string(),
            "resolve page p1: fetch children of block b1: network error: connection reset"
        );
    }

    #[test]
    fn cancelled_survives_context() {
        let err = BlockscribeError::Cancelled.context("fetch children of block b1");
        assert!(err.is_cancelled());
    }

    #[test]
    fn status_looks_through_context() {
        let err = BlockscribeError::Api {
            status: 429,
            code: "rate_limited".into(),
            message: "slow down".into(),
        }
        .context("query collection db1");
        assert_eq!(err.status(), Some(429));
        assert_eq!(BlockscribeError::Cancelled.status(), None);
    }
}
