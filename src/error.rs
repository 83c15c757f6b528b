//! Error types for cellmap.
//!
//! All errors are strongly typed using thiserror. Malformed entity data is
//! deliberately NOT an error: a bad accession clears the field and the record
//! survives with reduced capability, so the error surface here covers only
//! the dispatcher and the report flush.

use thiserror::Error;

/// Errors raised while scheduling or collecting match tasks.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("match job wait exceeded {timeout_secs}s with {outstanding} tasks outstanding")]
    Timeout {
        timeout_secs: u64,
        outstanding: usize,
    },

    #[error("dispatcher channel disconnected: {path}")]
    Disconnected { path: String },

    #[error("failed to spawn worker thread: {message}")]
    WorkerSpawn { message: String },
}

/// Errors raised while flushing results to the report writer.
///
/// A flush failure is fatal to the job (the caller is expected to terminate
/// with a non-zero status), in contrast to a timeout, which only skips the
/// flush.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {bucket} rows: {message}")]
    Write { bucket: String, message: String },

    #[error("report writer rejected a row with {actual} columns, expected {expected}")]
    ColumnCount { actual: usize, expected: usize },
}

/// Top-level error type for cellmap.
#[derive(Debug, Error)]
pub enum CellMapError {
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CellMapError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a dispatch error.
    #[must_use]
    pub const fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }

    /// Returns true if this is a report error.
    #[must_use]
    pub const fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }

    /// Returns true if the job may continue after this error.
    ///
    /// Only the wait timeout is survivable: the job skips the flush and
    /// leaves running tasks to finish on their own. Everything else is
    /// terminal.
    #[must_use]
    pub const fn is_survivable(&self) -> bool {
        matches!(self, Self::Dispatch(DispatchError::Timeout { .. }))
    }
}

/// Result type alias for cellmap operations.
pub type CellMapResult<T> = Result<T, CellMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_timeout_display() {
        let err = DispatchError::Timeout {
            timeout_secs: 36_000,
            outstanding: 7,
        };
        let msg = format!("{err}");
        assert!(msg.contains("36000s"));
        assert!(msg.contains("7 tasks"));
    }

    #[test]
    fn report_write_display() {
        let err = ReportError::Write {
            bucket: "multi".to_string(),
            message: "disk full".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("multi"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn from_dispatch() {
        let err: CellMapError = DispatchError::Disconnected {
            path: "results".to_string(),
        }
        .into();
        assert!(err.is_dispatch());
        assert!(!err.is_survivable());
    }

    #[test]
    fn from_report_is_fatal() {
        let err: CellMapError = ReportError::ColumnCount {
            actual: 21,
            expected: 22,
        }
        .into();
        assert!(err.is_report());
        assert!(!err.is_survivable());
    }

    #[test]
    fn timeout_is_survivable() {
        let err: CellMapError = DispatchError::Timeout {
            timeout_secs: 1,
            outstanding: 1,
        }
        .into();
        assert!(err.is_survivable());
    }

    #[test]
    fn internal_error() {
        let err = CellMapError::internal("unexpected state");
        let msg = format!("{err}");
        assert!(msg.contains("unexpected state"));
        assert!(!err.is_dispatch());
        assert!(!err.is_report());
    }
}
