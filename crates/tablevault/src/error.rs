//! Error types for backup runs
//!
//! One variant per failure class in the run state machine. Everything except
//! `Notification` aborts the remainder of the run and becomes the run's
//! terminal error.

use thiserror::Error;

/// Backup-specific errors
#[derive(Error, Debug)]
pub enum BackupError {
    /// Server unreachable
    #[error("connection error: {0}")]
    Connection(String),

    /// Listing databases or tables failed
    #[error("query error: {0}")]
    Query(String),

    /// The export tool reported failure for a table
    #[error("dump failed for {database}.{table}: {message}")]
    Dump {
        database: String,
        table: String,
        message: String,
    },

    /// The compression tool failed
    #[error("archive error: {0}")]
    Archive(String),

    /// Mail delivery failed; caught at the notifier boundary, never fatal
    #[error("notification error: {0}")]
    Notification(String),

    /// An external invocation exceeded its deadline or was cancelled
    #[error("timeout: {0}")]
    Timeout(String),

    /// Invalid settings, rejected before the run starts
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackupError {
    /// Create a new connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a new dump error for one `(database, table)` pair
    pub fn dump(
        database: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Dump {
            database: database.into(),
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a new archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a new notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check whether this error terminates the run.
    ///
    /// Notification failures sit off the critical path of backup
    /// correctness; everything else is fatal to the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Notification(_))
    }
}

/// Result type for backup operations
pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::dump("app", "orders", "exit status 2");
        assert!(err.to_string().contains("app.orders"));
        assert!(err.to_string().contains("exit status 2"));

        let err = BackupError::connection("server gone away");
        assert!(err.to_string().contains("connection error"));
    }

    #[test]
    fn test_error_constructors() {
        let _ = BackupError::query("SHOW DATABASES failed");
        let _ = BackupError::archive("7z exited with status 2");
        let _ = BackupError::notification("relay refused");
        let _ = BackupError::timeout("mysqldump after 3600s");
        let _ = BackupError::config("empty output root");
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(BackupError::connection("x").is_fatal());
        assert!(BackupError::query("x").is_fatal());
        assert!(BackupError::dump("a", "b", "x").is_fatal());
        assert!(BackupError::archive("x").is_fatal());
        assert!(BackupError::timeout("x").is_fatal());

        assert!(!BackupError::notification("x").is_fatal());
    }
}
