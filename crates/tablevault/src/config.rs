//! Immutable run configuration
//!
//! `Settings` is a snapshot constructed once at process start and passed by
//! reference into each component. Business logic never reads the environment
//! directly.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BackupError, Result};

/// Server-internal schemas excluded by the built-in overlay.
///
/// Applied in addition to the operator exclusion list when
/// `exclude_system_schemas` is set; never merged into it.
pub const SYSTEM_SCHEMAS: [&str; 4] = ["information_schema", "mysql", "performance_schema", "sys"];

/// Immutable configuration snapshot for one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// MySQL server host
    pub db_host: String,
    /// MySQL server port
    pub db_port: u16,
    /// MySQL user
    pub db_user: String,
    /// MySQL password
    pub db_pass: String,
    /// Directory containing the `mysqldump` binary
    pub mysqldump_dir: PathBuf,
    /// Root directory receiving one timestamped subdirectory per run
    pub output_root: PathBuf,
    /// Path to the `7z` binary
    pub sevenzip_path: PathBuf,
    /// Operator-supplied database names never backed up (exact match)
    pub exclude: HashSet<String>,
    /// Also drop the built-in `SYSTEM_SCHEMAS` overlay
    pub exclude_system_schemas: bool,
    /// Keep dumping remaining tables after a table export fails.
    /// The run is still reported failed and archiving is still skipped.
    pub continue_on_error: bool,
    /// Deadline for each external tool invocation
    pub tool_timeout: Duration,
    /// Mail delivery settings
    pub smtp: SmtpSettings,
}

/// SMTP relay and message identities for the notifier
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

impl Settings {
    /// Reject settings that would fail every run before any connection is
    /// attempted.
    pub fn validate(&self) -> Result<()> {
        if self.db_user.is_empty() {
            return Err(BackupError::config("database user must not be empty"));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(BackupError::config("output root must not be empty"));
        }
        if self.tool_timeout.is_zero() {
            return Err(BackupError::config("tool timeout must be greater than zero"));
        }
        if self.smtp.host.is_empty() {
            return Err(BackupError::config("SMTP host must not be empty"));
        }
        Ok(())
    }

    /// Check a database name against the operator list and, when enabled,
    /// the built-in system schema overlay.
    pub fn is_excluded(&self, database: &str) -> bool {
        if self.exclude.contains(database) {
            return true;
        }
        self.exclude_system_schemas && SYSTEM_SCHEMAS.contains(&database)
    }
}

/// Parse the comma-separated exclusion list, trimming whitespace around each
/// entry and dropping empties.
pub fn parse_exclusion_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            db_host: "localhost".into(),
            db_port: 3306,
            db_user: "backup".into(),
            db_pass: "secret".into(),
            mysqldump_dir: "/usr/bin".into(),
            output_root: "/var/backups".into(),
            sevenzip_path: "7z".into(),
            exclude: HashSet::new(),
            exclude_system_schemas: true,
            continue_on_error: false,
            tool_timeout: Duration::from_secs(3600),
            smtp: SmtpSettings {
                host: "smtp.example.com".into(),
                port: 587,
                user: "backup@example.com".into(),
                pass: "secret".into(),
                from: "backup@example.com".into(),
                to: "ops@example.com".into(),
            },
        }
    }

    #[test]
    fn test_parse_exclusion_list() {
        let set = parse_exclusion_list("staging, scratch ,tmp");
        assert_eq!(set.len(), 3);
        assert!(set.contains("staging"));
        assert!(set.contains("scratch"));
        assert!(set.contains("tmp"));
    }

    #[test]
    fn test_parse_exclusion_list_empty_entries() {
        assert!(parse_exclusion_list("").is_empty());
        assert!(parse_exclusion_list(" , ,").is_empty());
    }

    #[test]
    fn test_is_excluded_exact_case_sensitive() {
        let mut s = settings();
        s.exclude = parse_exclusion_list("app");
        assert!(s.is_excluded("app"));
        assert!(!s.is_excluded("App"));
        assert!(!s.is_excluded("app2"));
    }

    #[test]
    fn test_system_schema_overlay() {
        let mut s = settings();
        assert!(s.is_excluded("information_schema"));
        assert!(s.is_excluded("mysql"));
        assert!(s.is_excluded("performance_schema"));
        assert!(s.is_excluded("sys"));

        s.exclude_system_schemas = false;
        assert!(!s.is_excluded("mysql"));
    }

    #[test]
    fn test_validate() {
        assert!(settings().validate().is_ok());

        let mut s = settings();
        s.db_user.clear();
        assert!(s.validate().is_err());

        let mut s = settings();
        s.tool_timeout = Duration::ZERO;
        assert!(s.validate().is_err());

        let mut s = settings();
        s.smtp.host.clear();
        assert!(s.validate().is_err());
    }
}
