//! CLI argument parsing
//!
//! Every argument has an environment variable fallback so the tool can run
//! flagless from a scheduler. No subcommands: one invocation performs
//! exactly one run and exits.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{parse_exclusion_list, Settings, SmtpSettings};
use crate::error::Result;

/// tablevault - per-table MySQL backups
///
/// Enumerates every user database and table on the server, exports each
/// table with mysqldump into a timestamped directory, compresses the
/// directory with 7z, and mails the run log to an operator.
#[derive(Parser, Debug)]
#[command(name = "tablevault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ============ Database Server ============
    /// MySQL server host
    #[arg(long, default_value = "127.0.0.1", env = "TABLEVAULT_DB_HOST")]
    pub db_host: String,

    /// MySQL server port
    #[arg(long, default_value = "3306", env = "TABLEVAULT_DB_PORT")]
    pub db_port: u16,

    /// MySQL user
    #[arg(long, env = "TABLEVAULT_DB_USER")]
    pub db_user: String,

    /// MySQL password
    #[arg(long, env = "TABLEVAULT_DB_PASS", hide_env_values = true)]
    pub db_pass: String,

    // ============ Tools & Layout ============
    /// Directory containing the mysqldump binary
    #[arg(long, env = "TABLEVAULT_MYSQLDUMP_DIR")]
    pub mysqldump_dir: PathBuf,

    /// Root directory receiving one timestamped subdirectory per run
    #[arg(long, env = "TABLEVAULT_OUTPUT_ROOT")]
    pub output_root: PathBuf,

    /// Path to the 7z binary
    #[arg(long, default_value = "7z", env = "TABLEVAULT_SEVENZIP_PATH")]
    pub sevenzip_path: PathBuf,

    // ============ Run Policy ============
    /// Comma-separated database names to exclude (exact match, entries
    /// whitespace-trimmed)
    #[arg(long, default_value = "", env = "TABLEVAULT_EXCLUDE")]
    pub exclude: String,

    /// Also exclude the built-in server-internal schemas
    /// (information_schema, mysql, performance_schema, sys)
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "TABLEVAULT_EXCLUDE_SYSTEM_SCHEMAS"
    )]
    pub exclude_system_schemas: bool,

    /// Keep dumping remaining tables after a table export fails
    /// (the run is still reported failed and never archived)
    #[arg(long, env = "TABLEVAULT_CONTINUE_ON_ERROR")]
    pub continue_on_error: bool,

    /// Deadline in seconds for each external tool invocation
    #[arg(long, default_value = "3600", env = "TABLEVAULT_TOOL_TIMEOUT_SECS")]
    pub tool_timeout_secs: u64,

    // ============ Notification ============
    /// SMTP relay host
    #[arg(long, env = "TABLEVAULT_SMTP_HOST")]
    pub smtp_host: String,

    /// SMTP relay port
    #[arg(long, default_value = "587", env = "TABLEVAULT_SMTP_PORT")]
    pub smtp_port: u16,

    /// SMTP user
    #[arg(long, env = "TABLEVAULT_SMTP_USER")]
    pub smtp_user: String,

    /// SMTP password
    #[arg(long, env = "TABLEVAULT_SMTP_PASS", hide_env_values = true)]
    pub smtp_pass: String,

    /// Sender address for the run summary
    #[arg(long, env = "TABLEVAULT_MAIL_FROM")]
    pub mail_from: String,

    /// Recipient address for the run summary
    #[arg(long, env = "TABLEVAULT_MAIL_TO")]
    pub mail_to: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

impl Cli {
    /// Build the immutable settings snapshot for this run.
    pub fn into_settings(self) -> Result<Settings> {
        let settings = Settings {
            db_host: self.db_host,
            db_port: self.db_port,
            db_user: self.db_user,
            db_pass: self.db_pass,
            mysqldump_dir: self.mysqldump_dir,
            output_root: self.output_root,
            sevenzip_path: self.sevenzip_path,
            exclude: parse_exclusion_list(&self.exclude),
            exclude_system_schemas: self.exclude_system_schemas,
            continue_on_error: self.continue_on_error,
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
            smtp: SmtpSettings {
                host: self.smtp_host,
                port: self.smtp_port,
                user: self.smtp_user,
                pass: self.smtp_pass,
                from: self.mail_from,
                to: self.mail_to,
            },
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "tablevault",
            "--db-user",
            "backup",
            "--db-pass",
            "secret",
            "--mysqldump-dir",
            "/opt/mysql/bin",
            "--output-root",
            "/var/backups",
            "--smtp-host",
            "smtp.example.com",
            "--smtp-user",
            "backup@example.com",
            "--smtp-pass",
            "secret",
            "--mail-from",
            "backup@example.com",
            "--mail-to",
            "ops@example.com",
        ]
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(base_args()).unwrap();
        assert_eq!(cli.db_host, "127.0.0.1");
        assert_eq!(cli.db_port, 3306);
        assert!(cli.exclude_system_schemas);
        assert!(!cli.continue_on_error);
        assert_eq!(cli.tool_timeout_secs, 3600);
        assert_eq!(cli.smtp_port, 587);
    }

    #[test]
    fn test_cli_into_settings() {
        let mut args = base_args();
        args.extend(["--exclude", "staging, scratch", "--tool-timeout-secs", "120"]);
        let settings = Cli::try_parse_from(args).unwrap().into_settings().unwrap();

        assert_eq!(settings.tool_timeout, Duration::from_secs(120));
        assert!(settings.exclude.contains("staging"));
        assert!(settings.exclude.contains("scratch"));
    }

    #[test]
    fn test_cli_system_schema_overlay_can_be_disabled() {
        let mut args = base_args();
        args.extend(["--exclude-system-schemas", "false"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(!cli.exclude_system_schemas);
    }

    #[test]
    fn test_cli_continue_on_error_flag() {
        let mut args = base_args();
        args.push("--continue-on-error");
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.continue_on_error);
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        let mut args = base_args();
        args.extend(["--tool-timeout-secs", "0"]);
        assert!(Cli::try_parse_from(args).unwrap().into_settings().is_err());
    }
}
