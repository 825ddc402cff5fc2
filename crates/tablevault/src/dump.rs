//! Per-table dump execution
//!
//! Each `(database, table)` pair is one independent `mysqldump` invocation
//! with a fixed option set: no table locks, consistent point-in-time
//! snapshot, streamed row fetch, pinned character set, data-only output.
//! There is no cross-table transaction.
//!
//! The loop is fail-fast by default: the first failing export aborts all
//! remaining pairs, leaving earlier files on disk for inspection. With
//! `continue_on_error` the loop records failures and keeps going; the first
//! failure still becomes the run's terminal error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{BackupError, Result};
use crate::run::{BackupRun, Database, RunEntry};
use crate::tool::{run_tool, ToolReport};

/// Benign diagnostic emitted on every invocation; stripped from the log.
const PASSWORD_WARNING: &str =
    "mysqldump: [Warning] Using a password on the command line interface can be insecure.";

/// Deterministic dump file name for one pair; distinct pairs never collide
/// because database and table names cannot contain `/`.
pub fn dump_file_name(database: &str, table: &str) -> String {
    format!("{database}-{table}.sql")
}

/// Remove the known password warning and trim the remainder.
pub fn strip_password_warning(text: &str) -> String {
    text.replace(PASSWORD_WARNING, "").trim().to_owned()
}

/// Export interface consumed by the dump loop
#[async_trait]
pub trait TableDumper: Send + Sync {
    /// Export one table into `target_dir`, returning captured output and
    /// the terminal error if the export failed.
    async fn dump_table(&self, database: &str, table: &str, target_dir: &Path) -> ToolReport;
}

/// Production executor invoking `mysqldump`
pub struct MysqldumpExecutor {
    host: String,
    port: u16,
    user: String,
    password: String,
    mysqldump_dir: PathBuf,
    timeout: Duration,
    shutdown: broadcast::Sender<()>,
}

impl MysqldumpExecutor {
    pub fn new(settings: &Settings, shutdown: broadcast::Sender<()>) -> Self {
        Self {
            host: settings.db_host.clone(),
            port: settings.db_port,
            user: settings.db_user.clone(),
            password: settings.db_pass.clone(),
            mysqldump_dir: settings.mysqldump_dir.clone(),
            timeout: settings.tool_timeout,
            shutdown,
        }
    }

    /// The fixed option set for one pair.
    ///
    /// `--skip-lock-tables --single-transaction --quick` gives a lock-free,
    /// consistent, streamed read; `--no-create-db --no-create-info
    /// --skip-add-drop-table` makes the dump data-only.
    fn dump_args(&self, database: &str, table: &str, result_file: &Path) -> Vec<OsString> {
        vec![
            "-u".into(),
            self.user.clone().into(),
            format!("--password={}", self.password).into(),
            "--host".into(),
            self.host.clone().into(),
            "--port".into(),
            self.port.to_string().into(),
            database.into(),
            table.into(),
            "--skip-lock-tables".into(),
            "--single-transaction".into(),
            "--quick".into(),
            "--protocol=tcp".into(),
            "--default-character-set=utf8".into(),
            "--no-create-db".into(),
            "--no-create-info".into(),
            "--skip-add-drop-table".into(),
            "--result-file".into(),
            result_file.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl TableDumper for MysqldumpExecutor {
    async fn dump_table(&self, database: &str, table: &str, target_dir: &Path) -> ToolReport {
        let result_file = target_dir.join(dump_file_name(database, table));
        let mut cmd = Command::new(self.mysqldump_dir.join("mysqldump"));
        cmd.args(self.dump_args(database, table, &result_file));

        match run_tool(&mut cmd, self.timeout, &self.shutdown, "mysqldump").await {
            Ok(out) => {
                let output = strip_password_warning(&out.text);
                if out.success {
                    ToolReport::ok(output)
                } else {
                    let message = match out.code {
                        Some(code) => format!("mysqldump exited with status {code}"),
                        None => "mysqldump terminated by signal".to_owned(),
                    };
                    ToolReport::failed(output, BackupError::dump(database, table, message))
                }
            }
            // Timeouts keep their classification; spawn failures become
            // dump errors for this pair.
            Err(e @ BackupError::Timeout(_)) => ToolReport::failed(String::new(), e),
            Err(e) => ToolReport::failed(
                String::new(),
                BackupError::dump(database, table, e.to_string()),
            ),
        }
    }
}

/// Run the dump loop over every `(database, table)` pair in discovery order.
///
/// Every outcome is appended to the run log. Returns the first failure as
/// the run's terminal error; with `continue_on_error` the remaining pairs
/// are still attempted first.
pub async fn dump_all<D: TableDumper + ?Sized>(
    dumper: &D,
    databases: &[Database],
    run: &mut BackupRun,
    continue_on_error: bool,
) -> Result<()> {
    let mut first_error: Option<BackupError> = None;

    'pairs: for database in databases {
        for table in &database.tables {
            info!(database = %database.name, table = %table, "dumping table");
            let report = dumper.dump_table(&database.name, table, run.target_dir()).await;
            run.log.append(RunEntry::dump(&database.name, table, &report));

            if let Some(error) = report.error {
                if !continue_on_error {
                    return Err(error);
                }
                warn!(database = %database.name, table = %table, error = %error,
                    "table dump failed, continuing");
                // A timeout may mean the shutdown channel fired; pressing on
                // would stall on every remaining pair.
                let stop = matches!(error, BackupError::Timeout(_));
                if first_error.is_none() {
                    first_error = Some(error);
                }
                if stop {
                    break 'pairs;
                }
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
