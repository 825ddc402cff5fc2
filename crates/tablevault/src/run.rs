//! Run data model
//!
//! A `BackupRun` is created at run start and mutated only by appends to its
//! log. It is never persisted as structured data; the operator sees only the
//! rendered log text (console and mail body).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::tool::ToolReport;

/// Timestamp pattern for run directory names; lexicographic order matches
/// chronological order.
pub const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One database and its tables, as seen at discovery time.
///
/// Immutable after discovery; no re-validation happens before a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub tables: Vec<String>,
}

impl Database {
    pub fn new(name: impl Into<String>, tables: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tables,
        }
    }
}

/// Which step of the run produced a log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStep {
    /// One `(database, table)` export
    Dump { database: String, table: String },
    /// Compression of the run directory
    Archive,
}

/// One append-only log record
#[derive(Debug, Clone)]
pub struct RunEntry {
    pub step: RunStep,
    /// Captured tool output, already cleaned of known noise
    pub output: String,
    pub error: Option<String>,
}

impl RunEntry {
    pub fn dump(database: &str, table: &str, report: &ToolReport) -> Self {
        Self {
            step: RunStep::Dump {
                database: database.to_owned(),
                table: table.to_owned(),
            },
            output: report.output.clone(),
            error: report.error.as_ref().map(|e| e.to_string()),
        }
    }

    pub fn archive(report: &ToolReport) -> Self {
        Self {
            step: RunStep::Archive,
            output: report.output.clone(),
            error: report.error.as_ref().map(|e| e.to_string()),
        }
    }

    fn heading(&self) -> String {
        match &self.step {
            RunStep::Dump { database, table } => format!("{database}.{table}"),
            RunStep::Archive => "archive".to_owned(),
        }
    }
}

/// Append-only ordered log for one run
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<RunEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: RunEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the log as plain text, one block per entry in append order.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str("== ");
            text.push_str(&entry.heading());
            text.push('\n');
            if !entry.output.is_empty() {
                text.push_str(&entry.output);
                text.push('\n');
            }
            if let Some(err) = &entry.error {
                text.push_str("ERROR: ");
                text.push_str(err);
                text.push('\n');
            }
        }
        text.trim_end().to_owned()
    }
}

/// State for one run: start instant, target directory, log
#[derive(Debug)]
pub struct BackupRun {
    started_at: DateTime<Local>,
    target_dir: PathBuf,
    pub log: RunLog,
}

impl BackupRun {
    /// Create the run state. The target directory path is fixed here but
    /// only created on disk by [`create_target_dir`](Self::create_target_dir),
    /// after discovery has succeeded.
    pub fn new(output_root: &Path, started_at: DateTime<Local>) -> Self {
        let target_dir = output_root.join(started_at.format(RUN_DIR_FORMAT).to_string());
        Self {
            started_at,
            target_dir,
            log: RunLog::new(),
        }
    }

    /// Create the timestamped run directory before the first dump.
    pub fn create_target_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.target_dir)?;
        Ok(())
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(output: &str) -> ToolReport {
        ToolReport {
            output: output.to_owned(),
            error: None,
        }
    }

    #[test]
    fn test_run_dir_is_timestamp_keyed() {
        let started = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let run = BackupRun::new(Path::new("/var/backups"), started);
        assert_eq!(
            run.target_dir(),
            Path::new("/var/backups/2024-01-02_03-04-05")
        );
        assert_eq!(run.started_at(), started);
    }

    #[test]
    fn test_log_append_order() {
        let mut log = RunLog::new();
        log.append(RunEntry::dump("app", "users", &report("first")));
        log.append(RunEntry::dump("app", "orders", &report("second")));
        log.append(RunEntry::archive(&report("third")));

        let headings: Vec<String> = log.entries().iter().map(|e| e.heading()).collect();
        assert_eq!(headings, vec!["app.users", "app.orders", "archive"]);
    }

    #[test]
    fn test_log_render() {
        let mut log = RunLog::new();
        log.append(RunEntry::dump("app", "users", &report("")));
        log.append(RunEntry::dump(
            "app",
            "orders",
            &ToolReport {
                output: "some output".into(),
                error: Some(crate::error::BackupError::dump(
                    "app",
                    "orders",
                    "exit status 2",
                )),
            },
        ));

        let text = log.render();
        assert!(text.starts_with("== app.users"));
        assert!(text.contains("== app.orders"));
        assert!(text.contains("some output"));
        assert!(text.contains("ERROR: dump failed for app.orders"));
    }

    #[test]
    fn test_empty_log_renders_empty() {
        assert!(RunLog::new().render().is_empty());
        assert!(RunLog::new().is_empty());
    }

    #[test]
    fn test_create_target_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let started = Local.with_ymd_and_hms(2024, 6, 7, 8, 9, 10).unwrap();
        let run = BackupRun::new(tmp.path(), started);
        run.create_target_dir().unwrap();
        assert!(run.target_dir().is_dir());
    }
}
