//! External tool invocation
//!
//! Both the dump executor and the archiver shell out to an external binary.
//! Every invocation is synchronous from the run's point of view, bounded by
//! an explicit deadline, and aborted when the shutdown channel fires. The
//! child is spawned with `kill_on_drop` so a lost race leaves no orphan.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::broadcast;

use crate::error::{BackupError, Result};

/// Exit status and combined output of one finished invocation
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr, lossily decoded
    pub text: String,
}

/// What a run step contributes to the log: captured output plus the error
/// that terminates the run, if any.
#[derive(Debug)]
pub struct ToolReport {
    pub output: String,
    pub error: Option<BackupError>,
}

impl ToolReport {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(output: impl Into<String>, error: BackupError) -> Self {
        Self {
            output: output.into(),
            error: Some(error),
        }
    }
}

/// Run one external tool to completion, capturing combined output.
///
/// Returns `Err(Timeout)` when the deadline expires or the shutdown channel
/// fires; the child process is killed in both cases.
pub async fn run_tool(
    cmd: &mut Command,
    timeout: Duration,
    shutdown: &broadcast::Sender<()>,
    tool: &str,
) -> Result<ToolOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;
    let mut shutdown_rx = shutdown.subscribe();

    tokio::select! {
        result = child.wait_with_output() => {
            let output = result?;
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            if !output.stderr.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&String::from_utf8_lossy(&output.stderr));
            }
            Ok(ToolOutput {
                success: output.status.success(),
                code: output.status.code(),
                text,
            })
        }
        _ = tokio::time::sleep(timeout) => {
            Err(BackupError::timeout(format!(
                "{tool} did not finish within {}s",
                timeout.as_secs()
            )))
        }
        _ = shutdown_rx.recv() => {
            Err(BackupError::timeout(format!("{tool} aborted by shutdown signal")))
        }
    }
}
