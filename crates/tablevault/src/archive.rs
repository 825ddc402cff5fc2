//! Run directory archival
//!
//! Invoked only when every dump in the run succeeded. The run directory is
//! compressed into a sibling `.7z` artifact at maximum compression with
//! delete-source-on-success semantics; on failure the dump files stay on
//! disk and the failure becomes the run's terminal error without
//! invalidating prior dumps.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::broadcast;

use crate::config::Settings;
use crate::error::BackupError;
use crate::tool::{run_tool, ToolReport};

/// Artifact path for a run directory: same base name, `.7z` extension.
pub fn archive_path(dir: &Path) -> PathBuf {
    let mut path = dir.as_os_str().to_owned();
    path.push(".7z");
    PathBuf::from(path)
}

/// Compression interface consumed by the orchestrator
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Compress `dir` into a single artifact, deleting `dir` on success.
    async fn archive(&self, dir: &Path) -> ToolReport;
}

/// Production archiver invoking `7z`
pub struct SevenZipArchiver {
    sevenzip_path: PathBuf,
    timeout: Duration,
    shutdown: broadcast::Sender<()>,
}

impl SevenZipArchiver {
    pub fn new(settings: &Settings, shutdown: broadcast::Sender<()>) -> Self {
        Self {
            sevenzip_path: settings.sevenzip_path.clone(),
            timeout: settings.tool_timeout,
            shutdown,
        }
    }

    /// `-mx9` maximum compression, `-mmt=on` multithreaded, `-sdel` delete
    /// source files once the archive is written, `-bb1` echo file names.
    fn archive_args(dir: &Path) -> Vec<OsString> {
        vec![
            "a".into(),
            archive_path(dir).into_os_string(),
            dir.as_os_str().to_owned(),
            "-t7z".into(),
            "-mx9".into(),
            "-mmt=on".into(),
            "-sdel".into(),
            "-bb1".into(),
        ]
    }
}

#[async_trait]
impl Archiver for SevenZipArchiver {
    async fn archive(&self, dir: &Path) -> ToolReport {
        let mut cmd = Command::new(&self.sevenzip_path);
        cmd.args(Self::archive_args(dir));

        match run_tool(&mut cmd, self.timeout, &self.shutdown, "7z").await {
            Ok(out) => {
                let output = out.text.trim().to_owned();
                if out.success {
                    ToolReport::ok(output)
                } else {
                    let message = match out.code {
                        Some(code) => format!("7z exited with status {code}"),
                        None => "7z terminated by signal".to_owned(),
                    };
                    ToolReport::failed(output, BackupError::archive(message))
                }
            }
            Err(e @ BackupError::Timeout(_)) => ToolReport::failed(String::new(), e),
            Err(e) => {
                ToolReport::failed(String::new(), BackupError::archive(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_path() {
        assert_eq!(
            archive_path(Path::new("/var/backups/2024-01-02_03-04-05")),
            Path::new("/var/backups/2024-01-02_03-04-05.7z")
        );
    }

    #[test]
    fn test_archive_args() {
        let args = SevenZipArchiver::archive_args(Path::new("/out/run"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "a");
        assert_eq!(args[1], "/out/run.7z");
        assert_eq!(args[2], "/out/run");
        for flag in ["-t7z", "-mx9", "-mmt=on", "-sdel", "-bb1"] {
            assert!(args.contains(&flag.to_owned()), "missing {flag}");
        }
    }
}
