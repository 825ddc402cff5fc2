//! Backup run orchestration
//!
//! One run walks the state machine
//! `DISCOVER → DUMPING(i=1..N) → ARCHIVING → NOTIFY → DONE`, strictly
//! sequential on one logical thread of control. Any failure in discovery or
//! dumping skips archiving and goes straight to notification carrying the
//! error; an archiving failure does the same; notification always happens
//! exactly once. No state is retried.
//!
//! The orchestrator is generic over its four seams so every policy is
//! testable with in-memory fakes.

use chrono::Local;
use tracing::{error, info, warn};

use crate::archive::Archiver;
use crate::catalog::{discover, Catalog};
use crate::config::Settings;
use crate::dump::{dump_all, TableDumper};
use crate::error::{BackupError, Result};
use crate::notify::{failure_subject, render_body, Notifier, SUCCESS_SUBJECT};
use crate::run::{BackupRun, RunEntry};

/// Outcome of one run: the terminal error (if any) and the rendered log.
#[derive(Debug)]
pub struct RunReport {
    pub error: Option<BackupError>,
    pub log: String,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives one backup run through its four seams.
pub struct BackupOrchestrator<C, D, A, N> {
    catalog: C,
    dumper: D,
    archiver: A,
    notifier: N,
}

impl<C, D, A, N> BackupOrchestrator<C, D, A, N>
where
    C: Catalog,
    D: TableDumper,
    A: Archiver,
    N: Notifier,
{
    pub fn new(catalog: C, dumper: D, archiver: A, notifier: N) -> Self {
        Self {
            catalog,
            dumper,
            archiver,
            notifier,
        }
    }

    /// Execute one complete run: discovery through notification.
    pub async fn run(&self, settings: &Settings) -> RunReport {
        let mut run = BackupRun::new(&settings.output_root, Local::now());
        info!(
            started_at = %run.started_at().format("%Y-%m-%d %H:%M:%S"),
            target_dir = %run.target_dir().display(),
            "backup run starting"
        );

        let error = self.execute(settings, &mut run).await.err();
        match &error {
            None => info!("backup run complete"),
            Some(e) => error!(error = %e, "backup run failed"),
        }

        let log = run.log.render();
        let subject = match &error {
            None => SUCCESS_SUBJECT.to_owned(),
            Some(e) => failure_subject(e),
        };
        // Exactly one delivery attempt; failure never changes the outcome.
        if let Err(e) = self.notifier.notify(&subject, &render_body(&log)).await {
            if e.is_fatal() {
                // A notifier leaking a fatal error class is still contained
                // at this boundary.
                error!(error = %e, "notification delivery failed");
            } else {
                warn!(error = %e, "notification delivery failed");
            }
        }

        RunReport { error, log }
    }

    async fn execute(&self, settings: &Settings, run: &mut BackupRun) -> Result<()> {
        let databases = discover(&self.catalog, settings).await?;

        run.create_target_dir()?;
        dump_all(
            &self.dumper,
            &databases,
            run,
            settings.continue_on_error,
        )
        .await?;

        // All dumps succeeded; an empty run directory is archived too.
        info!(dir = %run.target_dir().display(), "archiving run directory");
        let report = self.archiver.archive(run.target_dir()).await;
        run.log.append(RunEntry::archive(&report));
        match report.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
