//! # tablevault - per-table MySQL backups
//!
//! One invocation performs one backup run: enumerate every user database and
//! table on a MySQL/MariaDB server, export each table individually with
//! `mysqldump`, compress the run directory with `7z`, and mail the run log
//! to an operator.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────────┐   ┌───────────┐   ┌───────────┐
//! │ Discovery │ → │ Dump Executor │ → │ Archiver  │ → │ Notifier  │
//! │  catalog  │   │   mysqldump   │   │    7z     │   │   SMTP    │
//! └───────────┘   └───────────────┘   └───────────┘   └───────────┘
//! ```
//!
//! Strictly sequential, one run per invocation. A failure in discovery or
//! dumping skips archiving; notification always happens exactly once and
//! never changes the run's reported outcome.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tablevault::{
//!     archive::SevenZipArchiver, catalog::MySqlCatalog, dump::MysqldumpExecutor,
//!     notify::SmtpNotifier, orchestrator::BackupOrchestrator,
//! };
//!
//! let orchestrator = BackupOrchestrator::new(
//!     MySqlCatalog::new(&settings),
//!     MysqldumpExecutor::new(&settings, shutdown.clone()),
//!     SevenZipArchiver::new(&settings, shutdown.clone()),
//!     SmtpNotifier::new(&settings.smtp)?,
//! );
//! let report = orchestrator.run(&settings).await;
//! ```
//!
//! Each seam (`Catalog`, `TableDumper`, `Archiver`, `Notifier`) is a trait,
//! so run policy is testable with in-memory fakes.

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod run;
pub mod tool;

pub use archive::{Archiver, SevenZipArchiver};
pub use catalog::{Catalog, MySqlCatalog};
pub use cli::Cli;
pub use config::{Settings, SmtpSettings};
pub use dump::{MysqldumpExecutor, TableDumper};
pub use error::{BackupError, Result};
pub use notify::{Notifier, SmtpNotifier};
pub use orchestrator::{BackupOrchestrator, RunReport};
pub use run::{BackupRun, Database, RunLog};
pub use tool::ToolReport;
