//! tablevault binary - one invocation, one backup run
//!
//! Usage:
//!   # Everything from environment variables
//!   tablevault
//!
//!   # Or explicit flags
//!   tablevault \
//!     --db-host db.internal --db-user backup --db-pass ... \
//!     --mysqldump-dir /opt/mysql/bin \
//!     --output-root /var/backups \
//!     --exclude staging,scratch \
//!     --smtp-host smtp.internal --mail-from backup@example.com \
//!     --mail-to ops@example.com

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tablevault::{
    BackupOrchestrator, Cli, MySqlCatalog, MysqldumpExecutor, SevenZipArchiver, SmtpNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = cli.into_settings()?;

    // Ctrl-C aborts the current external invocation; the run then fails
    // through the normal notification path.
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(());
            }
        });
    }

    let orchestrator = BackupOrchestrator::new(
        MySqlCatalog::new(&settings),
        MysqldumpExecutor::new(&settings, shutdown_tx.clone()),
        SevenZipArchiver::new(&settings, shutdown_tx.clone()),
        SmtpNotifier::new(&settings.smtp)?,
    );

    let report = orchestrator.run(&settings).await;
    match &report.error {
        None => {
            println!("OK (no errors). Log:\n");
            println!("{}", report.log);
        }
        Some(error) => {
            println!("==========");
            println!("= ERROR: =");
            println!("{error}");
            println!("==========");
            println!("{}", report.log);
            std::process::exit(1);
        }
    }

    Ok(())
}
