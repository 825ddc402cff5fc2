//! Database and table discovery
//!
//! Lists databases from a server-level connection, applies exclusion
//! filtering, then lists the tables of each surviving database through a
//! connection that selects it. Partial discovery is never used: any listing
//! failure aborts the entire run.
//!
//! Connections are short-lived, scoped to one listing call and explicitly
//! disconnected before the next step proceeds.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{BackupError, Result};
use crate::run::Database;

/// Listing interface consumed by discovery
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List all database names on the server, no database selected.
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// List the tables of one database.
    async fn list_tables(&self, database: &str) -> Result<Vec<String>>;
}

/// MySQL/MariaDB catalog over short-lived connections
pub struct MySqlCatalog {
    host: String,
    port: u16,
    user: String,
    pass: String,
}

impl MySqlCatalog {
    pub fn new(settings: &Settings) -> Self {
        Self {
            host: settings.db_host.clone(),
            port: settings.db_port,
            user: settings.db_user.clone(),
            pass: settings.db_pass.clone(),
        }
    }

    fn opts(&self, database: Option<&str>) -> Opts {
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.pass.clone()))
            .db_name(database)
            .into()
    }

    async fn connect(&self, database: Option<&str>) -> Result<Conn> {
        Conn::new(self.opts(database)).await.map_err(|e| {
            BackupError::connection(format!(
                "cannot reach {}:{}: {e}",
                self.host, self.port
            ))
        })
    }

    async fn release(conn: Conn) {
        if let Err(e) = conn.disconnect().await {
            debug!(error = %e, "connection close failed");
        }
    }
}

#[async_trait]
impl Catalog for MySqlCatalog {
    async fn list_databases(&self) -> Result<Vec<String>> {
        let mut conn = self.connect(None).await?;
        let databases = conn
            .query("SHOW DATABASES")
            .await
            .map_err(|e| BackupError::query(format!("SHOW DATABASES failed: {e}")));
        Self::release(conn).await;
        databases
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        let mut conn = self.connect(Some(database)).await?;
        let tables = conn
            .query("SHOW TABLES")
            .await
            .map_err(|e| BackupError::query(format!("SHOW TABLES failed for {database}: {e}")));
        Self::release(conn).await;
        tables
    }
}

/// Discover all databases to back up, in server order.
///
/// Exclusion filtering happens here, before any connection selecting an
/// excluded database is opened.
pub async fn discover<C: Catalog + ?Sized>(
    catalog: &C,
    settings: &Settings,
) -> Result<Vec<Database>> {
    let names = catalog.list_databases().await?;

    let mut databases = Vec::new();
    for name in names {
        if settings.is_excluded(&name) {
            debug!(database = %name, "excluded from backup");
            continue;
        }
        let tables = catalog.list_tables(&name).await?;
        databases.push(Database::new(name, tables));
    }

    info!(
        databases = databases.len(),
        tables = databases.iter().map(|d| d.tables.len()).sum::<usize>(),
        "discovery complete"
    );
    Ok(databases)
}
