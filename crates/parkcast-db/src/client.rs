//! Database client and connection management

use crate::{DbResult, WarehouseTables};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Database client wrapping an sqlx pool and the resolved table names
#[derive(Clone)]
pub struct DbClient {
    pool: PgPool,
    tables: WarehouseTables,
}

impl DbClient {
    /// Connect to `database_url`
    pub async fn new(database_url: &str, tables: WarehouseTables) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        info!(schema = %tables.schema(), "connected to warehouse");
        Ok(Self::from_pool(pool, tables))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, tables: WarehouseTables) -> Self {
        Self { pool, tables }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn tables(&self) -> &WarehouseTables {
        &self.tables
    }

    /// Test the database connection
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the connection pool gracefully
    pub async fn close(self) {
        self.pool.close().await;
    }
}
