//! Warehouse connection and the statement-execution seam.
//!
//! One pooled connection, statements issued one at a time in autocommit
//! mode, so each statement's effects are committed before the next begins.
//! Catalog statements go through `sqlx::raw_sql`: COPY and Redshift DDL are
//! not friendly to prepared statements.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::sql::{Statement, SCHEMA};

/// Seam between the pipeline drivers and the live pool. Drivers only ever
/// sequence statements, which keeps them testable against a recording fake.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(&self, stmt: &Statement) -> Result<()>;
}

pub struct Warehouse {
    pub pool: PgPool,
}

impl Warehouse {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let mut connect_options: PgConnectOptions = database_url
            .parse()
            .context("invalid database URL")?;

        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        // The run is strictly sequential; one connection is the whole model.
        // search_path is session state, so re-pin it if the pool ever has to
        // re-establish the connection mid-run.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    let _ = sqlx::query(&format!("SET search_path TO {SCHEMA}"))
                        .execute(&mut *conn)
                        .await;
                    Ok(())
                })
            })
            .connect_with(connect_options)
            .await?;
        info!("connected to warehouse");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StatementExecutor for Warehouse {
    async fn execute(&self, stmt: &Statement) -> Result<()> {
        sqlx::raw_sql(stmt.sql.as_ref())
            .execute(&self.pool)
            .await
            .with_context(|| format!("statement {} failed", stmt.name))?;
        Ok(())
    }
}
