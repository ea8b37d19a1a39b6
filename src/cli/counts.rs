//! Row-count report for the star schema.
//!
//! After a setup run every table should exist and be empty; after a load the
//! staging counts should match the source files and each dimension should
//! satisfy its uniqueness contract. This command gives the numbers to check
//! that against a live cluster.

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::warn;

use crate::config::resolve_dsn_from_env;
use crate::sql::{SCHEMA, TABLES};

#[derive(Debug, Clone, Default)]
pub struct CountsConfig {
    /// Optional override for the warehouse connection string.
    pub database_url: Option<String>,
    /// Emit the report as a single JSON object instead of text lines.
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct TableCount {
    pub table: String,
    /// None when the table does not exist in the target schema.
    pub rows: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CountsReport {
    pub schema: String,
    pub tables: Vec<TableCount>,
    /// MAX(start_time) in songplays; a cheap freshness marker.
    pub latest_songplay: Option<NaiveDateTime>,
}

fn is_undefined_table_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("42P01"),
        _ => false,
    }
}

async fn count_table(pool: &PgPool, table: &str) -> Result<Option<i64>> {
    // Table names come from the fixed catalog, never from input.
    let sql = format!("SELECT count(*) FROM {SCHEMA}.{table}");
    match sqlx::query_scalar::<_, i64>(&sql)
        .persistent(false)
        .fetch_one(pool)
        .await
    {
        Ok(val) => Ok(Some(val)),
        Err(e) if is_undefined_table_error(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn latest_songplay(pool: &PgPool) -> Option<NaiveDateTime> {
    let sql = format!("SELECT MAX(start_time) FROM {SCHEMA}.songplays");
    match sqlx::query_scalar::<_, Option<NaiveDateTime>>(&sql)
        .persistent(false)
        .fetch_one(pool)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            if !is_undefined_table_error(&e) {
                warn!(error = %e, "failed to read latest songplay");
            }
            None
        }
    }
}

pub async fn gather(pool: &PgPool) -> Result<CountsReport> {
    let mut tables = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        tables.push(TableCount {
            table: table.to_string(),
            rows: count_table(pool, table).await?,
        });
    }
    Ok(CountsReport {
        schema: SCHEMA.to_string(),
        latest_songplay: latest_songplay(pool).await,
        tables,
    })
}

pub async fn run(cfg: CountsConfig) -> Result<()> {
    // Cluster env vars are only consulted when no override is given, so
    // `counts --db-url ...` works against an arbitrary cluster.
    let dsn = resolve_dsn_from_env(cfg.database_url.as_deref())?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&dsn)
        .await?;

    let report = gather(&pool).await?;
    pool.close().await;

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("schema: {}", report.schema);
    for tc in &report.tables {
        match tc.rows {
            Some(n) => println!("{:>16}  {n}", tc.table),
            None => println!("{:>16}  (missing)", tc.table),
        }
    }
    if let Some(latest) = report.latest_songplay {
        println!("latest songplay: {latest}");
    }
    Ok(())
}
