//! The two pipeline drivers.
//!
//! Both issue their statement lists strictly sequentially through a
//! [`StatementExecutor`]; the first failure aborts the run. Each statement
//! commits on its own, so a mid-run failure leaves everything already
//! executed in place.

use std::time::Instant;

use anyhow::Result;
use tracing::info;

use crate::config::Settings;
use crate::sql::copy::staging_copy_statements;
use crate::sql::ddl::{CREATE_TABLES, DROP_TABLES, RESET_SCHEMA, SELECT_SCHEMA};
use crate::sql::insert::transform_statements;
use crate::sql::Statement;
use crate::warehouse::StatementExecutor;

async fn run_all<E: StatementExecutor>(
    executor: &E,
    phase: &str,
    statements: &[&Statement],
) -> Result<()> {
    for stmt in statements {
        info!(phase, statement = stmt.name, "executing");
        executor.execute(stmt).await?;
    }
    Ok(())
}

/// Entry sequence A: reset and select the schema, drop all tables, recreate
/// them. Must complete before [`run_load`] is invoked.
pub async fn run_setup<E: StatementExecutor>(executor: &E) -> Result<()> {
    let started = Instant::now();

    let mut reset: Vec<&Statement> = RESET_SCHEMA.iter().collect();
    reset.push(&SELECT_SCHEMA);
    run_all(executor, "schema", &reset).await?;

    let drops: Vec<&Statement> = DROP_TABLES.iter().collect();
    run_all(executor, "drop_tables", &drops).await?;

    let creates: Vec<&Statement> = CREATE_TABLES.iter().collect();
    run_all(executor, "create_tables", &creates).await?;

    info!(elapsed_ms = %started.elapsed().as_millis(), "setup complete");
    Ok(())
}

/// Entry sequence B: select the schema, bulk-load both staging tables, then
/// populate dimensions and the fact table. Assumes setup already ran.
pub async fn run_load<E: StatementExecutor>(executor: &E, settings: &Settings) -> Result<()> {
    let started = Instant::now();

    run_all(executor, "schema", &[&SELECT_SCHEMA]).await?;

    let copies = staging_copy_statements(settings);
    let copies: Vec<&Statement> = copies.iter().collect();
    run_all(executor, "load_staging", &copies).await?;

    let inserts: Vec<&Statement> = transform_statements().to_vec();
    run_all(executor, "transform", &inserts).await?;

    info!(elapsed_ms = %started.elapsed().as_millis(), "load complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterSettings, IamRole, S3Sources};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records statement names in order; optionally fails on a given name.
    struct Recorder {
        executed: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                executed: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(name: &'static str) -> Self {
            Self {
                executed: Mutex::new(Vec::new()),
                fail_on: Some(name),
            }
        }

        fn names(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatementExecutor for Recorder {
        async fn execute(&self, stmt: &Statement) -> anyhow::Result<()> {
            if self.fail_on == Some(stmt.name) {
                return Err(anyhow!("boom: {}", stmt.name));
            }
            self.executed.lock().unwrap().push(stmt.name.to_string());
            Ok(())
        }
    }

    fn settings() -> Settings {
        Settings {
            cluster: ClusterSettings {
                host: "example.redshift.amazonaws.com".into(),
                database: "dev".into(),
                user: "dwhuser".into(),
                password: "pw".into(),
                port: 5439,
            },
            iam_role: IamRole {
                arn: "arn:aws:iam::123456789012:role/dwhRole".into(),
            },
            s3: S3Sources {
                log_data: "s3://udacity-dend/log_data".into(),
                log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
                song_data: "s3://udacity-dend/song_data".into(),
            },
        }
    }

    #[tokio::test]
    async fn setup_issues_the_full_sequence_in_order() {
        let rec = Recorder::new();
        run_setup(&rec).await.unwrap();
        let names = rec.names();
        assert_eq!(
            names,
            vec![
                "drop_schema",
                "create_schema",
                "select_schema",
                "drop_staging_events",
                "drop_staging_songs",
                "drop_users",
                "drop_songs",
                "drop_artists",
                "drop_time",
                "drop_songplays",
                "create_staging_events",
                "create_staging_songs",
                "create_users",
                "create_songs",
                "create_artists",
                "create_time",
                "create_songplays",
            ]
        );
    }

    #[tokio::test]
    async fn load_issues_copies_then_transforms() {
        let rec = Recorder::new();
        run_load(&rec, &settings()).await.unwrap();
        assert_eq!(
            rec.names(),
            vec![
                "select_schema",
                "copy_staging_events",
                "copy_staging_songs",
                "insert_users",
                "insert_songs",
                "insert_artists",
                "insert_time",
                "insert_songplays",
            ]
        );
    }

    #[tokio::test]
    async fn setup_aborts_on_first_failure() {
        let rec = Recorder::failing_on("create_users");
        let err = run_setup(&rec).await.unwrap_err();
        assert!(err.to_string().contains("create_users"));
        let names = rec.names();
        // Everything before the failing statement ran and stays committed;
        // nothing after it was issued.
        assert_eq!(names.last().map(String::as_str), Some("create_staging_songs"));
        assert!(!names.iter().any(|n| n == "create_songs"));
    }

    #[tokio::test]
    async fn load_aborts_when_a_copy_fails() {
        let rec = Recorder::failing_on("copy_staging_songs");
        assert!(run_load(&rec, &settings()).await.is_err());
        assert_eq!(rec.names(), vec!["select_schema", "copy_staging_events"]);
    }
}
