//! Bulk-load statements for the staging tables.
//!
//! Both COPYs read JSON straight out of S3 under the configured IAM role.
//! Event records need an explicit jsonpaths file because their field names
//! do not match the staging columns; song records map automatically.
//! Row-level error policy is the warehouse loader's own: a malformed record
//! aborts the load.

use super::{quote_literal, Statement};
use crate::config::Settings;

pub fn staging_copy_statements(settings: &Settings) -> Vec<Statement> {
    let arn = quote_literal(&settings.iam_role.arn);
    vec![
        Statement::built(
            "copy_staging_events",
            format!(
                "COPY staging_events\n FROM '{}'\n IAM_ROLE '{}'\n JSON '{}'",
                quote_literal(&settings.s3.log_data),
                arn,
                quote_literal(&settings.s3.log_jsonpath),
            ),
        ),
        Statement::built(
            "copy_staging_songs",
            format!(
                "COPY staging_songs\n FROM '{}'\n IAM_ROLE '{}'\n JSON 'auto'",
                quote_literal(&settings.s3.song_data),
                arn,
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterSettings, IamRole, S3Sources};

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

    #[test]
    fn exactly_two_loads_events_first() {
        let stmts = staging_copy_statements(&settings());
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].name, "copy_staging_events");
        assert_eq!(stmts[1].name, "copy_staging_songs");
    }

    #[test]
    fn events_copy_uses_jsonpaths_mapping() {
        let stmts = staging_copy_statements(&settings());
        let sql = stmts[0].sql.as_ref();
        assert!(sql.contains("COPY staging_events"));
        assert!(sql.contains("FROM 's3://udacity-dend/log_data'"));
        assert!(sql.contains("IAM_ROLE 'arn:aws:iam::123456789012:role/dwhRole'"));
        assert!(sql.contains("JSON 's3://udacity-dend/log_json_path.json'"));
    }

    #[test]
    fn songs_copy_uses_auto_mapping() {
        let stmts = staging_copy_statements(&settings());
        let sql = stmts[1].sql.as_ref();
        assert!(sql.contains("COPY staging_songs"));
        assert!(sql.contains("FROM 's3://udacity-dend/song_data'"));
        assert!(sql.contains("JSON 'auto'"));
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let mut s = settings();
        s.s3.log_data = "s3://bucket/it's-logs".into();
        let stmts = staging_copy_statements(&s);
        assert!(stmts[0].sql.contains("FROM 's3://bucket/it''s-logs'"));
    }
}
