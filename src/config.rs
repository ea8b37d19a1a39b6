//! Typed, immutable run configuration.
//!
//! Everything is loaded exactly once at startup and passed by reference to
//! the components that need it. The connection string is composed through
//! `url::Url` with named fields so credentials with reserved characters are
//! percent-encoded instead of string-formatted positionally.

use anyhow::{Context, Result};
use tracing::info;

use crate::util::env::{env_opt, env_parse, env_req, redact_value};

/// Cluster coordinates used to build the Postgres DSN.
#[derive(Debug, Clone)]
pub struct ClusterSettings {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl ClusterSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env_req("DWH_HOST")?,
            database: env_req("DWH_DB")?,
            user: env_req("DWH_USER")?,
            password: env_req("DWH_PASSWORD")?,
            // Redshift's default port, not Postgres' 5432.
            port: env_parse("DWH_PORT", 5439u16),
        })
    }

    /// Compose the DSN. Username and password go through the Url builder so
    /// reserved characters ('@', '?', '!', ...) are encoded safely.
    pub fn dsn(&self) -> Result<String> {
        let mut out = url::Url::parse("postgresql://localhost")
            .context("failed to seed DSN builder")?;
        out.set_username(&self.user)
            .map_err(|_| anyhow::anyhow!("invalid DSN username"))?;
        out.set_password(Some(&self.password))
            .map_err(|_| anyhow::anyhow!("invalid DSN password"))?;
        out.set_host(Some(&self.host))
            .with_context(|| format!("invalid DSN host {:?}", self.host))?;
        out.set_port(Some(self.port))
            .map_err(|_| anyhow::anyhow!("invalid DSN port"))?;
        out.set_path(&format!("/{}", self.database));
        Ok(out.to_string())
    }
}

/// IAM role the cluster assumes when reading from S3 during COPY.
#[derive(Debug, Clone)]
pub struct IamRole {
    pub arn: String,
}

impl IamRole {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            arn: env_req("DWH_IAM_ROLE_ARN")?,
        })
    }
}

/// S3 locations of the raw sources and the events field-mapping file.
#[derive(Debug, Clone)]
pub struct S3Sources {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
}

impl S3Sources {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_data: env_req("DWH_LOG_DATA")?,
            log_jsonpath: env_req("DWH_LOG_JSONPATH")?,
            song_data: env_req("DWH_SONG_DATA")?,
        })
    }
}

/// Full pipeline configuration, loaded once.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cluster: ClusterSettings,
    pub iam_role: IamRole,
    pub s3: S3Sources,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cluster: ClusterSettings::from_env()?,
            iam_role: IamRole::from_env()?,
            s3: S3Sources::from_env()?,
        })
    }

    /// Log a redacted snapshot of the effective configuration.
    pub fn log_snapshot(&self) {
        let snapshot: Vec<(&str, String)> = vec![
            ("DWH_HOST", self.cluster.host.clone()),
            ("DWH_DB", self.cluster.database.clone()),
            ("DWH_USER", self.cluster.user.clone()),
            ("DWH_PASSWORD", redact_value("DWH_PASSWORD", &self.cluster.password)),
            ("DWH_PORT", self.cluster.port.to_string()),
            ("DWH_IAM_ROLE_ARN", self.iam_role.arn.clone()),
            ("DWH_LOG_DATA", self.s3.log_data.clone()),
            ("DWH_LOG_JSONPATH", self.s3.log_jsonpath.clone()),
            ("DWH_SONG_DATA", self.s3.song_data.clone()),
        ];
        info!(target: "preflight", snapshot = ?snapshot, "configuration snapshot");
    }
}

/// Resolve the DSN for a command: explicit override, then DATABASE_URL,
/// then the composed cluster DSN.
pub fn resolve_dsn(override_url: Option<&str>, cluster: &ClusterSettings) -> Result<String> {
    if let Some(url) = override_url {
        return Ok(url.to_string());
    }
    if let Some(url) = env_opt("DATABASE_URL") {
        return Ok(url);
    }
    cluster.dsn()
}

/// Same resolution order, but the cluster settings are only read from the
/// environment when neither an override nor DATABASE_URL is present, so a
/// `--db-url` invocation works without any DWH_* vars set.
pub fn resolve_dsn_from_env(override_url: Option<&str>) -> Result<String> {
    if let Some(url) = override_url {
        return Ok(url.to_string());
    }
    if let Some(url) = env_opt("DATABASE_URL") {
        return Ok(url);
    }
    ClusterSettings::from_env()?.dsn()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> ClusterSettings {
        ClusterSettings {
            host: "redshift-cluster.abc123.us-west-2.redshift.amazonaws.com".into(),
            database: "dev".into(),
            user: "dwhuser".into(),
            password: "Pa?ss@w!ord".into(),
            port: 5439,
        }
    }

    #[test]
    fn dsn_uses_named_fields() {
        let dsn = cluster().dsn().unwrap();
        assert!(dsn.starts_with("postgresql://dwhuser:"));
        assert!(dsn.ends_with(".redshift.amazonaws.com:5439/dev"));
    }

    #[test]
    fn dsn_percent_encodes_password() {
        let dsn = cluster().dsn().unwrap();
        // The raw password must not survive verbatim; '@' in particular
        // would break host parsing.
        assert!(!dsn.contains("Pa?ss@w!ord"));
        assert!(dsn.contains("Pa%3Fss%40w!ord") || dsn.contains("Pa%3Fss%40w%21ord"));
        let parsed = url::Url::parse(&dsn).unwrap();
        assert_eq!(parsed.username(), "dwhuser");
        assert_eq!(parsed.port(), Some(5439));
    }

    #[test]
    fn explicit_override_wins() {
        let dsn = resolve_dsn(Some("postgresql://u:p@other:5432/x"), &cluster()).unwrap();
        assert_eq!(dsn, "postgresql://u:p@other:5432/x");
    }

    #[test]
    fn override_needs_no_cluster_env() {
        // DWH_HOST/DWH_DB/... are absent in the test environment; an
        // explicit URL must still resolve without touching them.
        let dsn = resolve_dsn_from_env(Some("postgresql://u:p@other:5432/x")).unwrap();
        assert_eq!(dsn, "postgresql://u:p@other:5432/x");
    }
}
