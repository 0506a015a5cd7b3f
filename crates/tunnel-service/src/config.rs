//! Service configuration.

use std::path::Path;

use serde::Deserialize;

use tunnel_backup::{BackupConfig, DumpConnection};
use tunnel_core::{CashDrawerId, UserId, VoidRule};

/// Identifiers used when a request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    /// Cash drawer credited by payments (default: 1).
    pub caj_id: CashDrawerId,

    /// User recorded on payments and new clients (default: 23).
    pub bot_usu_id: UserId,

    /// User recorded on quotations and purchase orders (default: 1).
    pub system_usu_id: UserId,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            caj_id: CashDrawerId::new(1),
            bot_usu_id: UserId::new(23),
            system_usu_id: UserId::new(1),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// `mysql://` URL of the SICAR database. The in-memory store is used when unset.
    pub database_url: Option<String>,

    /// Pool size for the database (default: 10).
    pub db_max_connections: u32,

    /// Expected value of the `API-KEY` header.
    pub api_key: Option<String>,

    /// Fallback identifiers.
    pub defaults: Defaults,

    /// How voided receipts affect sibling payments.
    pub void_rule: VoidRule,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Backup jobs.
    pub backup: BackupConfig,
}

/// Database secrets file structure.
#[derive(Debug, Deserialize)]
struct DatabaseSecrets {
    url: String,
    #[serde(default)]
    api_key: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (database_url, api_key) = load_database_secrets();
        let fallback = Defaults::default();

        let defaults = Defaults {
            caj_id: env_parse("DEFAULT_CAJ_ID").map_or(fallback.caj_id, CashDrawerId::new),
            bot_usu_id: env_parse("DEFAULT_USU_ID").map_or(fallback.bot_usu_id, UserId::new),
            system_usu_id: env_parse("SYSTEM_USU_ID").map_or(fallback.system_usu_id, UserId::new),
        };

        let void_rule = match std::env::var("BALANCE_VOID_RULE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid BALANCE_VOID_RULE, using default");
                VoidRule::default()
            }),
            Err(_) => VoidRule::default(),
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
            backup: backup_from_env(database_url.as_deref()),
            database_url,
            api_key,
            defaults,
            void_rule,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS").unwrap_or(30),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            db_max_connections: 10,
            api_key: None,
            defaults: Defaults::default(),
            void_rule: VoidRule::default(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            backup: BackupConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn backup_from_env(database_url: Option<&str>) -> BackupConfig {
    let mut config = BackupConfig::new();
    if let Ok(dir) = std::env::var("BACKUP_DIR") {
        config = config.with_backup_dir(dir);
    }
    if let Ok(path) = std::env::var("MYSQLDUMP_PATH") {
        config = config.with_mysqldump_path(path);
    }
    if let Ok(url) = std::env::var("BACKUP_PUBLIC_URL") {
        config = config.with_public_url(url);
    }
    if let Some(keep) = env_parse("BACKUP_MAX_KEEP") {
        config = config.with_max_keep(keep);
    }
    if let Some(hours) = env_parse("BACKUP_EXPIRY_HOURS") {
        config = config.with_expiry_hours(hours);
    }
    if let Some(url) = database_url {
        match DumpConnection::from_url(url) {
            Ok(connection) => config = config.with_connection(connection),
            Err(e) => tracing::warn!(error = %e, "DATABASE_URL not usable for backups"),
        }
    }
    config
}

/// Load database secrets from file or environment.
fn load_database_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/database.json",
        "tunnelcuspi/.secrets/database.json",
        "tunnelcuspi/service/.secrets/database.json",
        "../.secrets/database.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<DatabaseSecrets>(path) {
            tracing::info!(path = %path, "Loaded database secrets from file");
            let api_key = secrets.api_key.or_else(|| std::env::var("API_KEY").ok());
            return (Some(secrets.url), api_key);
        }
    }

    tracing::debug!("Database secrets file not found, using environment variables");
    (
        std::env::var("DATABASE_URL").ok(),
        std::env::var("API_KEY").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.defaults.caj_id, CashDrawerId::new(1));
        assert_eq!(config.defaults.bot_usu_id, UserId::new(23));
        assert_eq!(config.defaults.system_usu_id, UserId::new(1));
        assert_eq!(config.void_rule, VoidRule::Group);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        std::fs::write(
            &path,
            r#"{"url": "mysql://root:x@localhost/sicar", "api_key": "k"}"#,
        )
        .unwrap();

        let secrets: DatabaseSecrets = load_secrets_file(path.to_str().unwrap()).unwrap();
        assert_eq!(secrets.url, "mysql://root:x@localhost/sicar");
        assert_eq!(secrets.api_key.as_deref(), Some("k"));

        assert!(load_secrets_file::<DatabaseSecrets>("/nonexistent/database.json").is_err());
    }

    #[test]
    fn test_backup_connection_from_url() {
        let config = backup_from_env(Some("mysql://cuspi:pw@db:3306/sicar"));
        assert_eq!(config.connection.host, "db");
        assert_eq!(config.connection.database, "sicar");
    }
}
