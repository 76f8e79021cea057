mod file_config;

pub use file_config::{DbPoolConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "mgaide-sync.db";
pub const DEFAULT_MOUNT_PREFIXES: &[&str] = &["", "/mgaide-api"];
/// Playlists can get big, so the default sits well above axum's 2 MB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// Empty means "use the defaults".
    pub mount_prefixes: Vec<String>,
    /// None means DEFAULT_MAX_BODY_BYTES.
    pub max_body_bytes: Option<usize>,
    pub db_pool: DbPoolSettings,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub mount_prefixes: Vec<String>,
    pub max_body_bytes: usize,
    pub db_pool: DbPoolSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));

        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let raw_prefixes = match file.mount_prefixes {
            Some(prefixes) => prefixes,
            None if !cli.mount_prefixes.is_empty() => cli.mount_prefixes.clone(),
            None => DEFAULT_MOUNT_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        let mount_prefixes = normalize_mount_prefixes(&raw_prefixes)?;

        let max_body_bytes = file
            .max_body_bytes
            .or(cli.max_body_bytes)
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);
        if max_body_bytes == 0 {
            bail!("max_body_bytes must be at least 1");
        }

        let pool_file = file.db_pool.unwrap_or_default();
        let db_pool = DbPoolSettings {
            max_open_connections: pool_file
                .max_open_connections
                .unwrap_or(cli.db_pool.max_open_connections),
            max_idle_connections: pool_file
                .max_idle_connections
                .unwrap_or(cli.db_pool.max_idle_connections),
            connection_max_lifetime_secs: pool_file
                .connection_max_lifetime_secs
                .unwrap_or(cli.db_pool.connection_max_lifetime_secs),
            busy_timeout_ms: pool_file
                .busy_timeout_ms
                .unwrap_or(cli.db_pool.busy_timeout_ms),
            acquire_timeout_secs: pool_file
                .acquire_timeout_secs
                .unwrap_or(cli.db_pool.acquire_timeout_secs),
        };
        db_pool.validate()?;

        Ok(Self {
            db_path,
            port,
            metrics_port,
            logging_level,
            mount_prefixes,
            max_body_bytes,
            db_pool,
        })
    }
}

/// Bounds for the sync store's connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPoolSettings {
    /// Upper bound on live connections.
    pub max_open_connections: u32,
    /// Upper bound on connections left open once handed back.
    pub max_idle_connections: u32,
    /// Connections older than this are closed and replaced.
    pub connection_max_lifetime_secs: u64,
    pub busy_timeout_ms: u64,
    /// How long a request waits for a free connection before failing.
    pub acquire_timeout_secs: u64,
}

impl Default for DbPoolSettings {
    fn default() -> Self {
        Self {
            max_open_connections: 10,
            max_idle_connections: 5,
            connection_max_lifetime_secs: 300, // 5 minutes
            busy_timeout_ms: 5000,
            acquire_timeout_secs: 30,
        }
    }
}

impl DbPoolSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_open_connections == 0 {
            bail!("max_open_connections must be at least 1");
        }
        if self.max_idle_connections > self.max_open_connections {
            bail!(
                "max_idle_connections ({}) cannot exceed max_open_connections ({})",
                self.max_idle_connections,
                self.max_open_connections
            );
        }
        if self.connection_max_lifetime_secs == 0 {
            bail!("connection_max_lifetime_secs must be at least 1");
        }
        if self.acquire_timeout_secs == 0 {
            bail!("acquire_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Normalizes a route mount prefix: "" and "/" mean the root, anything else
/// gets a leading slash and loses its trailing ones.
pub fn normalize_mount_prefix(prefix: &str) -> Result<String> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.contains(['{', '}', '*']) {
        bail!("Mount prefix cannot contain path parameters: {:?}", prefix);
    }
    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{}", trimmed))
    }
}

fn normalize_mount_prefixes(prefixes: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(prefixes.len());
    for prefix in prefixes {
        let prefix = normalize_mount_prefix(prefix)?;
        if !normalized.contains(&prefix) {
            normalized.push(prefix);
        }
    }
    if normalized.is_empty() {
        bail!("At least one mount prefix must be configured");
    }
    Ok(normalized)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        // Case insensitive
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sync.db");
        let cli = CliConfig {
            db_path: Some(db_path.clone()),
            port: 3000,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Headers,
            mount_prefixes: vec![],
            max_body_bytes: None,
            db_pool: DbPoolSettings::default(),
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path, db_path);
        assert_eq!(config.port, 3000);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(
            config.mount_prefixes,
            vec!["".to_string(), "/mgaide-api".to_string()]
        );
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.db_pool, DbPoolSettings::default());
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/should/be/overridden.db")),
            port: 3000,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            mount_prefixes: vec!["/cli".to_string()],
            max_body_bytes: Some(1024),
            db_pool: DbPoolSettings::default(),
        };

        let file_config = FileConfig {
            db_path: Some(temp_dir.path().join("file.db").to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            mount_prefixes: Some(vec!["/toml/".to_string()]),
            max_body_bytes: Some(8 * 1024 * 1024),
            db_pool: Some(DbPoolConfig {
                max_open_connections: Some(3),
                max_idle_connections: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_path, temp_dir.path().join("file.db"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.mount_prefixes, vec!["/toml".to_string()]);
        assert_eq!(config.max_body_bytes, 8 * 1024 * 1024);
        assert_eq!(config.db_pool.max_open_connections, 3);
        assert_eq!(config.db_pool.max_idle_connections, 1);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.db_pool.connection_max_lifetime_secs, 300);
    }

    #[test]
    fn test_resolve_cli_mount_prefixes() {
        let cli = CliConfig {
            mount_prefixes: vec!["/".to_string(), "api".to_string(), "/api/".to_string()],
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(
            config.mount_prefixes,
            vec!["".to_string(), "/api".to_string()]
        );
    }

    #[test]
    fn test_resolve_defaults_db_path() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE_NAME));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/nonexistent/path/that/should/not/exist/sync.db")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_path_is_directory_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("is a directory"));
    }

    #[test]
    fn test_resolve_rejects_empty_prefix_list() {
        let file_config = FileConfig {
            mount_prefixes: Some(vec![]),
            ..Default::default()
        };
        let result = AppConfig::resolve(&CliConfig::default(), Some(file_config));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("At least one mount prefix"));
    }

    #[test]
    fn test_resolve_rejects_zero_body_limit() {
        let cli = CliConfig {
            max_body_bytes: Some(0),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("max_body_bytes"));
    }

    #[test]
    fn test_normalize_mount_prefix() {
        assert_eq!(normalize_mount_prefix("").unwrap(), "");
        assert_eq!(normalize_mount_prefix("/").unwrap(), "");
        assert_eq!(normalize_mount_prefix("mgaide-api").unwrap(), "/mgaide-api");
        assert_eq!(normalize_mount_prefix("/mgaide-api//").unwrap(), "/mgaide-api");
        assert!(normalize_mount_prefix("/{uid}").is_err());
    }

    #[test]
    fn test_pool_settings_validation() {
        assert!(DbPoolSettings::default().validate().is_ok());

        let too_many_idle = DbPoolSettings {
            max_open_connections: 2,
            max_idle_connections: 3,
            ..Default::default()
        };
        assert!(too_many_idle
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot exceed"));

        let no_connections = DbPoolSettings {
            max_open_connections: 0,
            max_idle_connections: 0,
            ..Default::default()
        };
        assert!(no_connections.validate().is_err());
    }
}
