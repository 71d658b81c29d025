use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides the SQLite location from the config file
pub const DATABASE_URL_ENV: &str = "FOODGRAM_DATABASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the request carries no `limit`
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Upper bound for a client-supplied `limit`
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> i64 {
    6
}

fn default_max_page_size() -> i64 {
    100
}

/// Maximum field lengths, in characters
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Recipe, tag and ingredient names and measurement units
    #[serde(default = "default_name_max_length")]
    pub name_max_length: usize,
    #[serde(default = "default_slug_max_length")]
    pub slug_max_length: usize,
    /// Username, first name and last name
    #[serde(default = "default_user_name_max_length")]
    pub user_name_max_length: usize,
    #[serde(default = "default_email_max_length")]
    pub email_max_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            name_max_length: default_name_max_length(),
            slug_max_length: default_slug_max_length(),
            user_name_max_length: default_user_name_max_length(),
            email_max_length: default_email_max_length(),
        }
    }
}

fn default_name_max_length() -> usize {
    200
}

fn default_slug_max_length() -> usize {
    200
}

fn default_user_name_max_length() -> usize {
    150
}

fn default_email_max_length() -> usize {
    254
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// SQLite connection URL: the environment override, or `foodgram.db` in the data dir
    pub fn database_url(&self) -> String {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(url) if !url.is_empty() => url,
            _ => format!(
                "sqlite:{}?mode=rwc",
                self.server.data_dir.join("foodgram.db").display()
            ),
        }
    }

    /// Resolve a requested page size against the configured default and maximum
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(limit) if limit > 0 => limit.min(self.pagination.max_page_size),
            _ => self.pagination.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pagination.page_size, 6);
        assert_eq!(config.limits.name_max_length, 200);
        assert_eq!(config.limits.email_max_length, 254);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [server]
            port = 9000

            [limits]
            name_max_length = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.limits.name_max_length, 64);
        assert_eq!(config.limits.slug_max_length, 200);
        assert_eq!(config.pagination.max_page_size, 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(Config::parse("[server]\nport = \"not a number\"").is_err());
    }

    #[test]
    fn test_page_size_resolution() {
        let config = Config::default();
        assert_eq!(config.page_size(None), 6);
        assert_eq!(config.page_size(Some(0)), 6);
        assert_eq!(config.page_size(Some(-3)), 6);
        assert_eq!(config.page_size(Some(10)), 10);
        assert_eq!(config.page_size(Some(1000)), 100);
    }
}
