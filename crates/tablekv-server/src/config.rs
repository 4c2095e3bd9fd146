//! Configuration file parsing for tablekv.toml.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address {}:{}: {}", self.host, self.port, e))
    }
}

/// Database configuration.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, `:memory:` or `sqlite://` URL
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Table holding the records
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            table: default_table(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_db_path() -> String {
    "tablekv.db".to_string()
}

fn default_table() -> String {
    tablekv::DEFAULT_TABLE.to_string()
}

/// Load configuration from a file or search for default config files.
///
/// An explicitly named file must exist; a searched-for one is optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return read_config(path);
    }

    match find_config_file() {
        Some(path) => read_config(&path),
        None => Ok(Config::default()),
    }
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Search for configuration file in the current directory and parent directories.
fn find_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;

    const CONFIG_NAMES: &[&str] = &["tablekv.toml", ".tablekv.toml"];

    let mut dir = Some(cwd.as_path());
    while let Some(current) = dir {
        for name in CONFIG_NAMES {
            let path = current.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        dir = current.parent();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.database.path, "tablekv.db");
        assert_eq!(config.database.table, "KV");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 9000

[database]
path = ":memory:"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.database.table, "KV");
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig {
            host: "0.0.0.0".into(),
            port: 80,
        };
        assert_eq!(server.socket_addr().unwrap().port(), 80);

        let bad = ServerConfig {
            host: "not a host".into(),
            port: 80,
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tablekv.toml");
        std::fs::write(&path, "[database]\ntable = \"cache\"\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.database.table, "cache");

        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[server]\nport = \"eighty\"\n").unwrap();

        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
