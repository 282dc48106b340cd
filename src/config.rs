//! TOML configuration and store-location resolution.
//!
//! Every section is optional. Without a config file the built-in defaults are
//! used, which point the store at `/usr/local/share/fortune2/fortune2.db` and
//! the HTTP server at port 8000.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured store location.
pub const FORTUNE_FILE_ENV: &str = "FORTUNE2FILE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/usr/local/share/fortune2/fortune2.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/asset/`.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            asset_dir: default_asset_dir(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_asset_dir() -> PathBuf {
    PathBuf::from("./asset")
}

impl Config {
    /// Apply the store-location precedence: an explicit `-F` path, then
    /// `$FORTUNE2FILE`, then whatever the config file (or default) says.
    pub fn resolve_db_path(&mut self, cli_override: Option<PathBuf>) {
        let env_path = std::env::var_os(FORTUNE_FILE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        if let Some(path) = cli_override.or(env_path) {
            self.db.path = path;
        }
    }

    /// Address the HTTP server binds to, with an optional port override.
    pub fn bind_addr(&self, port: Option<u16>) -> String {
        format!("{}:{}", self.server.bind, port.unwrap_or(self.server.port))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    if config.server.port == 0 {
        anyhow::bail!("server.port must be > 0");
    }

    Ok(config)
}

/// Load `path` when given, otherwise fall back to the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = load_or_default(None).unwrap();
        assert_eq!(
            cfg.db.path,
            PathBuf::from("/usr/local/share/fortune2/fortune2.db")
        );
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.bind_addr(None), "0.0.0.0:8000");
        assert_eq!(cfg.bind_addr(Some(9000)), "0.0.0.0:9000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fortune2.toml");
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 8123);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.server.asset_dir, PathBuf::from("./asset"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fortune2.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_cli_override_wins() {
        let mut cfg = Config::default();
        cfg.resolve_db_path(Some(PathBuf::from("/tmp/explicit.db")));
        assert_eq!(cfg.db.path, PathBuf::from("/tmp/explicit.db"));
    }
}
