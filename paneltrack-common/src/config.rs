//! Configuration loading and root folder resolution
//!
//! The root folder holds the SQLite database and any uploaded artifacts.
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `PANELTRACK_ROOT` environment variable
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Server settings read from the TOML config file
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServerConfig {
    /// Bind address, defaults to 127.0.0.1
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port, defaults to 5710
    #[serde(default = "default_port")]
    pub port: u16,
    /// Root folder override
    pub root_folder: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5710
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root_folder: None,
        }
    }
}

/// Load the TOML config file from the platform config directory
///
/// Looks for `~/.config/paneltrack/config.toml` (or the platform
/// equivalent), then `/etc/paneltrack/config.toml` on Linux. A missing
/// file yields the defaults, not an error.
pub fn load_server_config() -> Result<ServerConfig> {
    for path in candidate_config_paths() {
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            return toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)));
        }
    }
    Ok(ServerConfig::default())
}

fn candidate_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("paneltrack").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/paneltrack/config.toml"));
    }
    paths
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &ServerConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("PANELTRACK_ROOT") {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("paneltrack"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/paneltrack"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("paneltrack"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/paneltrack"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("paneltrack"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\paneltrack"))
    } else {
        PathBuf::from("./paneltrack_data")
    }
}

/// Ensure the root folder exists and return the database path inside it
pub fn ensure_root_folder(root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    Ok(root.join("paneltrack.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_wins_over_config() {
        let config = ServerConfig {
            root_folder: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn config_file_used_when_no_cli_or_env() {
        // Only meaningful when the env var is unset in the test runner
        if std::env::var("PANELTRACK_ROOT").is_ok() {
            return;
        }
        let config = ServerConfig {
            root_folder: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(None, &config);
        assert_eq!(resolved, PathBuf::from("/from/config"));
    }

    #[test]
    fn defaults_parse_from_empty_toml() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5710);
        assert!(config.root_folder.is_none());
    }
}
