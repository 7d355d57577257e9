use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WORKERS: usize = 5;
const DEFAULT_PACK_DIR: &str = "pack";
const CONFIG_FILE_NAME: &str = "packserve.toml";

/// Built-in message templates, used when the config file does not override a key.
const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    (
        "pack_prompt",
        "&eServer resource pack available! Click &a[Accept] &7to download or &c[Decline] &7to skip.",
    ),
    ("resource_pack_applied", "&aResource pack has been applied successfully!"),
    (
        "resource_pack_failed",
        "&cFailed to download resource pack! Check your connection.",
    ),
    ("config_reloaded", "&aConfiguration reloaded successfully!"),
    ("no_permission", "&cYou don't have permission to use this command!"),
];

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_messages() -> BTreeMap<String, String> {
    DEFAULT_MESSAGES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Persisted server settings. Owned by the host; the control API mutates and saves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub http_port: u16,
    /// Advertised address. Empty means "detect".
    #[serde(default)]
    pub server_ip: String,
    #[serde(default)]
    pub force_pack: bool,
    #[serde(default = "default_true")]
    pub auto_apply_all_worlds: bool,
    /// Archive names under the pack directory, in offer order.
    #[serde(default)]
    pub resource_packs: Vec<String>,
    #[serde(default = "default_messages")]
    pub messages: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            http_port: DEFAULT_PORT,
            server_ip: String::new(),
            force_pack: false,
            auto_apply_all_worlds: true,
            resource_packs: Vec::new(),
            messages: default_messages(),
        }
    }
}

impl ServerConfig {
    /// The configured address, or `None` when left empty.
    pub fn configured_address(&self) -> Option<&str> {
        Some(self.server_ip.as_str()).filter(|s| !s.is_empty())
    }

    /// Message template for `key`, falling back to the built-in default.
    pub fn message(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .or_else(|| {
                DEFAULT_MESSAGES
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("http_port must be between 1 and 65535, got {0}")]
    InvalidPort(u16),
}

pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;
    if config.http_port == 0 {
        return Err(ConfigError::InvalidPort(config.http_port));
    }
    Ok(config)
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Locate the config file: explicit path, `./packserve.toml`, then the XDG
/// config dir. Falls back to `./packserve.toml`, which is created on first open.
pub fn find_config_file(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_owned();
    }
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return cwd_config;
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("packserve").join("config.toml");
        if xdg_config.exists() {
            return xdg_config;
        }
    }
    cwd_config
}

/// The persisted config plus the file it lives in.
///
/// Reads take a cloned snapshot. Writes build the new value on the side, persist
/// it, and only then replace the in-memory copy, so a failed save never leaves
/// memory and disk disagreeing.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<ServerConfig>,
}

impl ConfigStore {
    /// Open `path`, writing the defaults there if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = if path.exists() {
            let cfg = load_config(&path)?;
            tracing::debug!("Loaded config from {}", path.display());
            cfg
        } else {
            let cfg = ServerConfig::default();
            save_config(&path, &cfg)?;
            tracing::info!("Wrote default config to {}", path.display());
            cfg
        };
        Ok(Self::with_config(path, config))
    }

    /// Wrap an already-loaded config. Nothing is read or written.
    pub fn with_config(path: impl Into<PathBuf>, config: ServerConfig) -> Self {
        ConfigStore {
            path: path.into(),
            current: RwLock::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> ServerConfig {
        self.current.read().clone()
    }

    /// Re-read the file. On error the in-memory config is left as it was.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let fresh = load_config(&self.path)?;
        *self.current.write() = fresh;
        Ok(())
    }

    /// Apply `f` to a copy of the config, persist it, then publish it.
    pub fn update<F>(&self, f: F) -> Result<ServerConfig, ConfigError>
    where
        F: FnOnce(&mut ServerConfig),
    {
        let mut guard = self.current.write();
        let mut next = guard.clone();
        f(&mut next);
        save_config(&self.path, &next)?;
        *guard = next.clone();
        Ok(next)
    }
}

/// Launch settings resolved from the persisted config and the command line.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub port: u16,
    pub pack_dir: PathBuf,
    pub workers: usize,
    pub host_address: Option<String>,
}

impl RuntimeConfig {
    /// CLI flags win over the persisted config, which wins over defaults.
    pub fn resolve(file: &ServerConfig, args: &crate::cli::Args) -> Self {
        RuntimeConfig {
            port: args.port.unwrap_or(file.http_port),
            pack_dir: args
                .pack_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PACK_DIR)),
            workers: args.workers.filter(|n| *n > 0).unwrap_or(DEFAULT_WORKERS),
            host_address: args.host_address.clone().filter(|s| !s.is_empty()),
        }
    }
}
