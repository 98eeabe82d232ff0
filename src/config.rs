//! Configuration loading and management.
//!
//! The main config file has a `[connection]` section for the server link
//! and a `[bot]` section for dispatch behavior. Each module may also have
//! its own file, `<config_dir>/<name>.toml`, served through
//! [`ModuleConfigStore`] as a raw TOML blob the module deserializes itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Dispatch and module settings.
    #[serde(default)]
    pub bot: BotConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server hostname (e.g., "irc.libera.chat").
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connect with TLS.
    pub tls: bool,
    /// Nick to register with.
    pub nick: String,
    /// Username for USER registration.
    pub username: String,
    /// Realname for USER registration.
    pub realname: String,
    /// Server password, sent with PASS before registration.
    pub password: Option<String>,
    /// Channels joined after registration.
    pub channels: Vec<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "irc.libera.chat".to_string(),
            port: 6667,
            tls: false,
            nick: "slircbot".to_string(),
            username: "slircbot".to_string(),
            realname: "Straylight IRC bot".to_string(),
            password: None,
            channels: Vec::new(),
        }
    }
}

/// Dispatch and module settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Trigger character marking chat-command invocations.
    pub trigger: char,
    /// Match chat-command words case-insensitively.
    pub commands_case_insensitive: bool,
    /// Built-in modules loaded at startup, in order.
    pub modules: Vec<String>,
    /// Directory holding per-module config files (`<name>.toml`).
    pub config_dir: PathBuf,
    /// Directory for module data files.
    pub data_dir: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger: '!',
            commands_case_insensitive: false,
            modules: Vec::new(),
            config_dir: PathBuf::from("config"),
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Per-module configuration blobs.
///
/// Values are cached after the first read and re-read on demand through
/// [`reload`](ModuleConfigStore::reload), so a running bot can pick up
/// edits without restarting. A missing file yields an empty table rather
/// than an error; modules apply their own defaults.
pub struct ModuleConfigStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, toml::Value>>,
}

impl ModuleConfigStore {
    /// A store rooted at `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path_for(&self, module: &str) -> PathBuf {
        self.dir.join(format!("{module}.toml"))
    }

    fn read(&self, module: &str) -> Result<toml::Value, ConfigError> {
        let path = self.path_for(module);
        if !path.exists() {
            return Ok(empty_table());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// The config blob for `module`, loaded and cached on first use.
    ///
    /// An unreadable file is logged and served as an empty table so one
    /// broken config cannot stop a load sequence.
    pub fn get(&self, module: &str) -> toml::Value {
        if let Some(value) = self.cache.read().get(module) {
            return value.clone();
        }
        let value = match self.read(module) {
            Ok(value) => value,
            Err(error) => {
                warn!(module = %module, error = %error, "module config unreadable, using empty table");
                empty_table()
            }
        };
        self.cache.write().insert(module.to_string(), value.clone());
        value
    }

    /// Re-read one module's config file.
    pub fn reload(&self, module: &str) -> Result<(), ConfigError> {
        let value = self.read(module)?;
        self.cache.write().insert(module.to_string(), value);
        Ok(())
    }

    /// Re-read every cached module config. Returns how many reloaded
    /// cleanly; failures keep the previous value.
    pub fn reload_all(&self) -> usize {
        let names: Vec<String> = self.cache.read().keys().cloned().collect();
        let mut ok = 0;
        for name in names {
            match self.reload(&name) {
                Ok(()) => ok += 1,
                Err(error) => warn!(module = %name, error = %error, "config reload failed"),
            }
        }
        ok
    }
}

fn empty_table() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

// ============================================================================
// Tests
// ============================================================================
