use std::fs;
use std::path::{Path, PathBuf};

use common::prelude::{AssumePresent, AuthContext, DeviceKey, SoftwareCustodian, TerminalPrompt};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "secrypt";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "device.key";

/// How presence checks are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresenceMode {
    /// Ask on the terminal before every use of a sealing key
    #[default]
    Prompt,
    /// Never ask (unattended hosts)
    Assume,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub presence: PresenceMode,
    /// Default log level when neither `--log-level` nor `RUST_LOG` is set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            presence: PresenceMode::default(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.secrypt)
    pub secrypt_dir: PathBuf,
    /// Path to the device key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.secrypt)
    pub fn secrypt_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh device key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let secrypt_dir = Self::secrypt_dir(custom_path)?;

        if secrypt_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&secrypt_dir)?;

        let key = DeviceKey::generate().map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = secrypt_dir.join(KEY_FILE_NAME);
        write_private(&key_path, key.to_pem().as_bytes())?;

        let config = config.unwrap_or_default();
        let config_path = secrypt_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        tracing::info!(dir = %secrypt_dir.display(), "initialized state directory");

        Ok(Self {
            secrypt_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let secrypt_dir = Self::secrypt_dir(custom_path)?;

        if !secrypt_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = secrypt_dir.join(KEY_FILE_NAME);
        let config_path = secrypt_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            secrypt_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the device key from the key file
    pub fn load_key(&self) -> Result<DeviceKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = DeviceKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// The software custodian backed by this state's device key
    pub fn custodian(&self) -> Result<SoftwareCustodian, StateError> {
        Ok(SoftwareCustodian::new(self.load_key()?))
    }

    /// Build the auth context for one operation
    ///
    /// `assume_present` (from `--yes`) overrides the configured mode.
    pub fn auth_context(&self, assume_present: bool, reason: &str) -> AuthContext {
        let auth = match (assume_present, self.config.presence) {
            (true, _) | (false, PresenceMode::Assume) => AuthContext::new(AssumePresent),
            (false, PresenceMode::Prompt) => AuthContext::new(TerminalPrompt),
        };
        auth.with_reason(reason)
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("secrypt directory not initialized. Run 'secrypt init' first")]
    NotInitialized,

    #[error("secrypt directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid device key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
