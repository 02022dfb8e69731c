//! # Configuration
//!
//! Server address, chat tuning and storage location, layered as
//! defaults → `~/.sprout/config.toml` → `SPROUT_BASE_URL` → CLI flags.
//!
//! ```text
//! [server]    base_url
//! [chat]      namespace, timeouts, reconnect policy, input limit
//! [identity]  storage_dir
//! ```
//!
//! A first run writes a fully commented-out file listing every key.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::state::DEFAULT_MAX_INPUT_CHARS;
use crate::session::{ReconnectPolicy, SessionSettings};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SproutConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    pub namespace: Option<String>,
    pub answer_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub reconnect_attempts: Option<u32>,
    pub reconnect_delay_ms: Option<u64>,
    pub max_input_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub storage_dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_NAMESPACE: &str = "/chat";
pub const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub namespace: String,
    pub answer_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    pub max_input_chars: usize,
    pub storage_dir: PathBuf,
}

impl ResolvedConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            answer_timeout: self.answer_timeout,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.sprout`.
pub fn sprout_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".sprout"))
}

/// Returns the path to `~/.sprout/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    sprout_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.sprout/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `SproutConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<SproutConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(SproutConfig::default());
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(SproutConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<SproutConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: SproutConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Sprout Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [server]
# base_url = "http://localhost:5000"   # Or set SPROUT_BASE_URL, or pass --base-url

# [chat]
# namespace = "/chat"
# answer_timeout_secs = 30
# connect_timeout_secs = 30
# reconnect_attempts = 10
# reconnect_delay_ms = 2000
# max_input_chars = 500

# [identity]
# storage_dir = "~/.sprout/storage"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` is from the `--base-url` flag (None = not specified).
pub fn resolve(config: &SproutConfig, cli_base_url: Option<&str>) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("SPROUT_BASE_URL").ok())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let chat = &config.chat;
    let reconnect = ReconnectPolicy {
        attempts: chat.reconnect_attempts.unwrap_or(DEFAULT_RECONNECT_ATTEMPTS),
        delay: Duration::from_millis(chat.reconnect_delay_ms.unwrap_or(DEFAULT_RECONNECT_DELAY_MS)),
        connect_timeout: Duration::from_secs(
            chat.connect_timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        ),
    };

    ResolvedConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        namespace: chat
            .namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        answer_timeout: Duration::from_secs(
            chat.answer_timeout_secs.unwrap_or(DEFAULT_ANSWER_TIMEOUT_SECS),
        ),
        reconnect,
        max_input_chars: chat.max_input_chars.unwrap_or(DEFAULT_MAX_INPUT_CHARS),
        storage_dir: resolve_storage_dir(config),
    }
}

/// `[identity] storage_dir`, with a leading `~/` expanded. Defaults to `~/.sprout/storage`.
fn resolve_storage_dir(config: &SproutConfig) -> PathBuf {
    if let Some(ref dir) = config.identity.storage_dir {
        if let Some(rest) = dir.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        return PathBuf::from(dir);
    }
    sprout_dir()
        .map(|d| d.join("storage"))
        .unwrap_or_else(|| PathBuf::from(".sprout/storage"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = SproutConfig::default();
        assert!(config.server.base_url.is_none());
        assert!(config.chat.namespace.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve(&SproutConfig::default(), Some("http://farm.test"));
        assert_eq!(resolved.namespace, "/chat");
        assert_eq!(resolved.answer_timeout, Duration::from_secs(30));
        assert_eq!(resolved.reconnect, ReconnectPolicy::default());
        assert_eq!(resolved.max_input_chars, 500);
        assert!(resolved.storage_dir.ends_with(".sprout/storage"));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = SproutConfig {
            chat: ChatConfig {
                namespace: Some("/advice".to_string()),
                answer_timeout_secs: Some(10),
                connect_timeout_secs: Some(5),
                reconnect_attempts: Some(3),
                reconnect_delay_ms: Some(500),
                max_input_chars: Some(200),
            },
            identity: IdentityConfig {
                storage_dir: Some("/tmp/sprout-users".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some("http://farm.test"));
        assert_eq!(resolved.namespace, "/advice");
        assert_eq!(resolved.session_settings().answer_timeout, Duration::from_secs(10));
        assert_eq!(resolved.reconnect.attempts, 3);
        assert_eq!(resolved.reconnect.delay, Duration::from_millis(500));
        assert_eq!(resolved.reconnect.connect_timeout, Duration::from_secs(5));
        assert_eq!(resolved.max_input_chars, 200);
        assert_eq!(resolved.storage_dir, PathBuf::from("/tmp/sprout-users"));
    }

    #[test]
    fn test_resolve_cli_base_url_wins() {
        let config = SproutConfig {
            server: ServerConfig {
                base_url: Some("http://from-file:5000".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some("http://from-cli:5000/"));
        assert_eq!(resolved.base_url, "http://from-cli:5000");
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[chat]
answer_timeout_secs = 45
"#;
        let config: SproutConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chat.answer_timeout_secs, Some(45));
        assert!(config.chat.namespace.is_none());
        assert!(config.server.base_url.is_none());
    }

    #[test]
    fn test_load_from_file_and_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "[server]\nbase_url = \"http://10.0.0.2:5000\"\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.server.base_url.as_deref(), Some("http://10.0.0.2:5000"));

        fs::write(&path, "[server\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_generated_default_is_all_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        generate_default_config(&path);

        let config = load_config_from(&path).unwrap();
        assert!(config.server.base_url.is_none());
        assert!(config.chat.max_input_chars.is_none());
    }
}
