//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.verdict/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::session::DEFAULT_STORAGE_KEY;
use crate::core::state::UserIdentity;
use crate::gateway::http::DEFAULT_SUMMARIZE_QUESTION;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VerdictConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub user: UserConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub app_name: Option<String>,
    pub welcome_text: Option<String>,
    pub reveal_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub summarize_question: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_APP_NAME: &str = "Verdict AI";
pub const DEFAULT_WELCOME_TEXT: &str =
    "Your intelligent companion for understanding sentiment in text and documents.";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 15;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub app_name: String,
    pub welcome_text: String,
    pub reveal_interval: Duration,
    pub base_url: String,
    pub timeout: Duration,
    pub summarize_question: String,
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub user: Option<UserIdentity>,
}

/// Values from command-line flags (None = not specified).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
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

/// Returns `~/.verdict/`.
pub fn verdict_home() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".verdict"))
}

/// Returns the path to `~/.verdict/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    verdict_home().map(|h| h.join("config.toml"))
}

/// Load config from `~/.verdict/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `VerdictConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<VerdictConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(VerdictConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(VerdictConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: VerdictConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Verdict Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# app_name = "Verdict AI"
# welcome_text = "Your intelligent companion for understanding sentiment in text and documents."
# reveal_interval_ms = 15            # Delay between revealed characters of a summary

# [gateway]
# base_url = "http://localhost:8000" # Or set VERDICT_API_URL env var
# timeout_secs = 120
# summarize_question = "Summarize the key points of this document."

# [storage]
# data_dir = "/home/me/.verdict"     # Or set VERDICT_DATA_DIR env var
# key = "verdict-chats"

# [user]
# display_name = "Ada"
# email = "ada@example.com"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &VerdictConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("VERDICT_API_URL").ok())
        .or_else(|| config.gateway.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Data dir: CLI → env → config → ~/.verdict → ./.verdict
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| std::env::var("VERDICT_DATA_DIR").ok().map(PathBuf::from))
        .or_else(|| config.storage.data_dir.as_ref().map(PathBuf::from))
        .or_else(verdict_home)
        .unwrap_or_else(|| PathBuf::from(".verdict"));

    // User: CLI name wins; email only comes from the config file
    let user = cli
        .user
        .clone()
        .or_else(|| config.user.display_name.clone())
        .map(|display_name| UserIdentity {
            display_name,
            email: config.user.email.clone(),
        });

    ResolvedConfig {
        app_name: config
            .general
            .app_name
            .clone()
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        welcome_text: config
            .general
            .welcome_text
            .clone()
            .unwrap_or_else(|| DEFAULT_WELCOME_TEXT.to_string()),
        reveal_interval: Duration::from_millis(
            config
                .general
                .reveal_interval_ms
                .unwrap_or(DEFAULT_REVEAL_INTERVAL_MS),
        ),
        base_url,
        timeout: Duration::from_secs(config.gateway.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        summarize_question: config
            .gateway
            .summarize_question
            .clone()
            .unwrap_or_else(|| DEFAULT_SUMMARIZE_QUESTION.to_string()),
        data_dir,
        storage_key: config
            .storage
            .key
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
        user,
    }
}
