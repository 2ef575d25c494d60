//! Shared configuration for servdesk tools.
//!
//! A TOML file at the platform config path, overlaid by `SERVDESK_`
//! environment variables (`__` separates nesting, e.g.
//! `SERVDESK_API__BASE_URL`), translated into the API transport settings
//! and the core list settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use servdesk_api::{TlsMode, TransportConfig};
use servdesk_core::{ListSettings, UploadPolicy};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SERVDESK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub list: ListDefaults,

    #[serde(default)]
    pub uploads: UploadDefaults,
}

/// Where the back-office API lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiSettings {
    /// API base URL; collection paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer token in plaintext. Prefer `token_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token: None,
            token_env: None,
            insecure: false,
            ca_cert: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListDefaults {
    /// Search debounce quiet period.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UploadDefaults {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    #[serde(default = "default_allowed_mime")]
    pub allowed_mime: Vec<String>,
}

impl Default for UploadDefaults {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_mime: default_allowed_mime(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_page_size() -> u32 {
    10
}
fn default_max_bytes() -> usize {
    UploadPolicy::default().max_bytes
}
fn default_allowed_mime() -> Vec<String> {
    UploadPolicy::default().allowed_mime
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "servdesk", "servdesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("servdesk");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path + environment. A missing file is
/// not an error; defaults fill every gap.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl ApiSettings {
    /// Resolve the bearer token: `token_env` first, then plaintext.
    pub fn resolve_token(&self) -> Option<SecretString> {
        if let Some(ref env_name) = self.token_env {
            if let Ok(val) = std::env::var(env_name) {
                return Some(SecretString::from(val));
            }
        }
        self.token.clone().map(SecretString::from)
    }

    pub fn url(&self) -> Result<Url, ConfigError> {
        let url: Url = self.base_url.parse().map_err(|_| ConfigError::Validation {
            field: "api.base_url".into(),
            reason: format!("invalid URL: {}", self.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api.base_url".into(),
                reason: format!("expected an http(s) URL, got '{}'", self.base_url),
            });
        }
        Ok(url)
    }
}

impl Config {
    /// HTTP transport settings for `RestClient`.
    pub fn transport(&self) -> Result<TransportConfig, ConfigError> {
        self.api.url()?;
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "api.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }

        let tls = if self.api.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.api.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };

        let mut transport = TransportConfig {
            tls,
            timeout: Duration::from_secs(self.api.timeout_secs),
            ..TransportConfig::default()
        };
        if let Some(token) = self.api.resolve_token() {
            transport = transport.with_bearer_token(token);
        }
        Ok(transport)
    }

    /// Debounce, page size, and upload limits for management screens.
    pub fn list_settings(&self) -> Result<ListSettings, ConfigError> {
        if self.list.page_size == 0 {
            return Err(ConfigError::Validation {
                field: "list.page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::Validation {
                field: "uploads.max_bytes".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(ListSettings {
            debounce: Duration::from_millis(self.list.debounce_ms),
            page_size: self.list.page_size,
            upload: UploadPolicy {
                max_bytes: self.uploads.max_bytes,
                allowed_mime: self.uploads.allowed_mime.clone(),
            },
        })
    }
}
