// Configuration loading and parsing (config/vote.toml).

use alloy_primitives::Address;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// vote.toml structs
// ---------------------------------------------------------------------------

/// Fully assembled configuration, passed explicitly into the batch runner.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub vote: VoteConfig,
    pub batch: BatchConfig,
    pub accounts: AccountsConfig,
}

/// `[api]`: where the voting API lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL without a trailing slash, e.g. `https://api.reya.xyz/api/vote`.
    pub base_url: String,
    /// Proposal slug used by the eligibility endpoint (`rnip3`).
    pub proposal: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// `[vote]`: the EIP-712 domain and the fixed fields of the vote intent.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteConfig {
    pub verifying_contract: Address,
    pub chain_id: u64,
    pub domain_name: String,
    pub domain_version: String,
    pub nonce: u64,
    /// Added to the current unix time (in seconds) to form the signature deadline.
    pub deadline_offset_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of accounts in flight at once.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    /// CSV file with `Private key` and `Proxy` columns, relative to the working directory.
    pub path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

const CONFIG_FILE: &str = "vote.toml";

/// Load and validate `config/vote.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Copy every file from `defaults/` into `config/` that is not already there.
/// Returns the files that were copied. `.example` templates are left alone.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read defaults entry: {e}"),
            })?
            .path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);

        // create_new: an existing file is never overwritten.
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                dest.write_all(&content).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, seeding `config/`
/// from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let non_empty: &[(&str, &str)] = &[
        ("api.base_url", config.api.base_url.as_str()),
        ("api.proposal", config.api.proposal.as_str()),
        ("vote.domain_name", config.vote.domain_name.as_str()),
        ("vote.domain_version", config.vote.domain_version.as_str()),
        ("accounts.path", config.accounts.path.as_str()),
    ];
    for (name, val) in non_empty {
        if val.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
    }

    if config.api.base_url.ends_with('/') {
        return Err(invalid("api.base_url", "must not end with '/'"));
    }

    let positive: &[(&str, u64)] = &[
        ("api.request_timeout_secs", config.api.request_timeout_secs),
        ("api.connect_timeout_secs", config.api.connect_timeout_secs),
        ("vote.deadline_offset_secs", config.vote.deadline_offset_secs),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    if config.batch.concurrency == 0 {
        return Err(invalid("batch.concurrency", "must be > 0"));
    }

    if config.vote.verifying_contract == Address::ZERO {
        return Err(invalid("vote.verifying_contract", "must not be the zero address"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
