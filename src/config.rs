//! Configuration loading helpers.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backup::{BackupOptions, DEFAULT_COPY_CHUNK_SIZE};
use crate::env::{MemEnv, PosixEnv};

/// Errors returned by configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading config files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Invalid value for a key.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Raw value string.
        value: String,
    },
    /// Unknown configuration key.
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Top-level configuration schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OxibackupConfig {
    /// Backup configuration.
    pub backup: Option<BackupConfigSpec>,
    /// Environment configuration.
    pub env: Option<EnvConfigSpec>,
}

impl OxibackupConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from the `OXIBACKUP_CONFIG` env var (if set),
    /// then apply `OXIBACKUP__section__field` overrides.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let config_path = env::var("OXIBACKUP_CONFIG").ok();
        let mut config = match config_path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment overrides in-place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for (key, value) in env::vars() {
            if !key.starts_with("OXIBACKUP__") {
                continue;
            }
            let path = key["OXIBACKUP__".len()..].to_ascii_lowercase();
            let parts: Vec<&str> = path.split("__").collect();

            match parts.as_slice() {
                // Kept untrimmed: whitespace can be part of a prefix.
                ["backup", "hidden_prefix"] => {
                    self.backup_mut().hidden_prefix = Some(value);
                }
                ["backup", "copy_chunk_size"] => {
                    self.backup_mut().copy_chunk_size = Some(parse_value(&key, value.trim())?);
                }
                ["env", "kind"] => {
                    self.env_mut().kind = Some(value.trim().to_string());
                }
                ["env", "root"] => {
                    self.env_mut().root = Some(PathBuf::from(value.trim()));
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        Ok(())
    }

    /// Build `BackupOptions` using defaults plus overrides.
    pub fn to_backup_options(&self) -> BackupOptions {
        let mut options = BackupOptions::default();
        if let Some(backup) = &self.backup {
            backup.apply_to(&mut options);
        }
        options
    }

    /// Chunk size for directory copies.
    pub fn copy_chunk_size(&self) -> usize {
        self.backup
            .as_ref()
            .and_then(|b| b.copy_chunk_size)
            .unwrap_or(DEFAULT_COPY_CHUNK_SIZE)
            .max(1)
    }

    /// Resolve the environment configuration, defaulting to POSIX.
    pub fn env_config(&self) -> Result<EnvConfig, ConfigError> {
        match self.env.as_ref() {
            Some(spec) => spec.resolve(),
            None => Ok(EnvConfig::Posix { root: None }),
        }
    }

    fn backup_mut(&mut self) -> &mut BackupConfigSpec {
        self.backup.get_or_insert_with(BackupConfigSpec::default)
    }

    fn env_mut(&mut self) -> &mut EnvConfigSpec {
        self.env.get_or_insert_with(EnvConfigSpec::default)
    }
}

/// Backup configuration overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupConfigSpec {
    /// Names starting with this prefix are skipped.
    pub hidden_prefix: Option<String>,
    /// Read chunk size used when copying into a directory.
    pub copy_chunk_size: Option<usize>,
}

impl BackupConfigSpec {
    fn apply_to(&self, options: &mut BackupOptions) {
        if let Some(value) = &self.hidden_prefix {
            options.hidden_prefix = value.clone();
        }
    }
}

/// Environment configuration from TOML/env.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvConfigSpec {
    /// Environment kind: "posix" or "memory".
    pub kind: Option<String>,
    /// Root directory for relative paths (posix only).
    pub root: Option<PathBuf>,
}

impl EnvConfigSpec {
    fn resolve(&self) -> Result<EnvConfig, ConfigError> {
        let kind = self.kind.as_deref().map(|v| v.to_ascii_lowercase());

        match kind.as_deref() {
            None | Some("posix") => Ok(EnvConfig::Posix {
                root: self.root.clone(),
            }),
            Some("memory") => match &self.root {
                Some(root) => Err(ConfigError::InvalidValue {
                    key: "env.root".into(),
                    value: root.display().to_string(),
                }),
                None => Ok(EnvConfig::Memory),
            },
            Some(other) => Err(ConfigError::InvalidValue {
                key: "env.kind".into(),
                value: other.into(),
            }),
        }
    }
}

/// Resolved environment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvConfig {
    /// Disk-backed environment.
    Posix {
        /// Root for relative paths.
        root: Option<PathBuf>,
    },
    /// In-memory environment.
    Memory,
}

impl EnvConfig {
    /// Build the POSIX environment, if that is what is configured.
    pub fn posix_env(&self) -> Option<PosixEnv> {
        match self {
            EnvConfig::Posix { root: Some(root) } => Some(PosixEnv::with_root(root)),
            EnvConfig::Posix { root: None } => Some(PosixEnv::new()),
            EnvConfig::Memory => None,
        }
    }

    /// Build the in-memory environment, if that is what is configured.
    pub fn memory_env(&self) -> Option<MemEnv> {
        match self {
            EnvConfig::Memory => Some(MemEnv::new()),
            EnvConfig::Posix { .. } => None,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
