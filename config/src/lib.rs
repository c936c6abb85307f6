//! Configuration loading for Memory Pond.
//!
//! The optional file lives at `~/.pond/config.toml`. Every value can be overridden
//! by an environment variable, and everything has a default, so a missing file is
//! a valid configuration.
//!
//! ```toml
//! [generation]
//! base_url = "http://127.0.0.1:1234/v1"
//! api_key = "${OPENAI_API_KEY}"
//! model = "meta-llama-3.1-8b-instruct"
//! timeout_secs = 120
//!
//! [storage]
//! archive_file = "~/.pond/memories.jsonl"
//! sessions_file = "~/.pond/sessions.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1234/v1";
pub const DEFAULT_API_KEY: &str = "lm-studio";
pub const DEFAULT_MODEL: &str = "meta-llama-3.1-8b-instruct";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const ENV_BASE_URL: &str = "OPENAI_BASE";
const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_MODEL: &str = "MODEL";

const ARCHIVE_FILE_NAME: &str = "memories.jsonl";
const SESSIONS_FILE_NAME: &str = "sessions.json";

#[derive(Debug, Default, Deserialize)]
pub struct PondConfig {
    pub generation: Option<GenerationConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Text-generation backend settings (OpenAI-compatible chat completions).
#[derive(Default, Deserialize)]
pub struct GenerationConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_some() { "[REDACTED]" } else { "None" },
            )
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Append-only archive of finished rituals (one JSON record per line).
    pub archive_file: Option<String>,
    /// Whole-file session map, rewritten after every mutating call.
    pub sessions_file: Option<String>,
}

/// Fully resolved settings: file values, environment overrides and defaults applied.
#[derive(Clone)]
pub struct Settings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub archive_path: PathBuf,
    pub sessions_path: PathBuf,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("archive_path", &self.archive_path)
            .field("sessions_path", &self.sessions_path)
            .finish()
    }
}

/// Replace `${VAR}` references with environment values (unset variables become empty).
pub fn expand_env_vars(value: &str) -> String {
    expand_with(value, &|name| env::var(name).ok())
}

fn expand_with(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

impl PondConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve against the process environment and home directory.
    #[must_use]
    pub fn resolve(&self) -> Settings {
        let home = dirs::home_dir();
        self.resolve_with(&|name| env::var(name).ok(), home.as_deref())
    }

    /// Resolve with an explicit environment lookup and home directory.
    #[must_use]
    pub fn resolve_with(
        &self,
        lookup: &dyn Fn(&str) -> Option<String>,
        home: Option<&Path>,
    ) -> Settings {
        let generation = self.generation.as_ref();
        let storage = self.storage.as_ref();
        let from_env = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let from_file = |value: Option<&String>| {
            value
                .map(|raw| expand_with(raw, lookup))
                .filter(|value| !value.trim().is_empty())
        };

        let base_url = from_env(ENV_BASE_URL)
            .or_else(|| from_file(generation.and_then(|g| g.base_url.as_ref())))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = from_env(ENV_API_KEY)
            .or_else(|| from_file(generation.and_then(|g| g.api_key.as_ref())))
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());
        let model = from_env(ENV_MODEL)
            .or_else(|| from_file(generation.and_then(|g| g.model.as_ref())))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = generation
            .and_then(|g| g.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let data_dir = data_dir_in(home);
        let archive_path = from_file(storage.and_then(|s| s.archive_file.as_ref()))
            .map(|raw| expand_home(&raw, home))
            .unwrap_or_else(|| data_dir.join(ARCHIVE_FILE_NAME));
        let sessions_path = from_file(storage.and_then(|s| s.sessions_file.as_ref()))
            .map(|raw| expand_home(&raw, home))
            .unwrap_or_else(|| data_dir.join(SESSIONS_FILE_NAME));

        Settings {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
            archive_path,
            sessions_path,
        }
    }
}

fn data_dir_in(home: Option<&Path>) -> PathBuf {
    home.map_or_else(|| PathBuf::from(".pond"), |home| home.join(".pond"))
}

/// `~/.pond`, or `./.pond` when no home directory is known.
#[must_use]
pub fn data_dir() -> PathBuf {
    data_dir_in(dirs::home_dir().as_deref())
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pond").join("config.toml"))
}
