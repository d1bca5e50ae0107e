//! Runtime configuration for the crew and its reasoning endpoint.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variables (`DEEPSEEK_*`, `SITE_CREW_*`)
//! 2. The optional TOML settings file (`--settings`)
//! 3. Built-in defaults (DeepSeek chat on the public API)
//!
//! The credential has no default: a missing `DEEPSEEK_API_KEY` is a startup error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use rig::providers::openai;
use serde::Deserialize;

use crate::tools::PathResolver;

const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
const ENV_MODEL: &str = "DEEPSEEK_MODEL";
const ENV_BASE_URL: &str = "DEEPSEEK_BASE_URL";
const ENV_TEMPERATURE: &str = "SITE_CREW_TEMPERATURE";
const ENV_MAX_TURNS: &str = "SITE_CREW_MAX_TURNS";
const ENV_MAX_RETRIES: &str = "SITE_CREW_MAX_RETRIES";
const ENV_TASK_TIMEOUT: &str = "SITE_CREW_TASK_TIMEOUT_SECS";

const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_TEMPERATURE: f64 = 0.2;
/// Tool round trips allowed inside one task; file-writing tasks need one per file.
const DEFAULT_MAX_TURNS: usize = 25;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_OUTPUT_DIR: &str = "website";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DEEPSEEK_API_KEY environment variable is not set")]
    MissingCredential,

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read settings file {}: {source}", path.display())]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional file-based overrides. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_turns: Option<usize>,
    pub max_retries: Option<u32>,
    pub task_timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// Reasoning-endpoint and engine configuration, built once per process.
#[derive(Debug, Clone)]
pub struct CrewConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: f64,
    /// Maximum tool-call turns per task.
    pub max_turns: usize,
    /// Retries for transient service failures (0 = fail on the first error).
    pub max_retries: u32,
    /// Per-task deadline. `None` waits indefinitely.
    pub task_timeout: Option<Duration>,
    /// Directory the generated site is written to, relative to `base_dir`.
    pub output_dir: PathBuf,
    /// Directory relative capability paths resolve against.
    pub base_dir: PathBuf,
}

impl CrewConfig {
    /// Build from the process environment over optional settings.
    pub fn from_env(settings: Settings) -> Result<Self, ConfigError> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(|key| std::env::var(key).ok(), settings, base_dir)
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        settings: Settings,
        base_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let api_key = lookup(ENV_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let model = lookup(ENV_MODEL)
            .or(settings.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup(ENV_BASE_URL)
            .or(settings.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let temperature = parse_env(&lookup, ENV_TEMPERATURE)?
            .or(settings.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: ENV_TEMPERATURE,
                value: temperature.to_string(),
                reason: "must be between 0.0 and 2.0".into(),
            });
        }

        let max_turns = parse_env(&lookup, ENV_MAX_TURNS)?
            .or(settings.max_turns)
            .filter(|v: &usize| *v > 0)
            .unwrap_or(DEFAULT_MAX_TURNS);
        let max_retries = parse_env(&lookup, ENV_MAX_RETRIES)?
            .or(settings.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let task_timeout = parse_env::<u64>(&lookup, ENV_TASK_TIMEOUT)?
            .or(settings.task_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            model,
            api_key,
            base_url,
            temperature,
            max_turns,
            max_retries,
            task_timeout,
            output_dir: settings
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_dir: PathResolver::new(base_dir).base().to_path_buf(),
        })
    }

    /// Replace the base directory, anchoring a relative one at the working directory.
    pub fn set_base_dir(&mut self, base_dir: impl Into<PathBuf>) {
        self.base_dir = PathResolver::new(base_dir).base().to_path_buf();
    }

    /// Absolute location of the output directory, resolved the same way
    /// capability paths are.
    pub fn output_path(&self) -> PathBuf {
        PathResolver::new(&self.base_dir).resolve(&self.output_dir.to_string_lossy())
    }

    /// Build the OpenAI-compatible completions client for this endpoint.
    pub fn client(&self) -> anyhow::Result<openai::CompletionsClient> {
        openai::CompletionsClient::builder()
            .api_key(&self.api_key)
            .base_url(&self.base_url)
            .build()
            .with_context(|| format!("Failed to build completions client for {}", self.base_url))
    }
}

fn parse_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            }),
    }
}
