//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{
    ArchiveArgs, CliArgs, Command, CreateArgs, DeleteArgs, GlobalOverrides, ListArgs, ShowArgs,
    SortOrder, TagsArgs, UpdateArgs, VersionedArgs,
};

use crate::application::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::excerpt::DEFAULT_EXCERPT_LENGTH;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "ventus";
const ENV_PREFIX: &str = "VENTUS";
const DEFAULT_CONTENT_PATH: &str = "./content";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    pub content: ContentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Store root; posts live under `<content_path>/posts/<id>/`.
    pub content_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub excerpt_length: NonZeroUsize,
    pub default_page_size: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    storage: RawStorageSettings,
    content: RawContentSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(path) = overrides.content_path.as_ref() {
            self.storage.content_path = Some(path.clone());
        }
        if let Some(length) = overrides.excerpt_length {
            self.content.excerpt_length = Some(length);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            storage,
            content,
            logging,
        } = raw;

        Ok(Self {
            storage: build_storage_settings(storage)?,
            content: build_content_settings(content)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let content_path = storage
        .content_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_PATH));
    if content_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "storage.content_path",
            "path must not be empty",
        ));
    }

    Ok(StorageSettings { content_path })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let excerpt_length = non_zero_usize(
        content
            .excerpt_length
            .unwrap_or(DEFAULT_EXCERPT_LENGTH as u64),
        "content.excerpt_length",
    )?;
    let default_page_size = non_zero_usize(
        content
            .default_page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as u64),
        "content.default_page_size",
    )?;

    Ok(ContentSettings {
        excerpt_length,
        default_page_size,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    content_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    excerpt_length: Option<u64>,
    default_page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
