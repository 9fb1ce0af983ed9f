use std::process::ExitStatus;

use streamsurf_platforms::ExtractorError;
use thiserror::Error;
use vod_cache::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Extractor(#[from] ExtractorError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("no options available")]
    NoOptions,

    #[error("no channels configured; add `channels` to the config or pass --channels-file")]
    NoChannels,

    #[error("invalid start time {0:?}: expected H:MM:SS, M:SS or SS")]
    InvalidStartTime(String),

    #[error("player `{player}` exited with {status}")]
    PlayerFailed { player: String, status: ExitStatus },

    #[error("nothing found for channel {0}")]
    NothingForChannel(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
