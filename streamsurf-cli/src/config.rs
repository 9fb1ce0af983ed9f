use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use streamsurf_platforms::Twitch;
use tracing::debug;
use vod_cache::CacheConfig;
use vod_cache::config::{
    DEFAULT_CORRELATION_WINDOW, DEFAULT_MAX_CONCURRENT_QUERIES, DEFAULT_PAGE_SIZE,
};

/// Which Twitch adapter answers a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceChoice {
    Gql,
    Page,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Channels to follow
    pub channels: Vec<String>,

    /// Extra channels, one per line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels_file: Option<PathBuf>,

    /// VODs requested per channel
    pub page_size: usize,

    /// Explicit cache size; derived from the channel count when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_capacity: Option<usize>,

    pub max_concurrent_queries: usize,

    pub correlation_window_secs: u64,

    pub vod_source: SourceChoice,

    pub live_source: SourceChoice,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Player executable
    pub player: String,

    /// Extra player arguments, placed before the URL
    pub player_args: Vec<String>,

    /// Stream quality passed after the URL
    pub quality: String,

    /// Twitch `auth-token` cookie value, sent as an OAuth header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,

    /// Raw cookie string (`name=value; name2=value2`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            channels_file: None,
            page_size: DEFAULT_PAGE_SIZE,
            ring_capacity: None,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            correlation_window_secs: DEFAULT_CORRELATION_WINDOW.as_secs(),
            vod_source: SourceChoice::Gql,
            live_source: SourceChoice::Page,
            timeout_secs: 30,
            player: "streamlink".to_string(),
            player_args: Vec::new(),
            quality: "best".to_string(),
            oauth_token: None,
            cookies: None,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("streamsurf").join("config.toml"))
    }

    /// Load from `path`, or the default location. A missing file yields the
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Configured channels plus those of `channels_file`, normalized and
    /// without duplicates, in order of first appearance.
    pub fn resolve_channels(&self) -> Result<Vec<String>> {
        let mut raw = self.channels.clone();
        if let Some(path) = &self.channels_file {
            let content = std::fs::read_to_string(path)?;
            raw.extend(parse_channel_list(&content));
        }

        let mut channels: Vec<String> = Vec::with_capacity(raw.len());
        for entry in raw {
            let channel = Twitch::normalize_channel(&entry)?;
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        Ok(channels)
    }

    pub fn cache_config(&self, channel_count: usize) -> CacheConfig {
        let mut config = CacheConfig::with_page_size(channel_count, self.page_size);
        if let Some(capacity) = self.ring_capacity {
            config.ring_capacity = capacity;
        }
        config.max_concurrent_queries = self.max_concurrent_queries;
        config.correlation_window = Duration::from_secs(self.correlation_window_secs);
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn show(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(CliError::from)
    }
}

/// One channel per line; `\r` and surrounding blanks are trimmed, empty lines
/// and `#` comments skipped.
pub fn parse_channel_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
