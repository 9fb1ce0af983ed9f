use crate::config::AppConfig;
use crate::error::{CliError, Result};
use inquire::validator::Validation;
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use streamsurf_platforms::Twitch;
use tokio::process::Command;
use tracing::{debug, info};
use vod_cache::Video;

static START_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+:[0-5]\d:[0-5]\d|\d+:[0-5]\d|\d+)$").unwrap());

/// What to hand to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayRequest {
    pub url: String,
    pub start_offset: Option<String>,
}

impl PlayRequest {
    /// Resolve the user's start-time answer for `video`.
    ///
    /// Blank plays a live record from the channel page and a VOD from the
    /// beginning; anything else seeks into the record's own URL.
    pub fn new(video: &Video, start_time: &str) -> Result<Self> {
        let start_time = start_time.trim();
        if start_time.is_empty() {
            let url = if video.is_live {
                Twitch::channel_url(&video.channel)
            } else {
                video.url.clone()
            };
            return Ok(Self {
                url,
                start_offset: None,
            });
        }

        if !is_valid_start_time(start_time) {
            return Err(CliError::InvalidStartTime(start_time.to_string()));
        }
        Ok(Self {
            url: video.url.clone(),
            start_offset: Some(start_time.to_string()),
        })
    }
}

pub fn is_valid_start_time(value: &str) -> bool {
    START_TIME_REGEX.is_match(value)
}

pub fn prompt_start_time(video: &Video) -> Result<String> {
    let message = if video.is_live {
        "Start time (e.g. 1:00:00) (leave blank for live):"
    } else {
        "Start time (e.g. 1:00:00):"
    };
    let answer = inquire::Text::new(message)
        .with_validator(|input: &str| {
            let input = input.trim();
            if input.is_empty() || is_valid_start_time(input) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("expected H:MM:SS, M:SS or SS".into()))
            }
        })
        .prompt()?;
    Ok(answer)
}

/// External player invocation, `streamlink` by default.
#[derive(Debug, Clone)]
pub struct Player {
    program: String,
    extra_args: Vec<String>,
    quality: String,
}

impl Player {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            program: config.player.clone(),
            extra_args: config.player_args.clone(),
            quality: config.quality.clone(),
        }
    }

    pub fn command_args(&self, request: &PlayRequest) -> Vec<String> {
        let mut args = self.extra_args.clone();
        if let Some(offset) = &request.start_offset {
            args.push("--hls-start-offset".to_string());
            args.push(offset.clone());
        }
        args.push(request.url.clone());
        if !self.quality.is_empty() {
            args.push(self.quality.clone());
        }
        args
    }

    /// Run the player in the foreground and wait for it to exit.
    pub async fn play(&self, request: &PlayRequest) -> Result<()> {
        let args = self.command_args(request);
        info!(player = %self.program, url = %request.url, "Starting player");
        debug!(?args, "Player arguments");

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(CliError::PlayerFailed {
                player: self.program.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn video(is_live: bool, url: &str) -> Video {
        Video {
            title: "t".to_string(),
            channel: "chan".to_string(),
            thumbnail_urls: Vec::new(),
            start_time: None,
            duration: Duration::ZERO,
            is_live,
            url: url.to_string(),
            chapters: Vec::new(),
        }
    }

    #[test]
    fn test_start_time_formats() {
        for ok in ["1:00:00", "12:34:56", "5:07", "45", "0"] {
            assert!(is_valid_start_time(ok), "{ok}");
        }
        for bad in ["", "1:60", "1:2:3", "a", "1:00:0", "-5", "1h"] {
            assert!(!is_valid_start_time(bad), "{bad}");
        }
    }

    #[test]
    fn test_blank_start_on_merged_live_vod_plays_channel() {
        let merged = video(true, "https://www.twitch.tv/videos/9");
        let request = PlayRequest::new(&merged, "  ").unwrap();
        assert_eq!(request.url, "https://www.twitch.tv/chan");
        assert_eq!(request.start_offset, None);
    }

    #[test]
    fn test_blank_start_on_vod_plays_vod() {
        let vod = video(false, "https://www.twitch.tv/videos/9");
        let request = PlayRequest::new(&vod, "").unwrap();
        assert_eq!(request.url, "https://www.twitch.tv/videos/9");
    }

    #[test]
    fn test_offset_seeks_into_record_url() {
        let merged = video(true, "https://www.twitch.tv/videos/9");
        let request = PlayRequest::new(&merged, "1:00:00").unwrap();
        assert_eq!(request.url, "https://www.twitch.tv/videos/9");
        assert_eq!(request.start_offset.as_deref(), Some("1:00:00"));

        assert!(matches!(
            PlayRequest::new(&merged, "soon"),
            Err(CliError::InvalidStartTime(_))
        ));
    }

    #[test]
    fn test_command_args() {
        let config = AppConfig {
            player_args: vec!["--player".to_string(), "mpv".to_string()],
            ..AppConfig::default()
        };
        let player = Player::from_config(&config);
        let request = PlayRequest {
            url: "https://www.twitch.tv/videos/9".to_string(),
            start_offset: Some("5:00".to_string()),
        };
        assert_eq!(
            player.command_args(&request),
            vec![
                "--player",
                "mpv",
                "--hls-start-offset",
                "5:00",
                "https://www.twitch.tv/videos/9",
                "best"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_player_is_an_error() {
        let config = AppConfig {
            player: "false".to_string(),
            quality: String::new(),
            ..AppConfig::default()
        };
        let request = PlayRequest {
            url: "https://www.twitch.tv/chan".to_string(),
            start_offset: None,
        };
        assert!(matches!(
            Player::from_config(&config).play(&request).await,
            Err(CliError::PlayerFailed { .. })
        ));
    }
}
