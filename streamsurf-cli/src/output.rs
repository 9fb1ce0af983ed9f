use crate::{cli::OutputFormat, error::Result};
use chrono::{DateTime, Local, TimeZone, Utc};
#[cfg(feature = "colored-output")]
use colored::*;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use vod_cache::{BatchReport, FetchOutcome, Video};

pub const SEPARATOR: &str = " | ";

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// `LIVE` or start date, channel, duration, title, chapter names.
    pub fn format_line(&self, video: &Video) -> String {
        self.format_line_in(video, &Local)
    }

    fn format_line_in<Tz: TimeZone>(&self, video: &Video, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let when = if video.is_live {
            self.colorize("LIVE", &Color::Red, true)
        } else {
            match video.start_time {
                Some(start) => format_start(start, tz),
                None => self.colorize("offline", &Color::Dimmed, false),
            }
        };

        let chapters = video
            .chapters
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        [
            when,
            self.colorize(&video.channel, &Color::Cyan, false),
            format_duration(video.duration),
            video.title.clone(),
            chapters,
        ]
        .join(SEPARATOR)
    }

    pub fn format_videos(&self, videos: &[Arc<Video>], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => {
                let mut output = String::new();
                for video in videos {
                    output.push_str(&self.format_line(video));
                    output.push('\n');
                }
                Ok(output)
            }
            OutputFormat::Json => {
                let records: Vec<&Video> = videos.iter().map(Arc::as_ref).collect();
                let mut output = serde_json::to_string_pretty(&records)?;
                output.push('\n');
                Ok(output)
            }
        }
    }

    /// One warning line per channel whose data may be stale.
    pub fn format_report_warnings(&self, report: &BatchReport) -> Vec<String> {
        report
            .reports
            .iter()
            .filter_map(|r| {
                let detail = match &r.outcome {
                    FetchOutcome::Complete => return None,
                    FetchOutcome::Partial { failed, error } => {
                        format!("{failed} unavailable ({error})")
                    }
                    FetchOutcome::Failed {
                        vod_error,
                        live_error,
                    } => format!("no data (vods: {vod_error}; live status: {live_error})"),
                };
                Some(format!(
                    "{} {}: {detail}",
                    self.colorize("warning:", &Color::Yellow, true),
                    r.channel
                ))
            })
            .collect()
    }

    pub fn header(&self, text: &str) -> String {
        self.colorize(text, &Color::Green, true)
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Red => text.red(),
                    Color::Cyan => text.cyan(),
                    Color::Dimmed => text.dimmed(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Red,
    Cyan,
    Dimmed,
}

fn format_start<Tz: TimeZone>(start: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    start.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

/// `H:MM:SS`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

pub fn write_output(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
