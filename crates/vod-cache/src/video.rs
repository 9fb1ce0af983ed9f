use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Named segment of a broadcast, positioned relative to its start.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub name: String,
    #[serde(with = "duration_secs")]
    pub position: Duration,
}

impl Chapter {
    pub fn new(name: impl Into<String>, position: Duration) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    /// A chapter spanning the whole broadcast, used when no finer
    /// segmentation is available.
    pub fn whole(name: impl Into<String>) -> Self {
        Self::new(name, Duration::ZERO)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
/// One broadcast of a channel, either a finished VOD or the live stream.
///
/// `url` is the unique key. A finished VOD uses its own permalink, a live
/// record uses the channel page, so repeated observations of the same
/// ongoing stream share a key.
///
/// A record without a `start_time` carries no data and stands in for an
/// offline channel.
///
/// # Examples
///
/// ```rust
/// use vod_cache::Video;
///
/// let offline = Video::offline("somechannel");
/// assert!(offline.is_offline());
/// assert!(!offline.is_live);
/// ```
pub struct Video {
    pub title: String,
    pub channel: String,
    pub thumbnail_urls: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    // Snapshot taken at fetch time for live records.
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub is_live: bool,
    pub url: String,
    pub chapters: Vec<Chapter>,
}

impl Video {
    /// Placeholder for a channel that is not broadcasting.
    pub fn offline(channel: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            channel: channel.into(),
            thumbnail_urls: Vec::new(),
            start_time: None,
            duration: Duration::ZERO,
            is_live: false,
            url: String::new(),
            chapters: Vec::new(),
        }
    }

    pub fn is_offline(&self) -> bool {
        !self.is_live && self.start_time.is_none()
    }

    /// Start time plus duration, when the start is known.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        let start = self.start_time?;
        let duration = chrono::Duration::from_std(self.duration).ok()?;
        start.checked_add_signed(duration)
    }

    /// Name of the chapter playing at `offset` into the broadcast.
    pub fn chapter_at(&self, offset: Duration) -> Option<&Chapter> {
        self.chapters
            .iter()
            .take_while(|chapter| chapter.position <= offset)
            .last()
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_live {
            write!(f, "[LIVE] {} - {}", self.channel, self.title)
        } else if let Some(start) = self.start_time {
            write!(
                f,
                "[{}] {} - {}",
                start.format("%Y-%m-%d %H:%M"),
                self.channel,
                self.title
            )
        } else {
            write!(f, "[offline] {}", self.channel)
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
