//! Lock-guarded handle to the ring shared by the coordinator and consumers.
//!
//! Writers take the write lock for a whole commit; every read takes the read
//! lock and returns an owned snapshot, so no consumer ever observes a ring
//! in the middle of an insert.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::ring::RingCache;
use crate::video::Video;

#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<RwLock<RingCache>>,
}

impl SharedCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RingCache::new(capacity))),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.capacity()?))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, RingCache> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RingCache> {
        self.inner.write()
    }

    pub fn insert(&self, batch: Vec<Video>) -> usize {
        self.inner.write().insert(batch)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn window(&self) -> Vec<Arc<Video>> {
        self.inner.read().window()
    }

    pub fn latest_by_key(&self) -> FxHashMap<String, Arc<Video>> {
        self.inner.read().latest_by_key().clone()
    }

    /// Window entries of one channel, oldest first.
    pub fn channel_window(&self, channel: &str) -> Vec<Arc<Video>> {
        self.inner
            .read()
            .iter()
            .filter(|video| video.channel == channel)
            .cloned()
            .collect()
    }

    /// The live record of `channel`, or else its most recently started VOD.
    pub fn latest_for_channel(&self, channel: &str) -> Option<Arc<Video>> {
        let ring = self.inner.read();
        pick_latest(ring.iter().filter(|video| video.channel == channel)).cloned()
    }

    /// One representative record per channel, in the order given.
    ///
    /// Channels with nothing cached get an offline placeholder.
    pub fn follow_view(&self, channels: &[String]) -> Vec<Arc<Video>> {
        let ring = self.inner.read();
        let mut best: FxHashMap<&str, &Arc<Video>> = FxHashMap::default();
        for video in ring.iter() {
            let slot = best.entry(video.channel.as_str()).or_insert(video);
            if rank(video) >= rank(slot) {
                *slot = video;
            }
        }

        channels
            .iter()
            .map(|channel| match best.get(channel.as_str()) {
                Some(video) => Arc::clone(video),
                None => Arc::new(Video::offline(channel.as_str())),
            })
            .collect()
    }
}

// Live beats finished; otherwise the later start wins.
fn rank(video: &Video) -> (bool, Option<chrono::DateTime<chrono::Utc>>) {
    (video.is_live, video.start_time)
}

fn pick_latest<'a>(videos: impl Iterator<Item = &'a Arc<Video>>) -> Option<&'a Arc<Video>> {
    // `max_by_key` keeps the last of equal elements, i.e. the newest insert.
    videos.max_by_key(|video| rank(video))
}

/// Order for follow lists: live records first, then most recent start.
pub fn sort_by_latest<T: AsRef<Video>>(videos: &mut [T]) {
    videos.sort_by(|a, b| rank(b.as_ref()).cmp(&rank(a.as_ref())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn vod(channel: &str, id: u32, hour: u32) -> Video {
        Video {
            title: format!("{channel} #{id}"),
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).single(),
            url: format!("https://www.twitch.tv/videos/{id}"),
            ..Video::offline(channel)
        }
    }

    fn live(channel: &str, hour: u32) -> Video {
        Video {
            is_live: true,
            url: format!("https://www.twitch.tv/{channel}"),
            ..vod(channel, 0, hour)
        }
    }

    fn cache() -> SharedCache {
        SharedCache::new(NonZeroUsize::new(16).unwrap())
    }

    #[test]
    fn test_channel_window_filters_in_order() {
        let cache = cache();
        cache.insert(vec![vod("a", 1, 1), vod("b", 2, 2), vod("a", 3, 3)]);

        let titles: Vec<String> = cache
            .channel_window("a")
            .iter()
            .map(|v| v.title.clone())
            .collect();
        assert_eq!(titles, ["a #1", "a #3"]);
        assert!(cache.channel_window("c").is_empty());
    }

    #[test]
    fn test_latest_prefers_live_then_newest() {
        let cache = cache();
        cache.insert(vec![vod("a", 2, 5), vod("a", 1, 3)]);
        assert_eq!(cache.latest_for_channel("a").unwrap().title, "a #2");

        cache.insert(vec![live("a", 4)]);
        assert!(cache.latest_for_channel("a").unwrap().is_live);
        assert!(cache.latest_for_channel("missing").is_none());
    }

    #[test]
    fn test_follow_view_covers_every_channel() {
        let cache = cache();
        cache.insert(vec![vod("a", 1, 1), vod("b", 2, 2), vod("a", 3, 3)]);
        cache.insert(vec![live("b", 1)]);

        let channels = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let view = cache.follow_view(&channels);
        assert_eq!(view.len(), 3);
        assert!(view[0].is_live);
        assert_eq!(view[1].title, "a #3");
        assert!(view[2].is_offline());
        assert_eq!(view[2].channel, "c");
    }

    #[test]
    fn test_sort_by_latest() {
        let mut videos = vec![
            Arc::new(vod("a", 1, 1)),
            Arc::new(Video::offline("z")),
            Arc::new(live("b", 0)),
            Arc::new(vod("c", 2, 9)),
        ];
        sort_by_latest(&mut videos);
        let channels: Vec<&str> = videos.iter().map(|v| v.channel.as_str()).collect();
        assert_eq!(channels, ["b", "c", "a", "z"]);
    }

    #[test]
    fn test_snapshots_are_owned() {
        let cache = cache();
        cache.insert(vec![vod("a", 1, 1)]);
        let window = cache.window();
        let latest = cache.latest_by_key();
        // A writer can proceed while snapshots are held.
        cache.insert(vec![vod("a", 2, 2)]);
        assert_eq!(window.len(), 1);
        assert_eq!(latest.len(), 1);
        assert_eq!(cache.len(), 2);
    }
}
