//! Coordinator behaviour against in-memory sources.

use async_trait::async_trait;
use chrono::{DateTime, Duration as TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vod_cache::{
    CacheConfig, FetchOutcome, LiveResolution, LiveStatusFetcher, QueryCoordinator, SharedCache,
    SourceError, SourceKind, Video, VodFetcher,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).single().unwrap()
}

fn vod(channel: &str, id: u32, start: DateTime<Utc>) -> Video {
    Video {
        title: format!("vod {id}"),
        start_time: Some(start),
        duration: Duration::from_secs(3600),
        url: format!("https://www.twitch.tv/videos/{id}"),
        ..Video::offline(channel)
    }
}

fn live(channel: &str, start: DateTime<Utc>) -> Video {
    Video {
        title: "live now".to_string(),
        start_time: Some(start),
        is_live: true,
        url: format!("https://www.twitch.tv/{channel}"),
        ..Video::offline(channel)
    }
}

/// Answers every channel with the same canned result.
struct Canned {
    vods: Result<Vec<Video>, String>,
    live: Result<Video, String>,
}

#[async_trait]
impl VodFetcher for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn fetch_vods(&self, _channel: &str) -> Result<Vec<Video>, SourceError> {
        self.vods.clone().map_err(SourceError::Network)
    }
}

#[async_trait]
impl LiveStatusFetcher for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn fetch_live_status(&self, _channel: &str) -> Result<Video, SourceError> {
        self.live.clone().map_err(SourceError::Decode)
    }
}

fn coordinator(source: Canned) -> QueryCoordinator {
    let config = CacheConfig::for_channels(2);
    let cache = SharedCache::from_config(&config).unwrap();
    let source = Arc::new(source);
    QueryCoordinator::new(cache, source.clone(), source, &config)
}

#[tokio::test]
async fn live_within_window_merges_into_vod() {
    let t = base();
    let coordinator = coordinator(Canned {
        vods: Ok(vec![vod("chan", 1, t - TimeDelta::hours(30)), vod("chan", 2, t)]),
        live: Ok(live("chan", t + TimeDelta::minutes(3))),
    });

    let report = coordinator.query_channel("chan").await;
    assert!(report.is_complete());
    assert_eq!(
        report.live,
        LiveResolution::MergedIntoVod {
            url: "https://www.twitch.tv/videos/2".to_string()
        }
    );
    assert_eq!(report.stored, 2);

    let window = coordinator.cache().window();
    assert_eq!(window.len(), 2);
    assert!(!window[0].is_live);
    assert!(window[1].is_live);
    assert!(!coordinator.cache().read().contains("https://www.twitch.tv/chan"));
}

#[tokio::test]
async fn live_outside_window_is_stored_separately() {
    let t = base();
    let coordinator = coordinator(Canned {
        vods: Ok(vec![vod("chan", 1, t - TimeDelta::hours(30)), vod("chan", 2, t)]),
        live: Ok(live("chan", t + TimeDelta::minutes(10))),
    });

    let report = coordinator.query_channel("chan").await;
    assert_eq!(report.live, LiveResolution::Separate);
    assert_eq!(report.stored, 3);

    let window = coordinator.cache().window();
    assert_eq!(window.len(), 3);
    assert!(!window[1].is_live);
    assert!(window[2].is_live);
    assert_eq!(window[2].url, "https://www.twitch.tv/chan");
}

#[tokio::test]
async fn failed_live_status_keeps_vods() {
    let t = base();
    let coordinator = coordinator(Canned {
        vods: Ok(vec![
            vod("chan", 1, t - TimeDelta::hours(2)),
            vod("chan", 2, t - TimeDelta::hours(1)),
            vod("chan", 3, t),
        ]),
        live: Err("no packet".to_string()),
    });

    let report = coordinator.query_channel("chan").await;
    assert_eq!(report.vods_fetched, 3);
    assert_eq!(report.stored, 3);
    assert_eq!(report.live, LiveResolution::Unknown);
    assert!(matches!(
        report.outcome,
        FetchOutcome::Partial {
            failed: SourceKind::LiveStatus,
            ..
        }
    ));
    assert!(coordinator.cache().window().iter().all(|v| !v.is_live));
}

#[tokio::test]
async fn failed_vods_still_record_live() {
    let coordinator = coordinator(Canned {
        vods: Err("connection reset".to_string()),
        live: Ok(live("chan", base())),
    });

    let report = coordinator.query_channel("chan").await;
    assert_eq!(report.live, LiveResolution::Separate);
    assert_eq!(report.stored, 1);
    assert!(matches!(
        report.outcome,
        FetchOutcome::Partial {
            failed: SourceKind::Vods,
            ..
        }
    ));
}

#[tokio::test]
async fn both_sources_failing_stores_nothing() {
    let coordinator = coordinator(Canned {
        vods: Err("down".to_string()),
        live: Err("down".to_string()),
    });

    let report = coordinator.query_channel("chan").await;
    assert!(report.is_failed());
    assert_eq!(report.stored, 0);
    assert!(coordinator.cache().is_empty());
}

#[tokio::test]
async fn offline_channel_stores_only_vods() {
    let coordinator = coordinator(Canned {
        vods: Ok(vec![vod("chan", 1, base())]),
        live: Ok(Video::offline("chan")),
    });

    let report = coordinator.query_channel("chan").await;
    assert_eq!(report.live, LiveResolution::Offline);
    assert_eq!(coordinator.cache().len(), 1);
}

#[tokio::test]
async fn requery_of_live_channel_does_not_duplicate() {
    let t = base();
    let coordinator = coordinator(Canned {
        vods: Ok(vec![vod("chan", 1, t - TimeDelta::hours(30))]),
        live: Ok(live("chan", t)),
    });

    coordinator.query_channel("chan").await;
    let report = coordinator.query_channel("chan").await;
    assert_eq!(report.stored, 0);
    assert_eq!(coordinator.cache().len(), 2);
}

/// Lists VODs normally but panics when asked for live status.
struct PanickingLive;

#[async_trait]
impl VodFetcher for PanickingLive {
    fn name(&self) -> &'static str {
        "panicking-live"
    }

    async fn fetch_vods(&self, channel: &str) -> Result<Vec<Video>, SourceError> {
        Ok(vec![vod(channel, 7, base())])
    }
}

#[async_trait]
impl LiveStatusFetcher for PanickingLive {
    fn name(&self) -> &'static str {
        "panicking-live"
    }

    async fn fetch_live_status(&self, _channel: &str) -> Result<Video, SourceError> {
        panic!("live status parser blew up");
    }
}

#[tokio::test]
async fn panicking_source_keeps_other_source_result() {
    let config = CacheConfig::for_channels(1);
    let cache = SharedCache::from_config(&config).unwrap();
    let source = Arc::new(PanickingLive);
    let coordinator = QueryCoordinator::new(cache, source.clone(), source, &config);

    let report = coordinator.query_channel("chan").await;
    assert!(matches!(
        report.outcome,
        FetchOutcome::Partial {
            failed: SourceKind::LiveStatus,
            ..
        }
    ));
    assert_eq!(report.live, LiveResolution::Unknown);
    assert_eq!(report.stored, 1);
    assert!(coordinator.cache().read().contains("https://www.twitch.tv/videos/7"));
}

/// Tracks how many fetches run at once.
struct Slow {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Slow {
    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VodFetcher for Slow {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn fetch_vods(&self, channel: &str) -> Result<Vec<Video>, SourceError> {
        self.enter().await;
        Ok(vec![vod(channel, channel.len() as u32, base())])
    }
}

#[async_trait]
impl LiveStatusFetcher for Slow {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn fetch_live_status(&self, channel: &str) -> Result<Video, SourceError> {
        self.enter().await;
        Ok(Video::offline(channel))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn query_channels_respects_concurrency_limit() {
    let config = CacheConfig {
        max_concurrent_queries: 2,
        ..CacheConfig::for_channels(6)
    };
    let cache = SharedCache::from_config(&config).unwrap();
    let slow = Arc::new(Slow {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let coordinator = QueryCoordinator::new(cache, slow.clone(), slow.clone(), &config);

    let channels = ["a", "bb", "ccc", "dddd", "eeeee", "ffffff", "a"];
    let batch = coordinator.query_channels(channels).await;

    assert_eq!(batch.total_count(), 6);
    assert!(batch.is_complete());
    assert_eq!(batch.stored_count(), 6);
    // Each query runs its two fetches together.
    let peak = slow.peak.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak in-flight fetches was {peak}");
    assert!(peak >= 2);
}
