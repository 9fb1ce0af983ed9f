//! Fetches a channel from both sources, reconciles the answers and commits
//! them to the shared cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::SourceError;
use crate::report::{BatchReport, ChannelReport, FetchOutcome, LiveResolution, SourceKind};
use crate::shared::SharedCache;
use crate::source::{LiveStatusFetcher, VodFetcher};
use crate::video::Video;

/// Flag the VOD describing the same broadcast as `live`.
///
/// Scans from the most recent VOD backwards and marks the first one whose
/// start lies strictly within `window` of the live start. Returns its index.
pub fn correlate(vods: &mut [Video], live: &Video, window: Duration) -> Option<usize> {
    if !live.is_live {
        return None;
    }
    let live_start = live.start_time?;
    let window = chrono::Duration::from_std(window).ok()?;

    let index = vods.iter().rposition(|vod| {
        vod.start_time
            .is_some_and(|start| (start - live_start).abs() < window)
    })?;
    vods[index].is_live = true;
    Some(index)
}

fn task_failed(err: JoinError) -> SourceError {
    SourceError::Other(format!("fetch task failed: {err}"))
}

#[derive(Clone)]
pub struct QueryCoordinator {
    cache: SharedCache,
    vod_fetcher: Arc<dyn VodFetcher>,
    live_fetcher: Arc<dyn LiveStatusFetcher>,
    // Bounds concurrent channel queries; never closed.
    limiter: Arc<Semaphore>,
    correlation_window: Duration,
}

impl QueryCoordinator {
    pub fn new(
        cache: SharedCache,
        vod_fetcher: Arc<dyn VodFetcher>,
        live_fetcher: Arc<dyn LiveStatusFetcher>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            cache,
            vod_fetcher,
            live_fetcher,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_queries.max(1))),
            correlation_window: config.correlation_window,
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Query both sources for `channel` and commit the merged result.
    ///
    /// Source failures are logged and reported, never propagated: a failed
    /// source contributes no records. Each fetch runs as its own task, so a
    /// fetcher that panics fails only its own source.
    pub async fn query_channel(&self, channel: &str) -> ChannelReport {
        let _permit = self.limiter.acquire().await.ok();

        let vod_task = tokio::spawn({
            let fetcher = Arc::clone(&self.vod_fetcher);
            let channel = channel.to_string();
            async move { fetcher.fetch_vods(&channel).await }
        });
        let live_task = tokio::spawn({
            let fetcher = Arc::clone(&self.live_fetcher);
            let channel = channel.to_string();
            async move { fetcher.fetch_live_status(&channel).await }
        });
        let (vods, live) = tokio::join!(vod_task, live_task);
        let vods = vods.unwrap_or_else(|e| Err(task_failed(e)));
        let live = live.unwrap_or_else(|e| Err(task_failed(e)));

        let (mut vods, vod_error) = match vods {
            Ok(vods) => (vods, None),
            Err(e) => {
                warn!(channel = %channel, source = self.vod_fetcher.name(), error = %e, "VOD fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
        };
        let (live, live_error) = match live {
            Ok(live) => (Some(live), None),
            Err(e) => {
                warn!(channel = %channel, source = self.live_fetcher.name(), error = %e, "live status fetch failed");
                (None, Some(e.to_string()))
            }
        };

        let vods_fetched = vods.len();
        let resolution = match &live {
            None => LiveResolution::Unknown,
            Some(live) if !live.is_live => LiveResolution::Offline,
            Some(live) => match correlate(&mut vods, live, self.correlation_window) {
                Some(index) => LiveResolution::MergedIntoVod {
                    url: vods[index].url.clone(),
                },
                None => LiveResolution::Separate,
            },
        };
        debug!(channel = %channel, vods = vods_fetched, live = ?resolution, "merged sources");

        let stored = {
            let mut ring = self.cache.write();
            let mut stored = ring.insert(vods);
            if resolution == LiveResolution::Separate
                && let Some(live) = live
            {
                stored += ring.insert(vec![live]);
            }
            stored
        };

        let outcome = match (vod_error, live_error) {
            (None, None) => FetchOutcome::Complete,
            (Some(error), None) => FetchOutcome::Partial {
                failed: SourceKind::Vods,
                error,
            },
            (None, Some(error)) => FetchOutcome::Partial {
                failed: SourceKind::LiveStatus,
                error,
            },
            (Some(vod_error), Some(live_error)) => FetchOutcome::Failed {
                vod_error,
                live_error,
            },
        };

        ChannelReport {
            channel: channel.to_string(),
            outcome,
            vods_fetched,
            live: resolution,
            stored,
        }
    }

    /// Query every channel, at most `max_concurrent_queries` at a time.
    ///
    /// Duplicate channel names are queried once. A query task that dies is
    /// reported as failed for its channel.
    pub async fn query_channels<I, S>(&self, channels: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for channel in channels {
            let channel = channel.into();
            if !unique.contains(&channel) {
                unique.push(channel);
            }
        }

        let mut tasks = JoinSet::new();
        for channel in unique.iter().cloned() {
            let coordinator = self.clone();
            tasks.spawn(async move { coordinator.query_channel(&channel).await });
        }

        let mut batch = BatchReport::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => batch.push(report),
                Err(e) => warn!(error = %e, "channel query task failed"),
            }
        }
        for channel in unique {
            if batch.get(&channel).is_none() {
                batch.push(ChannelReport::aborted(channel, "query task did not finish"));
            }
        }

        info!(
            channels = batch.total_count(),
            complete = batch.complete_count(),
            partial = batch.partial_count(),
            failed = batch.failed_count(),
            stored = batch.stored_count(),
            "channel queries finished"
        );
        batch
    }
}
