//! VOD listing and live status through the Twitch GraphQL endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::debug;
use vod_cache::{Chapter, LiveStatusFetcher, SourceError, Video, VodFetcher};

use super::builder::Twitch;
use super::models::{User, VideoNode, VideosResponse};
use crate::extractor::error::ExtractorError;
use crate::extractor::utils::{elapsed_between, parse_rfc3339};

const GQL_API_URL: &str = "https://gql.twitch.tv/gql";

/// How long a channel answer is handed to further callers.
const REUSE_WINDOW: Duration = Duration::from_secs(2);

type ChannelData = (Vec<Video>, Video);
type SharedResult = Result<ChannelData, Arc<ExtractorError>>;

#[derive(Debug)]
struct InflightFetch {
    started: Instant,
    cell: Arc<OnceCell<SharedResult>>,
}

const VIDEOS_QUERY: &str = concat!(
    "query videos($channelOwnerLogin: String!, $limit: Int, $cursor: Cursor, ",
    "$broadcastType: BroadcastType, $videoSort: VideoSort, $options: VideoConnectionOptionsInput) {",
    " user(login: $channelOwnerLogin) {",
    " id",
    " videos(first: $limit, after: $cursor, type: $broadcastType, sort: $videoSort, options: $options) {",
    " edges { cursor node {",
    " __typename id title previewThumbnailURL(width: 320, height: 180) publishedAt lengthSeconds",
    " game { name }",
    " moments(first: 25, after: null, sort: ASC, types: GAME_CHANGE, momentRequestType: VIDEO_CHAPTER_MARKERS) {",
    " edges { node { description positionMilliseconds } }",
    " }",
    " } }",
    " pageInfo { hasNextPage }",
    " }",
    " stream { createdAt }",
    " broadcastSettings { game { name } title }",
    " }",
    "}",
);

/// Twitch source backed by the GraphQL `videos` operation.
///
/// One request answers both questions: the channel's latest VODs and, via
/// `user.stream`, whether it is live. Clones share their in-flight requests,
/// so a VOD fetch and a live-status fetch of the same channel issued
/// together cost a single POST.
#[derive(Debug, Clone)]
pub struct TwitchGql {
    twitch: Twitch,
    inflight: Arc<Mutex<FxHashMap<String, InflightFetch>>>,
}

impl TwitchGql {
    pub fn new(twitch: Twitch) -> Self {
        Self {
            twitch,
            inflight: Arc::default(),
        }
    }

    fn build_videos_request(&self, channel: &str) -> String {
        serde_json::json!([{
            "operationName": "videos",
            "variables": {
                "broadcastType": null,
                "channelOwnerLogin": channel,
                "cursor": null,
                "limit": self.twitch.page_size(),
                "videoSort": "TIME",
            },
            "query": VIDEOS_QUERY,
        }])
        .to_string()
    }

    async fn post_gql(&self, body: String) -> Result<Vec<VideosResponse>, ExtractorError> {
        let response = self
            .twitch
            .extractor()
            .post(GQL_API_URL)
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=UTF-8")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        // Batched requests answer with an array, single ones with an object.
        let responses = match serde_json::from_str::<Vec<VideosResponse>>(&body) {
            Ok(responses) => responses,
            Err(e) => {
                debug!("Failed to parse as array: {}", e);
                vec![serde_json::from_str::<VideosResponse>(&body)?]
            }
        };
        Ok(responses)
    }

    /// Fetch VODs (oldest first) and the live record of `channel`.
    pub async fn fetch_channel(&self, channel: &str) -> Result<(Vec<Video>, Video), ExtractorError> {
        let channel = Twitch::normalize_channel(channel)?;
        let responses = self.post_gql(self.build_videos_request(&channel)).await?;
        parse_videos_response(&channel, responses, self.twitch.page_size(), Utc::now())
    }

    async fn fetch_channel_shared(&self, channel: &str) -> Result<ChannelData, SourceError> {
        let channel = Twitch::normalize_channel(channel)?;
        self.shared_fetch(channel, |channel| async move {
            self.fetch_channel(&channel).await
        })
        .await
    }

    /// Run `fetch` for `channel` unless a call started less than
    /// [`REUSE_WINDOW`] ago, in which case its result is awaited instead.
    async fn shared_fetch<F, Fut>(&self, channel: String, fetch: F) -> Result<ChannelData, SourceError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<ChannelData, ExtractorError>>,
    {
        let cell = {
            let mut inflight = self.inflight.lock();
            inflight.retain(|_, entry| entry.started.elapsed() < REUSE_WINDOW);
            inflight
                .entry(channel.clone())
                .or_insert_with(|| InflightFetch {
                    started: Instant::now(),
                    cell: Arc::new(OnceCell::new()),
                })
                .cell
                .clone()
        };

        let result = cell
            .get_or_init(|| async move { fetch(channel).await.map_err(Arc::new) })
            .await;
        result.clone().map_err(|e| SourceError::from(e.as_ref()))
    }
}

pub(crate) fn parse_videos_response(
    channel: &str,
    responses: Vec<VideosResponse>,
    page_size: usize,
    now: DateTime<Utc>,
) -> Result<(Vec<Video>, Video), ExtractorError> {
    let Some(response) = responses.into_iter().next() else {
        return Err(ExtractorError::ValidationError(
            "empty GraphQL response".to_string(),
        ));
    };

    let Some(data) = response.data else {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(ExtractorError::ValidationError(format!(
            "GraphQL errors: {}",
            messages.join("; ")
        )));
    };
    let user = data.user.ok_or(ExtractorError::StreamerNotFound)?;

    let live = live_from_user(channel, &user, now)?;

    let edges = user.videos.map(|v| v.edges).unwrap_or_default();
    // Edges arrive newest first.
    let mut vods = edges
        .into_iter()
        .take(page_size)
        .map(|edge| vod_from_node(channel, edge.node))
        .collect::<Result<Vec<_>, _>>()?;
    vods.reverse();

    Ok((vods, live))
}

fn vod_from_node(channel: &str, node: VideoNode) -> Result<Video, ExtractorError> {
    let start_time = parse_rfc3339(&node.published_at)?;
    let game = node.game.map(|g| g.name);

    let moments = node.moments.map(|m| m.edges).unwrap_or_default();
    let chapters = if moments.is_empty() {
        game.map(Chapter::whole).into_iter().collect()
    } else {
        moments
            .into_iter()
            .map(|edge| {
                Chapter::new(
                    edge.node.description,
                    Duration::from_millis(edge.node.position_milliseconds),
                )
            })
            .collect()
    };

    Ok(Video {
        title: node.title.unwrap_or_default(),
        channel: channel.to_string(),
        thumbnail_urls: node.preview_thumbnail_url.into_iter().collect(),
        start_time: Some(start_time),
        duration: Duration::from_secs(node.length_seconds),
        is_live: false,
        url: Twitch::vod_url(&node.id),
        chapters,
    })
}

fn live_from_user(channel: &str, user: &User, now: DateTime<Utc>) -> Result<Video, ExtractorError> {
    let Some(stream) = &user.stream else {
        return Ok(Video::offline(channel));
    };
    let start_time = parse_rfc3339(&stream.created_at)?;
    let settings = user.broadcast_settings.as_ref();

    Ok(Video {
        title: settings.and_then(|s| s.title.clone()).unwrap_or_default(),
        channel: channel.to_string(),
        thumbnail_urls: Vec::new(),
        start_time: Some(start_time),
        duration: elapsed_between(start_time, now),
        is_live: true,
        url: Twitch::channel_url(channel),
        chapters: settings
            .and_then(|s| s.game.as_ref())
            .map(|g| Chapter::whole(g.name.clone()))
            .into_iter()
            .collect(),
    })
}

#[async_trait]
impl VodFetcher for TwitchGql {
    fn name(&self) -> &'static str {
        "twitch-gql"
    }

    async fn fetch_vods(&self, channel: &str) -> Result<Vec<Video>, SourceError> {
        let (vods, _) = self.fetch_channel_shared(channel).await?;
        Ok(vods)
    }
}

#[async_trait]
impl LiveStatusFetcher for TwitchGql {
    fn name(&self) -> &'static str {
        "twitch-gql"
    }

    async fn fetch_live_status(&self, channel: &str) -> Result<Video, SourceError> {
        let (_, live) = self.fetch_channel_shared(channel).await?;
        Ok(live)
    }
}
