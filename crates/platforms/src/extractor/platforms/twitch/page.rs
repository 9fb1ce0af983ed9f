//! VOD listing and live status scraped from the JSON-LD packet Twitch
//! embeds in the `<head>` of its channel pages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;
use vod_cache::{LiveStatusFetcher, SourceError, Video, VodFetcher};

use super::builder::Twitch;
use super::models::{LdGraph, LdItemList, LdVideoObject};
use crate::extractor::error::ExtractorError;
use crate::extractor::utils::{capture_group_1, elapsed_between, parse_iso8601_duration, parse_rfc3339};

static HEAD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head>").unwrap());

static LD_JSON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*\btype\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .unwrap()
});

/// Twitch source that reads channel pages instead of the API.
#[derive(Debug, Clone)]
pub struct TwitchPage {
    twitch: Twitch,
}

impl TwitchPage {
    pub fn new(twitch: Twitch) -> Self {
        Self { twitch }
    }

    async fn get_page(&self, url: &str) -> Result<String, ExtractorError> {
        let response = self
            .twitch
            .extractor()
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    pub async fn scrape_vods(&self, channel: &str) -> Result<Vec<Video>, ExtractorError> {
        let channel = Twitch::normalize_channel(channel)?;
        let url = format!("{}/videos", Twitch::channel_url(&channel));
        let html = self.get_page(&url).await?;
        let packet = extract_ld_json(&html)
            .ok_or_else(|| ExtractorError::MissingPacket(url.clone()))?;
        parse_vods_packet(&channel, packet, self.twitch.page_size())
    }

    pub async fn scrape_live_status(&self, channel: &str) -> Result<Video, ExtractorError> {
        let channel = Twitch::normalize_channel(channel)?;
        let url = Twitch::channel_url(&channel);
        let html = self.get_page(&url).await?;
        match extract_ld_json(&html) {
            Some(packet) => parse_live_packet(&channel, packet, Utc::now()),
            None => {
                debug!(channel = %channel, "No JSON-LD packet on channel page, treating as offline");
                Ok(Video::offline(&channel))
            }
        }
    }
}

/// Body of the first `application/ld+json` script inside `<head>`.
pub fn extract_ld_json(html: &str) -> Option<&str> {
    let head = capture_group_1(&HEAD_REGEX, html)?;
    capture_group_1(&LD_JSON_REGEX, head)
        .map(str::trim)
        .filter(|packet| !packet.is_empty())
}

pub(crate) fn parse_live_packet(
    channel: &str,
    packet: &str,
    now: DateTime<Utc>,
) -> Result<Video, ExtractorError> {
    let graph: LdGraph = serde_json::from_str(packet)?;
    let Some(node) = graph.graph.into_iter().next() else {
        return Ok(Video::offline(channel));
    };
    let node: LdVideoObject = serde_json::from_value(node)?;

    let Some(publication) = node.publication.filter(|p| p.is_live_broadcast) else {
        return Ok(Video::offline(channel));
    };
    let start_date = publication.start_date.as_deref().ok_or_else(|| {
        ExtractorError::ValidationError("live publication without startDate".to_string())
    })?;
    let start = parse_rfc3339(start_date)?;
    let end = match publication.end_date.as_deref() {
        Some(end_date) => parse_rfc3339(end_date)?,
        None => now,
    };

    Ok(Video {
        title: node.description,
        channel: channel.to_string(),
        thumbnail_urls: node.thumbnail_url,
        start_time: Some(start),
        duration: elapsed_between(start, end),
        is_live: true,
        url: Twitch::channel_url(channel),
        chapters: Vec::new(),
    })
}

pub(crate) fn parse_vods_packet(
    channel: &str,
    packet: &str,
    page_size: usize,
) -> Result<Vec<Video>, ExtractorError> {
    let graph: LdGraph = serde_json::from_str(packet)?;
    let list = graph
        .graph
        .into_iter()
        .find_map(|node| {
            serde_json::from_value::<LdItemList>(node)
                .ok()
                .filter(|list| list.kind == "ItemList")
        })
        .ok_or_else(|| ExtractorError::MissingPacket("ItemList".to_string()))?;

    // The list is newest first.
    let mut vods = Vec::with_capacity(page_size.min(list.item_list_element.len()));
    for item in list.item_list_element {
        if vods.len() >= page_size {
            break;
        }
        match Url::parse(&item.url) {
            Ok(url) if url.path().starts_with("/videos") => {}
            Ok(_) => {
                trace!(url = %item.url, "Skipping non-VOD entry");
                continue;
            }
            Err(e) => {
                debug!(url = %item.url, error = %e, "Failed to parse VOD url");
                continue;
            }
        }

        let Some(upload_date) = item.upload_date.as_deref() else {
            debug!(url = %item.url, "VOD entry without uploadDate");
            continue;
        };
        let start = parse_rfc3339(upload_date)?;
        let duration = match item.duration.as_deref().and_then(parse_iso8601_duration) {
            Some(duration) => duration,
            None => {
                debug!(url = %item.url, duration = ?item.duration, "Failed to parse duration");
                Duration::ZERO
            }
        };

        vods.push(Video {
            title: item.name,
            channel: channel.to_string(),
            thumbnail_urls: item.thumbnail_url,
            start_time: Some(start),
            duration,
            is_live: false,
            url: item.url,
            chapters: Vec::new(),
        });
    }
    vods.reverse();
    Ok(vods)
}

#[async_trait]
impl VodFetcher for TwitchPage {
    fn name(&self) -> &'static str {
        "twitch-page"
    }

    async fn fetch_vods(&self, channel: &str) -> Result<Vec<Video>, SourceError> {
        Ok(self.scrape_vods(channel).await?)
    }
}

#[async_trait]
impl LiveStatusFetcher for TwitchPage {
    fn name(&self) -> &'static str {
        "twitch-page"
    }

    async fn fetch_live_status(&self, channel: &str) -> Result<Video, SourceError> {
        Ok(self.scrape_live_status(channel).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LIVE_PAGE: &str = r#"<!DOCTYPE html><html lang="en"><head>
<meta charset="utf-8"><title>chan - Twitch</title>
<script type="application/ld+json">{"@context":"http://schema.org","@graph":[{"@type":"VideoObject","description":"speedrun attempts","embedUrl":"https://player.twitch.tv/?channel=chan","name":"chan - Twitch","thumbnailUrl":["https://thumb/live-320.jpg","https://thumb/live-640.jpg"],"uploadDate":"2025-11-12T15:06:12Z","publication":{"@type":"BroadcastEvent","endDate":"2025-11-12T17:06:12Z","startDate":"2025-11-12T15:06:12Z","isLiveBroadcast":true}}]}</script>
</head><body><script type="application/ld+json">{"ignored": true}</script></body></html>"#;

    const VIDEOS_PAGE: &str = r#"<html><head>
<script type='application/ld+json'>
{"@context":"http://schema.org","@graph":[
  {"@type":"WebPage","name":"chan videos"},
  {"@type":"ItemList","itemListElement":[
    {"@type":"VideoObject","name":"third","url":"https://www.twitch.tv/videos/3","thumbnailUrl":["https://thumb/3.jpg"],"uploadDate":"2025-11-03T12:00:00Z","duration":"PT2H"},
    {"@type":"VideoObject","name":"clip","url":"https://www.twitch.tv/chan/clip/Abc","uploadDate":"2025-11-02T12:00:00Z","duration":"PT30S"},
    {"@type":"VideoObject","name":"second","url":"https://www.twitch.tv/videos/2","thumbnailUrl":"https://thumb/2.jpg","uploadDate":"2025-11-02T10:00:00Z","duration":"bogus"},
    {"@type":"VideoObject","name":"first","url":"https://www.twitch.tv/videos/1","uploadDate":"2025-11-01T10:00:00Z","duration":"PT1H2M3S"}
  ]}
]}
</script></head><body></body></html>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 12, 18, 0, 0).single().unwrap()
    }

    #[test]
    fn test_extract_ld_json_reads_head_only() {
        let packet = extract_ld_json(LIVE_PAGE).unwrap();
        assert!(packet.starts_with('{'));
        assert!(packet.contains("BroadcastEvent"));

        let body_only = r#"<html><head></head><body><script type="application/ld+json">{}</script></body></html>"#;
        assert_eq!(extract_ld_json(body_only), None);
        assert_eq!(extract_ld_json("not html at all"), None);
    }

    #[test]
    fn test_parse_live_packet() {
        let packet = extract_ld_json(LIVE_PAGE).unwrap();
        let live = parse_live_packet("chan", packet, now()).unwrap();
        assert!(live.is_live);
        assert_eq!(live.title, "speedrun attempts");
        assert_eq!(live.url, "https://www.twitch.tv/chan");
        assert_eq!(live.duration, Duration::from_secs(2 * 3600));
        assert_eq!(live.thumbnail_urls.len(), 2);
        assert_eq!(
            live.start_time,
            Utc.with_ymd_and_hms(2025, 11, 12, 15, 6, 12).single()
        );
    }

    #[test]
    fn test_parse_live_packet_not_broadcasting() {
        let packet = r#"{"@graph":[{"@type":"VideoObject","description":"x","publication":{"isLiveBroadcast":false}}]}"#;
        assert!(parse_live_packet("chan", packet, now()).unwrap().is_offline());

        let empty = r#"{"@graph":[]}"#;
        assert!(parse_live_packet("chan", empty, now()).unwrap().is_offline());

        assert!(matches!(
            parse_live_packet("chan", "{not json", now()),
            Err(ExtractorError::JsonError(_))
        ));
    }

    #[test]
    fn test_parse_vods_packet() {
        let packet = extract_ld_json(VIDEOS_PAGE).unwrap();
        let vods = parse_vods_packet("chan", packet, 10).unwrap();

        let titles: Vec<&str> = vods.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        assert_eq!(vods[0].duration, Duration::from_secs(3723));
        assert_eq!(vods[1].duration, Duration::ZERO);
        assert_eq!(vods[1].thumbnail_urls, vec!["https://thumb/2.jpg"]);
        assert_eq!(vods[2].duration, Duration::from_secs(7200));
        assert!(vods.iter().all(|v| !v.is_live && v.chapters.is_empty()));
    }

    #[test]
    fn test_parse_vods_packet_keeps_newest_page() {
        let packet = extract_ld_json(VIDEOS_PAGE).unwrap();
        let vods = parse_vods_packet("chan", packet, 2).unwrap();
        let titles: Vec<&str> = vods.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "third"]);
    }

    #[test]
    fn test_parse_vods_packet_oversized_duration_is_zero() {
        let packet = r#"{"@graph":[{"@type":"ItemList","itemListElement":[
            {"@type":"VideoObject","name":"huge","url":"https://www.twitch.tv/videos/9","uploadDate":"2025-11-01T10:00:00Z","duration":"PT99999999999999999999S"},
            {"@type":"VideoObject","name":"long","url":"https://www.twitch.tv/videos/8","uploadDate":"2025-10-31T10:00:00Z","duration":"PT5124095576030432H"}
        ]}]}"#;
        let vods = parse_vods_packet("chan", packet, 10).unwrap();
        assert_eq!(vods.len(), 2);
        assert!(vods.iter().all(|v| v.duration == Duration::ZERO));
    }

    #[test]
    fn test_parse_vods_packet_without_list() {
        let packet = r#"{"@graph":[{"@type":"WebPage"}]}"#;
        assert!(matches!(
            parse_vods_packet("chan", packet, 10),
            Err(ExtractorError::MissingPacket(_))
        ));
    }
}
