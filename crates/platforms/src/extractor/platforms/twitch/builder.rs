use std::sync::LazyLock;

use rand::RngExt;
use regex::Regex;
use reqwest::Client;

use crate::extractor::error::ExtractorError;
use crate::extractor::platform_extractor::Extractor;
use crate::extractor::utils::capture_group_1;

pub static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(?:www\.)?twitch\.tv/([^/?#]+)").unwrap());

static CHANNEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Request context shared by the Twitch sources.
#[derive(Debug, Clone)]
pub struct Twitch {
    extractor: Extractor,
    page_size: usize,
}

impl Twitch {
    pub const BASE_URL: &str = "https://www.twitch.tv";
    const CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

    pub fn new(client: Client, page_size: usize) -> Self {
        let mut extractor = Extractor::new("Twitch", client);

        extractor.add_header_typed(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        extractor.set_referer_static(Self::BASE_URL);
        extractor.add_header_str("device-id", Self::get_device_id());
        extractor.add_header_str("Client-Id", Self::CLIENT_ID);

        Self {
            extractor,
            page_size: page_size.max(1),
        }
    }

    pub fn with_oauth_token(mut self, token: &str) -> Self {
        self.extractor
            .add_header_typed(reqwest::header::AUTHORIZATION, format!("OAuth {token}"));
        self
    }

    pub fn with_cookies(mut self, cookies: &str) -> Self {
        self.extractor.set_cookies_from_string(cookies);
        self
    }

    fn get_device_id() -> String {
        // random device id of 16 digits
        format!(
            "{}",
            rand::rng().random_range(1000000000000000i64..9999999999999999i64)
        )
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub(crate) fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Reduce a channel name or channel URL to the bare login name.
    ///
    /// Logins are case-insensitive on Twitch, so the result is lowercase.
    pub fn normalize_channel(input: &str) -> Result<String, ExtractorError> {
        let input = input.trim();
        let channel = capture_group_1(&URL_REGEX, input).unwrap_or(input);
        if CHANNEL_REGEX.is_match(channel) {
            Ok(channel.to_ascii_lowercase())
        } else {
            Err(ExtractorError::InvalidChannel(input.to_string()))
        }
    }

    /// Page of the channel; also the key of its live record.
    pub fn channel_url(channel: &str) -> String {
        format!("{}/{channel}", Self::BASE_URL)
    }

    pub fn vod_url(id: &str) -> String {
        format!("{}/videos/{id}", Self::BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_channel() {
        assert_eq!(Twitch::normalize_channel("some_chan").unwrap(), "some_chan");
        assert_eq!(
            Twitch::normalize_channel("https://www.twitch.tv/some_chan/videos?filter=all").unwrap(),
            "some_chan"
        );
        assert_eq!(
            Twitch::normalize_channel(" https://twitch.tv/Chan42 ").unwrap(),
            "chan42"
        );
        assert_eq!(
            Twitch::normalize_channel("Some_Chan").unwrap(),
            Twitch::normalize_channel("some_chan").unwrap()
        );
        assert!(matches!(
            Twitch::normalize_channel("a/b"),
            Err(ExtractorError::InvalidChannel(_))
        ));
        assert!(Twitch::normalize_channel("").is_err());
    }

    #[test]
    fn test_platform_headers() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let twitch = Twitch::new(Client::new(), 0)
            .with_oauth_token("secret")
            .with_cookies("unique_id=abc");
        let headers = twitch.extractor().get_platform_headers();

        assert_eq!(headers.get("client-id").unwrap(), Twitch::CLIENT_ID);
        assert_eq!(headers.get("authorization").unwrap(), "OAuth secret");
        assert_eq!(headers.get("device-id").unwrap().len(), 16);
        assert_eq!(twitch.extractor().cookies.len(), 1);
        assert_eq!(twitch.page_size(), 1);
    }

    #[test]
    fn test_urls() {
        assert_eq!(Twitch::channel_url("chan"), "https://www.twitch.tv/chan");
        assert_eq!(Twitch::vod_url("123"), "https://www.twitch.tv/videos/123");
    }
}
