use crate::extractor::default::DEFAULT_UA;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use rustc_hash::FxHashMap;
use std::str::FromStr;
use tracing::debug;

/// Shared request plumbing for a platform: client, default headers and
/// cookies applied to every request.
#[derive(Debug, Clone)]
pub struct Extractor {
    // name of the platform, e.g., "Twitch"
    pub platform_name: String,
    pub client: Client,
    platform_headers: HeaderMap,
    pub cookies: FxHashMap<String, String>,
}

impl Extractor {
    pub fn new<S: Into<String>>(platform_name: S, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        // Do not set `Accept-Encoding` here.
        // Reqwest adds it (and decompresses) when the corresponding crate
        // features are enabled, as long as we don't override the header.

        Self {
            platform_name: platform_name.into(),
            client,
            platform_headers: default_headers,
            cookies: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn set_referer_static(&mut self, referer: &'static str) {
        self.add_header_owned(reqwest::header::REFERER, HeaderValue::from_static(referer));
    }

    pub fn add_header_str<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderName::from_str(key.as_ref()) {
            Ok(name) => self.add_header_typed(name, value),
            Err(e) => {
                debug!(error = %e, "Invalid header name; skipping");
            }
        }
    }

    pub fn add_header_owned<K: Into<HeaderName>, V: Into<HeaderValue>>(
        &mut self,
        key: K,
        value: V,
    ) {
        self.platform_headers.insert(key.into(), value.into());
    }

    pub fn add_header_typed<K: Into<HeaderName>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.platform_headers.insert(key.into(), value);
            }
            Err(e) => {
                debug!(error = %e, "Invalid header value; skipping");
            }
        }
    }

    /// Set cookies from a cookie string (format: "name1=value1; name2=value2").
    pub fn set_cookies_from_string(&mut self, cookie_string: &str) {
        // Accept common separators: ';' from Cookie headers and '\n' from copy/paste.
        for part in cookie_string.split(&[';', '\n'][..]).map(str::trim) {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            self.cookies.insert(name.to_owned(), value.to_owned());
        }
    }

    fn build_cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let cookie_string = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(cookie_string)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Request with the platform headers and stored cookies applied.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut headers = self.platform_headers.clone();

        if let Some(cookie_header) = self.build_cookie_header() {
            match HeaderValue::from_str(&cookie_header) {
                Ok(value) => {
                    headers.insert(reqwest::header::COOKIE, value);
                }
                Err(e) => {
                    // Skip the Cookie header rather than send an invalid value.
                    debug!(error = %e, "Failed to build Cookie header");
                }
            }
        }

        self.client.request(method, url).headers(headers)
    }

    pub fn get_platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }
}
