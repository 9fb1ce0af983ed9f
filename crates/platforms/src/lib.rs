//! Twitch adapters for the [`vod_cache`] source traits.
//!
//! Two interchangeable sources are provided:
//!
//! - [`TwitchGql`] queries the GraphQL endpoint and yields chapter markers.
//! - [`TwitchPage`] reads the JSON-LD packet embedded in channel pages.
//!
//! Both implement [`vod_cache::VodFetcher`] and [`vod_cache::LiveStatusFetcher`].

pub mod extractor;

pub use extractor::error::ExtractorError;
pub use extractor::platforms::twitch::{Twitch, TwitchGql, TwitchPage};
pub use extractor::{DEFAULT_TIMEOUT, default_client};
