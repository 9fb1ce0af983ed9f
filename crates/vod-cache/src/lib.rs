//! Bounded, deduplicated cache of channel broadcasts.
//!
//! A [`RingCache`] stores finished VODs and live records keyed by URL,
//! evicting the oldest once full. A [`QueryCoordinator`] fills it by asking a
//! [`VodFetcher`] and a [`LiveStatusFetcher`] about a channel concurrently and
//! merging their answers, so the same broadcast is never listed twice.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod report;
pub mod ring;
pub mod shared;
pub mod source;
pub mod video;

pub use config::CacheConfig;
pub use coordinator::{QueryCoordinator, correlate};
pub use error::{ConfigError, SourceError};
pub use report::{BatchReport, ChannelReport, FetchOutcome, LiveResolution, SourceKind};
pub use ring::RingCache;
pub use shared::{SharedCache, sort_by_latest};
pub use source::{LiveStatusFetcher, VodFetcher};
pub use video::{Chapter, Video};
