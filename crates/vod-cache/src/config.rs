use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::ConfigError;

/// Records requested from a source per fetch.
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;
/// Tolerance for deciding that a live record and a VOD are the same broadcast.
pub const DEFAULT_CORRELATION_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Sizing and scheduling knobs for the cache and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub ring_capacity: usize,
    pub page_size: usize,
    pub max_concurrent_queries: usize,
    pub correlation_window: Duration,
}

impl CacheConfig {
    /// Derive a capacity for `channels` tracked channels: one page plus a
    /// live record each, doubled for headroom.
    pub fn for_channels(channels: usize) -> Self {
        Self::with_page_size(channels, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(channels: usize, page_size: usize) -> Self {
        let ring_capacity = channels
            .saturating_mul(page_size.saturating_add(1))
            .saturating_mul(2)
            .max(1);
        Self {
            ring_capacity,
            page_size,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
            correlation_window: DEFAULT_CORRELATION_WINDOW,
        }
    }

    /// Check that the ring can hold a full page for every channel.
    ///
    /// An undersized ring evicts unread records of other channels, which is
    /// indistinguishable from normal eviction, so callers must refuse to run.
    pub fn validate(&self, channel_count: usize) -> Result<(), ConfigError> {
        if self.ring_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "ring_capacity",
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Zero { field: "page_size" });
        }
        if self.max_concurrent_queries == 0 {
            return Err(ConfigError::Zero {
                field: "max_concurrent_queries",
            });
        }
        if channel_count.saturating_mul(self.page_size) > self.ring_capacity {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.ring_capacity,
                channels: channel_count,
                page_size: self.page_size,
            });
        }
        Ok(())
    }

    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.ring_capacity).ok_or(ConfigError::Zero {
            field: "ring_capacity",
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::for_channels(1)
    }
}
