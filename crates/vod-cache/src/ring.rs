//! Fixed-capacity ring of videos with a per-key index.
//!
//! The ring keeps two cursors. `start` is always a slot index, `close` counts
//! writes and is folded back into `[capacity, 2 * capacity)` once the ring
//! has wrapped, so the live window is `start..close` taken modulo the
//! capacity whether or not the ring has completed a lap.

use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use crate::video::Video;

#[derive(Debug, Clone)]
pub struct RingCache {
    buffer: Vec<Option<Arc<Video>>>,
    latest: FxHashMap<String, Arc<Video>>,
    start: usize,
    close: usize,
}

impl RingCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        let mut latest = FxHashMap::default();
        // Keys are removed before a lap overwrites them, so the map never
        // holds more than one ring's worth of entries.
        latest.reserve(capacity);
        Self {
            buffer: vec![None; capacity],
            latest,
            start: 0,
            close: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of slots inside the window.
    pub fn len(&self) -> usize {
        self.close - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.close == self.start
    }

    /// Cursor of the oldest surviving slot.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Cursor one past the newest slot.
    pub fn close(&self) -> usize {
        self.close
    }

    /// Append a batch in order, skipping records whose key is already indexed.
    ///
    /// Once the ring is full, the slots the whole batch would occupy are
    /// dropped from the index before any record is examined. A batch carrying
    /// duplicates therefore releases more slots than it fills, and the
    /// leftover oldest slots stay in the window without an index entry until
    /// they are overwritten. Only the newest `capacity` records of an
    /// oversized batch are considered.
    ///
    /// Returns the number of records written.
    pub fn insert(&mut self, batch: Vec<Video>) -> usize {
        let capacity = self.capacity();
        let skip = batch.len().saturating_sub(capacity);
        if skip > 0 {
            debug!(
                batch = batch.len(),
                capacity, "batch exceeds ring capacity, keeping newest records"
            );
        }
        let batch = batch.into_iter().skip(skip);

        // Slots at cursor positions below `capacity` have never been written.
        let reserved = batch.len();
        for position in (self.close..self.close + reserved).filter(|&p| p >= capacity) {
            if let Some(old) = &self.buffer[position % capacity] {
                self.latest.remove(&old.url);
            }
        }

        let mut stored = 0;
        for video in batch {
            if self.latest.contains_key(&video.url) {
                continue;
            }
            let video = Arc::new(video);
            self.latest.insert(video.url.clone(), Arc::clone(&video));
            self.buffer[self.close % capacity] = Some(video);
            self.close += 1;
            stored += 1;
        }

        if self.close > capacity {
            self.close = (self.close % capacity) + capacity;
            self.start = self.close;
        }
        self.start %= capacity;

        debug_assert!(self.start < capacity, "start cursor escaped the ring");
        debug_assert!(
            self.close >= self.start && self.close - self.start <= capacity,
            "window exceeds capacity"
        );
        stored
    }

    /// Oldest-to-newest iteration over the window.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Video>> + '_ {
        let capacity = self.capacity();
        (self.start..self.close).filter_map(move |i| self.buffer[i % capacity].as_ref())
    }

    pub fn window(&self) -> Vec<Arc<Video>> {
        self.iter().cloned().collect()
    }

    pub fn latest_by_key(&self) -> &FxHashMap<String, Arc<Video>> {
        &self.latest
    }

    pub fn get(&self, url: &str) -> Option<&Arc<Video>> {
        self.latest.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.latest.contains_key(url)
    }
}
