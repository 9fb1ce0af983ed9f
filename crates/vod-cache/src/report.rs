//! Per-channel outcome of a query, so callers can judge data freshness
//! without reading logs.

use serde::Serialize;
use std::fmt;

/// Which of the two sources a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vods,
    LiveStatus,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Vods => write!(f, "vods"),
            SourceKind::LiveStatus => write!(f, "live status"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Both sources answered.
    Complete,
    /// One source failed; the other one's records were committed.
    Partial { failed: SourceKind, error: String },
    /// Nothing was learned about the channel.
    Failed {
        vod_error: String,
        live_error: String,
    },
}

/// How the live-status answer was folded into the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveResolution {
    /// The channel is not broadcasting.
    Offline,
    /// A listed VOD matched the live start time and was flagged live.
    MergedIntoVod { url: String },
    /// No VOD matched; the live record was committed on its own.
    Separate,
    /// The live-status source failed.
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    pub outcome: FetchOutcome,
    /// Records returned by the VOD source.
    pub vods_fetched: usize,
    pub live: LiveResolution,
    /// Records actually written to the cache.
    pub stored: usize,
}

impl ChannelReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == FetchOutcome::Complete
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Failed { .. })
    }

    /// Report for a query that never produced an answer.
    pub fn aborted(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            channel: channel.into(),
            outcome: FetchOutcome::Failed {
                vod_error: reason.clone(),
                live_error: reason,
            },
            vods_fetched: 0,
            live: LiveResolution::Unknown,
            stored: 0,
        }
    }
}

/// Reports of a multi-channel query, in completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub reports: Vec<ChannelReport>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: ChannelReport) {
        self.reports.push(report);
    }

    pub fn get(&self, channel: &str) -> Option<&ChannelReport> {
        self.reports.iter().find(|r| r.channel == channel)
    }

    pub fn total_count(&self) -> usize {
        self.reports.len()
    }

    pub fn complete_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_complete()).count()
    }

    pub fn partial_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, FetchOutcome::Partial { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }

    pub fn stored_count(&self) -> usize {
        self.reports.iter().map(|r| r.stored).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.reports.iter().all(ChannelReport::is_complete)
    }
}
