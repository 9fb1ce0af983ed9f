use async_trait::async_trait;

use crate::error::SourceError;
use crate::video::Video;

/// Lists finished broadcasts of a channel, oldest first.
#[async_trait]
pub trait VodFetcher: Send + Sync {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    async fn fetch_vods(&self, channel: &str) -> Result<Vec<Video>, SourceError>;
}

/// Reports whether a channel is currently broadcasting.
///
/// An offline channel is not an error: implementations return
/// [`Video::offline`] for it.
#[async_trait]
pub trait LiveStatusFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_live_status(&self, channel: &str) -> Result<Video, SourceError>;
}
