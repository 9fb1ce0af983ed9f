use thiserror::Error;
use vod_cache::SourceError;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid channel: {0}")]
    InvalidChannel(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("tls error: {0}")]
    TlsError(#[from] rustls::Error),
    #[error("metadata packet not found on {0}")]
    MissingPacket(String),
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("streamer not found")]
    StreamerNotFound,
    #[error("validation error: {0}")]
    ValidationError(String),
}

impl From<&ExtractorError> for SourceError {
    fn from(err: &ExtractorError) -> Self {
        match err {
            ExtractorError::InvalidChannel(channel) => SourceError::InvalidChannel(channel.clone()),
            ExtractorError::HttpError(e) => SourceError::Network(e.to_string()),
            ExtractorError::TlsError(e) => SourceError::Network(e.to_string()),
            ExtractorError::JsonError(e) => SourceError::Decode(e.to_string()),
            ExtractorError::InvalidTimestamp { .. } => SourceError::Decode(err.to_string()),
            ExtractorError::MissingPacket(page) => SourceError::MissingMarkup(page.clone()),
            ExtractorError::StreamerNotFound => SourceError::ChannelNotFound(err.to_string()),
            ExtractorError::ValidationError(reason) => SourceError::Other(reason.clone()),
        }
    }
}

impl From<ExtractorError> for SourceError {
    fn from(err: ExtractorError) -> Self {
        SourceError::from(&err)
    }
}
