use thiserror::Error;

/// Failure reported by a data source for one fetch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("missing expected markup: {0}")]
    MissingMarkup(String),
    #[error("invalid channel: {0}")]
    InvalidChannel(String),
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    #[error("other: {0}")]
    Other(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "ring capacity {capacity} cannot hold {channels} channels x {page_size} records per page"
    )]
    CapacityTooSmall {
        capacity: usize,
        channels: usize,
        page_size: usize,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
