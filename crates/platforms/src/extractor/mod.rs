pub mod error;
pub mod platform_extractor;
pub mod platforms;
pub mod utils;
mod default;

pub use default::{DEFAULT_TIMEOUT, default_client};
