mod builder;
mod gql;
mod models;
mod page;

pub use builder::Twitch;
pub use builder::URL_REGEX;
pub use gql::TwitchGql;
pub use page::{TwitchPage, extract_ld_json};
