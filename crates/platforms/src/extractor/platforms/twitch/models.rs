use serde::Deserialize;

// GraphQL `videos` operation.

#[derive(Debug, Deserialize)]
pub struct VideosResponse {
    pub data: Option<VideosData>,
    #[serde(default)]
    pub errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VideosData {
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub videos: Option<VideoConnection>,
    pub stream: Option<Stream>,
    pub broadcast_settings: Option<BroadcastSettings>,
}

#[derive(Debug, Deserialize)]
pub struct VideoConnection {
    #[serde(default)]
    pub edges: Vec<VideoEdge>,
}

#[derive(Debug, Deserialize)]
pub struct VideoEdge {
    pub node: VideoNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoNode {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "previewThumbnailURL")]
    pub preview_thumbnail_url: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub length_seconds: u64,
    pub game: Option<Game>,
    pub moments: Option<MomentConnection>,
}

#[derive(Debug, Deserialize)]
pub struct Game {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MomentConnection {
    #[serde(default)]
    pub edges: Vec<MomentEdge>,
}

#[derive(Debug, Deserialize)]
pub struct MomentEdge {
    pub node: Moment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    pub description: String,
    pub position_milliseconds: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastSettings {
    pub title: Option<String>,
    pub game: Option<Game>,
}

// JSON-LD packets embedded in page heads.

#[derive(Debug, Deserialize)]
pub struct LdGraph {
    #[serde(rename = "@graph", default)]
    pub graph: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdItemList {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default)]
    pub item_list_element: Vec<LdVideoObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdVideoObject {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub thumbnail_url: Vec<String>,
    pub upload_date: Option<String>,
    pub duration: Option<String>,
    pub publication: Option<LdPublication>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdPublication {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_live_broadcast: bool,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}
