use serde::{Deserialize, Serialize};

/// Body of `POST /play` on the playback service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub guild_id: String,
    pub channel_id: String,
    #[serde(rename = "streamURL")]
    pub stream_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectUser {
    pub name: String,
    pub id: String,
}

/// Body of `POST /disconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectRequest {
    pub user: DisconnectUser,
}
