// File: streambot-core/src/services/playback.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use streambot_common::models::{DisconnectRequest, PlayRequest};
use streambot_common::traits::api::PlaybackApi;

use crate::http::HttpClient;
use crate::Error;

/// Talks to the companion playback service. One request per call, no retries;
/// the caller reports failures to the user.
pub struct PlaybackDispatcher {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl PlaybackDispatcher {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl PlaybackApi for PlaybackDispatcher {
    async fn play(&self, request: &PlayRequest) -> Result<(), Error> {
        let body = serde_json::to_value(request)?;
        match self.http.post_json(self.endpoint("play"), body).await {
            Ok(_) => {
                info!(
                    "Playback started in guild={} channel={}",
                    request.guild_id, request.channel_id
                );
                Ok(())
            }
            Err(e) => {
                error!("Play request failed: {e}");
                Err(into_upstream(e))
            }
        }
    }

    async fn disconnect(&self, request: &DisconnectRequest) -> Result<(), Error> {
        let body = serde_json::to_value(request)?;
        match self.http.post_json(self.endpoint("disconnect"), body).await {
            Ok(_) => {
                info!("Playback disconnected by {} ({})", request.user.name, request.user.id);
                Ok(())
            }
            Err(e) => {
                error!("Disconnect request failed: {e}");
                Err(into_upstream(e))
            }
        }
    }
}

fn into_upstream(e: Error) -> Error {
    match e {
        Error::UpstreamUnavailable(_) => e,
        other => Error::UpstreamUnavailable(other.to_string()),
    }
}
