use async_trait::async_trait;

use crate::error::Error;
use crate::models::inventory::InventoryItem;
use crate::models::playback::{DisconnectRequest, PlayRequest};
use crate::models::voice::VoiceChannel;

/// The companion playback service that joins voice and plays a locator.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    async fn play(&self, request: &PlayRequest) -> Result<(), Error>;
    async fn disconnect(&self, request: &DisconnectRequest) -> Result<(), Error>;
}

/// A media-server inventory (folders containing playable items).
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Every container/folder item the server knows about.
    async fn list_folders(&self) -> Result<Vec<InventoryItem>, Error>;

    /// Playable items below `parent_id`, searched recursively.
    async fn list_playable_items(&self, parent_id: &str) -> Result<Vec<InventoryItem>, Error>;
}

/// Where guild members currently sit in voice, as seen by the gateway.
pub trait VoicePresence: Send + Sync {
    fn voice_channel_of(&self, guild_id: u64, user_id: u64) -> Option<VoiceChannel>;
}
