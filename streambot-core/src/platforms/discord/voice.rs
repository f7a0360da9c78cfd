use std::sync::Arc;

use twilight_cache_inmemory::InMemoryCache;
use twilight_model::id::Id;

use streambot_common::models::VoiceChannel;
use streambot_common::traits::api::VoicePresence;

/// Reads voice states from the gateway-fed cache; no REST calls.
pub struct CacheVoicePresence {
    cache: Arc<InMemoryCache>,
}

impl CacheVoicePresence {
    pub fn new(cache: Arc<InMemoryCache>) -> Self {
        Self { cache }
    }
}

impl VoicePresence for CacheVoicePresence {
    fn voice_channel_of(&self, guild_id: u64, user_id: u64) -> Option<VoiceChannel> {
        let guild_id = Id::new_checked(guild_id)?;
        let user_id = Id::new_checked(user_id)?;

        let channel_id = self.cache.voice_state(user_id, guild_id)?.channel_id();
        let name = self
            .cache
            .channel(channel_id)
            .and_then(|channel| channel.name.clone())
            .unwrap_or_else(|| channel_id.to_string());

        Some(VoiceChannel { id: channel_id.get(), name })
    }
}
