//! streambot-server/src/context.rs
//!
//! Wires the core services together from a loaded `BotConfig`.

use std::sync::Arc;

use tracing::info;

use streambot_core::catalog::{CatalogStore, InventoryImporter, JellyfinClient, PlaylistImporter};
use streambot_core::platforms::discord::DiscordPlatform;
use streambot_core::services::selection::SessionTable;
use streambot_core::services::{PlaybackDispatcher, StreamService};
use streambot_core::tasks::CatalogRefresher;
use streambot_core::{BotConfig, DefaultHttpClient, Error, HttpClient};

use crate::Args;

pub struct ServerContext {
    pub config: BotConfig,
    pub catalog: Arc<CatalogStore>,
    pub refresher: Arc<CatalogRefresher>,
    pub stream_service: Arc<StreamService>,
    pub discord: DiscordPlatform,
}

impl ServerContext {
    pub fn new(config: BotConfig, args: &Args) -> Result<Self, Error> {
        let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new());
        let catalog = Arc::new(CatalogStore::new());

        let playlist = PlaylistImporter::new(
            http.clone(),
            config.playlist_urls.clone(),
            config.playlist_path.clone(),
        );
        let inventory = match &config.inventory {
            Some(inv) => {
                info!("Inventory import enabled for {} folder(s) at {}", inv.folders.len(), inv.base_url);
                let client = JellyfinClient::new(http.clone(), &inv.base_url, inv.api_key.clone())?;
                Some(InventoryImporter::new(Arc::new(client), inv.folders.clone(), inv.prefix.clone()))
            }
            None => None,
        };
        let refresher = Arc::new(CatalogRefresher::new(catalog.clone(), Some(playlist), inventory));

        let mut discord = DiscordPlatform::new(
            config.discord_token.clone(),
            config.application_id,
            config.guild_id,
        );
        discord.register_commands = !args.skip_command_registration;

        let stream_service = Arc::new(StreamService::new(
            catalog.clone(),
            Arc::new(SessionTable::new()),
            Arc::new(PlaybackDispatcher::new(http, &config.playback_url)),
            discord.voice_presence(),
            config.filter.clone(),
            config.selection,
        ));
        discord.set_stream_service(stream_service.clone());

        Ok(Self {
            config,
            catalog,
            refresher,
            stream_service,
            discord,
        })
    }
}
