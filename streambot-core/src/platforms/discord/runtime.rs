use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    Shard,
    MessageSender,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};
use twilight_model::id::Id;

use crate::Error;
use crate::platforms::discord::voice::CacheVoicePresence;
use crate::services::discord::slashcommands::{
    handle_interaction_create, register_guild_slash_commands, InteractionContext,
};
use crate::services::stream_service::StreamService;
use streambot_common::traits::platform_traits::{ConnectionStatus, PlatformAuth, PlatformIntegration};

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - updates the in-memory cache (voice states, channels)
///   - hands each interaction to its own task so a slow upstream call never
///     stalls the gateway loop.
async fn shard_runner(
    mut shard: Shard,
    cache: Arc<InMemoryCache>,
    ctx: Option<InteractionContext>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);

                match event {
                    Event::Ready(ready) => {
                        let data: &ReadyPayload = ready.as_ref();
                        info!(
                            "Shard {shard_id} => READY as {} (ID={})",
                            data.user.name, data.user.id
                        );
                    }
                    Event::InteractionCreate(interaction) => {
                        let Some(ctx) = ctx.clone() else {
                            warn!("Interaction received before the stream service was attached");
                            continue;
                        };
                        tokio::spawn(async move {
                            handle_interaction_create(&ctx, &interaction).await;
                        });
                    }
                    Event::VoiceStateUpdate(update) => {
                        debug!(
                            "Voice state => user {} channel {:?}",
                            update.user_id, update.channel_id
                        );
                    }
                    other => {
                        trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Gateway connection plus the REST client and cache the handlers share.
pub struct DiscordPlatform {
    pub token: String,
    pub application_id: Id<ApplicationMarker>,
    pub guild_id: Id<GuildMarker>,
    pub register_commands: bool,
    pub connection_status: ConnectionStatus,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Arc<InMemoryCache>,
    pub stream_service: Option<Arc<StreamService>>,
}

impl DiscordPlatform {
    pub fn new(
        token: String,
        application_id: Id<ApplicationMarker>,
        guild_id: Id<GuildMarker>,
    ) -> Self {
        let cache: InMemoryCache = InMemoryCache::builder()
            .resource_types(ResourceType::GUILD | ResourceType::CHANNEL | ResourceType::VOICE_STATE)
            .build();

        Self {
            token,
            application_id,
            guild_id,
            register_commands: true,
            connection_status: ConnectionStatus::Disconnected,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
            cache: Arc::new(cache),
            stream_service: None,
        }
    }

    /// Voice lookups backed by this platform's cache.
    pub fn voice_presence(&self) -> Arc<CacheVoicePresence> {
        Arc::new(CacheVoicePresence::new(Arc::clone(&self.cache)))
    }

    pub fn set_stream_service(&mut self, service: Arc<StreamService>) {
        self.stream_service = Some(service);
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }
}

/// Connect: build the REST client, register commands, spawn the shard runners.
#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        self.authenticate().await?;

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build()
        );
        self.http = Some(http_client.clone());

        if self.register_commands {
            info!("Started refreshing application (/) commands.");
            match register_guild_slash_commands(&http_client, self.application_id, self.guild_id).await {
                Ok(count) => info!("Successfully reloaded {count} application (/) commands."),
                Err(e) => error!("Error registering application commands: {e}"),
            }
        }

        let ctx = self.stream_service.clone().map(|service| InteractionContext {
            http: http_client.clone(),
            application_id: self.application_id,
            service,
        });

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_VOICE_STATES,
        );

        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let cache_for_shard = self.cache.clone();
            let ctx_for_shard = ctx.clone();

            let handle = tokio::spawn(async move {
                shard_runner(shard, cache_for_shard, ctx_for_shard).await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(token: &str) -> DiscordPlatform {
        DiscordPlatform::new(token.to_string(), Id::new(1234), Id::new(5678))
    }

    #[tokio::test]
    async fn empty_token_never_connects() {
        let mut discord = platform("");

        assert!(matches!(discord.connect().await, Err(Error::Auth(_))));
        assert_eq!(discord.connection_status, ConnectionStatus::Disconnected);
        assert!(discord.http.is_none());
    }

    #[tokio::test]
    async fn disconnect_before_connect_is_harmless() {
        let mut discord = platform("token");

        tokio_test::assert_ok!(discord.disconnect().await);
        assert_eq!(discord.connection_status, ConnectionStatus::Disconnected);
        assert!(discord.shard_tasks.is_empty());
    }
}
