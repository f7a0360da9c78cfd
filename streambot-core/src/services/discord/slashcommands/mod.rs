// File: streambot-core/src/services/discord/slashcommands/mod.rs

pub mod disconnect;
pub mod stream;

use std::sync::Arc;

use tracing::{debug, error, warn};
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::interaction::{Interaction, InteractionData},
    channel::message::MessageFlags,
    gateway::payload::incoming::InteractionCreate,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::marker::{ApplicationMarker, GuildMarker},
    id::Id,
};

use crate::services::discord::components::is_stream_component;
use crate::services::discord::slashcommands::disconnect::{
    create_disconnect_command, handle_disconnect_interaction,
};
use crate::services::discord::slashcommands::stream::{
    create_stream_command, handle_stream_component, handle_stream_interaction,
};
use crate::services::stream_service::StreamService;
use crate::Error;

/// What every handler needs to answer an interaction.
#[derive(Clone)]
pub struct InteractionContext {
    pub http: Arc<HttpClient>,
    pub application_id: Id<ApplicationMarker>,
    pub service: Arc<StreamService>,
}

/// Registers `/stream` and `/disconnect` for one guild.
pub async fn register_guild_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    guild_id: Id<GuildMarker>,
) -> Result<usize, Error> {
    let commands = [
        create_stream_command().build(),
        create_disconnect_command().build(),
    ];

    http.interaction(application_id)
        .set_guild_commands(guild_id, &commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register guild slash commands: {e}")))?;

    Ok(commands.len())
}

/// Routes an `InteractionCreate` to the command or component handler.
/// Handler failures become an ephemeral error reply.
pub async fn handle_interaction_create(ctx: &InteractionContext, event: &InteractionCreate) {
    let interaction = &event.0;

    let result = match &interaction.data {
        Some(InteractionData::ApplicationCommand(cmd_data)) => match cmd_data.name.as_str() {
            "stream" => handle_stream_interaction(ctx, interaction, cmd_data).await,
            "disconnect" => handle_disconnect_interaction(ctx, interaction).await,
            other => {
                warn!("No command matching {other} was found.");
                respond_ephemeral(ctx, interaction, &format!("Unrecognized command: {other}")).await
            }
        },
        Some(InteractionData::MessageComponent(component)) => {
            if is_stream_component(&component.custom_id) {
                handle_stream_component(ctx, interaction, component).await
            } else {
                debug!("Ignoring component {}", component.custom_id);
                Ok(())
            }
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        error!("Error handling interaction {}: {e}", interaction.id);
        send_error(ctx, interaction, "There was an error while executing this command!").await;
    }
}

pub(crate) async fn respond_ephemeral(
    ctx: &InteractionContext,
    interaction: &Interaction,
    content: &str,
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    content: Some(content.to_string()),
                    flags: Some(MessageFlags::EPHEMERAL),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error sending ephemeral response: {e}")))?;
    Ok(())
}

pub(crate) async fn defer(
    ctx: &InteractionContext,
    interaction: &Interaction,
    kind: InteractionResponseType,
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse { kind, data: None },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error deferring interaction: {e}")))?;
    Ok(())
}

/// Tries a fresh ephemeral reply; if the interaction was already
/// acknowledged, falls back to an ephemeral follow-up.
async fn send_error(ctx: &InteractionContext, interaction: &Interaction, message: &str) {
    if respond_ephemeral(ctx, interaction, message).await.is_ok() {
        return;
    }
    let followup = ctx
        .http
        .interaction(ctx.application_id)
        .create_followup(&interaction.token)
        .content(message)
        .flags(MessageFlags::EPHEMERAL)
        .await;
    if let Err(e) = followup {
        error!("Failed to send error message: {e}");
    }
}
