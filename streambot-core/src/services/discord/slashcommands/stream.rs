// File: streambot-core/src/services/discord/slashcommands/stream.rs

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::{
        command::CommandType,
        interaction::{
            application_command::{CommandData, CommandOptionValue},
            message_component::MessageComponentInteractionData,
            Interaction,
        },
    },
    channel::message::{component::Component, MessageFlags},
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::marker::ApplicationMarker,
    id::Id,
};
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use super::{defer, respond_ephemeral, InteractionContext};
use crate::services::discord::components::{
    expired_components, page_components, parse_custom_id, StreamComponent, EXPIRED_HINT,
};
use crate::services::selection::{IgnoreReason, PageView, SessionHandle};
use crate::services::stream_service::{BrowseReply, BrowseRequest, InteractionReply};
use crate::Error;

const SEARCH_OPTION: &str = "search";
const NOT_YOURS: &str = "This stream picker belongs to someone else. Run /stream to open your own.";
const NO_VOICE: &str = "You need to be in a voice channel to use this command.";
const STALE_PICK: &str = "That stream is no longer available. Run /stream again.";

/// `/stream [search]`
pub fn create_stream_command() -> CommandBuilder {
    CommandBuilder::new(
        "stream",
        "Pick a live stream for Stream Bot to play in your voice channel",
        CommandType::ChatInput,
    )
    .option(
        StringBuilder::new(SEARCH_OPTION, "Only show streams whose name contains this text")
            .required(false),
    )
}

fn search_keyword(data: &CommandData) -> Option<String> {
    data.options.iter().find_map(|opt| match (&opt.value, opt.name.as_str()) {
        (CommandOptionValue::String(value), SEARCH_OPTION) => Some(value.clone()),
        _ => None,
    })
}

/// Handles the slash command: defer, filter, open a session, draw page one.
pub async fn handle_stream_interaction(
    ctx: &InteractionContext,
    interaction: &Interaction,
    data: &CommandData,
) -> Result<(), Error> {
    let (Some(guild_id), Some(owner_id), Some(channel_id)) = (
        interaction.guild_id,
        interaction.author_id(),
        interaction.channel.as_ref().map(|c| c.id),
    ) else {
        return respond_ephemeral(ctx, interaction, "This command only works inside a server.").await;
    };

    defer(ctx, interaction, InteractionResponseType::DeferredChannelMessageWithSource).await?;

    let keyword = search_keyword(data);
    let request = BrowseRequest {
        owner_id: owner_id.get(),
        channel_id: channel_id.get(),
        guild_id: guild_id.get(),
        keyword,
        interaction_token: interaction.token.clone(),
    };

    match ctx.service.begin_browse(request, Instant::now()) {
        BrowseReply::NoVoiceChannel => edit_original(ctx, &interaction.token, NO_VOICE, &[]).await,
        BrowseReply::NoCandidates { keyword } => {
            let text = match keyword {
                Some(k) => format!("No streams found matching `{k}`."),
                None => "No streams are available right now.".to_string(),
            };
            edit_original(ctx, &interaction.token, &text, &[]).await
        }
        BrowseReply::Started { handle, view, superseded } => {
            arm_expiry(ctx, &handle);
            let drawn =
                edit_original(ctx, &interaction.token, &view.header(), &page_components(handle.id(), &view))
                    .await;
            if drawn.is_err() {
                ctx.service.sessions().remove(handle.id());
            }
            if let Some(old) = superseded {
                redraw_closed(ctx.http.as_ref(), ctx.application_id, &old).await;
            }
            drawn
        }
    }
}

/// How to answer a picker control, decided from the service reply.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ComponentAction {
    /// Draw this page over the picker.
    Redraw(PageView),
    /// Swap the picker for the expired notice.
    Expire,
    /// Ephemeral reply to the clicker only; the picker is left alone.
    Notice(&'static str),
    /// Replace the picker with the result of a pick.
    Outcome(String),
}

fn navigate_action(reply: InteractionReply) -> ComponentAction {
    match reply {
        InteractionReply::Render(view) => ComponentAction::Redraw(view),
        InteractionReply::Ignored(IgnoreReason::NotOwner) => ComponentAction::Notice(NOT_YOURS),
        // Only the owner gets past the owner check, so the picker is theirs to close.
        InteractionReply::Ignored(_) => ComponentAction::Expire,
        _ => ComponentAction::Notice(EXPIRED_HINT),
    }
}

fn select_action(reply: InteractionReply) -> ComponentAction {
    match reply {
        InteractionReply::Ignored(IgnoreReason::NotOwner) => ComponentAction::Notice(NOT_YOURS),
        InteractionReply::Gone => ComponentAction::Notice(EXPIRED_HINT),
        InteractionReply::Playing { entry, channel } => ComponentAction::Outcome(format!(
            "Started streaming **{}** in {}",
            entry.display_name, channel.name
        )),
        InteractionReply::PlaybackFailed { reason, .. } => {
            ComponentAction::Outcome(format!("Failed to start streaming: {reason}"))
        }
        InteractionReply::NoVoiceChannel => ComponentAction::Outcome(NO_VOICE.to_string()),
        _ => ComponentAction::Outcome(STALE_PICK.to_string()),
    }
}

/// Handles picker controls: prev/next buttons and the stream menus.
pub async fn handle_stream_component(
    ctx: &InteractionContext,
    interaction: &Interaction,
    data: &MessageComponentInteractionData,
) -> Result<(), Error> {
    let Some(actor_id) = interaction.author_id().map(|id| id.get()) else {
        return Ok(());
    };

    match parse_custom_id(&data.custom_id) {
        Some(StreamComponent::Navigate { session_id, direction }) => {
            let reply = ctx
                .service
                .navigate(session_id, actor_id, direction, Instant::now())
                .await;
            match navigate_action(reply) {
                ComponentAction::Redraw(view) => update_message(ctx, interaction, &view, session_id).await,
                ComponentAction::Expire => show_expired(ctx, interaction).await,
                ComponentAction::Notice(text) => respond_ephemeral(ctx, interaction, text).await,
                ComponentAction::Outcome(text) => respond_ephemeral(ctx, interaction, &text).await,
            }
        }
        Some(StreamComponent::Menu { session_id, .. }) => {
            // Strangers and dead sessions get an ephemeral reply; the picker stays as it is.
            let owner_id = ctx.service.sessions().get(session_id).map(|h| h.key().owner_id);
            match owner_id {
                None => return respond_ephemeral(ctx, interaction, EXPIRED_HINT).await,
                Some(owner_id) if owner_id != actor_id => {
                    return respond_ephemeral(ctx, interaction, NOT_YOURS).await;
                }
                Some(_) => {}
            }

            defer(ctx, interaction, InteractionResponseType::DeferredUpdateMessage).await?;

            let token = data.values.first().map(String::as_str).unwrap_or_default();
            let reply = ctx
                .service
                .select(session_id, actor_id, token, Instant::now())
                .await;
            if let InteractionReply::Playing { entry, channel } = &reply {
                info!("'{}' started in {} by {actor_id}", entry.display_name, channel.name);
            }

            match select_action(reply) {
                ComponentAction::Notice(text) => followup_ephemeral(ctx, interaction, text).await,
                ComponentAction::Outcome(text) => edit_original(ctx, &interaction.token, &text, &[]).await,
                ComponentAction::Expire => {
                    edit_original(ctx, &interaction.token, EXPIRED_HINT, &expired_components()).await
                }
                ComponentAction::Redraw(view) => {
                    edit_original(ctx, &interaction.token, &view.header(), &page_components(session_id, &view))
                        .await
                }
            }
        }
        Some(StreamComponent::Expired) | None => respond_ephemeral(ctx, interaction, EXPIRED_HINT).await,
    }
}

fn arm_expiry(ctx: &InteractionContext, handle: &Arc<SessionHandle>) {
    let http = Arc::clone(&ctx.http);
    let application_id = ctx.application_id;

    ctx.service.sessions().arm_expiry(handle, move |expired| async move {
        redraw_closed(&http, application_id, &expired).await;
    });
}

/// Puts the expired notice over a session's picker message.
async fn redraw_closed(http: &HttpClient, application_id: Id<ApplicationMarker>, handle: &SessionHandle) {
    let token = handle.session.lock().await.origin().interaction_token.clone();
    if let Err(e) = redraw_expired(http, application_id, &token).await {
        error!("Failed to redraw closed session {}: {e}", handle.id());
    }
}

async fn redraw_expired(
    http: &HttpClient,
    application_id: Id<ApplicationMarker>,
    token: &str,
) -> Result<(), Error> {
    http.interaction(application_id)
        .update_response(token)
        .content(Some(EXPIRED_HINT))
        .components(Some(&expired_components()))
        .await
        .map_err(|e| Error::Platform(format!("Error editing expired picker: {e}")))?;
    Ok(())
}

async fn edit_original(
    ctx: &InteractionContext,
    token: &str,
    content: &str,
    components: &[Component],
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .update_response(token)
        .content(Some(content))
        .components(Some(components))
        .await
        .map_err(|e| Error::Platform(format!("Error editing interaction response: {e}")))?;
    Ok(())
}

async fn update_message(
    ctx: &InteractionContext,
    interaction: &Interaction,
    view: &PageView,
    session_id: u64,
) -> Result<(), Error> {
    respond_update(ctx, interaction, view.header(), page_components(session_id, view)).await
}

async fn show_expired(ctx: &InteractionContext, interaction: &Interaction) -> Result<(), Error> {
    respond_update(ctx, interaction, EXPIRED_HINT.to_string(), expired_components()).await
}

async fn respond_update(
    ctx: &InteractionContext,
    interaction: &Interaction,
    content: String,
    components: Vec<Component>,
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::UpdateMessage,
                data: Some(InteractionResponseData {
                    content: Some(content),
                    components: Some(components),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error updating picker: {e}")))?;
    Ok(())
}

async fn followup_ephemeral(
    ctx: &InteractionContext,
    interaction: &Interaction,
    content: &str,
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .create_followup(&interaction.token)
        .content(content)
        .flags(MessageFlags::EPHEMERAL)
        .await
        .map_err(|e| Error::Platform(format!("Error sending follow-up: {e}")))?;
    Ok(())
}
