// File: streambot-core/src/services/discord/slashcommands/disconnect.rs

use tracing::error;
use twilight_model::{
    application::{command::CommandType, interaction::Interaction},
    http::interaction::InteractionResponseType,
};
use twilight_util::builder::command::CommandBuilder;

use super::{defer, InteractionContext};
use crate::Error;

/// `/disconnect`
pub fn create_disconnect_command() -> CommandBuilder {
    CommandBuilder::new("disconnect", "Disconnects Stream Bot", CommandType::ChatInput)
}

pub async fn handle_disconnect_interaction(
    ctx: &InteractionContext,
    interaction: &Interaction,
) -> Result<(), Error> {
    defer(ctx, interaction, InteractionResponseType::DeferredChannelMessageWithSource).await?;

    let (user_name, user_id) = interaction
        .author()
        .map(|user| (user.name.clone(), user.id.get()))
        .unwrap_or_default();

    let content = match ctx.service.disconnect(&user_name, user_id).await {
        Ok(()) => "Disconnected",
        Err(e) => {
            error!("Disconnect for {user_name} failed: {e}");
            "Failed to Disconnect"
        }
    };

    ctx.http
        .interaction(ctx.application_id)
        .create_followup(&interaction.token)
        .content(content)
        .await
        .map_err(|e| Error::Platform(format!("Error responding to `/disconnect`: {e}")))?;

    Ok(())
}
