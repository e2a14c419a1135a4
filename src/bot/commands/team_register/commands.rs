use std::str::FromStr;
use std::time::Duration;

use futures::StreamExt;
use log::debug;
use poise::serenity_prelude::ComponentInteractionCollector;
use poise::serenity_prelude::ComponentInteractionDataKind;
use poise::serenity_prelude::CreateInteractionResponse;
use poise::serenity_prelude::CreateInteractionResponseMessage;

use crate::bot::checks::channel_key;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::commands::team_register::views::TeamRegisterSettingsAction;
use crate::bot::commands::team_register::views::TeamRegisterSettingsView;
use crate::bot::commands::team_register::views::TeamRegisterSetupModal;
use crate::bot::commands::team_register::views::TeamSummaryView;
use crate::bot::error::BotError;
use crate::bot::error_handler::form_error_text;
use crate::bot::members::guild_registrants;
use crate::bot::views::ResponseComponentView;
use crate::bot::views::ViewProvider;

const INTERACTION_TIMEOUT_SECS: u64 = 300;
const MODAL_TIMEOUT_SECS: u64 = 600;

/// Opens the settings panel. `notice` is shown below the status.
pub async fn settings(ctx: Context<'_>, notice: Option<String>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let key = channel_key(ctx)?;
    let service = ctx.data().service.team_register.clone();

    let settings = service.settings(key).await?;
    let email = service.sheets().service_account_email();
    let mut view = TeamRegisterSettingsView::new(settings, email.clone());
    view.notice = notice;

    let msg_handle = ctx.send(view.create_ephemeral_reply()).await?;
    let msg_id = msg_handle.message().await?.into_owned().id;

    let mut collector = ComponentInteractionCollector::new(ctx.serenity_context())
        .message_id(msg_id)
        .author_id(ctx.author().id)
        .timeout(Duration::from_secs(INTERACTION_TIMEOUT_SECS))
        .stream();

    while let Some(interaction) = collector.next().await {
        let Ok(action) = TeamRegisterSettingsAction::from_str(&interaction.data.custom_id) else {
            continue;
        };

        match action {
            TeamRegisterSettingsAction::Setup => {
                let defaults = TeamRegisterSetupModal::from_settings(view.settings.as_ref());
                let submitted = poise::execute_modal_on_component_interaction::<
                    TeamRegisterSetupModal,
                >(
                    ctx.serenity_context(),
                    interaction.clone(),
                    defaults,
                    Some(Duration::from_secs(MODAL_TIMEOUT_SECS)),
                )
                .await?;
                let Some(form) = submitted else {
                    debug!("Team register setup form in channel {} timed out", key.channel_id);
                    continue;
                };

                match service.setup(key, &form.to_setup()).await {
                    Ok(settings) => {
                        view.settings = Some(settings);
                        view.notice = Some("✅ Settings saved.".to_string());
                    }
                    Err(e) => match form_error_text(&e, email.as_deref()) {
                        Some(text) => view.notice = Some(format!("⚠️ {text}")),
                        None => return Err(e.into()),
                    },
                }
                msg_handle.edit(ctx, view.create_ephemeral_reply()).await?;
            }
            TeamRegisterSettingsAction::EncoreRoles => {
                if let ComponentInteractionDataKind::RoleSelect { values } = &interaction.data.kind {
                    let role_ids: Vec<u64> = values.iter().map(|id| id.get()).collect();
                    let config = service.update_encore_roles(key, &role_ids).await?;
                    if let Some(settings) = view.settings.as_mut() {
                        settings.config = config;
                    }
                    view.notice = Some("✅ Encore roles saved.".to_string());
                }

                interaction
                    .create_response(
                        ctx.http(),
                        CreateInteractionResponse::UpdateMessage(
                            CreateInteractionResponseMessage::new().components(view.create()),
                        ),
                    )
                    .await?;
            }
        }
    }

    Ok(())
}

pub async fn summary(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let key = channel_key(ctx)?;
    let guild_id = ctx.guild_id().ok_or(BotError::GuildOnlyCommand)?;

    let members = guild_registrants(ctx.serenity_context(), guild_id);
    let summary = ctx
        .data()
        .service
        .team_register
        .refresh_summary(key, &members)
        .await?;

    ctx.send(TeamSummaryView::new(summary).create_ephemeral_reply())
        .await?;
    Ok(())
}
