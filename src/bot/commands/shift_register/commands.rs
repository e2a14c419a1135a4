use std::str::FromStr;
use std::time::Duration;

use futures::StreamExt;
use log::debug;
use poise::serenity_prelude::ComponentInteractionCollector;

use crate::bot::checks::channel_key;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::commands::shift_register::views::ShiftRegisterSettingsAction;
use crate::bot::commands::shift_register::views::ShiftRegisterSettingsView;
use crate::bot::commands::shift_register::views::ShiftRegisterSetupModal;
use crate::bot::error_handler::form_error_text;
use crate::bot::views::ResponseComponentView;

const INTERACTION_TIMEOUT_SECS: u64 = 300;
const MODAL_TIMEOUT_SECS: u64 = 600;

/// Opens the settings panel. `notice` is shown below the status.
pub async fn settings(ctx: Context<'_>, notice: Option<String>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let key = channel_key(ctx)?;
    let service = ctx.data().service.shift_register.clone();

    let settings = service.settings(key).await?;
    let email = ctx.data().service.sheets.service_account_email();
    let mut view = ShiftRegisterSettingsView::new(settings, email.clone());
    view.notice = notice;

    let msg_handle = ctx.send(view.create_ephemeral_reply()).await?;
    let msg_id = msg_handle.message().await?.into_owned().id;

    let mut collector = ComponentInteractionCollector::new(ctx.serenity_context())
        .message_id(msg_id)
        .author_id(ctx.author().id)
        .timeout(Duration::from_secs(INTERACTION_TIMEOUT_SECS))
        .stream();

    while let Some(interaction) = collector.next().await {
        if ShiftRegisterSettingsAction::from_str(&interaction.data.custom_id).is_err() {
            continue;
        }

        let defaults = ShiftRegisterSetupModal::from_settings(view.settings.as_ref());
        let submitted = poise::execute_modal_on_component_interaction::<ShiftRegisterSetupModal>(
            ctx.serenity_context(),
            interaction.clone(),
            defaults,
            Some(Duration::from_secs(MODAL_TIMEOUT_SECS)),
        )
        .await?;
        let Some(form) = submitted else {
            debug!("Shift register setup form in channel {} timed out", key.channel_id);
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

    Ok(())
}
