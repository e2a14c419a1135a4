//! Commands shared by every channel feature.

use poise::serenity_prelude::Message;

use crate::bot::checks::channel_key;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::members::registrant_of_message;
use crate::bot::views::ResponseComponentView;
use crate::bot::views::TextView;
use crate::bot::views::confirm::ConfirmOutcome;
use crate::bot::views::confirm::ConfirmView;
use crate::database::model::Feature;

async fn reply(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(TextView::new(text).create_ephemeral_reply()).await?;
    Ok(())
}

/// Enables `feature` and returns the notice shown above its settings panel.
pub async fn enable(ctx: Context<'_>, feature: Feature) -> Result<String, Error> {
    let key = channel_key(ctx)?;
    ctx.data().features.get(feature).enable(key).await?;
    Ok(format!(
        "🟢 **{}** enabled in this channel.",
        feature.display_name()
    ))
}

pub async fn disable(ctx: Context<'_>, feature: Feature) -> Result<(), Error> {
    let key = channel_key(ctx)?;
    let existed = ctx.data().features.get(feature).disable(key).await?;
    let text = if existed {
        format!(
            "⚪ **{}** disabled in this channel. Its settings are kept.",
            feature.display_name()
        )
    } else {
        format!(
            "**{}** was never enabled in this channel.",
            feature.display_name()
        )
    };
    reply(ctx, text).await
}

pub async fn disable_and_clear(ctx: Context<'_>, feature: Feature) -> Result<(), Error> {
    let key = channel_key(ctx)?;
    let prompt = format!(
        "## Disable and clear {name}\n\nThis disables **{name}** and deletes its settings in this channel. The spreadsheet itself is left untouched.",
        name = feature.display_name()
    );
    if ConfirmView::new(prompt).ask(ctx).await? != ConfirmOutcome::Confirmed {
        return Ok(());
    }

    let deleted = ctx.data().features.get(feature).clear(key).await?;
    let text = if deleted > 0 {
        format!(
            "🗑️ **{}** disabled and its settings cleared.",
            feature.display_name()
        )
    } else {
        format!(
            "**{}** had no settings in this channel.",
            feature.display_name()
        )
    };
    reply(ctx, text).await
}

pub async fn help(ctx: Context<'_>, feature: Feature) -> Result<(), Error> {
    let key = channel_key(ctx)?;
    let bot = format!("<@{}>", ctx.serenity_context().cache.current_user().id);
    let text = ctx
        .data()
        .features
        .get(feature)
        .help_text(key, &bot)
        .await?;
    ctx.send(TextView::new(text).create_reply()).await?;
    Ok(())
}

pub async fn delete_user_data(ctx: Context<'_>, feature: Feature) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let key = channel_key(ctx)?;
    let username = ctx.author().name.to_string();

    let deleted = ctx
        .data()
        .features
        .get(feature)
        .delete_user_data(key, &username)
        .await?;
    let text = if deleted {
        format!(
            "✅ Your {} data was deleted.",
            feature.display_name()
        )
    } else {
        format!("You have no {} data to delete.", feature.display_name())
    };
    reply(ctx, text).await
}

/// Registers the content of `message` on behalf of its author.
pub async fn upsert_message(
    ctx: Context<'_>,
    feature: Feature,
    message: Message,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let key = channel_key(ctx)?;
    let registrant = registrant_of_message(ctx.serenity_context(), &message);

    let registered = ctx
        .data()
        .features
        .get(feature)
        .upsert_from_message(key, &registrant, &message.content)
        .await?;
    let text = match registered {
        Some(summary) => format!(
            "✅ Registered for **{}**: {}",
            registrant.display_name, summary
        ),
        None => format!(
            "Nothing to register for {} in this message.",
            feature.display_name()
        ),
    };
    reply(ctx, text).await
}
