//! Command checks that resolve the feature channel of an invocation.

use log::debug;
use poise::serenity_prelude::Permissions;

use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::error::BotError;
use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::service::error::ServiceError;

/// Resolves the channel of a slash or prefix invocation.
pub fn channel_key(ctx: Context<'_>) -> Result<ChannelKey, BotError> {
    let invocation = match ctx {
        poise::Context::Application(_) => "slash",
        poise::Context::Prefix(_) => "prefix",
    };
    let key = resolve_channel_key(
        ctx.guild_id().map(|id| id.get()),
        ctx.channel_id().get(),
    )?;
    debug!(
        "Resolved {invocation} invocation of `{}` to channel {} of guild {}",
        ctx.command().qualified_name,
        key.channel_id,
        key.guild_id
    );
    Ok(key)
}

fn resolve_channel_key(guild_id: Option<u64>, channel_id: u64) -> Result<ChannelKey, BotError> {
    let guild_id = guild_id.ok_or(BotError::GuildOnlyCommand)?;
    Ok(ChannelKey::new(guild_id, channel_id))
}

/// Passes when `feature` is enabled in the invocation channel.
pub async fn require_feature(ctx: Context<'_>, feature: Feature) -> Result<bool, Error> {
    let key = channel_key(ctx)?;
    ctx.data()
        .features
        .get(feature)
        .guard(key)
        .await
        .map_err(into_check_error)?;
    Ok(true)
}

fn into_check_error(error: ServiceError) -> Error {
    match error {
        ServiceError::FeatureNotEnabled { feature } => BotError::FeatureNotEnabled { feature }.into(),
        other => other.into(),
    }
}

/// Passes for members with `Administrator` or `Manage Server`.
///
/// Slash commands are also hidden through `default_member_permissions`, but
/// Discord does not apply that to prefix invocations.
pub async fn guild_admin(ctx: Context<'_>) -> Result<bool, Error> {
    let member = ctx
        .author_member()
        .await
        .ok_or(BotError::GuildOnlyCommand)?;
    let permissions = ctx
        .guild()
        .ok_or(BotError::GuildOnlyCommand)?
        .member_permissions(member.as_ref());

    require_admin(permissions)?;
    Ok(true)
}

fn require_admin(permissions: Permissions) -> Result<(), BotError> {
    if permissions.contains(Permissions::ADMINISTRATOR)
        || permissions.contains(Permissions::MANAGE_GUILD)
    {
        return Ok(());
    }
    Err(BotError::PermissionDenied(
        "You need the `Manage Server` or `Administrator` permission to perform this action."
            .to_string(),
    ))
}

pub async fn team_register_enabled(ctx: Context<'_>) -> Result<bool, Error> {
    require_feature(ctx, Feature::TeamRegister).await
}

pub async fn shift_register_enabled(ctx: Context<'_>) -> Result<bool, Error> {
    require_feature(ctx, Feature::ShiftRegister).await
}
