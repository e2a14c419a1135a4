use poise::serenity_prelude::Message;

use crate::bot::checks::guild_admin;
use crate::bot::checks::shift_register_enabled;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::commands::feature_channel;
use crate::database::model::Feature;

pub mod commands;
pub mod views;

const FEATURE: Feature = Feature::ShiftRegister;

pub struct ShiftRegisterCog;

impl ShiftRegisterCog {
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        subcommands(
            "Self::enable",
            "Self::disable",
            "Self::disable_and_clear",
            "Self::settings",
            "Self::help"
        )
    )]
    pub async fn shift_register(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Enable shift registration in this channel
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin"
    )]
    pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
        let notice = feature_channel::enable(ctx, FEATURE).await?;
        commands::settings(ctx, Some(notice)).await
    }

    /// Disable shift registration in this channel and keep its settings
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin"
    )]
    pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
        feature_channel::disable(ctx, FEATURE).await
    }

    /// Disable shift registration in this channel and delete its settings
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin"
    )]
    pub async fn disable_and_clear(ctx: Context<'_>) -> Result<(), Error> {
        feature_channel::disable_and_clear(ctx, FEATURE).await
    }

    /// Set up the Google Sheet for shift registration
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin",
        check = "shift_register_enabled"
    )]
    pub async fn settings(ctx: Context<'_>) -> Result<(), Error> {
        commands::settings(ctx, None).await
    }

    /// Show how to register your shifts
    #[poise::command(slash_command, prefix_command, guild_only, check = "shift_register_enabled")]
    pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
        feature_channel::help(ctx, FEATURE).await
    }

    #[poise::command(slash_command, prefix_command, guild_only, subcommands("Self::delete"))]
    pub async fn shift(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Delete your registered shifts
    #[poise::command(slash_command, prefix_command, guild_only, check = "shift_register_enabled")]
    pub async fn delete(ctx: Context<'_>) -> Result<(), Error> {
        feature_channel::delete_user_data(ctx, FEATURE).await
    }

    #[poise::command(
        context_menu_command = "Upsert to Shift Register",
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin",
        check = "shift_register_enabled"
    )]
    pub async fn upsert_to_shift_register(
        ctx: Context<'_>,
        message: Message,
    ) -> Result<(), Error> {
        feature_channel::upsert_message(ctx, FEATURE, message).await
    }
}

impl Cog for ShiftRegisterCog {
    fn commands(&self) -> Vec<poise::Command<crate::bot::Data, Error>> {
        vec![
            Self::shift_register(),
            Self::shift(),
            Self::upsert_to_shift_register(),
        ]
    }
}
