use poise::serenity_prelude::Message;

use crate::bot::checks::guild_admin;
use crate::bot::checks::team_register_enabled;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::commands::feature_channel;
use crate::database::model::Feature;

pub mod commands;
pub mod views;

const FEATURE: Feature = Feature::TeamRegister;

pub struct TeamRegisterCog;

impl TeamRegisterCog {
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        subcommands(
            "Self::enable",
            "Self::disable",
            "Self::disable_and_clear",
            "Self::settings",
            "Self::summary",
            "Self::help"
        )
    )]
    pub async fn team_register(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Enable team registration in this channel
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

    /// Disable team registration in this channel and keep its settings
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

    /// Disable team registration in this channel and delete its settings
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

    /// Set up the Google Sheet and encore roles
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin",
        check = "team_register_enabled"
    )]
    pub async fn settings(ctx: Context<'_>) -> Result<(), Error> {
        commands::settings(ctx, None).await
    }

    /// Refresh and show the team summary
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin",
        check = "team_register_enabled"
    )]
    pub async fn summary(ctx: Context<'_>) -> Result<(), Error> {
        commands::summary(ctx).await
    }

    /// Show how to register your teams
    #[poise::command(slash_command, prefix_command, guild_only, check = "team_register_enabled")]
    pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
        feature_channel::help(ctx, FEATURE).await
    }

    #[poise::command(slash_command, prefix_command, guild_only, subcommands("Self::delete"))]
    pub async fn team(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Delete your registered teams
    #[poise::command(slash_command, prefix_command, guild_only, check = "team_register_enabled")]
    pub async fn delete(ctx: Context<'_>) -> Result<(), Error> {
        feature_channel::delete_user_data(ctx, FEATURE).await
    }

    #[poise::command(
        context_menu_command = "Upsert to Team Register",
        guild_only,
        default_member_permissions = "ADMINISTRATOR | MANAGE_GUILD",
        check = "guild_admin",
        check = "team_register_enabled"
    )]
    pub async fn upsert_to_team_register(ctx: Context<'_>, message: Message) -> Result<(), Error> {
        feature_channel::upsert_message(ctx, FEATURE, message).await
    }
}

impl Cog for TeamRegisterCog {
    fn commands(&self) -> Vec<poise::Command<crate::bot::Data, Error>> {
        vec![
            Self::team_register(),
            Self::team(),
            Self::upsert_to_team_register(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_subcommands_check_permissions() {
        let command = TeamRegisterCog::team_register();
        let mut checked = 0;
        for subcommand in &command.subcommands {
            let expected = match &*subcommand.name {
                "enable" | "disable" | "disable_and_clear" => 1,
                "settings" | "summary" => 2,
                _ => continue,
            };
            assert!(subcommand.prefix_action.is_some());
            assert_eq!(
                subcommand.checks.len(),
                expected,
                "`{}` is missing a check",
                subcommand.name
            );
            checked += 1;
        }
        assert!(checked >= 4);
    }

    #[test]
    fn test_context_menu_checks_permissions() {
        let command = TeamRegisterCog::upsert_to_team_register();
        assert!(command.prefix_action.is_none());
        assert_eq!(command.checks.len(), 2);
    }
}
