use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;

pub mod commands;
pub mod views;

pub struct FeaturesCog;

impl FeaturesCog {
    /// List the features registered in this channel
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn features(ctx: Context<'_>) -> Result<(), Error> {
        commands::features(ctx).await
    }
}

impl Cog for FeaturesCog {
    fn commands(&self) -> Vec<poise::Command<crate::bot::Data, Error>> {
        vec![Self::features()]
    }
}
