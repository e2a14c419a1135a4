use crate::database::model::Feature;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BotError {
    #[error("This command can only be used in a server.")]
    GuildOnlyCommand,

    #[error("Feature `{feature}` not enabled in this channel.")]
    FeatureNotEnabled { feature: Feature },

    #[error("{0}")]
    PermissionDenied(String),
}
