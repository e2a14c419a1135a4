use crate::bot::checks::channel_key;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::commands::features::views::FeatureListView;
use crate::bot::views::ResponseComponentView;

pub async fn features(ctx: Context<'_>) -> Result<(), Error> {
    let key = channel_key(ctx)?;
    let records = ctx.data().service.feature_channel.list(key).await?;
    ctx.send(FeatureListView::new(records).create_reply()).await?;
    Ok(())
}
