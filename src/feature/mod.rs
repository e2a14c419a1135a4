//! Channel features and the registry that dispatches to them.

use std::sync::Arc;

use async_trait::async_trait;
use minijinja::Environment;
use minijinja::context;

use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::database::model::FeatureChannelModel;
use crate::feature::shift_register::ShiftRegisterFeature;
use crate::feature::team_register::TeamRegisterFeature;
use crate::register::Registrant;
use crate::service::Services;
use crate::service::error::ServiceError;
use crate::service::feature_channel_service::FeatureChannelService;

pub mod shift_register;
pub mod team_register;

/// Behavior shared by every channel feature.
#[async_trait]
pub trait FeatureBehavior: Send + Sync {
    fn feature(&self) -> Feature;

    fn channels(&self) -> &FeatureChannelService;

    async fn enable(&self, key: ChannelKey) -> Result<FeatureChannelModel, ServiceError> {
        self.channels().enable(key, self.feature()).await
    }

    /// Keeps the settings. Returns whether a record existed.
    async fn disable(&self, key: ChannelKey) -> Result<bool, ServiceError> {
        self.channels().disable(key, self.feature()).await
    }

    /// Deletes the record together with the feature settings.
    async fn clear(&self, key: ChannelKey) -> Result<usize, ServiceError>;

    /// Fails with [`ServiceError::FeatureNotEnabled`] unless the feature is
    /// enabled in the channel.
    async fn guard(&self, key: ChannelKey) -> Result<FeatureChannelModel, ServiceError> {
        self.channels().require_enabled(key, self.feature()).await
    }

    /// Registers the message content. Returns a short description of what was
    /// registered, or `None` when the message holds nothing for this feature.
    async fn upsert_from_message(
        &self,
        key: ChannelKey,
        registrant: &Registrant,
        content: &str,
    ) -> Result<Option<String>, ServiceError>;

    /// Returns whether any data was removed.
    async fn delete_user_data(&self, key: ChannelKey, username: &str)
    -> Result<bool, ServiceError>;

    /// Usage guide with the sheet link. `bot` is how the bot is mentioned.
    async fn help_text(&self, key: ChannelKey, bot: &str) -> Result<String, ServiceError>;
}

/// Renders a help template with `{{ sheet_url }}` and `{{ bot }}`.
pub(crate) fn render_help(
    template: &str,
    sheet_url: &str,
    bot: &str,
) -> Result<String, ServiceError> {
    Environment::new()
        .render_str(
            template,
            context! {
                sheet_url => sheet_url,
                bot => bot,
            },
        )
        .map_err(|e| ServiceError::UnexpectedResult {
            message: format!("Failed to render help text: {e}"),
        })
}

pub struct FeatureRegistry {
    team_register: Arc<dyn FeatureBehavior>,
    shift_register: Arc<dyn FeatureBehavior>,
}

impl FeatureRegistry {
    pub fn new(services: &Services) -> Self {
        Self {
            team_register: Arc::new(TeamRegisterFeature::new(
                services.feature_channel.clone(),
                services.team_register.clone(),
            )),
            shift_register: Arc::new(ShiftRegisterFeature::new(
                services.feature_channel.clone(),
                services.shift_register.clone(),
            )),
        }
    }

    pub fn get(&self, feature: Feature) -> Arc<dyn FeatureBehavior> {
        match feature {
            Feature::TeamRegister => self.team_register.clone(),
            Feature::ShiftRegister => self.shift_register.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Arc<dyn FeatureBehavior>> + '_ {
        Feature::ALL.into_iter().map(|feature| self.get(feature))
    }
}
