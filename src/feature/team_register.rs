use std::sync::Arc;

use async_trait::async_trait;

use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::feature::FeatureBehavior;
use crate::feature::render_help;
use crate::register::Registrant;
use crate::service::error::ServiceError;
use crate::service::feature_channel_service::FeatureChannelService;
use crate::service::team_register_service::TeamRegisterService;

const HELP_TEMPLATE: &str = r#"### 📋 How to Register Your Teams

Each line is one team in the format `LeaderSkill/InternalSkill/TeamPower`. Notes may follow on the same line.

Example:
```
150/740/33.4 This is the main team
140/680/35.3 No HP check
150/700/39 Encore, any other notes
```
Order does not matter. {{ bot }} picks the teams for you:
- The team with the highest effective skill value is the "Main Team"
- Among the rest, the one with the highest power (not less than the main team) is the "Encore Team"
- Others are "Backup Teams"
- Any line containing `xxx/xxx/xx.x` is recognized, so labels at the start of a line are fine.

To delete your teams, use `/team delete`.
To update, simply send your teams again. Your previous registration is overwritten.

{{ bot }} records the results in [Google Sheets]({{ sheet_url }}) for you to review."#;

pub struct TeamRegisterFeature {
    channels: Arc<FeatureChannelService>,
    service: Arc<TeamRegisterService>,
}

impl TeamRegisterFeature {
    pub fn new(channels: Arc<FeatureChannelService>, service: Arc<TeamRegisterService>) -> Self {
        Self { channels, service }
    }
}

#[async_trait]
impl FeatureBehavior for TeamRegisterFeature {
    fn feature(&self) -> Feature {
        Feature::TeamRegister
    }

    fn channels(&self) -> &FeatureChannelService {
        &self.channels
    }

    async fn clear(&self, key: ChannelKey) -> Result<usize, ServiceError> {
        self.service.clear(key).await
    }

    async fn upsert_from_message(
        &self,
        key: ChannelKey,
        registrant: &Registrant,
        content: &str,
    ) -> Result<Option<String>, ServiceError> {
        let teams = self.service.register_teams(key, registrant, content).await?;
        Ok(teams.map(|teams| teams.to_string()))
    }

    async fn delete_user_data(
        &self,
        key: ChannelKey,
        username: &str,
    ) -> Result<bool, ServiceError> {
        self.service.delete_user_data(key, username).await
    }

    async fn help_text(&self, key: ChannelKey, bot: &str) -> Result<String, ServiceError> {
        let settings = self
            .service
            .settings(key)
            .await?
            .ok_or(ServiceError::NotConfigured { feature: Feature::TeamRegister })?;
        render_help(HELP_TEMPLATE, &settings.sheets.url(), bot)
    }
}
