use std::sync::Arc;

use async_trait::async_trait;

use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::feature::FeatureBehavior;
use crate::feature::render_help;
use crate::register::Registrant;
use crate::service::error::ServiceError;
use crate::service::feature_channel_service::FeatureChannelService;
use crate::service::shift_register_service::ShiftRegisterService;

const HELP_TEMPLATE: &str = r#"### 📋 How to Register Your Shifts

Write one or more time ranges anywhere in your message in the format `start-end` (24-hour, e.g. `15-18`).
Notes before or after the ranges are fine. {{ bot }} picks up every valid range.

**Examples:**
```
15-18 18-20 consecutive not allowed
20-22
16-17 encore not allowed 19-21
```
Every range above (`15-18`, `18-20`, `20-22`, `16-17`, `19-21`) is registered, regardless of line breaks or notes.
- Ranges past midnight such as `23-2` count towards the same day.
- Sending again replaces your previous registration.
- To delete your shifts, use `/shift delete`.
- Your shifts are shown in [Google Sheets]({{ sheet_url }}) for review."#;

pub struct ShiftRegisterFeature {
    channels: Arc<FeatureChannelService>,
    service: Arc<ShiftRegisterService>,
}

impl ShiftRegisterFeature {
    pub fn new(channels: Arc<FeatureChannelService>, service: Arc<ShiftRegisterService>) -> Self {
        Self { channels, service }
    }
}

#[async_trait]
impl FeatureBehavior for ShiftRegisterFeature {
    fn feature(&self) -> Feature {
        Feature::ShiftRegister
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
        let shift = self.service.register_shift(key, registrant, content).await?;
        Ok(shift.map(|shift| shift.to_string()))
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
            .ok_or(ServiceError::NotConfigured { feature: Feature::ShiftRegister })?;
        render_help(HELP_TEMPLATE, &settings.sheets.url(), bot)
    }
}
