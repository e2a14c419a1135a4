//! Per-channel feature state.

use std::sync::Arc;

use log::debug;
use log::info;

use crate::database::Database;
use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::database::model::FeatureChannelModel;
use crate::service::error::ServiceError;

pub struct FeatureChannelService {
    db: Arc<Database>,
}

impl FeatureChannelService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Creates the record on first use, otherwise sets `is_enabled`.
    ///
    /// # Performance
    /// * DB calls: 1
    pub async fn enable(
        &self,
        key: ChannelKey,
        feature: Feature,
    ) -> Result<FeatureChannelModel, ServiceError> {
        let model = self
            .db
            .feature_channel_table
            .upsert_enabled(key, feature, true)
            .await?;
        info!(
            "Enabled {feature} in channel {} of guild {}",
            key.channel_id, key.guild_id
        );
        Ok(model)
    }

    /// Disables the feature but keeps its settings. Returns `false` when the
    /// feature was never enabled in the channel.
    ///
    /// # Performance
    /// * DB calls: 1
    pub async fn disable(&self, key: ChannelKey, feature: Feature) -> Result<bool, ServiceError> {
        let updated = self
            .db
            .feature_channel_table
            .update_enabled(key, feature, false)
            .await?;
        if updated.is_some() {
            info!(
                "Disabled {feature} in channel {} of guild {}",
                key.channel_id, key.guild_id
            );
        }
        Ok(updated.is_some())
    }

    /// Deletes the record and, by cascade, the feature settings.
    ///
    /// # Performance
    /// * DB calls: 1
    pub async fn clear(&self, key: ChannelKey, feature: Feature) -> Result<usize, ServiceError> {
        let deleted = self.db.feature_channel_table.delete(key, feature).await?;
        info!(
            "Cleared {feature} in channel {} of guild {} ({deleted} records)",
            key.channel_id, key.guild_id
        );
        Ok(deleted)
    }

    pub async fn get(
        &self,
        key: ChannelKey,
        feature: Feature,
    ) -> Result<Option<FeatureChannelModel>, ServiceError> {
        Ok(self.db.feature_channel_table.select(key, feature).await?)
    }

    pub async fn is_enabled(&self, key: ChannelKey, feature: Feature) -> Result<bool, ServiceError> {
        Ok(self
            .get(key, feature)
            .await?
            .is_some_and(|model| model.is_enabled))
    }

    /// Returns the record if the feature is enabled, otherwise
    /// [`ServiceError::FeatureNotEnabled`].
    pub async fn require_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
    ) -> Result<FeatureChannelModel, ServiceError> {
        match self.get(key, feature).await? {
            Some(model) if model.is_enabled => Ok(model),
            _ => {
                debug!(
                    "Rejected {feature} in channel {}: feature not enabled",
                    key.channel_id
                );
                Err(ServiceError::FeatureNotEnabled { feature })
            }
        }
    }

    pub async fn list(&self, key: ChannelKey) -> Result<Vec<FeatureChannelModel>, ServiceError> {
        Ok(self.db.feature_channel_table.select_all_by_channel(key).await?)
    }
}
