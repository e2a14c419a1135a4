//! Table access for the feature channel and register configuration tables.
//!
//! Each table is a trait so that services can be exercised against in-memory
//! fakes. The `Pg*` types are the PostgreSQL implementations.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::deadpool::Pool;

use crate::database::error::DatabaseError;
use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::database::model::FeatureChannelModel;
use crate::database::model::NewFeatureChannel;
use crate::database::model::NewShiftRegisterConfig;
use crate::database::model::NewTeamRegisterConfig;
use crate::database::model::ShiftRegisterConfigModel;
use crate::database::model::TeamRegisterConfigModel;
use crate::database::schema::feature_channel;
use crate::database::schema::shift_register;
use crate::database::schema::team_register;

pub type PgPool = Pool<diesel_async::AsyncPgConnection>;

#[async_trait]
pub trait FeatureChannelTable: Send + Sync {
    async fn select(
        &self,
        key: ChannelKey,
        feature: Feature,
    ) -> Result<Option<FeatureChannelModel>, DatabaseError>;

    /// All feature records of a channel, enabled or not.
    async fn select_all_by_channel(
        &self,
        key: ChannelKey,
    ) -> Result<Vec<FeatureChannelModel>, DatabaseError>;

    /// Inserts the record or updates `is_enabled` of the existing one.
    async fn upsert_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
        is_enabled: bool,
    ) -> Result<FeatureChannelModel, DatabaseError>;

    /// Updates `is_enabled` of an existing record. Returns `None` when there is no record.
    async fn update_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
        is_enabled: bool,
    ) -> Result<Option<FeatureChannelModel>, DatabaseError>;

    /// Deletes the record. Settings referencing it are deleted by cascade.
    async fn delete(&self, key: ChannelKey, feature: Feature) -> Result<usize, DatabaseError>;
}

#[async_trait]
pub trait TeamRegisterTable: Send + Sync {
    async fn select(
        &self,
        feature_channel_id: i32,
    ) -> Result<Option<TeamRegisterConfigModel>, DatabaseError>;

    /// Inserts or replaces the sheet settings. Encore roles of an existing row are kept.
    async fn upsert(
        &self,
        config: &NewTeamRegisterConfig,
    ) -> Result<TeamRegisterConfigModel, DatabaseError>;

    async fn update_encore_roles(
        &self,
        feature_channel_id: i32,
        role_ids: &[i64],
    ) -> Result<Option<TeamRegisterConfigModel>, DatabaseError>;
}

#[async_trait]
pub trait ShiftRegisterTable: Send + Sync {
    async fn select(
        &self,
        feature_channel_id: i32,
    ) -> Result<Option<ShiftRegisterConfigModel>, DatabaseError>;

    async fn upsert(
        &self,
        config: &NewShiftRegisterConfig,
    ) -> Result<ShiftRegisterConfigModel, DatabaseError>;
}

pub struct BaseTable {
    pub pool: PgPool,
}

impl BaseTable {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgFeatureChannelTable {
    base: BaseTable,
}

impl PgFeatureChannelTable {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }
}

#[async_trait]
impl FeatureChannelTable for PgFeatureChannelTable {
    async fn select(
        &self,
        key: ChannelKey,
        feature: Feature,
    ) -> Result<Option<FeatureChannelModel>, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let ret = feature_channel::table
            .filter(feature_channel::guild_id.eq(key.guild_id as i64))
            .filter(feature_channel::channel_id.eq(key.channel_id as i64))
            .filter(feature_channel::feature_name.eq(feature.as_str()))
            .select(FeatureChannelModel::as_select())
            .first(&mut *conn)
            .await
            .optional()?;
        Ok(ret)
    }

    async fn select_all_by_channel(
        &self,
        key: ChannelKey,
    ) -> Result<Vec<FeatureChannelModel>, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let ret = feature_channel::table
            .filter(feature_channel::guild_id.eq(key.guild_id as i64))
            .filter(feature_channel::channel_id.eq(key.channel_id as i64))
            .order(feature_channel::feature_name.asc())
            .select(FeatureChannelModel::as_select())
            .load(&mut *conn)
            .await?;
        Ok(ret)
    }

    async fn upsert_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
        is_enabled: bool,
    ) -> Result<FeatureChannelModel, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let new = NewFeatureChannel::new(key, feature, is_enabled);
        let ret = diesel::insert_into(feature_channel::table)
            .values(&new)
            .on_conflict((
                feature_channel::guild_id,
                feature_channel::channel_id,
                feature_channel::feature_name,
            ))
            .do_update()
            .set((
                feature_channel::is_enabled.eq(is_enabled),
                feature_channel::updated_at.eq(Utc::now()),
            ))
            .returning(FeatureChannelModel::as_returning())
            .get_result(&mut *conn)
            .await?;
        Ok(ret)
    }

    async fn update_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
        is_enabled: bool,
    ) -> Result<Option<FeatureChannelModel>, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let target = feature_channel::table
            .filter(feature_channel::guild_id.eq(key.guild_id as i64))
            .filter(feature_channel::channel_id.eq(key.channel_id as i64))
            .filter(feature_channel::feature_name.eq(feature.as_str()));
        let ret = diesel::update(target)
            .set((
                feature_channel::is_enabled.eq(is_enabled),
                feature_channel::updated_at.eq(Utc::now()),
            ))
            .returning(FeatureChannelModel::as_returning())
            .get_result(&mut *conn)
            .await
            .optional()?;
        Ok(ret)
    }

    async fn delete(&self, key: ChannelKey, feature: Feature) -> Result<usize, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let target = feature_channel::table
            .filter(feature_channel::guild_id.eq(key.guild_id as i64))
            .filter(feature_channel::channel_id.eq(key.channel_id as i64))
            .filter(feature_channel::feature_name.eq(feature.as_str()));
        let deleted = diesel::delete(target).execute(&mut *conn).await?;
        Ok(deleted)
    }
}

pub struct PgTeamRegisterTable {
    base: BaseTable,
}

impl PgTeamRegisterTable {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }
}

#[async_trait]
impl TeamRegisterTable for PgTeamRegisterTable {
    async fn select(
        &self,
        feature_channel_id: i32,
    ) -> Result<Option<TeamRegisterConfigModel>, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let ret = team_register::table
            .filter(team_register::feature_channel_id.eq(feature_channel_id))
            .select(TeamRegisterConfigModel::as_select())
            .first(&mut *conn)
            .await
            .optional()?;
        Ok(ret)
    }

    async fn upsert(
        &self,
        config: &NewTeamRegisterConfig,
    ) -> Result<TeamRegisterConfigModel, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let ret = diesel::insert_into(team_register::table)
            .values(config)
            .on_conflict(team_register::feature_channel_id)
            .do_update()
            .set((
                team_register::spreadsheet_id.eq(&config.spreadsheet_id),
                team_register::team_worksheet_ids.eq(&config.team_worksheet_ids),
                team_register::summary_worksheet_id.eq(config.summary_worksheet_id),
                team_register::updated_at.eq(Utc::now()),
            ))
            .returning(TeamRegisterConfigModel::as_returning())
            .get_result(&mut *conn)
            .await?;
        Ok(ret)
    }

    async fn update_encore_roles(
        &self,
        feature_channel_id: i32,
        role_ids: &[i64],
    ) -> Result<Option<TeamRegisterConfigModel>, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let target =
            team_register::table.filter(team_register::feature_channel_id.eq(feature_channel_id));
        let ret = diesel::update(target)
            .set((
                team_register::encore_role_ids.eq(role_ids.to_vec()),
                team_register::updated_at.eq(Utc::now()),
            ))
            .returning(TeamRegisterConfigModel::as_returning())
            .get_result(&mut *conn)
            .await
            .optional()?;
        Ok(ret)
    }
}

pub struct PgShiftRegisterTable {
    base: BaseTable,
}

impl PgShiftRegisterTable {
    pub fn new(pool: PgPool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }
}

#[async_trait]
impl ShiftRegisterTable for PgShiftRegisterTable {
    async fn select(
        &self,
        feature_channel_id: i32,
    ) -> Result<Option<ShiftRegisterConfigModel>, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let ret = shift_register::table
            .filter(shift_register::feature_channel_id.eq(feature_channel_id))
            .select(ShiftRegisterConfigModel::as_select())
            .first(&mut *conn)
            .await
            .optional()?;
        Ok(ret)
    }

    async fn upsert(
        &self,
        config: &NewShiftRegisterConfig,
    ) -> Result<ShiftRegisterConfigModel, DatabaseError> {
        let mut conn = self.base.pool.get().await?;
        let ret = diesel::insert_into(shift_register::table)
            .values(config)
            .on_conflict(shift_register::feature_channel_id)
            .do_update()
            .set((
                shift_register::spreadsheet_id.eq(&config.spreadsheet_id),
                shift_register::entry_worksheet_id.eq(config.entry_worksheet_id),
                shift_register::draft_worksheet_id.eq(config.draft_worksheet_id),
                shift_register::final_schedule_worksheet_id
                    .eq(config.final_schedule_worksheet_id),
                shift_register::final_schedule_anchor_cell
                    .eq(&config.final_schedule_anchor_cell),
                shift_register::updated_at.eq(Utc::now()),
            ))
            .returning(ShiftRegisterConfigModel::as_returning())
            .get_result(&mut *conn)
            .await?;
        Ok(ret)
    }
}
