//! Database models for the feature channel and register configuration tables.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use diesel::prelude::*;

use crate::database::schema::feature_channel;
use crate::database::schema::shift_register;
use crate::database::schema::team_register;

/// Features that can be toggled per channel.
///
/// Persisted as a string discriminator in `feature_channel.feature_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    TeamRegister,
    ShiftRegister,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::TeamRegister, Feature::ShiftRegister];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::TeamRegister => "team_register",
            Feature::ShiftRegister => "shift_register",
        }
    }

    /// Human readable name used in Discord responses.
    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::TeamRegister => "Team Register",
            Feature::ShiftRegister => "Shift Register",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown feature \"{0}\"")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// Identifies a text channel inside a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub guild_id: u64,
    pub channel_id: u64,
}

impl ChannelKey {
    pub fn new(guild_id: u64, channel_id: u64) -> Self {
        Self {
            guild_id,
            channel_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = feature_channel)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeatureChannelModel {
    pub id: i32,
    pub guild_id: i64,
    pub channel_id: i64,
    pub feature_name: String,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureChannelModel {
    pub fn feature(&self) -> Result<Feature, UnknownFeature> {
        self.feature_name.parse()
    }

    pub fn key(&self) -> ChannelKey {
        ChannelKey::new(self.guild_id as u64, self.channel_id as u64)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feature_channel)]
pub struct NewFeatureChannel<'a> {
    pub guild_id: i64,
    pub channel_id: i64,
    pub feature_name: &'a str,
    pub is_enabled: bool,
}

impl<'a> NewFeatureChannel<'a> {
    pub fn new(key: ChannelKey, feature: Feature, is_enabled: bool) -> Self {
        Self {
            guild_id: key.guild_id as i64,
            channel_id: key.channel_id as i64,
            feature_name: feature.as_str(),
            is_enabled,
        }
    }
}

/// Team register settings of one feature channel.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = team_register)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamRegisterConfigModel {
    pub id: i32,
    pub feature_channel_id: i32,
    pub spreadsheet_id: String,
    /// Ordered as main, encore, backup, then extra teams.
    pub team_worksheet_ids: Vec<i64>,
    pub summary_worksheet_id: i64,
    pub encore_role_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_register)]
pub struct NewTeamRegisterConfig {
    pub feature_channel_id: i32,
    pub spreadsheet_id: String,
    pub team_worksheet_ids: Vec<i64>,
    pub summary_worksheet_id: i64,
    pub encore_role_ids: Vec<i64>,
}

/// Shift register settings of one feature channel.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = shift_register)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShiftRegisterConfigModel {
    pub id: i32,
    pub feature_channel_id: i32,
    pub spreadsheet_id: String,
    pub entry_worksheet_id: i64,
    pub draft_worksheet_id: i64,
    pub final_schedule_worksheet_id: i64,
    pub final_schedule_anchor_cell: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shift_register)]
pub struct NewShiftRegisterConfig {
    pub feature_channel_id: i32,
    pub spreadsheet_id: String,
    pub entry_worksheet_id: i64,
    pub draft_worksheet_id: i64,
    pub final_schedule_worksheet_id: i64,
    pub final_schedule_anchor_cell: String,
}
