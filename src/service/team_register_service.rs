//! Team register: setup, per-user registration and the summary worksheet.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use log::info;
use log::warn;

use crate::database::Database;
use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::database::model::FeatureChannelModel;
use crate::database::model::NewTeamRegisterConfig;
use crate::database::model::TeamRegisterConfigModel;
use crate::register::Registrant;
use crate::register::content::WorksheetContent;
use crate::register::layout::WorksheetRole;
use crate::register::layout::WorksheetSlot;
use crate::register::layout::plan_titles;
use crate::register::team::ClassifiedTeams;
use crate::register::team::SummaryRow;
use crate::register::team::Team;
use crate::register::team::summarize;
use crate::register::team::summary_columns;
use crate::service::error::ServiceError;
use crate::service::feature_channel_service::FeatureChannelService;
use crate::service::keyed_lock::KeyedLock;
use crate::sheets::Grid;
use crate::sheets::SheetClient;
use crate::sheets::WorksheetHandle;
use crate::sheets::range;

const FEATURE: Feature = Feature::TeamRegister;

/// Input of the setup and edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRegisterSetup {
    pub spreadsheet: String,
    pub team_worksheet_titles: Vec<String>,
    pub summary_worksheet_title: Option<String>,
}

impl TeamRegisterSetup {
    /// `team_titles` holds one title per line.
    pub fn from_form(spreadsheet: &str, team_titles: Option<&str>, summary_title: Option<&str>) -> Self {
        Self {
            spreadsheet: spreadsheet.trim().to_string(),
            team_worksheet_titles: team_titles
                .unwrap_or_default()
                .lines()
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .map(str::to_string)
                .collect(),
            summary_worksheet_title: summary_title
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .map(str::to_string),
        }
    }
}

/// Configured worksheets resolved against the spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRegisterSheets {
    pub spreadsheet_id: String,
    pub spreadsheet_title: String,
    pub teams: Vec<WorksheetSlot>,
    pub summary: WorksheetSlot,
}

impl TeamRegisterSheets {
    pub fn url(&self) -> String {
        range::spreadsheet_url(&self.spreadsheet_id)
    }

    pub fn slots(&self) -> impl Iterator<Item = &WorksheetSlot> {
        self.teams.iter().chain(std::iter::once(&self.summary))
    }

    pub fn missing(&self) -> Vec<&WorksheetSlot> {
        self.slots().filter(|slot| slot.is_missing()).collect()
    }

    pub fn team_worksheets(&self) -> Vec<&WorksheetHandle> {
        self.teams
            .iter()
            .filter_map(|slot| slot.worksheet.as_ref())
            .collect()
    }

    fn resolved_titles(&self) -> HashSet<String> {
        self.slots()
            .filter_map(|slot| slot.title())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRegisterSettings {
    pub config: TeamRegisterConfigModel,
    pub sheets: TeamRegisterSheets,
}

impl TeamRegisterSettings {
    /// Worksheet titles and IDs for the status display.
    pub fn status_text(&self) -> String {
        let sheets = &self.sheets;
        let mut lines = vec![
            format!("**Spreadsheet:** [{}]({})", sheets.spreadsheet_title, sheets.url()),
            "**Team Worksheets**".to_string(),
        ];
        lines.extend(sheets.teams.iter().map(|slot| format!("- {}", slot.status_line())));
        lines.push("**Summary Worksheet**".to_string());
        lines.push(format!("- {}", sheets.summary.status_line()));
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSummary {
    pub spreadsheet_url: String,
    pub team_titles: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

pub struct TeamRegisterService {
    db: Arc<Database>,
    sheets: Arc<SheetClient>,
    channels: Arc<FeatureChannelService>,
    locks: KeyedLock<u64>,
}

impl TeamRegisterService {
    pub fn new(
        db: Arc<Database>,
        sheets: Arc<SheetClient>,
        channels: Arc<FeatureChannelService>,
    ) -> Self {
        Self {
            db,
            sheets,
            channels,
            locks: KeyedLock::new(),
        }
    }

    pub fn sheets(&self) -> &SheetClient {
        &self.sheets
    }

    /// Current settings, or `None` before the first setup.
    pub async fn settings(
        &self,
        key: ChannelKey,
    ) -> Result<Option<TeamRegisterSettings>, ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let Some(config) = self
            .db
            .team_register_table
            .select(feature_channel.id)
            .await?
        else {
            return Ok(None);
        };

        let sheets = self.resolve_sheets(&config).await?;
        Ok(Some(TeamRegisterSettings { config, sheets }))
    }

    /// Creates or updates the configuration from the setup form.
    ///
    /// Worksheets are looked up by title and only the missing ones are
    /// created, so running the same setup again changes nothing.
    ///
    /// # Performance
    /// * DB calls: 3
    pub async fn setup(
        &self,
        key: ChannelKey,
        setup: &TeamRegisterSetup,
    ) -> Result<TeamRegisterSettings, ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let spreadsheet_id = range::parse_spreadsheet_id(&setup.spreadsheet).ok_or_else(|| {
            ServiceError::invalid_input(
                "Google Sheet Link",
                "paste the link of the sheet or its ID",
            )
        })?;

        let mut team_titles: Vec<String> = Vec::new();
        for title in &setup.team_worksheet_titles {
            if !team_titles.contains(title) {
                team_titles.push(title.clone());
            }
        }
        if team_titles.is_empty() {
            team_titles = WorksheetRole::Team.default_titles().take(3).collect();
        }
        let summary_title = setup
            .summary_worksheet_title
            .clone()
            .unwrap_or_else(|| WorksheetRole::Summary.default_title());
        if team_titles.contains(&summary_title) {
            return Err(ServiceError::invalid_input(
                "Summary Worksheet Title",
                "it must differ from the team worksheet titles",
            ));
        }

        let previous = self
            .db
            .team_register_table
            .select(feature_channel.id)
            .await?;

        let mut titles = team_titles;
        titles.push(summary_title);
        let worksheets = self
            .sheets
            .get_or_create_worksheets(&spreadsheet_id, &titles)
            .await?;

        let encore_role_ids = previous
            .as_ref()
            .map(|config| config.encore_role_ids.clone())
            .unwrap_or_default();
        let config = self
            .persist(&feature_channel, &spreadsheet_id, &worksheets, encore_role_ids)
            .await?;

        if let Some(previous) = previous
            && previous.spreadsheet_id != config.spreadsheet_id
        {
            self.sheets.invalidate(&previous.spreadsheet_id);
        }

        info!(
            "Set up team register in channel {} with spreadsheet {}",
            key.channel_id, config.spreadsheet_id
        );
        let sheets = self.resolve_sheets(&config).await?;
        Ok(TeamRegisterSettings { config, sheets })
    }

    /// # Performance
    /// * DB calls: 2
    pub async fn update_encore_roles(
        &self,
        key: ChannelKey,
        role_ids: &[u64],
    ) -> Result<TeamRegisterConfigModel, ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let role_ids: Vec<i64> = role_ids.iter().map(|id| *id as i64).collect();
        self.db
            .team_register_table
            .update_encore_roles(feature_channel.id, &role_ids)
            .await?
            .ok_or(ServiceError::NotConfigured { feature: FEATURE })
    }

    /// Parses the teams in `content` and writes them to the team and summary
    /// worksheets. Returns `None` when the message holds no team.
    pub async fn register_teams(
        &self,
        key: ChannelKey,
        registrant: &Registrant,
        content: &str,
    ) -> Result<Option<ClassifiedTeams>, ServiceError> {
        let Some(classified) = ClassifiedTeams::classify(Team::parse_message(content)) else {
            return Ok(None);
        };
        let (feature_channel, config) = self.require_config(key).await?;

        let _guard = self.locks.lock(key.channel_id).await;
        let sheets = self.resolve_sheets(&config).await?;
        let (config, sheets) = self
            .ensure_sheets(&feature_channel, &config, sheets, classified.slot_count())
            .await?;

        let team_worksheets = sheets.team_worksheets();
        let summary_worksheet = self.summary_worksheet(&sheets)?;
        let mut grids = self
            .read_with_summary(&config.spreadsheet_id, &team_worksheets, summary_worksheet)
            .await?;

        let slots = classified.slots();
        let team_slots: Vec<Option<&Team>> = (0..team_worksheets.len())
            .map(|i| slots.get(i).copied().flatten())
            .collect();

        let mut updates: Vec<(&WorksheetHandle, Grid)> = Vec::new();
        for (worksheet, slot) in team_worksheets.iter().zip(&team_slots) {
            let mut content = WorksheetContent::from_grid(Team::columns(), grids.next().unwrap_or_default());
            match slot {
                Some(team) => content.upsert(team.to_row(registrant)),
                None => {
                    if !content.delete(&registrant.username) {
                        continue;
                    }
                }
            }
            updates.push((*worksheet, content.to_grid()));
        }

        let titles: Vec<String> = team_worksheets.iter().map(|ws| ws.title.clone()).collect();
        let summary_row = SummaryRow::from_teams(registrant, &config.encore_role_ids, &team_slots);
        let mut summary =
            WorksheetContent::from_grid(summary_columns(&titles), grids.next().unwrap_or_default());
        summary.upsert(summary_row.to_row());
        updates.push((summary_worksheet, summary.to_grid()));

        self.sheets
            .write_worksheets(&config.spreadsheet_id, &updates)
            .await?;
        info!(
            "Registered {} teams of {} in channel {}",
            classified.slots().iter().flatten().count(),
            registrant.username,
            key.channel_id
        );
        Ok(Some(classified))
    }

    /// Removes the user's rows from every team worksheet and the summary.
    /// Returns whether any row was removed.
    pub async fn delete_user_data(
        &self,
        key: ChannelKey,
        username: &str,
    ) -> Result<bool, ServiceError> {
        let (_, config) = self.require_config(key).await?;

        let _guard = self.locks.lock(key.channel_id).await;
        let sheets = self.resolve_sheets(&config).await?;
        let team_worksheets = sheets.team_worksheets();
        let titles: Vec<String> = team_worksheets.iter().map(|ws| ws.title.clone()).collect();

        let mut targets: Vec<(&WorksheetHandle, Vec<_>)> = team_worksheets
            .iter()
            .map(|ws| (*ws, Team::columns()))
            .collect();
        if let Some(summary) = sheets.summary.worksheet.as_ref() {
            targets.push((summary, summary_columns(&titles)));
        }

        let worksheets: Vec<&WorksheetHandle> = targets.iter().map(|(ws, _)| *ws).collect();
        let grids = self
            .sheets
            .read_worksheets(&config.spreadsheet_id, &worksheets)
            .await?;

        let mut updates: Vec<(&WorksheetHandle, Grid)> = Vec::new();
        for ((worksheet, columns), grid) in targets.into_iter().zip(grids) {
            let mut content = WorksheetContent::from_grid(columns, grid);
            if content.delete(username) {
                updates.push((worksheet, content.to_grid()));
            }
        }

        let deleted = !updates.is_empty();
        self.sheets
            .write_worksheets(&config.spreadsheet_id, &updates)
            .await?;
        info!(
            "Deleted team register data of {username} in channel {} ({} worksheets)",
            key.channel_id,
            updates.len()
        );
        Ok(deleted)
    }

    /// Rebuilds the summary worksheet from the team worksheets.
    pub async fn refresh_summary(
        &self,
        key: ChannelKey,
        members: &HashMap<String, Registrant>,
    ) -> Result<TeamSummary, ServiceError> {
        let (feature_channel, config) = self.require_config(key).await?;

        let _guard = self.locks.lock(key.channel_id).await;
        let sheets = self.resolve_sheets(&config).await?;
        let (config, sheets) = self
            .ensure_sheets(&feature_channel, &config, sheets, 0)
            .await?;

        let team_worksheets = sheets.team_worksheets();
        let summary_worksheet = self.summary_worksheet(&sheets)?;
        let mut grids = self
            .read_with_summary(&config.spreadsheet_id, &team_worksheets, summary_worksheet)
            .await?;

        let contents: Vec<WorksheetContent> = team_worksheets
            .iter()
            .map(|_| WorksheetContent::from_grid(Team::columns(), grids.next().unwrap_or_default()))
            .collect();
        let rows = summarize(&contents, members, &config.encore_role_ids);

        let titles: Vec<String> = team_worksheets.iter().map(|ws| ws.title.clone()).collect();
        let mut summary =
            WorksheetContent::from_grid(summary_columns(&titles), grids.next().unwrap_or_default());
        summary.replace_rows(rows.iter().map(SummaryRow::to_row).collect());
        self.sheets
            .write_worksheets(&config.spreadsheet_id, &[(summary_worksheet, summary.to_grid())])
            .await?;

        debug!(
            "Refreshed team summary of channel {} with {} users",
            key.channel_id,
            rows.len()
        );
        Ok(TeamSummary {
            spreadsheet_url: sheets.url(),
            team_titles: titles,
            rows,
        })
    }

    /// Deletes the feature record and its settings and forgets the cached
    /// worksheets of the configured spreadsheet.
    pub async fn clear(&self, key: ChannelKey) -> Result<usize, ServiceError> {
        if let Some(feature_channel) = self.channels.get(key, FEATURE).await?
            && let Some(config) = self
                .db
                .team_register_table
                .select(feature_channel.id)
                .await?
        {
            self.sheets.invalidate(&config.spreadsheet_id);
        }
        self.channels.clear(key, FEATURE).await
    }

    async fn require_config(
        &self,
        key: ChannelKey,
    ) -> Result<(FeatureChannelModel, TeamRegisterConfigModel), ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let config = self
            .db
            .team_register_table
            .select(feature_channel.id)
            .await?
            .ok_or(ServiceError::NotConfigured { feature: FEATURE })?;
        Ok((feature_channel, config))
    }

    async fn resolve_sheets(
        &self,
        config: &TeamRegisterConfigModel,
    ) -> Result<TeamRegisterSheets, ServiceError> {
        let spreadsheet = self.sheets.spreadsheet(&config.spreadsheet_id).await?;
        Ok(TeamRegisterSheets {
            spreadsheet_id: spreadsheet.id.clone(),
            spreadsheet_title: spreadsheet.title.clone(),
            teams: config
                .team_worksheet_ids
                .iter()
                .map(|id| WorksheetSlot::resolve(WorksheetRole::Team, *id, &spreadsheet))
                .collect(),
            summary: WorksheetSlot::resolve(
                WorksheetRole::Summary,
                config.summary_worksheet_id,
                &spreadsheet,
            ),
        })
    }

    /// Makes sure at least `team_count` team worksheets and the summary
    /// worksheet exist. Missing worksheets are recreated under default titles
    /// and the configuration is updated with the new IDs.
    async fn ensure_sheets(
        &self,
        feature_channel: &FeatureChannelModel,
        config: &TeamRegisterConfigModel,
        sheets: TeamRegisterSheets,
        team_count: usize,
    ) -> Result<(TeamRegisterConfigModel, TeamRegisterSheets), ServiceError> {
        let missing = sheets.missing();
        if missing.is_empty() && sheets.teams.len() >= team_count {
            return Ok((config.clone(), sheets));
        }
        for slot in &missing {
            warn!(
                "{} worksheet {} of spreadsheet {} no longer exists",
                slot.role.label(),
                slot.id,
                sheets.spreadsheet_id
            );
        }

        let mut taken = sheets.resolved_titles();
        let mut titles = plan_titles(&sheets.teams, WorksheetRole::Team, team_count, &mut taken);
        let summary_title = match sheets.summary.title() {
            Some(title) => title.to_string(),
            None => WorksheetRole::Summary.default_titles().next_free(&taken),
        };
        titles.push(summary_title);

        let worksheets = self
            .sheets
            .get_or_create_worksheets(&sheets.spreadsheet_id, &titles)
            .await?;
        let config = self
            .persist(
                feature_channel,
                &sheets.spreadsheet_id,
                &worksheets,
                config.encore_role_ids.clone(),
            )
            .await?;

        let (summary, teams) = split_summary(&worksheets)?;
        let sheets = TeamRegisterSheets {
            teams: teams
                .iter()
                .cloned()
                .map(|ws| WorksheetSlot::found(WorksheetRole::Team, ws))
                .collect(),
            summary: WorksheetSlot::found(WorksheetRole::Summary, summary.clone()),
            ..sheets
        };
        Ok((config, sheets))
    }

    /// Saves the worksheet IDs. The last worksheet is the summary.
    async fn persist(
        &self,
        feature_channel: &FeatureChannelModel,
        spreadsheet_id: &str,
        worksheets: &[WorksheetHandle],
        encore_role_ids: Vec<i64>,
    ) -> Result<TeamRegisterConfigModel, ServiceError> {
        let (summary, teams) = split_summary(worksheets)?;
        let config = NewTeamRegisterConfig {
            feature_channel_id: feature_channel.id,
            spreadsheet_id: spreadsheet_id.to_string(),
            team_worksheet_ids: teams.iter().map(|ws| ws.id).collect(),
            summary_worksheet_id: summary.id,
            encore_role_ids,
        };
        Ok(self.db.team_register_table.upsert(&config).await?)
    }

    fn summary_worksheet<'a>(
        &self,
        sheets: &'a TeamRegisterSheets,
    ) -> Result<&'a WorksheetHandle, ServiceError> {
        sheets
            .summary
            .worksheet
            .as_ref()
            .ok_or_else(|| ServiceError::UnexpectedResult {
                message: "Summary worksheet is missing after ensuring worksheets".to_string(),
            })
    }

    /// Reads the team worksheets followed by the summary worksheet.
    async fn read_with_summary(
        &self,
        spreadsheet_id: &str,
        team_worksheets: &[&WorksheetHandle],
        summary_worksheet: &WorksheetHandle,
    ) -> Result<std::vec::IntoIter<Grid>, ServiceError> {
        let mut worksheets = team_worksheets.to_vec();
        worksheets.push(summary_worksheet);
        let grids = self
            .sheets
            .read_worksheets(spreadsheet_id, &worksheets)
            .await?;
        Ok(grids.into_iter())
    }
}

fn split_summary(
    worksheets: &[WorksheetHandle],
) -> Result<(&WorksheetHandle, &[WorksheetHandle]), ServiceError> {
    worksheets
        .split_last()
        .ok_or_else(|| ServiceError::UnexpectedResult {
            message: "No worksheets were returned".to_string(),
        })
}
