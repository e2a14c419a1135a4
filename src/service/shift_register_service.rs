//! Shift register: setup and per-user availability rows.

use std::collections::HashSet;
use std::sync::Arc;

use log::info;
use log::warn;

use crate::database::Database;
use crate::database::model::ChannelKey;
use crate::database::model::Feature;
use crate::database::model::FeatureChannelModel;
use crate::database::model::NewShiftRegisterConfig;
use crate::database::model::ShiftRegisterConfigModel;
use crate::register::Registrant;
use crate::register::content::WorksheetContent;
use crate::register::layout::WorksheetRole;
use crate::register::layout::WorksheetSlot;
use crate::register::shift::Shift;
use crate::service::error::ServiceError;
use crate::service::feature_channel_service::FeatureChannelService;
use crate::service::keyed_lock::KeyedLock;
use crate::sheets::SheetClient;
use crate::sheets::WorksheetHandle;
use crate::sheets::range;

const FEATURE: Feature = Feature::ShiftRegister;

const ROLES: [WorksheetRole; 3] = [
    WorksheetRole::ShiftEntry,
    WorksheetRole::ShiftDraft,
    WorksheetRole::ShiftFinalSchedule,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftRegisterSetup {
    pub spreadsheet: String,
    pub entry_worksheet_title: Option<String>,
    pub draft_worksheet_title: Option<String>,
    pub final_schedule_worksheet_title: Option<String>,
    pub final_schedule_anchor_cell: Option<String>,
}

impl ShiftRegisterSetup {
    pub fn from_form(
        spreadsheet: &str,
        entry: Option<&str>,
        draft: Option<&str>,
        final_schedule: Option<&str>,
        anchor_cell: Option<&str>,
    ) -> Self {
        fn non_blank(input: Option<&str>) -> Option<String> {
            input
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Self {
            spreadsheet: spreadsheet.trim().to_string(),
            entry_worksheet_title: non_blank(entry),
            draft_worksheet_title: non_blank(draft),
            final_schedule_worksheet_title: non_blank(final_schedule),
            final_schedule_anchor_cell: non_blank(anchor_cell),
        }
    }

    /// Titles in entry, draft, final schedule order with defaults applied.
    fn titles(&self) -> [String; 3] {
        let [entry, draft, final_schedule] = ROLES;
        [
            self.entry_worksheet_title
                .clone()
                .unwrap_or_else(|| entry.default_title()),
            self.draft_worksheet_title
                .clone()
                .unwrap_or_else(|| draft.default_title()),
            self.final_schedule_worksheet_title
                .clone()
                .unwrap_or_else(|| final_schedule.default_title()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftRegisterSheets {
    pub spreadsheet_id: String,
    pub spreadsheet_title: String,
    pub entry: WorksheetSlot,
    pub draft: WorksheetSlot,
    pub final_schedule: WorksheetSlot,
}

impl ShiftRegisterSheets {
    pub fn url(&self) -> String {
        range::spreadsheet_url(&self.spreadsheet_id)
    }

    pub fn slots(&self) -> [&WorksheetSlot; 3] {
        [&self.entry, &self.draft, &self.final_schedule]
    }

    pub fn missing(&self) -> Vec<&WorksheetSlot> {
        self.slots()
            .into_iter()
            .filter(|slot| slot.is_missing())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftRegisterSettings {
    pub config: ShiftRegisterConfigModel,
    pub sheets: ShiftRegisterSheets,
}

impl ShiftRegisterSettings {
    /// Worksheet titles and IDs for the status display.
    pub fn status_text(&self) -> String {
        let sheets = &self.sheets;
        let mut lines = vec![format!(
            "**Spreadsheet:** [{}]({})",
            sheets.spreadsheet_title,
            sheets.url()
        )];
        lines.extend(
            sheets
                .slots()
                .into_iter()
                .map(|slot| format!("- {}: {}", slot.role.label(), slot.status_line())),
        );
        lines.push(format!(
            "- Final Schedule Anchor Cell: `{}`",
            self.config.final_schedule_anchor_cell
        ));
        lines.join("\n")
    }
}

pub struct ShiftRegisterService {
    db: Arc<Database>,
    sheets: Arc<SheetClient>,
    channels: Arc<FeatureChannelService>,
    locks: KeyedLock<u64>,
}

impl ShiftRegisterService {
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

    pub async fn settings(
        &self,
        key: ChannelKey,
    ) -> Result<Option<ShiftRegisterSettings>, ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let Some(config) = self
            .db
            .shift_register_table
            .select(feature_channel.id)
            .await?
        else {
            return Ok(None);
        };

        let sheets = self.resolve_sheets(&config).await?;
        Ok(Some(ShiftRegisterSettings { config, sheets }))
    }

    /// Ensures the entry, draft and final schedule worksheets and saves
    /// their IDs.
    ///
    /// # Performance
    /// * DB calls: 3
    pub async fn setup(
        &self,
        key: ChannelKey,
        setup: &ShiftRegisterSetup,
    ) -> Result<ShiftRegisterSettings, ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let spreadsheet_id = range::parse_spreadsheet_id(&setup.spreadsheet).ok_or_else(|| {
            ServiceError::invalid_input(
                "Google Sheet Link",
                "paste the link of the sheet or its ID",
            )
        })?;

        let titles = setup.titles();
        let unique: HashSet<&String> = titles.iter().collect();
        if unique.len() != titles.len() {
            return Err(ServiceError::invalid_input(
                "Worksheet Titles",
                "the entry, draft and final schedule worksheets need different titles",
            ));
        }
        let anchor_cell =
            range::normalize_anchor_cell(setup.final_schedule_anchor_cell.as_deref());

        let previous = self
            .db
            .shift_register_table
            .select(feature_channel.id)
            .await?;

        let worksheets = self
            .sheets
            .get_or_create_worksheets(&spreadsheet_id, &titles)
            .await?;
        let config = self
            .persist(&feature_channel, &spreadsheet_id, &worksheets, anchor_cell)
            .await?;

        if let Some(previous) = previous
            && previous.spreadsheet_id != config.spreadsheet_id
        {
            self.sheets.invalidate(&previous.spreadsheet_id);
        }

        info!(
            "Set up shift register in channel {} with spreadsheet {}",
            key.channel_id, config.spreadsheet_id
        );
        let sheets = self.resolve_sheets(&config).await?;
        Ok(ShiftRegisterSettings { config, sheets })
    }

    /// Parses the hour ranges in `content` and upserts the user's row in the
    /// entry worksheet. Returns `None` when the message holds no range.
    pub async fn register_shift(
        &self,
        key: ChannelKey,
        registrant: &Registrant,
        content: &str,
    ) -> Result<Option<Shift>, ServiceError> {
        let Some(shift) = Shift::parse(content) else {
            return Ok(None);
        };
        let (feature_channel, config) = self.require_config(key).await?;

        let _guard = self.locks.lock(key.channel_id).await;
        let sheets = self.resolve_sheets(&config).await?;
        let (config, sheets) = self.ensure_sheets(&feature_channel, &config, sheets).await?;
        let entry = entry_worksheet(&sheets)?;

        let grid = self
            .sheets
            .read_worksheets(&config.spreadsheet_id, &[entry])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        let mut content = WorksheetContent::from_grid(Shift::columns(), grid);
        content.upsert(shift.to_row(registrant));
        self.sheets
            .write_worksheets(&config.spreadsheet_id, &[(entry, content.to_grid())])
            .await?;

        info!(
            "Registered shift {shift} of {} in channel {}",
            registrant.username, key.channel_id
        );
        Ok(Some(shift))
    }

    /// Removes the user's row from the entry worksheet.
    pub async fn delete_user_data(
        &self,
        key: ChannelKey,
        username: &str,
    ) -> Result<bool, ServiceError> {
        let (_, config) = self.require_config(key).await?;

        let _guard = self.locks.lock(key.channel_id).await;
        let sheets = self.resolve_sheets(&config).await?;
        let Some(entry) = sheets.entry.worksheet.as_ref() else {
            return Ok(false);
        };

        let grid = self
            .sheets
            .read_worksheets(&config.spreadsheet_id, &[entry])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        let mut content = WorksheetContent::from_grid(Shift::columns(), grid);
        if !content.delete(username) {
            return Ok(false);
        }
        self.sheets
            .write_worksheets(&config.spreadsheet_id, &[(entry, content.to_grid())])
            .await?;

        info!(
            "Deleted shift register data of {username} in channel {}",
            key.channel_id
        );
        Ok(true)
    }

    pub async fn clear(&self, key: ChannelKey) -> Result<usize, ServiceError> {
        if let Some(feature_channel) = self.channels.get(key, FEATURE).await?
            && let Some(config) = self
                .db
                .shift_register_table
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
    ) -> Result<(FeatureChannelModel, ShiftRegisterConfigModel), ServiceError> {
        let feature_channel = self.channels.require_enabled(key, FEATURE).await?;
        let config = self
            .db
            .shift_register_table
            .select(feature_channel.id)
            .await?
            .ok_or(ServiceError::NotConfigured { feature: FEATURE })?;
        Ok((feature_channel, config))
    }

    async fn resolve_sheets(
        &self,
        config: &ShiftRegisterConfigModel,
    ) -> Result<ShiftRegisterSheets, ServiceError> {
        let spreadsheet = self.sheets.spreadsheet(&config.spreadsheet_id).await?;
        let [entry, draft, final_schedule] = ROLES;
        Ok(ShiftRegisterSheets {
            spreadsheet_id: spreadsheet.id.clone(),
            spreadsheet_title: spreadsheet.title.clone(),
            entry: WorksheetSlot::resolve(entry, config.entry_worksheet_id, &spreadsheet),
            draft: WorksheetSlot::resolve(draft, config.draft_worksheet_id, &spreadsheet),
            final_schedule: WorksheetSlot::resolve(
                final_schedule,
                config.final_schedule_worksheet_id,
                &spreadsheet,
            ),
        })
    }

    /// Recreates deleted worksheets under their default titles.
    async fn ensure_sheets(
        &self,
        feature_channel: &FeatureChannelModel,
        config: &ShiftRegisterConfigModel,
        sheets: ShiftRegisterSheets,
    ) -> Result<(ShiftRegisterConfigModel, ShiftRegisterSheets), ServiceError> {
        let missing = sheets.missing();
        if missing.is_empty() {
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

        let mut taken: HashSet<String> = sheets
            .slots()
            .into_iter()
            .filter_map(|slot| slot.title())
            .map(str::to_string)
            .collect();
        let titles: Vec<String> = sheets
            .slots()
            .into_iter()
            .map(|slot| match slot.title() {
                Some(title) => title.to_string(),
                None => {
                    let title = slot.role.default_titles().next_free(&taken);
                    taken.insert(title.clone());
                    title
                }
            })
            .collect();

        let worksheets = self
            .sheets
            .get_or_create_worksheets(&sheets.spreadsheet_id, &titles)
            .await?;
        let config = self
            .persist(
                feature_channel,
                &sheets.spreadsheet_id,
                &worksheets,
                config.final_schedule_anchor_cell.clone(),
            )
            .await?;

        let mut found = worksheets
            .into_iter()
            .zip(ROLES)
            .map(|(ws, role)| WorksheetSlot::found(role, ws));
        let (Some(entry), Some(draft), Some(final_schedule)) = (found.next(), found.next(), found.next())
        else {
            return Err(worksheet_count_mismatch());
        };
        let sheets = ShiftRegisterSheets {
            entry,
            draft,
            final_schedule,
            ..sheets
        };
        Ok((config, sheets))
    }

    async fn persist(
        &self,
        feature_channel: &FeatureChannelModel,
        spreadsheet_id: &str,
        worksheets: &[WorksheetHandle],
        anchor_cell: String,
    ) -> Result<ShiftRegisterConfigModel, ServiceError> {
        let [entry, draft, final_schedule] = worksheets else {
            return Err(worksheet_count_mismatch());
        };
        let config = NewShiftRegisterConfig {
            feature_channel_id: feature_channel.id,
            spreadsheet_id: spreadsheet_id.to_string(),
            entry_worksheet_id: entry.id,
            draft_worksheet_id: draft.id,
            final_schedule_worksheet_id: final_schedule.id,
            final_schedule_anchor_cell: anchor_cell,
        };
        Ok(self.db.shift_register_table.upsert(&config).await?)
    }
}

fn entry_worksheet(sheets: &ShiftRegisterSheets) -> Result<&WorksheetHandle, ServiceError> {
    sheets
        .entry
        .worksheet
        .as_ref()
        .ok_or_else(|| ServiceError::UnexpectedResult {
            message: "Entry worksheet is missing after ensuring worksheets".to_string(),
        })
}

fn worksheet_count_mismatch() -> ServiceError {
    ServiceError::UnexpectedResult {
        message: "Expected 3 shift worksheets".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_titles_default() {
        let setup = ShiftRegisterSetup::from_form("ABC123", None, Some(" "), Some("Final"), None);
        assert_eq!(
            setup.titles(),
            [
                "Shift Entry".to_string(),
                "Shift Draft".to_string(),
                "Final".to_string()
            ]
        );
    }
}
