use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use rhoboto::database::Database;
use rhoboto::database::error::DatabaseError;
use rhoboto::database::model::ChannelKey;
use rhoboto::database::model::Feature;
use rhoboto::database::model::FeatureChannelModel;
use rhoboto::database::model::NewShiftRegisterConfig;
use rhoboto::database::model::NewTeamRegisterConfig;
use rhoboto::database::model::ShiftRegisterConfigModel;
use rhoboto::database::model::TeamRegisterConfigModel;
use rhoboto::database::table::FeatureChannelTable;
use rhoboto::database::table::ShiftRegisterTable;
use rhoboto::database::table::TeamRegisterTable;
use rhoboto::service::Services;
use rhoboto::sheets::Grid;
use rhoboto::sheets::SheetClient;
use rhoboto::sheets::SheetsApi;
use rhoboto::sheets::SpreadsheetHandle;
use rhoboto::sheets::ValueRange;
use rhoboto::sheets::WorksheetHandle;
use rhoboto::sheets::error::SheetsError;
use rhoboto::sheets::range::range_title;

#[allow(dead_code)]
pub const GUILD_ID: u64 = 1000;
#[allow(dead_code)]
pub const CHANNEL_ID: u64 = 2000;

#[allow(dead_code)]
pub fn channel_key() -> ChannelKey {
    ChannelKey::new(GUILD_ID, CHANNEL_ID)
}

/// Services backed by in-memory tables and a fake spreadsheet backend.
#[allow(dead_code)]
pub fn setup_services(sheets: Arc<FakeSheets>) -> Services {
    let db = Arc::new(InMemoryDatabase::new().into_database());
    let client = Arc::new(SheetClient::new(sheets));
    Services::new(db, client)
}

// IN-MEMORY DATABASE

#[derive(Default)]
struct Tables {
    next_id: i32,
    feature_channels: Vec<FeatureChannelModel>,
    team_register: Vec<TeamRegisterConfigModel>,
    shift_register: Vec<ShiftRegisterConfigModel>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Implements every table over one shared state. Deleting a feature channel
/// cascades to the register settings like the PostgreSQL foreign keys do.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

#[allow(dead_code)]
impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_database(self) -> Database {
        let tables = Arc::new(self);
        Database::from_tables(tables.clone(), tables.clone(), tables)
    }
}

fn matches(model: &FeatureChannelModel, key: ChannelKey, feature: Feature) -> bool {
    model.guild_id == key.guild_id as i64
        && model.channel_id == key.channel_id as i64
        && model.feature_name == feature.as_str()
}

#[async_trait]
impl FeatureChannelTable for InMemoryDatabase {
    async fn select(
        &self,
        key: ChannelKey,
        feature: Feature,
    ) -> Result<Option<FeatureChannelModel>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .feature_channels
            .iter()
            .find(|model| matches(model, key, feature))
            .cloned())
    }

    async fn select_all_by_channel(
        &self,
        key: ChannelKey,
    ) -> Result<Vec<FeatureChannelModel>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .feature_channels
            .iter()
            .filter(|model| model.key() == key)
            .cloned()
            .collect())
    }

    async fn upsert_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
        is_enabled: bool,
    ) -> Result<FeatureChannelModel, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(model) = tables
            .feature_channels
            .iter_mut()
            .find(|model| matches(model, key, feature))
        {
            model.is_enabled = is_enabled;
            model.updated_at = Utc::now();
            return Ok(model.clone());
        }

        let now = Utc::now();
        let model = FeatureChannelModel {
            id: tables.next_id(),
            guild_id: key.guild_id as i64,
            channel_id: key.channel_id as i64,
            feature_name: feature.as_str().to_string(),
            is_enabled,
            created_at: now,
            updated_at: now,
        };
        tables.feature_channels.push(model.clone());
        Ok(model)
    }

    async fn update_enabled(
        &self,
        key: ChannelKey,
        feature: Feature,
        is_enabled: bool,
    ) -> Result<Option<FeatureChannelModel>, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .feature_channels
            .iter_mut()
            .find(|model| matches(model, key, feature))
            .map(|model| {
                model.is_enabled = is_enabled;
                model.clone()
            }))
    }

    async fn delete(&self, key: ChannelKey, feature: Feature) -> Result<usize, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(position) = tables
            .feature_channels
            .iter()
            .position(|model| matches(model, key, feature))
        else {
            return Ok(0);
        };

        let removed = tables.feature_channels.remove(position);
        tables
            .team_register
            .retain(|config| config.feature_channel_id != removed.id);
        tables
            .shift_register
            .retain(|config| config.feature_channel_id != removed.id);
        Ok(1)
    }
}

#[async_trait]
impl TeamRegisterTable for InMemoryDatabase {
    async fn select(
        &self,
        feature_channel_id: i32,
    ) -> Result<Option<TeamRegisterConfigModel>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .team_register
            .iter()
            .find(|config| config.feature_channel_id == feature_channel_id)
            .cloned())
    }

    async fn upsert(
        &self,
        config: &NewTeamRegisterConfig,
    ) -> Result<TeamRegisterConfigModel, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = tables
            .team_register
            .iter_mut()
            .find(|existing| existing.feature_channel_id == config.feature_channel_id)
        {
            existing.spreadsheet_id = config.spreadsheet_id.clone();
            existing.team_worksheet_ids = config.team_worksheet_ids.clone();
            existing.summary_worksheet_id = config.summary_worksheet_id;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let model = TeamRegisterConfigModel {
            id: tables.next_id(),
            feature_channel_id: config.feature_channel_id,
            spreadsheet_id: config.spreadsheet_id.clone(),
            team_worksheet_ids: config.team_worksheet_ids.clone(),
            summary_worksheet_id: config.summary_worksheet_id,
            encore_role_ids: config.encore_role_ids.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.team_register.push(model.clone());
        Ok(model)
    }

    async fn update_encore_roles(
        &self,
        feature_channel_id: i32,
        role_ids: &[i64],
    ) -> Result<Option<TeamRegisterConfigModel>, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .team_register
            .iter_mut()
            .find(|config| config.feature_channel_id == feature_channel_id)
            .map(|config| {
                config.encore_role_ids = role_ids.to_vec();
                config.clone()
            }))
    }
}

#[async_trait]
impl ShiftRegisterTable for InMemoryDatabase {
    async fn select(
        &self,
        feature_channel_id: i32,
    ) -> Result<Option<ShiftRegisterConfigModel>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .shift_register
            .iter()
            .find(|config| config.feature_channel_id == feature_channel_id)
            .cloned())
    }

    async fn upsert(
        &self,
        config: &NewShiftRegisterConfig,
    ) -> Result<ShiftRegisterConfigModel, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = tables
            .shift_register
            .iter_mut()
            .find(|existing| existing.feature_channel_id == config.feature_channel_id)
        {
            existing.spreadsheet_id = config.spreadsheet_id.clone();
            existing.entry_worksheet_id = config.entry_worksheet_id;
            existing.draft_worksheet_id = config.draft_worksheet_id;
            existing.final_schedule_worksheet_id = config.final_schedule_worksheet_id;
            existing.final_schedule_anchor_cell = config.final_schedule_anchor_cell.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let model = ShiftRegisterConfigModel {
            id: tables.next_id(),
            feature_channel_id: config.feature_channel_id,
            spreadsheet_id: config.spreadsheet_id.clone(),
            entry_worksheet_id: config.entry_worksheet_id,
            draft_worksheet_id: config.draft_worksheet_id,
            final_schedule_worksheet_id: config.final_schedule_worksheet_id,
            final_schedule_anchor_cell: config.final_schedule_anchor_cell.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.shift_register.push(model.clone());
        Ok(model)
    }
}

// FAKE SHEETS

struct FakeSpreadsheet {
    title: String,
    worksheets: Vec<(WorksheetHandle, Grid)>,
}

impl FakeSpreadsheet {
    fn grid_mut(&mut self, title: &str) -> Option<&mut Grid> {
        self.worksheets
            .iter_mut()
            .find(|(ws, _)| ws.title == title)
            .map(|(_, grid)| grid)
    }
}

/// Spreadsheet backend that keeps worksheets in memory and counts calls.
#[derive(Default)]
pub struct FakeSheets {
    spreadsheets: Mutex<HashMap<String, FakeSpreadsheet>>,
    next_worksheet_id: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeSheets {
    pub fn new() -> Self {
        Self {
            next_worksheet_id: AtomicUsize::new(100),
            ..Default::default()
        }
    }

    /// Adds a spreadsheet with empty worksheets.
    pub fn with_spreadsheet(self, id: &str, title: &str, worksheet_titles: &[&str]) -> Self {
        let worksheets = worksheet_titles
            .iter()
            .enumerate()
            .map(|(index, title)| (self.handle(title, index as u32), Grid::new()))
            .collect();
        self.spreadsheets.lock().unwrap().insert(
            id.to_string(),
            FakeSpreadsheet {
                title: title.to_string(),
                worksheets,
            },
        );
        self
    }

    pub fn grid(&self, spreadsheet_id: &str, title: &str) -> Option<Grid> {
        let mut spreadsheets = self.spreadsheets.lock().unwrap();
        spreadsheets
            .get_mut(spreadsheet_id)?
            .grid_mut(title)
            .map(|grid| grid.clone())
    }

    pub fn worksheet_titles(&self, spreadsheet_id: &str) -> Vec<String> {
        let spreadsheets = self.spreadsheets.lock().unwrap();
        spreadsheets
            .get(spreadsheet_id)
            .map(|spreadsheet| {
                spreadsheet
                    .worksheets
                    .iter()
                    .map(|(ws, _)| ws.title.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deletes a worksheet the way a user would in the browser.
    pub fn remove_worksheet(&self, spreadsheet_id: &str, title: &str) {
        let mut spreadsheets = self.spreadsheets.lock().unwrap();
        if let Some(spreadsheet) = spreadsheets.get_mut(spreadsheet_id) {
            spreadsheet.worksheets.retain(|(ws, _)| ws.title != title);
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn adds(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Number of calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.fetches() + self.adds() + self.reads() + self.writes()
    }

    fn handle(&self, title: &str, index: u32) -> WorksheetHandle {
        WorksheetHandle {
            id: self.next_worksheet_id.fetch_add(1, Ordering::SeqCst) as i64,
            title: title.to_string(),
            index,
        }
    }
}

fn not_found(spreadsheet_id: &str) -> SheetsError {
    SheetsError::NotFound {
        message: format!("Requested entity was not found: {spreadsheet_id}"),
    }
}

fn unknown_range(range: &str) -> SheetsError {
    SheetsError::Api {
        status: 400,
        message: format!("Unable to parse range: {range}"),
    }
}

#[async_trait]
impl SheetsApi for FakeSheets {
    async fn fetch_spreadsheet(
        &self,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetHandle, SheetsError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let spreadsheets = self.spreadsheets.lock().unwrap();
        let spreadsheet = spreadsheets
            .get(spreadsheet_id)
            .ok_or_else(|| not_found(spreadsheet_id))?;
        Ok(SpreadsheetHandle {
            id: spreadsheet_id.to_string(),
            title: spreadsheet.title.clone(),
            worksheets: spreadsheet
                .worksheets
                .iter()
                .map(|(ws, _)| ws.clone())
                .collect(),
        })
    }

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<WorksheetHandle, SheetsError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        let mut spreadsheets = self.spreadsheets.lock().unwrap();
        let spreadsheet = spreadsheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| not_found(spreadsheet_id))?;
        if spreadsheet.worksheets.iter().any(|(ws, _)| ws.title == title) {
            return Err(SheetsError::Api {
                status: 400,
                message: format!("A sheet with the name \"{title}\" already exists."),
            });
        }

        let worksheet = self.handle(title, spreadsheet.worksheets.len() as u32);
        spreadsheet.worksheets.push((worksheet.clone(), Grid::new()));
        Ok(worksheet)
    }

    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Grid>, SheetsError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let mut spreadsheets = self.spreadsheets.lock().unwrap();
        let spreadsheet = spreadsheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| not_found(spreadsheet_id))?;
        ranges
            .iter()
            .map(|range| {
                spreadsheet
                    .grid_mut(&range_title(range))
                    .map(|grid| grid.clone())
                    .ok_or_else(|| unknown_range(range))
            })
            .collect()
    }

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: &[ValueRange],
    ) -> Result<(), SheetsError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let mut spreadsheets = self.spreadsheets.lock().unwrap();
        let spreadsheet = spreadsheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| not_found(spreadsheet_id))?;
        for range in data {
            let grid = spreadsheet
                .grid_mut(&range_title(&range.range))
                .ok_or_else(|| unknown_range(&range.range))?;
            *grid = range.values.clone();
        }
        Ok(())
    }

    fn service_account_email(&self) -> Option<String> {
        Some("rhoboto@example.iam.gserviceaccount.com".to_string())
    }
}
