//! Google Sheets access.
//!
//! [`SheetsApi`] is the remote surface. [`SheetClient`] wraps it with a
//! [`WorksheetCache`] so repeated worksheet lookups skip the listing call.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use log::info;

use crate::sheets::cache::WorksheetCache;
use crate::sheets::error::SheetsError;

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod range;

/// Rows of cell values, as displayed in the sheet.
pub type Grid = Vec<Vec<String>>;

/// Resolved metadata of one worksheet tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetHandle {
    pub id: i64,
    pub title: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetHandle {
    pub id: String,
    pub title: String,
    pub worksheets: Vec<WorksheetHandle>,
}

impl SpreadsheetHandle {
    pub fn url(&self) -> String {
        range::spreadsheet_url(&self.id)
    }

    pub fn worksheet_by_id(&self, id: i64) -> Option<&WorksheetHandle> {
        self.worksheets.iter().find(|ws| ws.id == id)
    }

    pub fn worksheet_by_title(&self, title: &str) -> Option<&WorksheetHandle> {
        self.worksheets.iter().find(|ws| ws.title == title)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    pub range: String,
    pub values: Grid,
}

#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Fetches the spreadsheet title and its worksheet list.
    async fn fetch_spreadsheet(&self, spreadsheet_id: &str)
    -> Result<SpreadsheetHandle, SheetsError>;

    async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<WorksheetHandle, SheetsError>;

    /// Reads each range. The result has one grid per requested range.
    async fn batch_get_values(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
    ) -> Result<Vec<Grid>, SheetsError>;

    async fn batch_update_values(
        &self,
        spreadsheet_id: &str,
        data: &[ValueRange],
    ) -> Result<(), SheetsError>;

    /// Account that spreadsheets must be shared with, if known.
    fn service_account_email(&self) -> Option<String> {
        None
    }
}

/// Caching wrapper around a [`SheetsApi`].
pub struct SheetClient {
    api: Arc<dyn SheetsApi>,
    cache: WorksheetCache,
}

impl SheetClient {
    pub fn new(api: Arc<dyn SheetsApi>) -> Self {
        Self {
            api,
            cache: WorksheetCache::new(),
        }
    }

    pub fn cache(&self) -> &WorksheetCache {
        &self.cache
    }

    pub fn service_account_email(&self) -> Option<String> {
        self.api.service_account_email()
    }

    /// Returns the spreadsheet metadata, from cache when possible.
    pub async fn spreadsheet(&self, spreadsheet_id: &str) -> Result<SpreadsheetHandle, SheetsError> {
        if let Some(spreadsheet) = self.cache.get(spreadsheet_id) {
            debug!("Worksheet cache hit for {spreadsheet_id}");
            return Ok(spreadsheet);
        }

        debug!("Worksheet cache miss for {spreadsheet_id}");
        let spreadsheet = self.api.fetch_spreadsheet(spreadsheet_id).await?;
        self.cache.insert(spreadsheet.clone());
        Ok(spreadsheet)
    }

    pub async fn worksheets(
        &self,
        spreadsheet_id: &str,
    ) -> Result<Vec<WorksheetHandle>, SheetsError> {
        Ok(self.spreadsheet(spreadsheet_id).await?.worksheets)
    }

    /// Creates a worksheet and invalidates the cached listing.
    pub async fn create_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<WorksheetHandle, SheetsError> {
        info!("Creating worksheet \"{title}\" in spreadsheet {spreadsheet_id}");
        let worksheet = self.api.add_worksheet(spreadsheet_id, title).await?;
        self.cache.invalidate(spreadsheet_id);
        Ok(worksheet)
    }

    /// Returns a worksheet for every title, in order, creating the ones that
    /// do not exist yet.
    pub async fn get_or_create_worksheets(
        &self,
        spreadsheet_id: &str,
        titles: &[String],
    ) -> Result<Vec<WorksheetHandle>, SheetsError> {
        let spreadsheet = self.spreadsheet(spreadsheet_id).await?;
        let mut created: HashMap<&str, WorksheetHandle> = HashMap::new();
        let mut worksheets = Vec::with_capacity(titles.len());

        for title in titles {
            if let Some(worksheet) = spreadsheet.worksheet_by_title(title) {
                worksheets.push(worksheet.clone());
            } else if let Some(worksheet) = created.get(title.as_str()) {
                worksheets.push(worksheet.clone());
            } else {
                let worksheet = self.create_worksheet(spreadsheet_id, title).await?;
                created.insert(title, worksheet.clone());
                worksheets.push(worksheet);
            }
        }
        Ok(worksheets)
    }

    /// Reads the full content of each worksheet.
    pub async fn read_worksheets(
        &self,
        spreadsheet_id: &str,
        worksheets: &[&WorksheetHandle],
    ) -> Result<Vec<Grid>, SheetsError> {
        if worksheets.is_empty() {
            return Ok(Vec::new());
        }

        let ranges: Vec<String> = worksheets
            .iter()
            .map(|ws| range::sheet_range(&ws.title))
            .collect();
        self.api
            .batch_get_values(spreadsheet_id, &ranges)
            .await
            .inspect_err(|_| {
                // The cached titles may be stale.
                self.cache.invalidate(spreadsheet_id);
            })
    }

    /// Writes each grid to its worksheet starting at `A1`.
    pub async fn write_worksheets(
        &self,
        spreadsheet_id: &str,
        updates: &[(&WorksheetHandle, Grid)],
    ) -> Result<(), SheetsError> {
        self.write_ranges(
            spreadsheet_id,
            updates
                .iter()
                .map(|(ws, values)| ValueRange {
                    range: range::anchored_range(&ws.title, range::DEFAULT_ANCHOR_CELL),
                    values: values.clone(),
                })
                .collect(),
        )
        .await
    }

    pub async fn write_ranges(
        &self,
        spreadsheet_id: &str,
        data: Vec<ValueRange>,
    ) -> Result<(), SheetsError> {
        if data.is_empty() {
            return Ok(());
        }

        self.api
            .batch_update_values(spreadsheet_id, &data)
            .await
            .inspect_err(|_| {
                self.cache.invalidate(spreadsheet_id);
            })
    }

    pub fn invalidate(&self, spreadsheet_id: &str) -> bool {
        debug!("Invalidating worksheet cache for {spreadsheet_id}");
        self.cache.invalidate(spreadsheet_id)
    }
}
