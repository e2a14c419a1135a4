use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::sheets::SpreadsheetHandle;

/// In-memory spreadsheet metadata keyed by spreadsheet ID.
///
/// Entries live until they are invalidated or the process restarts. A miss
/// only costs a remote listing call.
#[derive(Default)]
pub struct WorksheetCache {
    entries: RwLock<HashMap<String, SpreadsheetHandle>>,
}

impl WorksheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, spreadsheet_id: &str) -> Option<SpreadsheetHandle> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(spreadsheet_id)
            .cloned()
    }

    pub fn insert(&self, spreadsheet: SpreadsheetHandle) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spreadsheet.id.clone(), spreadsheet);
    }

    /// Drops the entry of a spreadsheet. Returns whether one was cached.
    pub fn invalidate(&self, spreadsheet_id: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(spreadsheet_id)
            .is_some()
    }

    pub fn contains(&self, spreadsheet_id: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(spreadsheet_id)
    }
}
