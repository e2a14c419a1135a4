//! Keyed table content of a worksheet.
//!
//! The first row is the header and the first column is the row key
//! (the username). Rows that fail validation are kept below the valid ones
//! so that nothing a user typed by hand is lost.

use std::collections::HashSet;

use crate::sheets::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Number,
}

impl ColumnKind {
    fn accepts(&self, value: &str) -> bool {
        match self {
            ColumnKind::Text => true,
            ColumnKind::Integer => value.trim().parse::<i64>().is_ok(),
            ColumnKind::Number => value.trim().parse::<f64>().is_ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Integer,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Number,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetContent {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    extra: Vec<Vec<String>>,
    original_height: usize,
}

impl WorksheetContent {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            extra: Vec::new(),
            original_height: 0,
        }
    }

    /// Reads a worksheet grid. The existing header is replaced by `columns`;
    /// cells are matched by position.
    pub fn from_grid(columns: Vec<Column>, grid: Grid) -> Self {
        let mut content = Self::new(columns);
        let mut seen = HashSet::new();

        for row in grid.into_iter().skip(1) {
            content.original_height += 1;
            let row = content.fit(row);
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let key = row[0].clone();
            if content.is_valid(&row) && seen.insert(key) {
                content.rows.push(row);
            } else {
                content.extra.push(row);
            }
        }
        content
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows that failed validation or duplicated a key.
    pub fn extra_rows(&self) -> &[Vec<String>] {
        &self.extra
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row[0] == key)
            .map(|row| row.as_slice())
    }

    /// Inserts the row, or moves an existing row with the same key to the
    /// bottom with the new values.
    pub fn upsert(&mut self, row: Vec<String>) {
        let row = self.fit(row);
        self.rows.retain(|existing| existing[0] != row[0]);
        self.rows.push(row);
    }

    /// Removes the row with the key. Returns whether a row was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row[0] != key);
        self.rows.len() != before
    }

    /// Replaces all valid rows, keeping invalid rows and the grid height.
    pub fn replace_rows(&mut self, rows: Vec<Vec<String>>) {
        self.rows = rows.into_iter().map(|row| self.fit(row)).collect();
    }

    /// Header, valid rows, blank padding up to the height that was read, then
    /// the invalid rows.
    pub fn to_grid(&self) -> Grid {
        let width = self.columns.len();
        let padding = self
            .original_height
            .saturating_sub(self.rows.len() + self.extra.len());

        let mut grid = Vec::with_capacity(1 + self.rows.len() + padding + self.extra.len());
        grid.push(self.columns.iter().map(|c| c.name.clone()).collect());
        grid.extend(self.rows.iter().cloned());
        grid.extend(std::iter::repeat_n(vec![String::new(); width], padding));
        grid.extend(self.extra.iter().cloned());
        grid
    }

    fn fit(&self, mut row: Vec<String>) -> Vec<String> {
        row.resize(self.columns.len().max(1), String::new());
        row
    }

    fn is_valid(&self, row: &[String]) -> bool {
        !row[0].trim().is_empty()
            && self
                .columns
                .iter()
                .zip(row)
                .all(|(column, value)| column.kind.accepts(value))
    }
}
