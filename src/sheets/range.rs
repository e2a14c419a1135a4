//! A1 notation and spreadsheet link helpers.

use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_ANCHOR_CELL: &str = "A1";

const SPREADSHEET_URL_PREFIX: &str = "https://docs.google.com/spreadsheets/d/";

static CELL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+[1-9][0-9]*$").expect("valid cell regex"));

/// Extracts the spreadsheet ID from a Google Sheets link or a raw ID.
pub fn parse_spreadsheet_id(input: &str) -> Option<String> {
    let input = input.trim();
    let id = match input.split_once("/spreadsheets/d/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or_default(),
        None => input,
    };

    let is_valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    is_valid.then(|| id.to_string())
}

pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("{SPREADSHEET_URL_PREFIX}{spreadsheet_id}")
}

/// Link to a single worksheet tab.
pub fn worksheet_url(spreadsheet_id: &str, worksheet_id: i64) -> String {
    format!("{}/edit#gid={worksheet_id}", spreadsheet_url(spreadsheet_id))
}

/// Quotes a worksheet title for use in a range.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Range covering the whole worksheet.
pub fn sheet_range(title: &str) -> String {
    quote_title(title)
}

/// Range starting at `cell` in the worksheet.
pub fn anchored_range(title: &str, cell: &str) -> String {
    format!("{}!{cell}", quote_title(title))
}

/// Extracts the worksheet title from a range produced by [`sheet_range`] or
/// [`anchored_range`].
pub fn range_title(range: &str) -> String {
    let Some(quoted) = range.strip_prefix('\'') else {
        return range.split('!').next().unwrap_or_default().to_string();
    };

    let mut title = String::new();
    let mut chars = quoted.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                title.push('\'');
            } else {
                break;
            }
        } else {
            title.push(c);
        }
    }
    title
}

pub fn is_valid_cell(cell: &str) -> bool {
    CELL_REGEX.is_match(cell)
}

/// Uppercases the input and falls back to `A1` when it is not a single cell.
pub fn normalize_anchor_cell(input: Option<&str>) -> String {
    input
        .map(|cell| cell.trim().to_ascii_uppercase())
        .filter(|cell| is_valid_cell(cell))
        .unwrap_or_else(|| DEFAULT_ANCHOR_CELL.to_string())
}
