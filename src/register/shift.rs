//! Shift registrations.
//!
//! Hours are counted in a day that starts at [`SPLIT_HOUR`], so a late night
//! shift such as `22-2` stays on the same day as the evening before it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::register::Registrant;
use crate::register::content::Column;

pub const SPLIT_HOUR: u32 = 4;
const HOURS_PER_DAY: u32 = 24;

static SHIFT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<start>\d+)\s*[-－~～]\s*(?P<end>\d+)").expect("valid shift regex")
});

/// Hour slots of one day, `SPLIT_HOUR..SPLIT_HOUR + 24`.
pub fn hour_slots() -> impl Iterator<Item = u32> {
    SPLIT_HOUR..SPLIT_HOUR + HOURS_PER_DAY
}

pub fn slot_label(hour: u32) -> String {
    format!("{hour}-{}", hour + 1)
}

fn normalize_hour(hour: u32) -> u32 {
    if hour < SPLIT_HOUR {
        hour + HOURS_PER_DAY
    } else if hour < SPLIT_HOUR + HOURS_PER_DAY {
        hour
    } else {
        hour - HOURS_PER_DAY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: u32,
    pub end: u32,
}

impl Period {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start % HOURS_PER_DAY,
            end: end % HOURS_PER_DAY,
        }
    }

    /// Normalized hour slots covered by the period. Wraps past midnight.
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        let end = if self.end < self.start {
            self.end + HOURS_PER_DAY
        } else {
            self.end
        };
        (self.start..end).map(normalize_hour)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub periods: Vec<Period>,
    pub slots: BTreeSet<u32>,
    pub original_message: String,
}

impl Shift {
    /// Parses all periods in a message. Returns `None` when no hour is covered.
    pub fn parse(content: &str) -> Option<Self> {
        let periods: Vec<Period> = SHIFT_REGEX
            .captures_iter(content)
            .filter_map(|captures| {
                let start = captures["start"].parse().ok()?;
                let end = captures["end"].parse().ok()?;
                Some(Period::new(start, end))
            })
            .collect();

        let slots: BTreeSet<u32> = periods.iter().flat_map(Period::hours).collect();
        if slots.is_empty() {
            return None;
        }

        let original_message = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" / ");

        Some(Self {
            periods,
            slots,
            original_message,
        })
    }

    pub fn columns() -> Vec<Column> {
        let mut columns = vec![Column::text("username"), Column::text("display_name")];
        columns.extend(hour_slots().map(|hour| Column::integer(slot_label(hour))));
        columns.push(Column::text("original_message"));
        columns
    }

    pub fn to_row(&self, registrant: &Registrant) -> Vec<String> {
        let mut row = vec![registrant.username.clone(), registrant.display_name.clone()];
        row.extend(hour_slots().map(|hour| {
            if self.slots.contains(&hour) { "1" } else { "0" }.to_string()
        }));
        row.push(self.original_message.clone());
        row
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let periods: Vec<String> = self.periods.iter().map(Period::to_string).collect();
        write!(f, "{} ({} hours)", periods.join(", "), self.slots.len())
    }
}
