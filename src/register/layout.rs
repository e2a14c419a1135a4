//! Worksheet roles and default titles.

use std::collections::HashSet;

use crate::sheets::SpreadsheetHandle;
use crate::sheets::WorksheetHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorksheetRole {
    Team,
    Summary,
    ShiftEntry,
    ShiftDraft,
    ShiftFinalSchedule,
}

impl WorksheetRole {
    pub fn label(&self) -> &'static str {
        match self {
            WorksheetRole::Team => "Team",
            WorksheetRole::Summary => "Summary",
            WorksheetRole::ShiftEntry => "Entry",
            WorksheetRole::ShiftDraft => "Draft",
            WorksheetRole::ShiftFinalSchedule => "Final Schedule",
        }
    }

    fn base_titles(&self) -> &'static [&'static str] {
        match self {
            WorksheetRole::Team => &["Main Team", "Encore Team", "Backup Team"],
            WorksheetRole::Summary => &["Team Summary"],
            WorksheetRole::ShiftEntry => &["Shift Entry"],
            WorksheetRole::ShiftDraft => &["Shift Draft"],
            WorksheetRole::ShiftFinalSchedule => &["Shift Final Schedule"],
        }
    }

    fn numbered_title(&self, position: usize) -> String {
        match self {
            // Team numbers continue after the named teams: "Team 4", "Team 5", ...
            WorksheetRole::Team => format!("Team {}", position + 1),
            _ => format!("{} {position}", self.base_titles()[0]),
        }
    }

    pub fn default_titles(&self) -> DefaultTitles {
        DefaultTitles {
            role: *self,
            position: 0,
        }
    }

    /// The first default title.
    pub fn default_title(&self) -> String {
        self.base_titles()[0].to_string()
    }
}

/// Endless sequence of default titles for a role.
pub struct DefaultTitles {
    role: WorksheetRole,
    position: usize,
}

impl DefaultTitles {
    /// Next title not contained in `taken`.
    pub fn next_free(&mut self, taken: &HashSet<String>) -> String {
        loop {
            let title = self.next_title();
            if !taken.contains(&title) {
                return title;
            }
        }
    }

    fn next_title(&mut self) -> String {
        let base = self.role.base_titles();
        let title = match base.get(self.position) {
            Some(title) => title.to_string(),
            None => self.role.numbered_title(self.position),
        };
        self.position += 1;
        title
    }
}

impl Iterator for DefaultTitles {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_title())
    }
}

/// A configured worksheet, resolved against the spreadsheet if it still exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetSlot {
    pub role: WorksheetRole,
    pub id: i64,
    pub worksheet: Option<WorksheetHandle>,
}

impl WorksheetSlot {
    pub fn resolve(role: WorksheetRole, id: i64, spreadsheet: &SpreadsheetHandle) -> Self {
        Self {
            role,
            id,
            worksheet: spreadsheet.worksheet_by_id(id).cloned(),
        }
    }

    pub fn found(role: WorksheetRole, worksheet: WorksheetHandle) -> Self {
        Self {
            role,
            id: worksheet.id,
            worksheet: Some(worksheet),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.worksheet.as_ref().map(|ws| ws.title.as_str())
    }

    pub fn is_missing(&self) -> bool {
        self.worksheet.is_none()
    }

    /// `Title (ID: 123)`, or `**Not Found** (ID: 123)` when the worksheet was deleted.
    pub fn status_line(&self) -> String {
        match self.title() {
            Some(title) => format!("{title} (ID: {})", self.id),
            None => format!("**Not Found** (ID: {})", self.id),
        }
    }
}

/// Titles to ensure for the slots of one role.
///
/// Slots that still exist keep their title. Missing slots within `count` get
/// the next free default title, missing slots past it are dropped, and default
/// titles are appended until there are `count` titles. Assigned titles are
/// added to `taken`.
pub fn plan_titles(
    slots: &[WorksheetSlot],
    role: WorksheetRole,
    count: usize,
    taken: &mut HashSet<String>,
) -> Vec<String> {
    let mut defaults = role.default_titles();
    let mut titles = Vec::with_capacity(count.max(slots.len()));

    for (position, slot) in slots.iter().enumerate() {
        match slot.title() {
            Some(title) => titles.push(title.to_string()),
            None if position < count => {
                let title = defaults.next_free(taken);
                taken.insert(title.clone());
                titles.push(title);
            }
            None => {}
        }
    }

    while titles.len() < count {
        let title = defaults.next_free(taken);
        taken.insert(title.clone());
        titles.push(title);
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worksheet(id: i64, title: &str) -> WorksheetHandle {
        WorksheetHandle {
            id,
            title: title.to_string(),
            index: 0,
        }
    }

    #[test]
    fn test_team_default_titles() {
        let titles: Vec<String> = WorksheetRole::Team.default_titles().take(5).collect();
        assert_eq!(
            titles,
            vec!["Main Team", "Encore Team", "Backup Team", "Team 4", "Team 5"]
        );
    }

    #[test]
    fn test_summary_default_titles() {
        let titles: Vec<String> = WorksheetRole::Summary.default_titles().take(3).collect();
        assert_eq!(titles, vec!["Team Summary", "Team Summary 1", "Team Summary 2"]);
    }

    #[test]
    fn test_next_free_skips_taken() {
        let taken = HashSet::from(["Main Team".to_string(), "Encore Team".to_string()]);
        let mut defaults = WorksheetRole::Team.default_titles();
        assert_eq!(defaults.next_free(&taken), "Backup Team");
        assert_eq!(defaults.next_free(&taken), "Team 4");
    }

    #[test]
    fn test_plan_titles_keeps_existing_and_fills_missing() {
        let slots = vec![
            WorksheetSlot::found(WorksheetRole::Team, worksheet(1, "Alpha")),
            WorksheetSlot {
                role: WorksheetRole::Team,
                id: 2,
                worksheet: None,
            },
        ];
        let mut taken = HashSet::from(["Alpha".to_string()]);

        let titles = plan_titles(&slots, WorksheetRole::Team, 3, &mut taken);
        assert_eq!(titles, vec!["Alpha", "Main Team", "Encore Team"]);
        assert!(taken.contains("Encore Team"));
    }

    #[test]
    fn test_plan_titles_drops_missing_past_count() {
        let slots = vec![
            WorksheetSlot::found(WorksheetRole::Team, worksheet(1, "Main Team")),
            WorksheetSlot {
                role: WorksheetRole::Team,
                id: 2,
                worksheet: None,
            },
            WorksheetSlot::found(WorksheetRole::Team, worksheet(3, "Backup Team")),
        ];
        let mut taken = HashSet::from(["Main Team".to_string(), "Backup Team".to_string()]);

        let titles = plan_titles(&slots, WorksheetRole::Team, 1, &mut taken);
        assert_eq!(titles, vec!["Main Team", "Backup Team"]);
    }

    #[test]
    fn test_resolve_slot() {
        let spreadsheet = SpreadsheetHandle {
            id: "ABC123".to_string(),
            title: "Roster".to_string(),
            worksheets: vec![worksheet(10, "Main Team")],
        };
        let found = WorksheetSlot::resolve(WorksheetRole::Team, 10, &spreadsheet);
        assert_eq!(found.title(), Some("Main Team"));

        let missing = WorksheetSlot::resolve(WorksheetRole::Team, 11, &spreadsheet);
        assert!(missing.is_missing());
        assert_eq!(missing.id, 11);
    }

    #[test]
    fn test_status_line() {
        let found = WorksheetSlot::found(WorksheetRole::Summary, worksheet(7, "Team Summary"));
        assert_eq!(found.status_line(), "Team Summary (ID: 7)");

        let missing = WorksheetSlot {
            role: WorksheetRole::Team,
            id: 8,
            worksheet: None,
        };
        assert_eq!(missing.status_line(), "**Not Found** (ID: 8)");
    }
}
