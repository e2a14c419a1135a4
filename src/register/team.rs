//! Team registrations: parsing, classification and the summary sheet.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::register::Registrant;
use crate::register::content::Column;
use crate::register::content::WorksheetContent;
use crate::register::format_number;

static TEAM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<leader_skill>[0-9]+)\s*/\s*(?P<total_skill>[0-9]+)\s*/\s*(?P<team_power>[0-9]+(?:\.[0-9]*)?|\.[0-9]+)",
    )
    .expect("valid team regex")
});

pub const SUMMARY_BASE_COLUMNS: [&str; 3] = ["username", "display_name", "encore_roles"];

/// One team line: `leader skill / internal skill / power`.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub leader_skill_value: u64,
    pub internal_skill_value: u64,
    pub team_power: f64,
    pub original_message: String,
}

impl Team {
    /// Parses a single line. Lines without a team are ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let captures = TEAM_REGEX.captures(line)?;
        Some(Self {
            leader_skill_value: captures["leader_skill"].parse().ok()?,
            internal_skill_value: captures["total_skill"].parse().ok()?,
            team_power: captures["team_power"].parse().ok()?,
            original_message: line.trim().to_string(),
        })
    }

    /// Parses every line of a message.
    pub fn parse_message(content: &str) -> Vec<Self> {
        content.lines().filter_map(Self::parse).collect()
    }

    /// Leader skill plus a fifth of the other members' contribution.
    pub fn effective_skill_value(&self) -> f64 {
        let leader = self.leader_skill_value as f64;
        let internal = self.internal_skill_value as f64;
        leader + (internal - leader) / 5.0
    }

    pub fn columns() -> Vec<Column> {
        vec![
            Column::text("username"),
            Column::text("display_name"),
            Column::integer("leader_skill_value"),
            Column::integer("internal_skill_value"),
            Column::number("team_power"),
            Column::text("original_message"),
        ]
    }

    pub fn to_row(&self, registrant: &Registrant) -> Vec<String> {
        vec![
            registrant.username.clone(),
            registrant.display_name.clone(),
            self.leader_skill_value.to_string(),
            self.internal_skill_value.to_string(),
            format_number(self.team_power),
            self.original_message.clone(),
        ]
    }

    /// Reads a validated team worksheet row back into
    /// `(username, display_name, team)`.
    pub fn from_row(row: &[String]) -> Option<(String, String, Self)> {
        let [username, display_name, leader, internal, power, original_message] = row else {
            return None;
        };
        let team = Self {
            leader_skill_value: leader.trim().parse().ok()?,
            internal_skill_value: internal.trim().parse().ok()?,
            team_power: power.trim().parse().ok()?,
            original_message: original_message.clone(),
        };
        Some((username.clone(), display_name.clone(), team))
    }

    pub fn score(&self) -> TeamScore {
        TeamScore {
            effective_skill_value: self.effective_skill_value(),
            team_power: self.team_power,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.leader_skill_value,
            self.internal_skill_value,
            format_number(self.team_power)
        )
    }
}

/// Teams of one registrant sorted into worksheet slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTeams {
    pub main: Team,
    pub encore: Option<Team>,
    pub backups: Vec<Team>,
}

impl ClassifiedTeams {
    /// The main team has the highest effective skill value. The encore team
    /// has the highest power of the rest, and only counts when it is at least
    /// as strong as the main team. Ties go to the earlier team.
    pub fn classify(teams: Vec<Team>) -> Option<Self> {
        let main_index = first_max_by(&teams, Team::effective_skill_value)?;
        let mut rest = teams;
        let main = rest.remove(main_index);

        let encore = first_max_by(&rest, |team| team.team_power)
            .filter(|&i| rest[i].team_power >= main.team_power)
            .map(|i| rest.remove(i));

        Some(Self {
            main,
            encore,
            backups: rest,
        })
    }

    /// Main, encore, then backups. Holds `None` when there is no encore team.
    pub fn slots(&self) -> Vec<Option<&Team>> {
        let mut slots = vec![Some(&self.main), self.encore.as_ref()];
        slots.extend(self.backups.iter().map(Some));
        slots
    }

    /// Number of team worksheets needed.
    pub fn slot_count(&self) -> usize {
        2 + self.backups.len()
    }
}

impl fmt::Display for ClassifiedTeams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Main: {}", self.main)?;
        match &self.encore {
            Some(team) => writeln!(f, "Encore: {team}")?,
            None => writeln!(f, "Encore: -")?,
        }
        for (i, team) in self.backups.iter().enumerate() {
            writeln!(f, "Backup {}: {team}", i + 1)?;
        }
        Ok(())
    }
}

fn first_max_by(teams: &[Team], key: impl Fn(&Team) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, team) in teams.iter().enumerate() {
        let value = key(team);
        if best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamScore {
    pub effective_skill_value: f64,
    pub team_power: f64,
}

impl fmt::Display for TeamScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}/{:.1}",
            self.effective_skill_value, self.team_power
        )
    }
}

/// Summary columns for the given team worksheet titles.
pub fn summary_columns(team_titles: &[String]) -> Vec<Column> {
    let mut columns: Vec<Column> = SUMMARY_BASE_COLUMNS.into_iter().map(Column::text).collect();
    for title in team_titles {
        columns.push(Column::text(format!("{title} ISV")));
        columns.push(Column::text(format!("{title} Power")));
    }
    columns
}

/// One user's line in the summary worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub username: String,
    pub display_name: String,
    pub encore_roles: Vec<String>,
    /// One entry per team worksheet.
    pub teams: Vec<Option<TeamScore>>,
}

impl SummaryRow {
    pub fn from_teams(
        registrant: &Registrant,
        encore_role_ids: &[i64],
        slots: &[Option<&Team>],
    ) -> Self {
        Self {
            username: registrant.username.clone(),
            display_name: registrant.display_name.clone(),
            encore_roles: registrant.role_names_in(encore_role_ids),
            teams: slots.iter().map(|slot| slot.map(Team::score)).collect(),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.username.clone(),
            self.display_name.clone(),
            self.encore_roles.join(", "),
        ];
        for team in &self.teams {
            match team {
                Some(score) => {
                    row.push(format_number(score.effective_skill_value));
                    row.push(format_number(score.team_power));
                }
                None => row.extend([String::new(), String::new()]),
            }
        }
        row
    }
}

/// Rebuilds the summary from the team worksheets.
///
/// Users are listed in the order they first appear across the team
/// worksheets. Display names and encore roles come from `members` when the
/// user is still a member, otherwise the display name from the team worksheet
/// is kept.
pub fn summarize(
    team_contents: &[WorksheetContent],
    members: &HashMap<String, Registrant>,
    encore_role_ids: &[i64],
) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (slot, content) in team_contents.iter().enumerate() {
        for row in content.rows() {
            let Some((username, display_name, team)) = Team::from_row(row) else {
                continue;
            };
            let position = *index.entry(username.clone()).or_insert_with(|| {
                let (display_name, encore_roles) = match members.get(&username) {
                    Some(member) => (
                        member.display_name.clone(),
                        member.role_names_in(encore_role_ids),
                    ),
                    None => (display_name, Vec::new()),
                };
                rows.push(SummaryRow {
                    username,
                    display_name,
                    encore_roles,
                    teams: vec![None; team_contents.len()],
                });
                rows.len() - 1
            });
            rows[position].teams[slot] = Some(team.score());
        }
    }
    rows
}
