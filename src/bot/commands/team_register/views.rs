//! Views for the team register settings panel and summary.

use poise::Modal;
use poise::serenity_prelude::ButtonStyle;
use poise::serenity_prelude::CreateActionRow;
use poise::serenity_prelude::CreateButton;
use poise::serenity_prelude::CreateComponent;
use poise::serenity_prelude::CreateContainer;
use poise::serenity_prelude::CreateContainerComponent;
use poise::serenity_prelude::CreateSelectMenu;
use poise::serenity_prelude::CreateSelectMenuKind;
use poise::serenity_prelude::CreateTextDisplay;
use poise::serenity_prelude::RoleId;

use crate::bot::views::Action;
use crate::bot::views::ResponseComponentView;
use crate::bot::views::ViewProvider;
use crate::custom_id_enum;
use crate::register::team::SummaryRow;
use crate::service::team_register_service::TeamRegisterSettings;
use crate::service::team_register_service::TeamRegisterSetup;
use crate::service::team_register_service::TeamSummary;

const MAX_SUMMARY_ROWS: usize = 20;

custom_id_enum!(TeamRegisterSettingsAction { Setup, EncoreRoles });

#[derive(Debug, Modal, Clone)]
#[name = "Team Register Setup"]
pub struct TeamRegisterSetupModal {
    #[name = "Google Sheet Link"]
    #[placeholder = "https://docs.google.com/spreadsheets/d/..."]
    sheet_link: String,
    #[name = "Worksheet Titles (one per line)"]
    #[placeholder = "Main Team\nEncore Team\nBackup Team"]
    #[paragraph]
    worksheet_titles: Option<String>,
    #[name = "Summary Worksheet Title"]
    #[placeholder = "Team Summary"]
    summary_worksheet_title: Option<String>,
}

impl TeamRegisterSetupModal {
    /// Pre-fills the form with the current settings.
    pub fn from_settings(settings: Option<&TeamRegisterSettings>) -> Option<Self> {
        let settings = settings?;
        let team_titles: Vec<&str> = settings
            .sheets
            .teams
            .iter()
            .filter_map(|slot| slot.title())
            .collect();

        Some(Self {
            sheet_link: settings.sheets.url(),
            worksheet_titles: Some(team_titles.join("\n")),
            summary_worksheet_title: settings.sheets.summary.title().map(str::to_string),
        })
    }

    pub fn to_setup(&self) -> TeamRegisterSetup {
        TeamRegisterSetup::from_form(
            &self.sheet_link,
            self.worksheet_titles.as_deref(),
            self.summary_worksheet_title.as_deref(),
        )
    }
}

pub struct TeamRegisterSettingsView {
    pub settings: Option<TeamRegisterSettings>,
    pub notice: Option<String>,
    service_account_email: Option<String>,
}

impl TeamRegisterSettingsView {
    pub fn new(settings: Option<TeamRegisterSettings>, service_account_email: Option<String>) -> Self {
        Self {
            settings,
            notice: None,
            service_account_email,
        }
    }

    fn share_hint(&self) -> String {
        match &self.service_account_email {
            Some(email) => format!("Share the Google Sheet with `{email}` as an editor first."),
            None => "Share the Google Sheet with the bot's service account as an editor first."
                .to_string(),
        }
    }

    fn status(&self) -> String {
        match &self.settings {
            Some(settings) => format!("## Team Register Settings\n\n{}", settings.status_text()),
            None => format!(
                "## Team Register Settings\n\nTeam Register is not yet configured for this channel. Click below to set up.\n> 🛈  {}",
                self.share_hint()
            ),
        }
    }
}

impl<'a> ViewProvider<'a> for TeamRegisterSettingsView {
    fn create(&self) -> Vec<CreateComponent<'a>> {
        let mut components = Vec::new();

        components.push(CreateContainerComponent::TextDisplay(CreateTextDisplay::new(
            self.status(),
        )));

        if let Some(settings) = &self.settings {
            let roles: Vec<RoleId> = settings
                .config
                .encore_role_ids
                .iter()
                .map(|id| RoleId::new(*id as u64))
                .collect();
            let role_select = CreateSelectMenu::new(
                TeamRegisterSettingsAction::EncoreRoles.as_str(),
                CreateSelectMenuKind::Role {
                    default_roles: Some(roles.into()),
                },
            )
            .min_values(0)
            .max_values(25)
            .placeholder("Optional: Select encore roles");

            components.push(CreateContainerComponent::TextDisplay(CreateTextDisplay::new(
                "### Encore Roles\n\n> 🛈  Members with these roles have them listed in the summary.",
            )));
            components.push(CreateContainerComponent::ActionRow(
                CreateActionRow::SelectMenu(role_select),
            ));
        }

        let button = CreateButton::new(TeamRegisterSettingsAction::Setup.as_str())
            .label(if self.settings.is_some() {
                "Edit"
            } else {
                "Set Up"
            })
            .style(ButtonStyle::Primary);
        components.push(CreateContainerComponent::ActionRow(CreateActionRow::Buttons(
            vec![button].into(),
        )));

        if let Some(notice) = &self.notice {
            components.push(CreateContainerComponent::TextDisplay(CreateTextDisplay::new(
                format!("> {notice}"),
            )));
        }

        vec![CreateComponent::Container(CreateContainer::new(components))]
    }
}

impl ResponseComponentView for TeamRegisterSettingsView {}

pub struct TeamSummaryView {
    summary: TeamSummary,
}

impl TeamSummaryView {
    pub fn new(summary: TeamSummary) -> Self {
        Self { summary }
    }

    fn row_line(&self, row: &SummaryRow) -> String {
        let teams: Vec<String> = self
            .summary
            .team_titles
            .iter()
            .zip(&row.teams)
            .map(|(title, score)| match score {
                Some(score) => format!("{title} `{score}`"),
                None => format!("{title} -"),
            })
            .collect();
        let roles = if row.encore_roles.is_empty() {
            String::new()
        } else {
            format!(" [{}]", row.encore_roles.join(", "))
        };
        format!(
            "- **{}** (`{}`){}: {}",
            row.display_name,
            row.username,
            roles,
            teams.join(" · ")
        )
    }

    fn text(&self) -> String {
        let rows = &self.summary.rows;
        let mut text = String::from("## Team Summary\n\n-# ISV/Power per team worksheet\n");
        if rows.is_empty() {
            text.push_str("No teams are registered yet.");
            return text;
        }

        let lines: Vec<String> = rows
            .iter()
            .take(MAX_SUMMARY_ROWS)
            .map(|row| self.row_line(row))
            .collect();
        text.push_str(&lines.join("\n"));
        if rows.len() > MAX_SUMMARY_ROWS {
            text.push_str(&format!(
                "\n\n...and {} more in the [sheet]({}).",
                rows.len() - MAX_SUMMARY_ROWS,
                self.summary.spreadsheet_url
            ));
        }
        text
    }
}

impl<'a> ViewProvider<'a> for TeamSummaryView {
    fn create(&self) -> Vec<CreateComponent<'a>> {
        vec![CreateComponent::Container(CreateContainer::new(vec![
            CreateContainerComponent::TextDisplay(CreateTextDisplay::new(self.text())),
        ]))]
    }
}

impl ResponseComponentView for TeamSummaryView {}
