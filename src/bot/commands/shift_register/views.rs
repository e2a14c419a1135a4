use poise::Modal;
use poise::serenity_prelude::ButtonStyle;
use poise::serenity_prelude::CreateActionRow;
use poise::serenity_prelude::CreateButton;
use poise::serenity_prelude::CreateComponent;
use poise::serenity_prelude::CreateContainer;
use poise::serenity_prelude::CreateContainerComponent;
use poise::serenity_prelude::CreateTextDisplay;

use crate::bot::views::Action;
use crate::bot::views::ResponseComponentView;
use crate::bot::views::ViewProvider;
use crate::custom_id_enum;
use crate::service::shift_register_service::ShiftRegisterSettings;
use crate::service::shift_register_service::ShiftRegisterSetup;

custom_id_enum!(ShiftRegisterSettingsAction { Setup });

#[derive(Debug, Modal, Clone)]
#[name = "Shift Register Setup"]
pub struct ShiftRegisterSetupModal {
    #[name = "Google Sheet Link"]
    #[placeholder = "https://docs.google.com/spreadsheets/d/..."]
    sheet_link: String,
    #[name = "Entry Worksheet Title"]
    #[placeholder = "Shift Entry"]
    entry_worksheet_title: Option<String>,
    #[name = "Draft Worksheet Title"]
    #[placeholder = "Shift Draft"]
    draft_worksheet_title: Option<String>,
    #[name = "Final Schedule Worksheet Title"]
    #[placeholder = "Shift Final Schedule"]
    final_schedule_worksheet_title: Option<String>,
    #[name = "Final Schedule Anchor Cell"]
    #[placeholder = "A1"]
    final_schedule_anchor_cell: Option<String>,
}

impl ShiftRegisterSetupModal {
    pub fn from_settings(settings: Option<&ShiftRegisterSettings>) -> Option<Self> {
        let settings = settings?;
        let sheets = &settings.sheets;
        Some(Self {
            sheet_link: sheets.url(),
            entry_worksheet_title: sheets.entry.title().map(str::to_string),
            draft_worksheet_title: sheets.draft.title().map(str::to_string),
            final_schedule_worksheet_title: sheets.final_schedule.title().map(str::to_string),
            final_schedule_anchor_cell: Some(settings.config.final_schedule_anchor_cell.clone()),
        })
    }

    pub fn to_setup(&self) -> ShiftRegisterSetup {
        ShiftRegisterSetup::from_form(
            &self.sheet_link,
            self.entry_worksheet_title.as_deref(),
            self.draft_worksheet_title.as_deref(),
            self.final_schedule_worksheet_title.as_deref(),
            self.final_schedule_anchor_cell.as_deref(),
        )
    }
}

pub struct ShiftRegisterSettingsView {
    pub settings: Option<ShiftRegisterSettings>,
    pub notice: Option<String>,
    service_account_email: Option<String>,
}

impl ShiftRegisterSettingsView {
    pub fn new(
        settings: Option<ShiftRegisterSettings>,
        service_account_email: Option<String>,
    ) -> Self {
        Self {
            settings,
            notice: None,
            service_account_email,
        }
    }

    fn status(&self) -> String {
        match &self.settings {
            Some(settings) => format!("## Shift Register Settings\n\n{}", settings.status_text()),
            None => format!(
                "## Shift Register Settings\n\nShift Register is not yet configured for this channel. Click below to set up.\n> 🛈  Share the Google Sheet with {} as an editor first.",
                self.service_account_email
                    .as_deref()
                    .map(|email| format!("`{email}`"))
                    .unwrap_or_else(|| "the bot's service account".to_string())
            ),
        }
    }
}

impl<'a> ViewProvider<'a> for ShiftRegisterSettingsView {
    fn create(&self) -> Vec<CreateComponent<'a>> {
        let status = self.status();

        let button = CreateButton::new(ShiftRegisterSettingsAction::Setup.as_str())
            .label(if self.settings.is_some() {
                "Edit"
            } else {
                "Set Up"
            })
            .style(ButtonStyle::Primary);

        let mut components = vec![
            CreateContainerComponent::TextDisplay(CreateTextDisplay::new(status)),
            CreateContainerComponent::ActionRow(CreateActionRow::Buttons(vec![button].into())),
        ];
        if let Some(notice) = &self.notice {
            components.push(CreateContainerComponent::TextDisplay(CreateTextDisplay::new(
                format!("> {notice}"),
            )));
        }

        vec![CreateComponent::Container(CreateContainer::new(components))]
    }
}

impl ResponseComponentView for ShiftRegisterSettingsView {}
