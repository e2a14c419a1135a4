//! Confirm or cancel prompt for destructive commands.

use std::str::FromStr;
use std::time::Duration;

use poise::serenity_prelude::ButtonStyle;
use poise::serenity_prelude::ComponentInteraction;
use poise::serenity_prelude::CreateActionRow;
use poise::serenity_prelude::CreateButton;
use poise::serenity_prelude::CreateComponent;
use poise::serenity_prelude::CreateContainer;
use poise::serenity_prelude::CreateContainerComponent;
use poise::serenity_prelude::CreateTextDisplay;

use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::bot::views::Action;
use crate::bot::views::InteractableComponentView;
use crate::bot::views::ResponseComponentView;
use crate::bot::views::TextView;
use crate::bot::views::ViewProvider;
use crate::custom_id_enum;

pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(20);

custom_id_enum!(ConfirmAction { Confirm, Cancel });

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Cancelled,
    TimedOut,
}

impl ConfirmOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ConfirmOutcome::Confirmed => "Confirmed. Clearing settings...",
            ConfirmOutcome::Cancelled => "Operation cancelled.",
            ConfirmOutcome::TimedOut => "No response received. Operation timed out.",
        }
    }
}

impl From<Option<ConfirmAction>> for ConfirmOutcome {
    fn from(action: Option<ConfirmAction>) -> Self {
        match action {
            Some(ConfirmAction::Confirm) => ConfirmOutcome::Confirmed,
            Some(ConfirmAction::Cancel) => ConfirmOutcome::Cancelled,
            None => ConfirmOutcome::TimedOut,
        }
    }
}

pub struct ConfirmView {
    prompt: String,
}

impl ConfirmView {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Shows the prompt and waits for the author's answer. The prompt is
    /// replaced by the outcome message.
    pub async fn ask(mut self, ctx: Context<'_>) -> Result<ConfirmOutcome, Error> {
        let handle = ctx.send(self.create_reply()).await?;
        let action = self
            .listen_once(&ctx, CONFIRM_TIMEOUT)
            .await
            .map(|(action, _)| action);
        let outcome = ConfirmOutcome::from(action);

        handle
            .edit(ctx, TextView::new(outcome.message()).create_reply())
            .await?;
        Ok(outcome)
    }
}

impl<'a> ViewProvider<'a> for ConfirmView {
    fn create(&self) -> Vec<CreateComponent<'a>> {
        let buttons = vec![
            CreateButton::new(ConfirmAction::Confirm.as_str())
                .label("Confirm")
                .style(ButtonStyle::Danger),
            CreateButton::new(ConfirmAction::Cancel.as_str())
                .label("Cancel")
                .style(ButtonStyle::Secondary),
        ];

        vec![CreateComponent::Container(CreateContainer::new(vec![
            CreateContainerComponent::TextDisplay(CreateTextDisplay::new(self.prompt.clone())),
            CreateContainerComponent::ActionRow(CreateActionRow::Buttons(buttons.into())),
        ]))]
    }
}

impl ResponseComponentView for ConfirmView {}

#[async_trait::async_trait]
impl InteractableComponentView<ConfirmAction> for ConfirmView {
    async fn handle(&mut self, interaction: &ComponentInteraction) -> Option<ConfirmAction> {
        ConfirmAction::from_str(&interaction.data.custom_id).ok()
    }
}
