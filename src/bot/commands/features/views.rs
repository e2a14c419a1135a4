use poise::serenity_prelude::CreateComponent;
use poise::serenity_prelude::CreateContainer;
use poise::serenity_prelude::CreateContainerComponent;
use poise::serenity_prelude::CreateTextDisplay;

use crate::bot::views::ResponseComponentView;
use crate::bot::views::ViewProvider;
use crate::database::model::FeatureChannelModel;

/// Status of every feature record in a channel.
pub struct FeatureListView {
    records: Vec<FeatureChannelModel>,
}

impl FeatureListView {
    pub fn new(records: Vec<FeatureChannelModel>) -> Self {
        Self { records }
    }

    fn status_text(&self) -> String {
        if self.records.is_empty() {
            return "No features are registered in this channel.".to_string();
        }

        self.records
            .iter()
            .map(|record| {
                let status = if record.is_enabled {
                    "🟢 enabled"
                } else {
                    "⚪ disabled"
                };
                format!("- `{}`: {}", record.feature_name, status)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> ViewProvider<'a> for FeatureListView {
    fn create(&self) -> Vec<CreateComponent<'a>> {
        let text = format!("## Channel Features\n\n{}", self.status_text());
        vec![CreateComponent::Container(CreateContainer::new(vec![
            CreateContainerComponent::TextDisplay(CreateTextDisplay::new(text)),
        ]))]
    }
}

impl ResponseComponentView for FeatureListView {}
