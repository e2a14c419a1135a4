//! Components V2 views for settings panels, status displays and prompts.

use std::str::FromStr;
use std::time::Duration;

use poise::CreateReply;
use poise::serenity_prelude::ComponentInteraction;
use poise::serenity_prelude::ComponentInteractionCollector;
use poise::serenity_prelude::CreateComponent;
use poise::serenity_prelude::CreateContainer;
use poise::serenity_prelude::CreateContainerComponent;
use poise::serenity_prelude::CreateInteractionResponse;
use poise::serenity_prelude::CreateTextDisplay;
use poise::serenity_prelude::MessageFlags;

use crate::bot::commands::Context;

pub mod confirm;

/// Trait for types that can create Discord UI components.
pub trait ViewProvider<'a, T = CreateComponent<'a>> {
    /// Creates the components for this view.
    fn create(&self) -> Vec<T>;
}

/// Trait for views that can be sent as a response to a command.
pub trait ResponseComponentView: for<'a> ViewProvider<'a> {
    fn create_reply<'a>(&self) -> CreateReply<'a> {
        CreateReply::new()
            .flags(MessageFlags::IS_COMPONENTS_V2)
            .components(self.create())
    }

    /// Reply only the invoking user can see. Prefix replies stay public.
    fn create_ephemeral_reply<'a>(&self) -> CreateReply<'a> {
        CreateReply::new()
            .flags(MessageFlags::IS_COMPONENTS_V2)
            .ephemeral(true)
            .components(self.create())
    }
}

/// Trait for views that can be attached to existing component collections.
pub trait AttachableView<'a, T = CreateComponent<'a>>: ViewProvider<'a, T> {
    /// Attaches this view's components to the given collection.
    fn attach(&self, components: &mut impl Extend<T>) {
        components.extend(self.create());
    }
}

impl<'a, T> AttachableView<'a> for T where T: ViewProvider<'a> {}

/// Trait for views that handle component interactions.
#[async_trait::async_trait]
pub trait InteractableComponentView<T>: for<'a> AttachableView<'a>
where
    T: Action,
{
    /// Waits for a single interaction and handles it.
    async fn listen_once<'a>(
        &mut self,
        ctx: &'a Context<'a>,
        timeout: Duration,
    ) -> Option<(T, ComponentInteraction)> {
        let collector = ComponentInteractionCollector::new(ctx.serenity_context())
            .author_id(ctx.author().id)
            .filter(move |i| T::ALL.contains(&i.data.custom_id.as_str()))
            .timeout(timeout);

        let interaction = collector.next().await?;

        interaction
            .create_response(ctx.http(), CreateInteractionResponse::Acknowledge)
            .await
            .ok();

        self.handle(&interaction)
            .await
            .map(|action| (action, interaction))
    }

    /// Handles an interaction and returns the action if recognized.
    async fn handle(&mut self, interaction: &ComponentInteraction) -> Option<T>;
}

/// Trait for action enums used in interactive views.
pub trait Action: FromStr + Send {
    /// All possible action strings.
    const ALL: &'static [&'static str];

    /// Returns the string representation of this action.
    fn as_str(&self) -> &'static str;
}

#[macro_export]
macro_rules! custom_id_enum {
    ($name:ident { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)*
        }

        impl $crate::bot::views::Action for $name {
            const ALL: &'static [&'static str] = &[
                $(stringify!($variant),)*
            ];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)*
                    _ => Err(()),
                }
            }
        }
    };
}

/// A single container holding one markdown text block.
pub struct TextView {
    text: String,
}

impl TextView {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl<'a> ViewProvider<'a> for TextView {
    fn create(&self) -> Vec<CreateComponent<'a>> {
        vec![CreateComponent::Container(CreateContainer::new(vec![
            CreateContainerComponent::TextDisplay(CreateTextDisplay::new(self.text.clone())),
        ]))]
    }
}

impl ResponseComponentView for TextView {}
