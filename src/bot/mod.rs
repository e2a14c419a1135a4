pub mod checks;
pub mod commands;
pub mod error;
pub mod error_handler;
pub mod members;
pub mod views;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use log::error;
use log::info;
use log::warn;
use poise::Framework;
use poise::FrameworkOptions;
use poise::serenity_prelude::ClientBuilder;
use poise::serenity_prelude::FullEvent;
use poise::serenity_prelude::GatewayIntents;
use poise::serenity_prelude::Message;
use poise::serenity_prelude::Token;

type Error = Box<dyn std::error::Error + Send + Sync>;

use crate::bot::commands::Cog;
use crate::bot::commands::Cogs;
use crate::bot::error_handler::ErrorHandler;
use crate::bot::members::registrant_of_message;
use crate::config::Config;
use crate::database::model::ChannelKey;
use crate::feature::FeatureRegistry;
use crate::service::Services;

pub struct Data {
    pub config: Arc<Config>,
    pub service: Arc<Services>,
    pub features: Arc<FeatureRegistry>,
}

pub struct Bot {
    client_builder: Option<ClientBuilder>,
}

impl Bot {
    pub async fn new(
        config: Arc<Config>,
        service: Arc<Services>,
        features: Arc<FeatureRegistry>,
    ) -> Result<Self> {
        info!("Initializing bot...");

        let framework = Self::create_framework(&config);
        let data = Arc::new(Data {
            config: config.clone(),
            service,
            features: features.clone(),
        });
        let (token, intents) = Self::create_client_config(&config)?;
        let event_handler = Arc::new(BotEventHandler::new(features));

        let client_builder = ClientBuilder::new(token, intents)
            .event_handler(event_handler)
            .framework(framework)
            .data(data);

        Ok(Self {
            client_builder: Some(client_builder),
        })
    }

    pub fn start(&mut self) {
        info!("Starting bot client...");
        let Some(client_builder) = self.client_builder.take() else {
            warn!("Bot client was already started.");
            return;
        };

        tokio::spawn(async move {
            info!("Connecting bot to Discord...");
            let mut client = match client_builder.await {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to build Discord client: {e}");
                    return;
                }
            };
            info!("Bot connected to Discord.");

            if let Err(e) = client.start().await {
                error!("Bot client crashed: {e}");
            }
        });

        info!("Bot client start initiated.");
    }

    fn create_framework(config: &Config) -> Box<Framework<Data, Error>> {
        let cogs = Cogs;
        let options = FrameworkOptions::<Data, Error> {
            commands: cogs.commands(),
            on_error: |error| Box::pin(Self::on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone().into()),
                edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                    Duration::from_secs(3600),
                ))),
                ..Default::default()
            },
            ..Default::default()
        };

        Box::new(poise::Framework::builder().options(options).build())
    }

    fn create_client_config(config: &Config) -> Result<(Token, GatewayIntents)> {
        let token = Token::from_str(&config.discord_token)?;
        let intents = GatewayIntents::non_privileged()
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MEMBERS;
        Ok((token, intents))
    }

    async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
        ErrorHandler::handle(error).await;
    }
}

pub struct BotEventHandler {
    features: Arc<FeatureRegistry>,
}

impl BotEventHandler {
    pub fn new(features: Arc<FeatureRegistry>) -> Self {
        Self { features }
    }

    /// Offers a guild message to every feature. The message gets a ✅ reaction
    /// when something was registered and a ❌ reaction when registering failed.
    async fn register_message(&self, ctx: &poise::serenity_prelude::Context, message: &Message) {
        if message.author.bot() {
            return;
        }
        let Some(guild_id) = message.guild_id else {
            return;
        };

        let key = ChannelKey::new(guild_id.get(), message.channel_id.get());
        let registrant = registrant_of_message(ctx, message);

        for feature in self.features.iter() {
            let reaction = match feature
                .upsert_from_message(key, &registrant, &message.content)
                .await
            {
                Ok(Some(registered)) => {
                    info!(
                        "Registered {} for {} in channel {}: {registered}",
                        feature.feature(),
                        registrant.username,
                        key.channel_id
                    );
                    '✅'
                }
                Ok(None) => continue,
                Err(e) if e.is_feature_unavailable() => {
                    debug!("Skipped {} for message {}: {e}", feature.feature(), message.id);
                    continue;
                }
                Err(e) => {
                    error!(
                        "Failed to register {} for {} in channel {}: {e}",
                        feature.feature(),
                        registrant.username,
                        key.channel_id
                    );
                    '❌'
                }
            };

            if let Err(e) = message.react(&ctx.http, reaction).await {
                warn!("Failed to react to message {}: {e}", message.id);
            }
        }
    }
}

#[async_trait]
impl poise::serenity_prelude::EventHandler for BotEventHandler {
    async fn dispatch(&self, context: &poise::serenity_prelude::Context, event: &FullEvent) {
        #[allow(clippy::single_match)]
        match event {
            FullEvent::Message { new_message, .. } => {
                self.register_message(context, new_message).await;
            }
            _ => {}
        };
    }
}
