//! Application entry point for rhoboto.
//!
//! Initializes all components and starts the Discord bot.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;
use rhoboto::bot::Bot;
use rhoboto::config::Config;
use rhoboto::database::Database;
use rhoboto::database::run_migrations;
use rhoboto::feature::FeatureRegistry;
use rhoboto::logging::setup_logging;
use rhoboto::service::Services;
use rhoboto::sheets::SheetClient;
use rhoboto::sheets::auth::ServiceAccountKey;
use rhoboto::sheets::auth::ServiceAccountTokenProvider;
use rhoboto::sheets::auth::TokenProvider;
use rhoboto::sheets::client::GoogleSheetsClient;
use rhoboto::sheets::client::SheetsClientConfigBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config().await?;

    let db = setup_database(&config, init_start).await?;
    let sheets = setup_sheets(&config, init_start)?;
    let services = Arc::new(Services::new(db, sheets));
    let features = Arc::new(FeatureRegistry::new(&services));

    setup_bot(&config, services, features, init_start).await?;

    run(init_start).await
}

async fn load_config() -> Result<Arc<Config>> {
    debug!("Loading configuration...");
    let mut config = Config::new();
    config.load()?;
    let config = Arc::new(config);
    setup_logging(&config)?;
    info!("Starting rhoboto...");
    Ok(config)
}

async fn setup_database(config: &Config, init_start: Instant) -> Result<Arc<Database>> {
    debug!("Setting up Database...");
    info!("Running database migrations...");
    run_migrations(&config.db_url).await?;

    let db = Arc::new(Database::new(&config.db_url).await?);
    info!(
        "Database setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    Ok(db)
}

fn setup_sheets(config: &Config, init_start: Instant) -> Result<Arc<SheetClient>> {
    debug!("Setting up Google Sheets client...");
    let key = ServiceAccountKey::from_file(&config.service_account_path)?;
    info!("Using service account {}", key.client_email);

    let tokens: Arc<dyn TokenProvider> = Arc::new(ServiceAccountTokenProvider::new(key)?);
    let client_config = SheetsClientConfigBuilder::default()
        .base_url(config.sheets_api_url.clone())
        .build()?;
    let client = GoogleSheetsClient::new(client_config, tokens)?;

    debug!(
        "Google Sheets setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(Arc::new(SheetClient::new(Arc::new(client))))
}

async fn setup_bot(
    config: &Arc<Config>,
    services: Arc<Services>,
    features: Arc<FeatureRegistry>,
    init_start: Instant,
) -> Result<()> {
    info!("Starting bot...");
    let mut bot = Bot::new(config.clone(), services, features).await?;

    bot.start();
    info!(
        "Bot setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    Ok(())
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "rhoboto is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
