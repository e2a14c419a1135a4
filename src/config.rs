use std::path::PathBuf;

use crate::error::AppError;
use crate::sheets::client::DEFAULT_SHEETS_API_URL;

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub db_url: String,
    pub service_account_path: PathBuf,
    pub command_prefix: String,
    pub logs_path: PathBuf,
    pub sheets_api_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            discord_token: String::new(),
            db_url: String::new(),
            service_account_path: PathBuf::from("service_account.json"),
            command_prefix: "$".to_string(),
            logs_path: PathBuf::from("logs"),
            sheets_api_url: DEFAULT_SHEETS_API_URL.to_string(),
        }
    }

    /// Reads the configuration from the environment.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.load_from(|key| std::env::var(key).ok())
    }

    fn load_from(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        let required = |key: &str| {
            var(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::MissingConfig {
                    key: key.to_string(),
                })
        };

        self.discord_token = required("DISCORD_TOKEN")?;
        self.db_url = required("DATABASE_URL")?;

        if let Some(path) = var("GOOGLE_SERVICE_ACCOUNT_PATH") {
            self.service_account_path = PathBuf::from(path);
        }
        if let Some(prefix) = var("COMMAND_PREFIX") {
            self.command_prefix = prefix;
        }
        if let Some(path) = var("LOGS_PATH") {
            self.logs_path = PathBuf::from(path);
        }
        if let Some(url) = var("SHEETS_API_URL") {
            self.sheets_api_url = url;
        }
        Ok(())
    }
}
