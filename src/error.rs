use log::error;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Missing config with key \"{key}\"")]
    MissingConfig { key: String },

    #[error("Configuration error: {msg}")]
    ConfigurationError { msg: String },
}

impl AppError {
    /// Logs the error under a new reference ID and returns the ID so it can be
    /// shown to the user.
    pub fn log_with_ref(error: &(dyn std::error::Error + Send + Sync)) -> Uuid {
        let ref_id = Uuid::new_v4();
        error!("[{ref_id}] {error}");
        ref_id
    }
}
