use crate::database::error::DatabaseError;
use crate::database::model::Feature;
use crate::sheets::error::SheetsError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("Feature `{feature}` not enabled in this channel.")]
    FeatureNotEnabled { feature: Feature },

    #[error("`{feature}` is not configured for this channel.")]
    NotConfigured { feature: Feature },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unexpected result: {message}")]
    UnexpectedResult { message: String },

    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("SheetsError: {0}")]
    SheetsError(#[from] SheetsError),
}

impl ServiceError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ServiceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the feature is disabled or not set up in the channel.
    pub fn is_feature_unavailable(&self) -> bool {
        matches!(
            self,
            ServiceError::FeatureNotEnabled { .. } | ServiceError::NotConfigured { .. }
        )
    }
}
