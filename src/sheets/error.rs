use serde::Deserialize;

/// Coarse classification of a Google Sheets failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetsErrorKind {
    /// The spreadsheet or range does not exist or is not shared with the bot.
    NotFound,
    /// Rate limited, server side failure or network error. Retrying later may succeed.
    Transient,
    /// Credentials were rejected. Needs an administrator.
    Auth,
    Api,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SheetsError {
    #[error("Spreadsheet not found: {message}")]
    NotFound { message: String },

    #[error("Google Sheets is temporarily unavailable: {message}")]
    Transient { message: String },

    #[error("Google Sheets rejected the bot's credentials: {message}")]
    Auth { message: String },

    #[error("Google Sheets request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse Google Sheets response: {message}")]
    ParseFailed { message: String },
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl SheetsError {
    /// Builds an error from a non-success HTTP status and the response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        match status {
            404 => SheetsError::NotFound { message },
            401 | 403 => SheetsError::Auth { message },
            408 | 429 | 500..=599 => SheetsError::Transient { message },
            _ => SheetsError::Api { status, message },
        }
    }

    pub fn kind(&self) -> SheetsErrorKind {
        match self {
            SheetsError::NotFound { .. } => SheetsErrorKind::NotFound,
            SheetsError::Transient { .. } => SheetsErrorKind::Transient,
            SheetsError::Auth { .. } => SheetsErrorKind::Auth,
            SheetsError::Api { .. } | SheetsError::ParseFailed { .. } => SheetsErrorKind::Api,
        }
    }
}

impl From<wreq::Error> for SheetsError {
    fn from(e: wreq::Error) -> Self {
        SheetsError::Transient {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for SheetsError {
    fn from(e: serde_json::Error) -> Self {
        SheetsError::ParseFailed {
            message: e.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for SheetsError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        SheetsError::Auth {
            message: format!("Failed to sign service account assertion: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert_eq!(
            SheetsError::from_status(404, "").kind(),
            SheetsErrorKind::NotFound
        );
        assert_eq!(SheetsError::from_status(401, "").kind(), SheetsErrorKind::Auth);
        assert_eq!(SheetsError::from_status(403, "").kind(), SheetsErrorKind::Auth);
        assert_eq!(
            SheetsError::from_status(429, "").kind(),
            SheetsErrorKind::Transient
        );
        assert_eq!(
            SheetsError::from_status(503, "").kind(),
            SheetsErrorKind::Transient
        );
        assert_eq!(SheetsError::from_status(400, "").kind(), SheetsErrorKind::Api);
    }

    #[test]
    fn test_from_status_extracts_google_message() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        let err = SheetsError::from_status(404, body);
        assert_eq!(
            err.to_string(),
            "Spreadsheet not found: Requested entity was not found."
        );
    }
}
