//! OAuth2 access tokens for the Sheets API.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::Algorithm;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use log::debug;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use wreq::Client;
use wreq::header::CONTENT_TYPE;

use crate::sheets::error::SheetsError;

const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed.
const REFRESH_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;

    /// Account the bot acts as, shown to users who need to share a sheet.
    fn principal(&self) -> Option<String> {
        None
    }
}

/// Fixed bearer token.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

/// The fields of a Google service account key file that are needed to sign
/// token requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SheetsError::Auth {
            message: format!(
                "Failed to read service account file '{}': {e}",
                path.display()
            ),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(content).map_err(|e| SheetsError::Auth {
            message: format!("Invalid service account file: {e}"),
        })
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Exchanges signed JWT assertions for access tokens and caches them until
/// shortly before they expire.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let client = Client::builder().build()?;
        Ok(Self {
            key,
            encoding_key,
            client,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self, now: i64) -> Result<String, SheetsError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let claims = Claims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(&header, &claims, &self.encoding_key)?)
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken, SheetsError> {
        debug!("Requesting access token for {}", self.key.client_email);
        let body = format!(
            "grant_type={JWT_BEARER_GRANT}&assertion={}",
            self.assertion(now)?
        );
        let response = self
            .client
            .post(self.key.token_uri.as_str())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(match status {
                429 | 500..=599 => SheetsError::Transient {
                    message: format!("Token endpoint returned {status}"),
                },
                _ => SheetsError::Auth {
                    message: format!("Token exchange failed with status {status}: {text}"),
                },
            });
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref()
            && token.expires_at - REFRESH_MARGIN_SECS > now
        {
            return Ok(token.token.clone());
        }

        let token = self.exchange(now).await?;
        let access_token = token.token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    fn principal(&self) -> Option<String> {
        Some(self.key.client_email.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email":"bot@example.iam.gserviceaccount.com","private_key":"x"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(key.private_key_id.is_none());
    }

    #[test]
    fn test_invalid_key_file_is_auth_error() {
        let err = ServiceAccountKey::from_json("{}").unwrap_err();
        assert!(matches!(err, SheetsError::Auth { .. }));
    }

    #[test]
    fn test_invalid_private_key_is_auth_error() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email":"bot@example.iam.gserviceaccount.com","private_key":"not a pem"}"#,
        )
        .unwrap();
        let err = ServiceAccountTokenProvider::new(key).err().unwrap();
        assert!(matches!(err, SheetsError::Auth { .. }));
    }
}
