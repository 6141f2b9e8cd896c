//! OAuth access tokens for the GKE API

use crate::credentials::GoogleCredentials;
use crate::error::{GcpError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

enum Source {
    Credentials(GoogleCredentials),
    Static(String),
}

/// Hands out bearer tokens, exchanging credentials on first use
pub struct TokenProvider {
    source: Source,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(credentials: GoogleCredentials, http: reqwest::Client) -> Self {
        Self {
            source: Source::Credentials(credentials),
            http,
            cached: Mutex::new(None),
        }
    }

    /// Provider that always returns `token`, for emulators and tests
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: Source::Static(token.into()),
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token
    pub async fn token(&self) -> Result<String> {
        let credentials = match &self.source {
            Source::Static(token) => return Ok(token.clone()),
            Source::Credentials(credentials) => credentials,
        };

        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        tracing::debug!(principal = %credentials.principal(), "Exchanging credentials for access token");
        let token = self.exchange(credentials, now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn exchange(
        &self,
        credentials: &GoogleCredentials,
        now: DateTime<Utc>,
    ) -> Result<AccessToken> {
        let request = match credentials {
            GoogleCredentials::ServiceAccount(key) => {
                let claims = AssertionClaims {
                    iss: &key.client_email,
                    scope: CLOUD_PLATFORM_SCOPE,
                    aud: &key.token_uri,
                    iat: now.timestamp(),
                    exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
                };
                let mut header = Header::new(Algorithm::RS256);
                header.kid = key.private_key_id.clone();
                let assertion = jsonwebtoken::encode(&header, &claims, &key.signing_key)?;

                self.http.post(&key.token_uri).form(&[
                    ("grant_type", JWT_BEARER_GRANT),
                    ("assertion", assertion.as_str()),
                ])
            }
            GoogleCredentials::AuthorizedUser(user) => self.http.post(&user.token_uri).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ]),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status.as_u16()),
            };
            return Err(GcpError::TokenExchange(message));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        Ok(AccessToken {
            value: parsed.access_token,
            expires_at: expiry(now, parsed.expires_in),
        })
    }
}

/// Expiry for a token issued at `now`; out-of-range lifetimes get the default
fn expiry(now: DateTime<Utc>, expires_in: Option<i64>) -> DateTime<Utc> {
    let default_lifetime = Duration::try_seconds(ASSERTION_LIFETIME_SECS).unwrap_or_default();
    expires_in
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .or_else(|| now.checked_add_signed(default_lifetime))
        .unwrap_or(now)
}
