//! Google OAuth credential plumbing.
//!
//! The ledger only ever sees an opaque [`Credential`]; this module issues the
//! consent URL and exchanges the callback code (or a refresh token) for
//! tokens against Google's token endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

const CONSENT_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Opaque calendar credential. Held by the mirror once obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// OAuth client settings for the team calendar account.
#[derive(Debug, Clone, Deserialize)]
pub struct OauthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Client for Google's OAuth endpoints.
pub struct GoogleAuth {
    settings: OauthSettings,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl GoogleAuth {
    pub fn new(settings: OauthSettings) -> Self {
        GoogleAuth {
            settings,
            http: reqwest::Client::new(),
        }
    }

    /// Consent URL the operator opens in a browser.
    pub fn consent_url(&self) -> String {
        let url = url::Url::parse_with_params(
            CONSENT_URL,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .expect("consent url is a valid base");
        url.into()
    }

    /// Exchange the OAuth callback code for tokens.
    pub async fn exchange_code(&self, code: &str) -> LedgerResult<Credential> {
        self.token_request(&[
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    /// Trade a refresh token for a fresh access token. Google omits the
    /// refresh token in this response, so the old one is carried over.
    pub async fn refresh(&self, refresh_token: &str) -> LedgerResult<Credential> {
        let mut credential = self
            .token_request(&[
                ("refresh_token", refresh_token),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        if credential.refresh_token.is_none() {
            credential.refresh_token = Some(refresh_token.to_string());
        }
        Ok(credential)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> LedgerResult<Credential> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(|e| LedgerError::Credential(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Credential(format!(
                "token endpoint returned HTTP {}",
                response.status()
            )));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Credential(e.to_string()))?;

        Ok(Credential {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}
