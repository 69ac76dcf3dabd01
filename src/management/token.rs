use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Res, config, debug};

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens within this many seconds of expiry are refreshed before use.
const EXPIRY_BUFFER_SECS: i64 = 240;

/// OAuth token as stored on disk, compatible with the `oauth2.Token` JSON layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Body returned by the Google token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds))
    }
}

/// Posts a form to a token endpoint and decodes the response.
pub async fn request_token(client: &Client, url: &str, form: &[(&str, &str)]) -> Res<TokenResponse> {
    debug!("POST {}", url);
    let response = client.post(url).form(form).send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!("POST {} -> {}", url, status.as_u16());

    if !status.is_success() {
        return Err(Error::auth(
            "token request failed",
            format!("{}: {}", status.as_u16(), token_error_message(&body)),
            "",
        ));
    }

    Ok(serde_json::from_str(&body)?)
}

fn token_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("error_description")
                .or_else(|| v.get("error"))
                .and_then(|e| e.as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Loads, refreshes and persists a user OAuth token.
pub struct TokenManager {
    path: PathBuf,
    token: StoredToken,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl TokenManager {
    pub fn new(path: impl Into<PathBuf>, token: StoredToken, client_id: &str, client_secret: &str) -> Self {
        TokenManager {
            path: path.into(),
            token,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub async fn load(path: &Path, client_id: &str, client_secret: &str) -> Res<Self> {
        let content = async_fs::read_to_string(path).await.map_err(|e| {
            Error::auth(
                "failed to read OAuth token file",
                e,
                format!(
                    "Check that {} exists and is readable (configured via profile token_path or {}).",
                    path.display(),
                    config::OAUTH_TOKEN_ENV
                ),
            )
        })?;
        let token: StoredToken = serde_json::from_str(&content).map_err(|e| {
            Error::auth(
                "failed to parse OAuth token JSON",
                e,
                "Ensure the OAuth token file contains valid JSON.",
            )
        })?;
        Ok(Self::new(path, token, client_id, client_secret))
    }

    /// Points refreshes at a different token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub async fn persist(&self) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)?;
        config::write_private(&self.path, json.as_bytes()).await
    }

    pub async fn get_valid_token(&mut self) -> Res<String> {
        if self.is_expired() {
            let refreshed = self.refresh_token().await.map_err(|e| {
                Error::auth(
                    "failed to refresh OAuth token",
                    e,
                    "Run `gplay auth login` to sign in again.",
                )
            })?;
            self.token = refreshed;
            self.persist().await?;
        }

        Ok(self.token.access_token.clone())
    }

    pub fn is_expired(&self) -> bool {
        if self.token.access_token.is_empty() {
            return true;
        }
        match self.token.expiry {
            Some(expiry) => Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECS) >= expiry,
            None => false,
        }
    }

    async fn refresh_token(&self) -> Res<StoredToken> {
        if self.token.refresh_token.is_empty() {
            return Err(Error::usage("token has expired and carries no refresh token"));
        }

        let client = Client::new();
        let res = request_token(
            &client,
            &self.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", &self.token.refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ],
        )
        .await?;

        Ok(StoredToken {
            expiry: res.expiry(),
            access_token: res.access_token,
            token_type: res.token_type,
            refresh_token: res
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.token.refresh_token.clone()),
        })
    }

    pub fn current_token(&self) -> &StoredToken {
        &self.token
    }
}
