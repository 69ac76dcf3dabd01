//! Service-account authentication using the OAuth 2.0 JWT bearer grant.
//!
//! The key file downloaded from the Google Cloud console carries an RSA
//! private key in PKCS#8 PEM form. An RS256-signed assertion is exchanged at
//! the key's `token_uri` for a short-lived access token, which is cached and
//! reused until shortly before it expires.

use std::path::Path;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use ring::{
    rand::SystemRandom,
    signature::{RSA_PKCS1_SHA256, RsaKeyPair},
};
use rustls_pki_types::{PrivatePkcs8KeyDer, pem::PemObject};
use serde::Deserialize;
use serde_json::json;

use crate::{Error, Res, config, management::token};

pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
pub const REPORTING_SCOPE: &str = "https://www.googleapis.com/auth/playdeveloperreporting";
pub const SCOPES: &[&str] = &[ANDROID_PUBLISHER_SCOPE, REPORTING_SCOPE];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REUSE_BUFFER_SECS: i64 = 60;

fn default_token_uri() -> String {
    token::GOOGLE_TOKEN_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub async fn load(path: &Path) -> Res<Self> {
        let content = async_fs::read_to_string(path).await.map_err(|e| {
            Error::auth(
                "failed to read service account file",
                e,
                format!(
                    "Check that {} exists and is readable (configured via profile key_path or {}).",
                    path.display(),
                    config::SERVICE_ACCOUNT_ENV
                ),
            )
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Res<Self> {
        let parse_error = |cause: String| {
            Error::auth(
                "failed to parse service account JSON",
                cause,
                "Ensure the file is a valid service account JSON with Android Publisher access.",
            )
        };

        let key: ServiceAccountKey =
            serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;
        if key.kind != "service_account" {
            return Err(parse_error(format!(
                "expected type \"service_account\", got {:?}",
                key.kind
            )));
        }
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(parse_error(
                "client_email and private_key are required".to_string(),
            ));
        }
        key.key_pair().map_err(|e| parse_error(e.to_string()))?;
        Ok(key)
    }

    fn key_pair(&self) -> Res<RsaKeyPair> {
        let der = PrivatePkcs8KeyDer::from_pem_slice(self.private_key.as_bytes())
            .map_err(|e| Error::usage(format!("invalid PEM private key: {e}")))?;
        RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
            .map_err(|e| Error::usage(format!("invalid private key: {e}")))
    }

    /// Builds the signed assertion for the given scopes, issued at `issued_at` (unix seconds).
    pub fn sign_jwt(&self, scopes: &[&str], issued_at: i64) -> Res<String> {
        let mut header = json!({ "alg": "RS256", "typ": "JWT" });
        if !self.private_key_id.is_empty() {
            header["kid"] = json!(self.private_key_id);
        }
        let claims = json!({
            "iss": self.client_email,
            "scope": scopes.join(" "),
            "aud": self.token_uri,
            "iat": issued_at,
            "exp": issued_at + ASSERTION_LIFETIME_SECS,
        });

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );

        let key_pair = self.key_pair()?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                message.as_bytes(),
                &mut signature,
            )
            .map_err(|_| Error::usage("failed to sign service account assertion"))?;

        Ok(format!("{}.{}", message, URL_SAFE_NO_PAD.encode(signature)))
    }
}

/// Access tokens minted from a service-account key.
pub struct ServiceAccount {
    key: ServiceAccountKey,
    cached: Option<(String, DateTime<Utc>)>,
}

impl ServiceAccount {
    pub fn new(key: ServiceAccountKey) -> Self {
        ServiceAccount { key, cached: None }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn access_token(&mut self) -> Res<String> {
        if let Some((token, expiry)) = &self.cached {
            if Utc::now() + Duration::seconds(REUSE_BUFFER_SECS) < *expiry {
                return Ok(token.clone());
            }
        }

        let assertion = self.key.sign_jwt(SCOPES, Utc::now().timestamp())?;
        let client = Client::new();
        let res = token::request_token(
            &client,
            &self.key.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)],
        )
        .await
        .map_err(|e| {
            Error::auth(
                "service account token exchange failed",
                e,
                "Check that the service account key is active and has been invited to the Play Console.",
            )
        })?;

        let expiry = res
            .expiry()
            .unwrap_or_else(|| Utc::now() + Duration::seconds(ASSERTION_LIFETIME_SECS));
        self.cached = Some((res.access_token.clone(), expiry));
        Ok(res.access_token)
    }
}
