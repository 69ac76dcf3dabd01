//! Credential resolution.
//!
//! A selected profile in `config.json` takes precedence over the
//! `GPLAY_SERVICE_ACCOUNT_JSON` / `GPLAY_OAUTH_TOKEN_PATH` environment
//! variables. With `GPLAY_STRICT_AUTH` enabled, having both is an error
//! instead of a silent choice.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    Error, Res,
    config::{self, Config, Environment, Profile},
    management::{
        service_account::{ServiceAccount, ServiceAccountKey},
        token::TokenManager,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Profile,
    Env,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    ServiceAccount {
        key_path: PathBuf,
    },
    OAuth {
        token_path: PathBuf,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub source: CredentialSource,
    pub profile: Option<String>,
}

pub fn resolve_credentials(cfg: Option<&Config>, env: &Environment) -> Res<ResolvedCredentials> {
    if let (Some(name), Some(cfg)) = (config::resolve_profile_name(cfg, env), cfg) {
        let Some(profile) = cfg.find_profile(&name) else {
            return Err(Error::auth(
                "authentication failed",
                format!("profile not found: {name}"),
                "Run `gplay auth login --profile <name>` or set GPLAY_PROFILE to an existing profile.",
            ));
        };

        let credentials = credentials_from_profile(profile)?;
        if config::strict_auth_enabled(env) && env.auth_present() {
            return Err(Error::auth(
                "authentication failed",
                "strict auth: profile selected but environment credentials also present",
                "Unset environment credentials or set GPLAY_STRICT_AUTH=false.",
            ));
        }

        return Ok(ResolvedCredentials {
            credentials,
            source: CredentialSource::Profile,
            profile: Some(name),
        });
    }

    if env.auth_present() {
        return Ok(ResolvedCredentials {
            credentials: credentials_from_env(env)?,
            source: CredentialSource::Env,
            profile: None,
        });
    }

    Err(Error::auth(
        "authentication failed",
        "no credentials found",
        "Run `gplay auth login` or set GPLAY_SERVICE_ACCOUNT_JSON / GPLAY_OAUTH_TOKEN_PATH.",
    ))
}

/// Normalizes a profile type, accepting the common spellings of `service_account`.
pub fn profile_kind(kind: &str) -> Option<&'static str> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "service_account" | "service-account" | "serviceaccount" => Some("service_account"),
        "oauth" => Some("oauth"),
        _ => None,
    }
}

fn credentials_from_profile(profile: &Profile) -> Res<Credentials> {
    match profile_kind(&profile.kind) {
        Some("service_account") => {
            if profile.key_path.trim().is_empty() {
                return Err(Error::auth(
                    "invalid auth profile",
                    "service account profile missing key_path",
                    "Set key_path in config.json or re-run `gplay auth login` with --service-account.",
                ));
            }
            Ok(Credentials::ServiceAccount {
                key_path: PathBuf::from(profile.key_path.trim()),
            })
        }
        Some("oauth") => {
            if profile.token_path.trim().is_empty() {
                return Err(Error::auth(
                    "invalid auth profile",
                    "oauth profile missing token_path",
                    "Set token_path in config.json or re-run `gplay auth login`.",
                ));
            }
            let client_id = profile.client_id.trim();
            let client_secret = profile.client_secret.trim();
            if client_id.is_empty() || client_secret.is_empty() {
                return Err(Error::auth(
                    "invalid auth profile",
                    "oauth profile missing client_id or client_secret",
                    "Set client_id/client_secret in config.json or re-run `gplay auth login` with --client-id/--client-secret.",
                ));
            }
            Ok(Credentials::OAuth {
                token_path: PathBuf::from(profile.token_path.trim()),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            })
        }
        _ => Err(Error::auth(
            "invalid auth profile",
            format!("unknown profile type: {}", profile.kind),
            "Use type service_account or oauth.",
        )),
    }
}

fn credentials_from_env(env: &Environment) -> Res<Credentials> {
    if let Some(key_path) = env.service_account_path() {
        return Ok(Credentials::ServiceAccount {
            key_path: PathBuf::from(key_path),
        });
    }

    let token_path = env.oauth_token_path().unwrap_or_default();
    match (env.oauth_client_id(), env.oauth_client_secret()) {
        (Some(client_id), Some(client_secret)) => Ok(Credentials::OAuth {
            token_path: PathBuf::from(token_path),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }),
        _ => Err(Error::auth(
            "oauth env vars incomplete",
            format!(
                "missing {} or {}",
                config::OAUTH_CLIENT_ID_ENV,
                config::OAUTH_CLIENT_SECRET_ENV
            ),
            "Set both env vars or use `gplay auth login` to create a profile.",
        )),
    }
}

/// Supplies bearer tokens for API requests.
pub enum TokenSource {
    /// A fixed token that never expires.
    Static(String),
    ServiceAccount(ServiceAccount),
    OAuth(TokenManager),
}

impl TokenSource {
    pub async fn from_credentials(resolved: &ResolvedCredentials) -> Res<Self> {
        match &resolved.credentials {
            Credentials::ServiceAccount { key_path } => {
                let key = ServiceAccountKey::load(key_path).await?;
                Ok(TokenSource::ServiceAccount(ServiceAccount::new(key)))
            }
            Credentials::OAuth {
                token_path,
                client_id,
                client_secret,
            } => {
                let manager = TokenManager::load(token_path, client_id, client_secret).await?;
                Ok(TokenSource::OAuth(manager))
            }
        }
    }

    pub async fn access_token(&mut self) -> Res<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(account) => account.access_token().await,
            TokenSource::OAuth(manager) => manager.get_valid_token().await,
        }
    }
}

/// Result of `gplay auth doctor`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthReport {
    pub errors: usize,
    pub warnings: usize,
    pub checks: Vec<String>,
}

impl AuthReport {
    fn ok(&mut self, check: String) {
        self.checks.push(check);
    }

    fn warn(&mut self, check: String) {
        self.warnings += 1;
        self.checks.push(format!("warning: {check}"));
    }

    fn fail(&mut self, check: String) {
        self.errors += 1;
        self.checks.push(format!("error: {check}"));
    }
}

/// Inspects the loaded configuration and environment for common auth mistakes.
pub fn build_auth_report(cfg: Res<Option<Config>>, env: &Environment) -> AuthReport {
    let mut report = AuthReport::default();
    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(e) => {
            report.fail(format!("failed to load config: {e}"));
            return report;
        }
    };

    match cfg.as_ref() {
        Some(cfg) if !cfg.profiles.is_empty() => {
            report.ok(format!("profiles configured: {}", cfg.profiles.len()));
            for profile in &cfg.profiles {
                check_profile(&mut report, profile);
            }
        }
        _ => report.warn("no profiles configured".to_string()),
    }

    if env.auth_present() {
        report.ok("environment credentials detected".to_string());
        if let Some(path) = env.service_account_path() {
            check_file(&mut report, "GPLAY_SERVICE_ACCOUNT_JSON", Path::new(path));
        }
    }

    if cfg.is_some() {
        match config::resolve_profile_name(cfg.as_ref(), env) {
            Some(profile) => report.ok(format!("default profile: {profile}")),
            None => report.warn("no default profile selected".to_string()),
        }
    }

    if let Err(e) = resolve_credentials(cfg.as_ref(), env) {
        report.fail(e.to_string());
    }

    report
}

fn check_profile(report: &mut AuthReport, profile: &Profile) {
    match profile_kind(&profile.kind) {
        Some("service_account") if !profile.key_path.trim().is_empty() => {
            check_file(report, &profile.name, Path::new(profile.key_path.trim()))
        }
        Some("oauth") if !profile.token_path.trim().is_empty() => {
            check_file(report, &profile.name, Path::new(profile.token_path.trim()))
        }
        Some(_) => report.fail(format!(
            "profile {}: missing key_path or token_path",
            profile.name
        )),
        None => report.fail(format!(
            "profile {}: unknown type {:?}",
            profile.name, profile.kind
        )),
    }
}

fn check_file(report: &mut AuthReport, owner: &str, path: &Path) {
    if path.is_file() {
        report.ok(format!("{owner}: {} found", path.display()));
    } else {
        report.fail(format!("{owner}: {} does not exist", path.display()));
    }
}
