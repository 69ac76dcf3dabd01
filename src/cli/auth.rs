use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

use crate::{
    Error, Res,
    cli::AppContext,
    config::{self, Config, Profile},
    info,
    management::{
        TokenManager,
        credentials::{AuthReport, build_auth_report},
        service_account::ServiceAccountKey,
    },
    play::auth::{BrowserLoginOptions, DEFAULT_LOGIN_TIMEOUT, browser_login},
    success, utils, warning,
};

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Create a template config.json
    Init(InitOpts),

    /// Authenticate via browser (OAuth) or register a service account
    Login(LoginOpts),

    /// Switch the default auth profile
    Switch(ProfileOpts),

    /// Remove a stored auth profile
    Logout(LogoutOpts),

    /// Show authentication status
    Status,

    /// Diagnose authentication configuration issues
    Doctor,
}

#[derive(Parser, Debug, Clone)]
pub struct InitOpts {
    /// Overwrite an existing config.json
    #[clap(long)]
    pub force: bool,

    /// Write config.json to ./.gplay in the current directory
    #[clap(long)]
    pub local: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOpts {
    /// Profile name
    #[clap(long, default_value = "default")]
    pub profile: String,

    /// Path to a service account JSON key (for CI/CD)
    #[clap(long)]
    pub service_account: Option<String>,

    /// OAuth client ID (falls back to GPLAY_OAUTH_CLIENT_ID)
    #[clap(long)]
    pub client_id: Option<String>,

    /// OAuth client secret (falls back to GPLAY_OAUTH_CLIENT_SECRET)
    #[clap(long)]
    pub client_secret: Option<String>,

    /// Set as default profile
    #[clap(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub set_default: bool,

    /// Write to the local ./.gplay/config.json
    #[clap(long)]
    pub local: bool,

    /// How long to wait for the browser sign-in (e.g. 90s, 5m)
    #[clap(long, value_parser = config::parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(Parser, Debug, Clone)]
pub struct ProfileOpts {
    /// Profile name
    #[clap(long)]
    pub profile: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct LogoutOpts {
    /// Profile name
    #[clap(long)]
    pub profile: Option<String>,

    /// Confirm removal
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Serialize)]
struct InitResult<'a> {
    config_path: String,
    created: bool,
    config: &'a Config,
}

#[derive(Serialize)]
struct LoginResult<'a> {
    config_path: String,
    profile: &'a Profile,
}

#[derive(Serialize)]
struct SwitchResult<'a> {
    config_path: String,
    default_profile: &'a str,
}

#[derive(Serialize)]
struct LogoutResult<'a> {
    config_path: String,
    removed_profile: &'a str,
}

#[derive(Serialize)]
struct StatusResult {
    config_path: String,
    profile: String,
    profiles: Vec<Profile>,
    env_present: bool,
}

pub async fn run(ctx: &AppContext, command: AuthCommand) -> Res<()> {
    match command {
        AuthCommand::Init(opts) => init(ctx, opts).await,
        AuthCommand::Login(opts) => login(ctx, opts).await,
        AuthCommand::Switch(opts) => switch(ctx, opts).await,
        AuthCommand::Logout(opts) => logout(ctx, opts).await,
        AuthCommand::Status => status(ctx).await,
        AuthCommand::Doctor => doctor(ctx).await,
    }
}

async fn init(ctx: &AppContext, opts: InitOpts) -> Res<()> {
    let path = if opts.local {
        config::local_path(&ctx.env)
    } else {
        config::global_path(&ctx.env)
    };

    if !opts.force && path.exists() {
        return Err(Error::usage(format!(
            "auth init: config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let template = Config::default();
    config::save_at(&path, &template).await?;
    success!("Created {}", path.display());

    ctx.print(&InitResult {
        config_path: path.display().to_string(),
        created: true,
        config: &template,
    })
}

fn token_path(ctx: &AppContext, profile: &str) -> PathBuf {
    config::config_dir(&ctx.env)
        .join("tokens")
        .join(format!("{profile}.json"))
}

async fn login(ctx: &AppContext, opts: LoginOpts) -> Res<()> {
    let name = opts.profile.trim().to_string();
    if name.is_empty() {
        return Err(Error::usage("--profile is required"));
    }

    let profile = match opts.service_account.as_deref().map(str::trim) {
        Some(key_path) if !key_path.is_empty() => {
            let key = ServiceAccountKey::load(Path::new(key_path)).await?;
            info!("Using service account {}", key.client_email);
            Profile {
                name: name.clone(),
                kind: "service_account".to_string(),
                key_path: key_path.to_string(),
                ..Profile::default()
            }
        }
        _ => {
            let client_id = opts
                .client_id
                .clone()
                .or_else(|| ctx.env.oauth_client_id().map(str::to_string))
                .filter(|v| !v.trim().is_empty());
            let client_secret = opts
                .client_secret
                .clone()
                .or_else(|| ctx.env.oauth_client_secret().map(str::to_string))
                .filter(|v| !v.trim().is_empty());
            let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
                return Err(Error::auth(
                    "browser authentication failed",
                    "OAuth client ID and secret are required",
                    format!(
                        "Pass --client-id and --client-secret or set {} and {}.",
                        config::OAUTH_CLIENT_ID_ENV,
                        config::OAUTH_CLIENT_SECRET_ENV
                    ),
                ));
            };

            let timeout = opts.timeout.unwrap_or(DEFAULT_LOGIN_TIMEOUT);
            let token = browser_login(&BrowserLoginOptions::new(&client_id, &client_secret, timeout)).await?;
            success!("Authentication successful!");

            let path = token_path(ctx, &name);
            if let Some(parent) = path.parent() {
                async_fs::create_dir_all(parent).await?;
            }
            TokenManager::new(path.clone(), token, &client_id, &client_secret)
                .persist()
                .await?;
            info!("Token saved to {}", path.display());

            Profile {
                name: name.clone(),
                kind: "oauth".to_string(),
                token_path: path.display().to_string(),
                client_id,
                client_secret,
                ..Profile::default()
            }
        }
    };

    // a broken or missing config is replaced rather than blocking login
    let mut cfg = match ctx.config().await {
        Ok(cfg) => cfg.unwrap_or_default(),
        Err(e) => {
            warning!("Ignoring unreadable config: {}", e);
            Config::default()
        }
    };
    cfg.upsert_profile(profile.clone());
    if opts.set_default {
        cfg.default_profile = name;
    }

    let path = if opts.local {
        config::local_path(&ctx.env)
    } else {
        config::resolve_path(&ctx.env)
    };
    config::save_at(&path, &cfg).await?;

    ctx.print(&LoginResult {
        config_path: path.display().to_string(),
        profile: &profile,
    })
}

async fn switch(ctx: &AppContext, opts: ProfileOpts) -> Res<()> {
    let profile = utils::require(opts.profile.as_deref(), "--profile")?;
    let mut cfg = config::load(&ctx.env).await?;
    if cfg.find_profile(profile).is_none() {
        return Err(Error::usage(format!("profile not found: {profile}")));
    }
    cfg.default_profile = profile.to_string();

    let path = config::resolve_path(&ctx.env);
    config::save_at(&path, &cfg).await?;
    success!("Default profile set to {}", profile);

    ctx.print(&SwitchResult {
        config_path: path.display().to_string(),
        default_profile: profile,
    })
}

async fn logout(ctx: &AppContext, opts: LogoutOpts) -> Res<()> {
    let profile = utils::require(opts.profile.as_deref(), "--profile")?;
    utils::require_confirm(opts.confirm)?;

    let mut cfg = config::load(&ctx.env).await?;
    if !cfg.remove_profile(profile) {
        return Err(Error::usage(format!("profile not found: {profile}")));
    }

    let path = config::resolve_path(&ctx.env);
    config::save_at(&path, &cfg).await?;
    success!("Removed profile {}", profile);

    ctx.print(&LogoutResult {
        config_path: path.display().to_string(),
        removed_profile: profile,
    })
}

async fn status(ctx: &AppContext) -> Res<()> {
    let cfg = ctx.config().await.ok().flatten();
    let result = StatusResult {
        config_path: config::resolve_path(&ctx.env).display().to_string(),
        profile: config::resolve_profile_name(cfg.as_ref(), &ctx.env).unwrap_or_default(),
        profiles: cfg
            .map(|c| c.profiles.into_iter().map(redact_secret).collect())
            .unwrap_or_default(),
        env_present: ctx.env.auth_present(),
    };
    ctx.print(&result)
}

fn redact_secret(mut profile: Profile) -> Profile {
    if !profile.client_secret.is_empty() {
        profile.client_secret = "********".to_string();
    }
    profile
}

async fn doctor(ctx: &AppContext) -> Res<()> {
    let report = build_auth_report(ctx.config().await, &ctx.env);
    print_report(&report);
    ctx.print(&report)?;

    if report.errors > 0 {
        return Err(Error::usage(format!(
            "auth doctor: found {} error(s)",
            report.errors
        )));
    }
    Ok(())
}

fn print_report(report: &AuthReport) {
    for check in &report.checks {
        if check.starts_with("error:") || check.starts_with("warning:") {
            warning!("{}", check);
        } else {
            success!("{}", check);
        }
    }
    info!(
        "{} error(s), {} warning(s)",
        report.errors, report.warnings
    );
}
