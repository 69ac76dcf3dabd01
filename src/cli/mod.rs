//! # CLI Module
//!
//! This module provides the command-line interface layer of gplay. Each
//! submodule owns one command group: its clap argument types and an async
//! `run` function that resolves what the command needs, issues the API
//! call(s) through [`PlayClient`] and prints the response.
//!
//! ## Command Groups
//!
//! - [`auth`] - Profiles, browser login, status and diagnostics
//! - [`edits`] - Edit lifecycle (create, get, validate, commit, delete)
//! - [`tracks`] - Track releases and country availability
//! - [`listings`] - Store listings per locale
//! - [`images`] - Store listing images
//! - [`details`] - App contact details
//! - [`testers`] - Tester groups per track
//! - [`artifacts`] - Bundles, APKs and deobfuscation files
//! - [`release`] - One-shot upload and release to a track
//! - [`rollout`] - Staged rollouts and track promotion
//! - [`reviews`] - User reviews and replies
//! - [`iap`] - In-app products
//! - [`subscriptions`] - Subscription products
//! - [`baseplans`] - Subscription base plans
//! - [`offers`] - Subscription offers (trials, introductory prices)
//! - [`purchases`] - Purchases, voided purchases and orders
//! - [`vitals`] - Crash/ANR metrics and anomalies
//!
//! ## Data Flow
//!
//! ```text
//! main (clap parse, global flags)
//!     ↓
//! AppContext (environment, output options, dry run)
//!     ↓
//! Session (credentials → PlayClient, package name)
//!     ↓
//! PlayClient → Google Play APIs
//!     ↓
//! output::print (json | table | markdown)
//! ```
//!
//! Status and progress messages go to stderr, leaving stdout for the
//! rendered response so that output can be piped into other tools.

pub mod artifacts;
pub mod auth;
pub mod baseplans;
pub mod details;
pub mod edits;
pub mod iap;
pub mod images;
pub mod listings;
pub mod offers;
pub mod purchases;
pub mod release;
pub mod reviews;
pub mod rollout;
pub mod subscriptions;
pub mod testers;
pub mod tracks;
pub mod vitals;

use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::{
    Error, Res,
    config::{self, Config, Environment},
    management::credentials::{TokenSource, resolve_credentials},
    output::{self, OutputOptions},
    play::{ClientSettings, PlayClient},
};

/// Everything a command needs that does not depend on its own arguments.
pub struct AppContext {
    pub env: Environment,
    pub output: OutputOptions,
    pub dry_run: bool,
}

/// An authenticated client bound to the package a command operates on.
pub struct Session {
    pub client: PlayClient,
    pub package: String,
}

impl AppContext {
    pub fn new(env: Environment, output: OutputOptions, dry_run: bool) -> Self {
        AppContext {
            env,
            output,
            dry_run,
        }
    }

    /// Loads the active config file; a missing file yields `None`.
    pub async fn config(&self) -> Res<Option<Config>> {
        config::load_optional(&self.env).await
    }

    /// Resolves credentials, builds the API client and the target package.
    pub async fn session(&self, package: &PackageArg) -> Res<Session> {
        let cfg = self.config().await?;
        let resolved = resolve_credentials(cfg.as_ref(), &self.env)?;
        let tokens = TokenSource::from_credentials(&resolved).await?;

        let package = config::resolve_package_name(package.package.as_deref(), cfg.as_ref(), &self.env)
            .ok_or_else(|| Error::usage("--package is required"))?;

        let timeouts = config::resolve_timeouts(cfg.as_ref(), &self.env);
        let settings = ClientSettings {
            timeout: timeouts.request,
            upload_timeout: timeouts.upload,
            dry_run: self.dry_run,
            ..ClientSettings::default()
        };

        Ok(Session {
            client: PlayClient::new(settings, tokens),
            package,
        })
    }

    pub fn print<T: Serialize + ?Sized>(&self, value: &T) -> Res<()> {
        output::print(value, self.output)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PackageArg {
    /// Package name (applicationId); falls back to GPLAY_PACKAGE_NAME or config
    #[clap(long)]
    pub package: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    #[command(flatten)]
    pub package: PackageArg,

    /// Edit ID
    #[clap(long)]
    pub edit: String,
}

/// Spinner shown on stderr while a long request runs.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

/// Reads an artifact from disk for upload, rejecting missing or empty files.
pub(crate) async fn read_artifact(path: &str) -> Res<Vec<u8>> {
    let data = async_fs::read(path).await.map_err(|e| {
        Error::usage(format!("cannot read {path}: {e}"))
    })?;
    if data.is_empty() {
        return Err(Error::usage(format!("{path} is empty")));
    }
    Ok(data)
}
