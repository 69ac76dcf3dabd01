use std::time::Duration;

use clap::Parser;

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg, read_artifact},
    config,
    management::{
        ReleaseRequest,
        release::{Artifact, WaitOptions, parse_release_notes},
        rollout::{STATUS_COMPLETED, STATUS_DRAFT, STATUS_HALTED, STATUS_IN_PROGRESS},
        run_release,
    },
    utils,
};

#[derive(Parser, Debug, Clone)]
pub struct ReleaseOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Target track (production, beta, alpha, internal)
    #[clap(long, default_value = "internal")]
    pub track: String,

    /// Path to the .aab bundle
    #[clap(long)]
    pub bundle: Option<String>,

    /// Path to the .apk file (use --bundle or --apk, not both)
    #[clap(long)]
    pub apk: Option<String>,

    /// Release notes: plain text (en-US), JSON array or @file
    #[clap(long)]
    pub release_notes: Option<String>,

    /// Staged rollout fraction in (0, 1]
    #[clap(long, default_value_t = 1.0)]
    pub rollout: f64,

    /// Release status: draft, inProgress, halted, completed
    #[clap(long, default_value = STATUS_COMPLETED)]
    pub status: String,

    /// Release name shown in the Play Console
    #[clap(long)]
    pub version_name: Option<String>,

    /// Wait until the release shows up on the track
    #[clap(long)]
    pub wait: bool,

    /// Polling interval while waiting
    #[clap(long, default_value = "10s", value_parser = config::parse_duration)]
    pub poll_interval: Duration,

    /// Give up waiting after this long
    #[clap(long, default_value = "30m", value_parser = config::parse_duration)]
    pub wait_timeout: Duration,

    /// Do not send the changes for review
    #[clap(long)]
    pub changes_not_sent_for_review: bool,
}

/// Returns the artifact path and whether it is a bundle.
pub fn artifact_path(opts: &ReleaseOpts) -> Res<(&str, bool)> {
    let bundle = opts.bundle.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let apk = opts.apk.as_deref().map(str::trim).filter(|p| !p.is_empty());
    match (bundle, apk) {
        (Some(path), None) => Ok((path, true)),
        (None, Some(path)) => Ok((path, false)),
        (Some(_), Some(_)) => Err(Error::usage("use either --bundle or --apk, not both")),
        (None, None) => Err(Error::usage("either --bundle or --apk is required")),
    }
}

pub fn check_status(status: &str) -> Res<&str> {
    let status = status.trim();
    if [STATUS_DRAFT, STATUS_IN_PROGRESS, STATUS_HALTED, STATUS_COMPLETED].contains(&status) {
        Ok(status)
    } else {
        Err(Error::usage(
            "--status must be one of: draft, inProgress, halted, completed",
        ))
    }
}

pub async fn run(ctx: &AppContext, opts: ReleaseOpts) -> Res<()> {
    let (path, is_bundle) = artifact_path(&opts)?;
    let rollout = utils::validate_fraction("--rollout", opts.rollout, true)?;
    let status = check_status(&opts.status)?.to_string();
    let track = utils::require(Some(opts.track.as_str()), "--track")?.to_string();
    let release_notes = match opts.release_notes.as_deref() {
        Some(notes) => parse_release_notes(notes).await?,
        None => Vec::new(),
    };
    if opts.poll_interval.is_zero() {
        return Err(Error::usage("--poll-interval must be positive"));
    }

    let data = read_artifact(path).await?;
    let artifact = if is_bundle {
        Artifact::Bundle(data)
    } else {
        Artifact::Apk(data)
    };

    let session = ctx.session(&opts.package).await?;
    let request = ReleaseRequest {
        package: session.package.clone(),
        track,
        artifact,
        release_notes,
        rollout,
        status,
        version_name: opts
            .version_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        changes_not_sent_for_review: opts.changes_not_sent_for_review,
        wait: opts.wait.then_some(WaitOptions {
            poll_interval: opts.poll_interval,
            timeout: opts.wait_timeout,
        }),
    };
    let result = run_release(&session.client, &request).await?;
    ctx.print(&result)
}
