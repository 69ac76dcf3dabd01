use clap::{Parser, Subcommand};

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg},
    error::ResultExt,
    management::{
        PromoteRequest, RolloutAction, RolloutRequest,
        rollout::{STATUS_COMPLETED, STATUS_DRAFT, STATUS_HALTED, STATUS_IN_PROGRESS},
        run_promote, run_rollout,
    },
    types::LocalizedText,
    utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum RolloutCommand {
    /// Halt a staged rollout
    Halt(RolloutOpts),

    /// Resume a halted rollout, optionally with a new fraction
    Resume(FractionOpts),

    /// Raise the rollout fraction of a staged rollout
    Update(FractionOpts),

    /// Complete a staged rollout to 100%
    Complete(RolloutOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct RolloutOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Track name
    #[clap(long, default_value = "production")]
    pub track: String,

    /// Do not send the changes for review
    #[clap(long)]
    pub changes_not_sent_for_review: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FractionOpts {
    #[command(flatten)]
    pub rollout: RolloutOpts,

    /// Rollout fraction in (0, 1)
    #[clap(long = "rollout")]
    pub rollout_fraction: Option<f64>,
}

#[derive(Parser, Debug, Clone)]
pub struct PromoteOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Source track (e.g. internal, alpha, beta)
    #[clap(long)]
    pub from: Option<String>,

    /// Destination track (e.g. beta, production)
    #[clap(long)]
    pub to: Option<String>,

    /// Staged rollout fraction for the destination, in (0, 1]
    #[clap(long)]
    pub rollout: Option<f64>,

    /// Release status: draft, inProgress, halted, completed
    #[clap(long, default_value = STATUS_COMPLETED)]
    pub status: String,

    /// Release notes JSON (or @file); copied from the source release when omitted
    #[clap(long)]
    pub release_notes: Option<String>,

    /// Do not send the changes for review
    #[clap(long)]
    pub changes_not_sent_for_review: bool,
}

/// Turns a rollout subcommand into the action applied to the track.
pub fn rollout_action(command: &RolloutCommand) -> Res<RolloutAction> {
    match command {
        RolloutCommand::Halt(_) => Ok(RolloutAction::Halt),
        RolloutCommand::Complete(_) => Ok(RolloutAction::Complete),
        RolloutCommand::Resume(opts) => {
            let fraction = opts
                .rollout_fraction
                .map(|f| utils::validate_fraction("--rollout", f, false))
                .transpose()?;
            Ok(RolloutAction::Resume { fraction })
        }
        RolloutCommand::Update(opts) => {
            let fraction = opts
                .rollout_fraction
                .ok_or_else(|| Error::usage("--rollout is required"))?;
            let fraction = utils::validate_fraction("--rollout", fraction, false)?;
            Ok(RolloutAction::Update { fraction })
        }
    }
}

pub async fn run(ctx: &AppContext, command: RolloutCommand) -> Res<()> {
    let action = rollout_action(&command)?;
    let opts = match command {
        RolloutCommand::Halt(opts) | RolloutCommand::Complete(opts) => opts,
        RolloutCommand::Resume(opts) | RolloutCommand::Update(opts) => opts.rollout,
    };
    let track = utils::require(Some(opts.track.as_str()), "--track")?.to_string();

    let session = ctx.session(&opts.package).await?;
    let request = RolloutRequest {
        package: session.package.clone(),
        track,
        action,
        changes_not_sent_for_review: opts.changes_not_sent_for_review,
    };
    let result = run_rollout(&session.client, &request).await?;
    ctx.print(&result)
}

pub async fn run_promote_command(ctx: &AppContext, opts: PromoteOpts) -> Res<()> {
    let from = utils::require(opts.from.as_deref(), "--from")?.to_string();
    let to = utils::require(opts.to.as_deref(), "--to")?.to_string();
    let rollout = opts
        .rollout
        .map(|f| utils::validate_fraction("--rollout", f, true))
        .transpose()?;

    let status = opts.status.trim();
    if ![STATUS_DRAFT, STATUS_IN_PROGRESS, STATUS_HALTED, STATUS_COMPLETED].contains(&status) {
        return Err(Error::usage(
            "--status must be one of: draft, inProgress, halted, completed",
        ));
    }

    let release_notes = match opts.release_notes.as_deref() {
        Some(notes) => Some(
            utils::load_json_arg::<Vec<LocalizedText>>(notes)
                .await
                .context("invalid release notes JSON")?,
        ),
        None => None,
    };

    let session = ctx.session(&opts.package).await?;
    let request = PromoteRequest {
        package: session.package.clone(),
        from_track: from,
        to_track: to,
        rollout,
        status: status.to_string(),
        release_notes,
        changes_not_sent_for_review: opts.changes_not_sent_for_review,
    };
    let result = run_promote(&session.client, &request).await?;
    ctx.print(&result)
}
