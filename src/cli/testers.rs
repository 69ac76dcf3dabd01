use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;

use crate::{
    Res,
    cli::{AppContext, EditArgs},
    error::ResultExt,
    types::Testers,
    utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum TestersCommand {
    /// Get the tester groups of a track
    Get(TrackOpts),

    /// Replace the tester groups of a track
    Update(WriteTestersOpts),

    /// Patch the tester groups of a track
    Patch(WriteTestersOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Track name (internal, alpha, beta or a custom track)
    #[clap(long)]
    pub track: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct WriteTestersOpts {
    #[command(flatten)]
    pub target: TrackOpts,

    /// Comma-separated Google Group email addresses
    #[clap(long)]
    pub google_groups: Option<String>,

    /// Testers JSON (or @file); overrides --google-groups
    #[clap(long)]
    pub json: Option<String>,
}

pub async fn run(ctx: &AppContext, command: TestersCommand) -> Res<()> {
    match command {
        TestersCommand::Get(opts) => {
            let track = utils::require(opts.track.as_deref(), "--track")?;
            let session = ctx.session(&opts.edit.package).await?;
            let testers = session
                .client
                .get_testers(&session.package, &opts.edit.edit, track)
                .await?;
            ctx.print(&testers)
        }
        TestersCommand::Update(opts) => write(ctx, opts, Method::PUT).await,
        TestersCommand::Patch(opts) => write(ctx, opts, Method::PATCH).await,
    }
}

async fn write(ctx: &AppContext, opts: WriteTestersOpts, method: Method) -> Res<()> {
    let track = utils::require(opts.target.track.as_deref(), "--track")?;
    let body: Value = match opts.json.as_deref().filter(|j| !j.trim().is_empty()) {
        Some(json) => utils::load_json_arg(json).await.context("invalid JSON")?,
        None => serde_json::to_value(Testers {
            google_groups: opts
                .google_groups
                .as_deref()
                .map(utils::split_csv)
                .unwrap_or_default(),
        })?,
    };

    let session = ctx.session(&opts.target.edit.package).await?;
    let result = session
        .client
        .write_testers(method, &session.package, &opts.target.edit.edit, track, body)
        .await?;
    ctx.print(&result)
}
