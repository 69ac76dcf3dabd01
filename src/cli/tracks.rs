use clap::{Parser, Subcommand};
use reqwest::Method;

use crate::{
    Res,
    cli::{AppContext, EditArgs},
    error::ResultExt,
    types::{Track, TrackRelease},
    utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum TracksCommand {
    /// List the tracks of an edit
    List(EditArgs),

    /// Get one track
    Get(TrackOpts),

    /// Replace the releases of a track
    Update(WriteTrackOpts),

    /// Patch the releases of a track
    Patch(WriteTrackOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AvailabilityCommand {
    /// Get the country availability of a track
    Get(TrackOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Track name (production, beta, alpha, internal or a custom track)
    #[clap(long)]
    pub track: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct WriteTrackOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Track name
    #[clap(long)]
    pub track: Option<String>,

    /// JSON array of track releases (or @file)
    #[clap(long)]
    pub releases: Option<String>,
}

pub async fn run(ctx: &AppContext, command: TracksCommand) -> Res<()> {
    match command {
        TracksCommand::List(args) => {
            let session = ctx.session(&args.package).await?;
            let tracks = session
                .client
                .list_tracks(&session.package, &args.edit)
                .await?;
            ctx.print(&tracks)
        }
        TracksCommand::Get(opts) => {
            let track = utils::require(opts.track.as_deref(), "--track")?;
            let session = ctx.session(&opts.edit.package).await?;
            let track = session
                .client
                .get_track(&session.package, &opts.edit.edit, track)
                .await?;
            ctx.print(&track)
        }
        TracksCommand::Update(opts) => write(ctx, opts, Method::PUT).await,
        TracksCommand::Patch(opts) => write(ctx, opts, Method::PATCH).await,
    }
}

async fn write(ctx: &AppContext, opts: WriteTrackOpts, method: Method) -> Res<()> {
    let track = utils::require(opts.track.as_deref(), "--track")?;
    let releases = utils::require(opts.releases.as_deref(), "--releases")?;
    let releases: Vec<TrackRelease> = utils::load_json_arg(releases)
        .await
        .context("invalid releases JSON")?;

    let session = ctx.session(&opts.edit.package).await?;
    let track = Track {
        track: track.to_string(),
        releases,
    };
    let result = session
        .client
        .write_track(method, &session.package, &opts.edit.edit, &track)
        .await?;
    ctx.print(&result)
}

pub async fn run_availability(ctx: &AppContext, command: AvailabilityCommand) -> Res<()> {
    match command {
        AvailabilityCommand::Get(opts) => {
            let track = utils::require(opts.track.as_deref(), "--track")?;
            let session = ctx.session(&opts.edit.package).await?;
            let availability = session
                .client
                .get_country_availability(&session.package, &opts.edit.edit, track)
                .await?;
            ctx.print(&availability)
        }
    }
}
