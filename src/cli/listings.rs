use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::json;

use crate::{
    Res,
    cli::{AppContext, EditArgs},
    types::Listing,
    utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum ListingsCommand {
    /// List store listings for every locale
    List(EditArgs),

    /// Get the store listing of one locale
    Get(LocaleOpts),

    /// Replace the store listing of a locale
    Update(WriteListingOpts),

    /// Patch the store listing of a locale
    Patch(WriteListingOpts),

    /// Delete the store listing of a locale
    Delete(DeleteOpts),

    /// Delete every store listing
    DeleteAll(DeleteAllOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct LocaleOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Locale (e.g. en-US)
    #[clap(long)]
    pub locale: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct WriteListingOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Locale (e.g. en-US)
    #[clap(long)]
    pub locale: Option<String>,

    /// Listing title
    #[clap(long)]
    pub title: Option<String>,

    /// Short description
    #[clap(long)]
    pub short_description: Option<String>,

    /// Full description
    #[clap(long)]
    pub full_description: Option<String>,

    /// Promo video URL
    #[clap(long)]
    pub video: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Locale (e.g. en-US)
    #[clap(long)]
    pub locale: Option<String>,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteAllOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

pub async fn run(ctx: &AppContext, command: ListingsCommand) -> Res<()> {
    match command {
        ListingsCommand::List(args) => {
            let session = ctx.session(&args.package).await?;
            let listings = session
                .client
                .list_listings(&session.package, &args.edit)
                .await?;
            ctx.print(&listings)
        }
        ListingsCommand::Get(opts) => {
            let locale = utils::require(opts.locale.as_deref(), "--locale")?;
            let session = ctx.session(&opts.edit.package).await?;
            let listing = session
                .client
                .get_listing(&session.package, &opts.edit.edit, locale)
                .await?;
            ctx.print(&listing)
        }
        ListingsCommand::Update(opts) => write(ctx, opts, Method::PUT).await,
        ListingsCommand::Patch(opts) => write(ctx, opts, Method::PATCH).await,
        ListingsCommand::Delete(opts) => {
            let locale = utils::require(opts.locale.as_deref(), "--locale")?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.edit.package).await?;
            session
                .client
                .delete_listing(&session.package, &opts.edit.edit, locale)
                .await?;
            ctx.print(&json!({ "deleted": true, "locale": locale }))
        }
        ListingsCommand::DeleteAll(opts) => {
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.edit.package).await?;
            session
                .client
                .delete_all_listings(&session.package, &opts.edit.edit)
                .await?;
            ctx.print(&json!({ "deleted": true }))
        }
    }
}

async fn write(ctx: &AppContext, opts: WriteListingOpts, method: Method) -> Res<()> {
    let locale = utils::require(opts.locale.as_deref(), "--locale")?;
    let listing = Listing {
        language: locale.to_string(),
        title: opts.title.unwrap_or_default(),
        short_description: opts.short_description.unwrap_or_default(),
        full_description: opts.full_description.unwrap_or_default(),
        video: opts.video.unwrap_or_default(),
    };

    let session = ctx.session(&opts.edit.package).await?;
    let result = session
        .client
        .write_listing(
            method,
            &session.package,
            &opts.edit.edit,
            locale,
            serde_json::to_value(&listing)?,
        )
        .await?;
    ctx.print(&result)
}
