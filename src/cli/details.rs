use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;

use crate::{
    Res,
    cli::{AppContext, EditArgs},
    error::ResultExt,
    types::AppDetails,
    utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum DetailsCommand {
    /// Get the app contact details
    Get(EditArgs),

    /// Replace the app contact details
    Update(WriteDetailsOpts),

    /// Patch the app contact details
    Patch(WriteDetailsOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct WriteDetailsOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Contact email address
    #[clap(long)]
    pub contact_email: Option<String>,

    /// Contact phone number
    #[clap(long)]
    pub contact_phone: Option<String>,

    /// Contact website URL
    #[clap(long)]
    pub contact_website: Option<String>,

    /// Default language (BCP-47 code)
    #[clap(long)]
    pub default_language: Option<String>,

    /// AppDetails JSON (or @file); overrides the other flags
    #[clap(long)]
    pub json: Option<String>,
}

impl WriteDetailsOpts {
    async fn body(&self) -> Res<Value> {
        if let Some(json) = self.json.as_deref().filter(|j| !j.trim().is_empty()) {
            return utils::load_json_arg(json).await.context("invalid JSON");
        }

        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let details = AppDetails {
            contact_email: field(&self.contact_email),
            contact_phone: field(&self.contact_phone),
            contact_website: field(&self.contact_website),
            default_language: field(&self.default_language),
        };
        Ok(serde_json::to_value(details)?)
    }
}

pub async fn run(ctx: &AppContext, command: DetailsCommand) -> Res<()> {
    match command {
        DetailsCommand::Get(args) => {
            let session = ctx.session(&args.package).await?;
            let details = session
                .client
                .get_details(&session.package, &args.edit)
                .await?;
            ctx.print(&details)
        }
        DetailsCommand::Update(opts) => write(ctx, opts, Method::PUT).await,
        DetailsCommand::Patch(opts) => write(ctx, opts, Method::PATCH).await,
    }
}

async fn write(ctx: &AppContext, opts: WriteDetailsOpts, method: Method) -> Res<()> {
    let body = opts.body().await?;
    let session = ctx.session(&opts.edit.package).await?;
    let result = session
        .client
        .write_details(method, &session.package, &opts.edit.edit, body)
        .await?;
    ctx.print(&result)
}
