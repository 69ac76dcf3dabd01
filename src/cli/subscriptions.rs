use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg},
    error::ResultExt,
    play::monetization::DEFAULT_REGIONS_VERSION,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum SubscriptionsCommand {
    /// List subscription products
    List(ListOpts),

    /// Get a subscription product
    Get(ProductOpts),

    /// Create a subscription product
    Create(CreateOpts),

    /// Update a subscription product
    Update(UpdateOpts),

    /// Delete a subscription product
    Delete(DeleteOpts),

    /// Archive a subscription product
    Archive(ProductOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Page size
    #[clap(long, default_value_t = 100)]
    pub page_size: u32,

    /// Include archived subscriptions
    #[clap(long)]
    pub show_archived: bool,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ProductOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Subscription product ID
    #[clap(long)]
    pub product_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CreateOpts {
    #[command(flatten)]
    pub product: ProductOpts,

    /// Subscription JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,

    /// Regions version used for price conversion
    #[clap(long, default_value = DEFAULT_REGIONS_VERSION)]
    pub regions_version: String,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateOpts {
    #[command(flatten)]
    pub product: ProductOpts,

    /// Subscription JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,

    /// Fields to update, comma-separated (defaults to the top-level JSON fields)
    #[clap(long)]
    pub update_mask: Option<String>,

    /// Regions version used for price conversion
    #[clap(long, default_value = DEFAULT_REGIONS_VERSION)]
    pub regions_version: String,

    /// Create the subscription if it does not exist
    #[clap(long)]
    pub allow_missing: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub product: ProductOpts,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

/// Builds an update mask from the top-level fields of a subscription body.
///
/// Identity fields are skipped since they are taken from the flags.
pub fn derive_update_mask(subscription: &Value) -> Option<String> {
    let fields: Vec<&str> = subscription
        .as_object()?
        .keys()
        .map(String::as_str)
        .filter(|k| *k != "packageName" && *k != "productId")
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields.join(","))
    }
}

async fn subscription_json(json: Option<&str>) -> Res<Value> {
    let json = utils::require(json, "--json")?;
    utils::load_json_arg(json).await.context("invalid JSON")
}

pub async fn run(ctx: &AppContext, command: SubscriptionsCommand) -> Res<()> {
    match command {
        SubscriptionsCommand::List(opts) => {
            let session = ctx.session(&opts.package).await?;
            let subscriptions = if opts.paginate {
                session
                    .client
                    .list_all_subscriptions(&session.package, Some(opts.page_size), opts.show_archived)
                    .await?
            } else {
                session
                    .client
                    .list_subscriptions(
                        &session.package,
                        Some(opts.page_size),
                        opts.show_archived,
                        None,
                    )
                    .await?
            };
            ctx.print(&subscriptions)
        }
        SubscriptionsCommand::Get(opts) => {
            let product_id = utils::require(opts.product_id.as_deref(), "--product-id")?;
            let session = ctx.session(&opts.package).await?;
            let subscription = session
                .client
                .get_subscription(&session.package, product_id)
                .await?;
            ctx.print(&subscription)
        }
        SubscriptionsCommand::Create(opts) => {
            let subscription = subscription_json(opts.json.as_deref()).await?;
            let product_id = opts
                .product
                .product_id
                .clone()
                .or_else(|| {
                    subscription
                        .get("productId")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| Error::usage("--product-id is required"))?;

            let session = ctx.session(&opts.product.package).await?;
            let result = session
                .client
                .create_subscription(
                    &session.package,
                    &product_id,
                    subscription,
                    &opts.regions_version,
                )
                .await?;
            success!("Subscription {} created", product_id);
            ctx.print(&result)
        }
        SubscriptionsCommand::Update(opts) => {
            let product_id = utils::require(opts.product.product_id.as_deref(), "--product-id")?;
            let subscription = subscription_json(opts.json.as_deref()).await?;
            let update_mask = match opts.update_mask.as_deref().map(str::trim) {
                Some(mask) if !mask.is_empty() => mask.to_string(),
                _ => derive_update_mask(&subscription)
                    .ok_or_else(|| Error::usage("--update-mask is required"))?,
            };

            let session = ctx.session(&opts.product.package).await?;
            let result = session
                .client
                .update_subscription(
                    &session.package,
                    product_id,
                    subscription,
                    &update_mask,
                    &opts.regions_version,
                    opts.allow_missing,
                )
                .await?;
            ctx.print(&result)
        }
        SubscriptionsCommand::Delete(opts) => {
            let product_id = utils::require(opts.product.product_id.as_deref(), "--product-id")?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.product.package).await?;
            session
                .client
                .delete_subscription(&session.package, product_id)
                .await?;
            ctx.print(&json!({ "deleted": true, "productId": product_id }))
        }
        SubscriptionsCommand::Archive(opts) => {
            let product_id = utils::require(opts.product_id.as_deref(), "--product-id")?;
            let session = ctx.session(&opts.package).await?;
            let result = session
                .client
                .archive_subscription(&session.package, product_id)
                .await?;
            success!("Subscription {} archived", product_id);
            ctx.print(&result)
        }
    }
}
