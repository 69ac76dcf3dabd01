use clap::{ArgAction, Parser, Subcommand};
use serde_json::{Value, json};

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg},
    error::ResultExt,
    play::monetization::PriceOptions,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum IapCommand {
    /// List in-app products
    List(ListOpts),

    /// Get an in-app product
    Get(SkuOpts),

    /// Create an in-app product
    Create(CreateOpts),

    /// Update an in-app product
    Update(UpdateOpts),

    /// Delete an in-app product
    Delete(DeleteOpts),

    /// Get several in-app products at once
    BatchGet(SkusOpts),

    /// Update several in-app products at once
    BatchUpdate(BatchUpdateOpts),

    /// Delete several in-app products at once
    BatchDelete(BatchDeleteOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Maximum number of results per page
    #[clap(long, default_value_t = 100)]
    pub max_results: u32,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SkuOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Product SKU
    #[clap(long)]
    pub sku: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PriceArgs {
    /// Auto-convert missing prices to local currencies
    #[clap(
        long = "auto-convert-prices",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub auto_convert_prices: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CreateOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// InAppProduct JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,

    #[command(flatten)]
    pub prices: PriceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Product SKU
    #[clap(long)]
    pub sku: Option<String>,

    /// InAppProduct JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,

    #[command(flatten)]
    pub prices: PriceArgs,

    /// Create the product if it does not exist
    #[clap(long)]
    pub allow_missing: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Product SKU
    #[clap(long)]
    pub sku: Option<String>,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SkusOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Comma-separated list of SKUs
    #[clap(long)]
    pub skus: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchUpdateOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// JSON array of InAppProducts (or @file)
    #[clap(long)]
    pub json: Option<String>,

    #[command(flatten)]
    pub prices: PriceArgs,

    /// Create products that do not exist
    #[clap(long)]
    pub allow_missing: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchDeleteOpts {
    #[command(flatten)]
    pub skus: SkusOpts,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

fn required_skus(skus: Option<&str>) -> Res<Vec<String>> {
    let skus = utils::split_csv(utils::require(skus, "--skus")?);
    if skus.is_empty() {
        return Err(Error::usage("--skus is required"));
    }
    Ok(skus)
}

async fn product_json(json: Option<&str>) -> Res<Value> {
    let json = utils::require(json, "--json")?;
    utils::load_json_arg(json).await.context("invalid JSON")
}

pub async fn run(ctx: &AppContext, command: IapCommand) -> Res<()> {
    match command {
        IapCommand::List(opts) => {
            let session = ctx.session(&opts.package).await?;
            let products = if opts.paginate {
                session
                    .client
                    .list_all_in_app_products(&session.package, Some(opts.max_results))
                    .await?
            } else {
                session
                    .client
                    .list_in_app_products(&session.package, Some(opts.max_results), None)
                    .await?
            };
            ctx.print(&products)
        }
        IapCommand::Get(opts) => {
            let sku = utils::require(opts.sku.as_deref(), "--sku")?;
            let session = ctx.session(&opts.package).await?;
            let product = session
                .client
                .get_in_app_product(&session.package, sku)
                .await?;
            ctx.print(&product)
        }
        IapCommand::Create(opts) => {
            let product = product_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.package).await?;
            let prices = PriceOptions {
                auto_convert_missing_prices: opts.prices.auto_convert_prices,
                allow_missing: false,
            };
            let result = session
                .client
                .insert_in_app_product(&session.package, product, prices)
                .await?;
            success!("In-app product created");
            ctx.print(&result)
        }
        IapCommand::Update(opts) => {
            let sku = utils::require(opts.sku.as_deref(), "--sku")?;
            let product = product_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.package).await?;
            let prices = PriceOptions {
                auto_convert_missing_prices: opts.prices.auto_convert_prices,
                allow_missing: opts.allow_missing,
            };
            let result = session
                .client
                .update_in_app_product(&session.package, sku, product, prices)
                .await?;
            ctx.print(&result)
        }
        IapCommand::Delete(opts) => {
            let sku = utils::require(opts.sku.as_deref(), "--sku")?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.package).await?;
            session
                .client
                .delete_in_app_product(&session.package, sku)
                .await?;
            ctx.print(&json!({ "deleted": true, "sku": sku }))
        }
        IapCommand::BatchGet(opts) => {
            let skus = required_skus(opts.skus.as_deref())?;
            let session = ctx.session(&opts.package).await?;
            let products = session
                .client
                .batch_get_in_app_products(&session.package, &skus)
                .await?;
            ctx.print(&products)
        }
        IapCommand::BatchUpdate(opts) => {
            let json = utils::require(opts.json.as_deref(), "--json")?;
            let products: Vec<Value> = utils::load_json_arg(json).await.context("invalid JSON")?;
            let session = ctx.session(&opts.package).await?;
            let prices = PriceOptions {
                auto_convert_missing_prices: opts.prices.auto_convert_prices,
                allow_missing: opts.allow_missing,
            };
            let result = session
                .client
                .batch_update_in_app_products(&session.package, products, prices)
                .await?;
            ctx.print(&result)
        }
        IapCommand::BatchDelete(opts) => {
            let skus = required_skus(opts.skus.skus.as_deref())?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.skus.package).await?;
            session
                .client
                .batch_delete_in_app_products(&session.package, &skus)
                .await?;
            ctx.print(&json!({ "deleted": true, "skus": skus }))
        }
    }
}
