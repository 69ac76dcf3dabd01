use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use crate::{
    Res,
    cli::{AppContext, PackageArg},
    error::ResultExt,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum BasePlansCommand {
    /// Activate a base plan
    Activate(BasePlanOpts),

    /// Deactivate a base plan (stops new subscriptions)
    Deactivate(BasePlanOpts),

    /// Delete a base plan that never had subscribers
    Delete(DeleteOpts),

    /// Move existing subscribers to the current base plan prices
    MigratePrices(MigrateOpts),

    /// Activate or deactivate several base plans at once
    BatchUpdateStates(BatchOpts),

    /// Migrate prices of several base plans at once
    BatchMigratePrices(BatchOpts),
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
pub struct BasePlanOpts {
    #[command(flatten)]
    pub product: ProductOpts,

    /// Base plan ID
    #[clap(long)]
    pub base_plan_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub base_plan: BasePlanOpts,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct MigrateOpts {
    #[command(flatten)]
    pub base_plan: BasePlanOpts,

    /// Migration request JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchOpts {
    #[command(flatten)]
    pub product: ProductOpts,

    /// Batch request JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,
}

impl BasePlanOpts {
    fn resolve(&self) -> Res<(&str, &str)> {
        let product_id = utils::require(self.product.product_id.as_deref(), "--product-id")?;
        let base_plan_id = utils::require(self.base_plan_id.as_deref(), "--base-plan-id")?;
        Ok((product_id, base_plan_id))
    }
}

async fn request_json(json: Option<&str>) -> Res<Value> {
    let json = utils::require(json, "--json")?;
    utils::load_json_arg(json).await.context("invalid JSON")
}

pub async fn run(ctx: &AppContext, command: BasePlansCommand) -> Res<()> {
    match command {
        BasePlansCommand::Activate(opts) => {
            let (product_id, base_plan_id) = opts.resolve()?;
            let session = ctx.session(&opts.product.package).await?;
            let result = session
                .client
                .activate_base_plan(&session.package, product_id, base_plan_id)
                .await?;
            success!("Base plan {} activated", base_plan_id);
            ctx.print(&result)
        }
        BasePlansCommand::Deactivate(opts) => {
            let (product_id, base_plan_id) = opts.resolve()?;
            let session = ctx.session(&opts.product.package).await?;
            let result = session
                .client
                .deactivate_base_plan(&session.package, product_id, base_plan_id)
                .await?;
            success!("Base plan {} deactivated", base_plan_id);
            ctx.print(&result)
        }
        BasePlansCommand::Delete(opts) => {
            let (product_id, base_plan_id) = opts.base_plan.resolve()?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.base_plan.product.package).await?;
            session
                .client
                .delete_base_plan(&session.package, product_id, base_plan_id)
                .await?;
            ctx.print(&json!({
                "deleted": true,
                "productId": product_id,
                "basePlanId": base_plan_id,
            }))
        }
        BasePlansCommand::MigratePrices(opts) => {
            let (product_id, base_plan_id) = opts.base_plan.resolve()?;
            let request = request_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.base_plan.product.package).await?;
            let result = session
                .client
                .migrate_base_plan_prices(&session.package, product_id, base_plan_id, request)
                .await?;
            ctx.print(&result)
        }
        BasePlansCommand::BatchUpdateStates(opts) => {
            let product_id = utils::require(opts.product.product_id.as_deref(), "--product-id")?;
            let request = request_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.product.package).await?;
            let result = session
                .client
                .batch_update_base_plan_states(&session.package, product_id, request)
                .await?;
            ctx.print(&result)
        }
        BasePlansCommand::BatchMigratePrices(opts) => {
            let product_id = utils::require(opts.product.product_id.as_deref(), "--product-id")?;
            let request = request_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.product.package).await?;
            let result = session
                .client
                .batch_migrate_base_plan_prices(&session.package, product_id, request)
                .await?;
            ctx.print(&result)
        }
    }
}
