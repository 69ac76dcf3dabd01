use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg, subscriptions::derive_update_mask},
    error::ResultExt,
    play::monetization::DEFAULT_REGIONS_VERSION,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum OffersCommand {
    /// List the offers of a base plan
    List(ListOpts),

    /// Get an offer
    Get(OfferOpts),

    /// Create an offer (free trial, introductory price, ...)
    Create(CreateOpts),

    /// Update an offer
    Update(UpdateOpts),

    /// Activate an offer
    Activate(OfferOpts),

    /// Deactivate an offer
    Deactivate(OfferOpts),

    /// Delete an offer
    Delete(DeleteOpts),

    /// Get several offers at once
    BatchGet(BatchGetOpts),

    /// Update several offers at once
    BatchUpdate(BatchOpts),

    /// Activate or deactivate several offers at once
    BatchUpdateStates(BatchOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct BasePlanOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Subscription product ID
    #[clap(long)]
    pub product_id: Option<String>,

    /// Base plan ID
    #[clap(long)]
    pub base_plan_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    #[command(flatten)]
    pub base_plan: BasePlanOpts,

    /// Page size
    #[clap(long, default_value_t = 100)]
    pub page_size: u32,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OfferOpts {
    #[command(flatten)]
    pub base_plan: BasePlanOpts,

    /// Offer ID
    #[clap(long)]
    pub offer_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CreateOpts {
    #[command(flatten)]
    pub offer: OfferOpts,

    /// SubscriptionOffer JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,

    /// Regions version used for price conversion
    #[clap(long, default_value = DEFAULT_REGIONS_VERSION)]
    pub regions_version: String,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateOpts {
    #[command(flatten)]
    pub offer: OfferOpts,

    /// SubscriptionOffer JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,

    /// Fields to update, comma-separated (defaults to the top-level JSON fields)
    #[clap(long)]
    pub update_mask: Option<String>,

    /// Regions version used for price conversion
    #[clap(long, default_value = DEFAULT_REGIONS_VERSION)]
    pub regions_version: String,

    /// Create the offer if it does not exist
    #[clap(long)]
    pub allow_missing: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub offer: OfferOpts,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchGetOpts {
    #[command(flatten)]
    pub base_plan: BasePlanOpts,

    /// Comma-separated offer IDs
    #[clap(long)]
    pub offer_ids: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchOpts {
    #[command(flatten)]
    pub base_plan: BasePlanOpts,

    /// Batch request JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,
}

impl BasePlanOpts {
    fn resolve(&self) -> Res<(&str, &str)> {
        let product_id = utils::require(self.product_id.as_deref(), "--product-id")?;
        let base_plan_id = utils::require(self.base_plan_id.as_deref(), "--base-plan-id")?;
        Ok((product_id, base_plan_id))
    }
}

impl OfferOpts {
    fn resolve(&self) -> Res<(&str, &str, &str)> {
        let (product_id, base_plan_id) = self.base_plan.resolve()?;
        let offer_id = utils::require(self.offer_id.as_deref(), "--offer-id")?;
        Ok((product_id, base_plan_id, offer_id))
    }
}

async fn request_json(json: Option<&str>) -> Res<Value> {
    let json = utils::require(json, "--json")?;
    utils::load_json_arg(json).await.context("invalid JSON")
}

/// Update mask for an offer body; the identity fields come from the flags.
pub fn offer_update_mask(offer: &Value) -> Option<String> {
    let mask = derive_update_mask(offer)?;
    let fields: Vec<&str> = mask
        .split(',')
        .filter(|f| *f != "basePlanId" && *f != "offerId")
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields.join(","))
    }
}

pub async fn run(ctx: &AppContext, command: OffersCommand) -> Res<()> {
    match command {
        OffersCommand::List(opts) => {
            let (product_id, base_plan_id) = opts.base_plan.resolve()?;
            let session = ctx.session(&opts.base_plan.package).await?;
            let offers = if opts.paginate {
                session
                    .client
                    .list_all_offers(
                        &session.package,
                        product_id,
                        base_plan_id,
                        Some(opts.page_size),
                    )
                    .await?
            } else {
                session
                    .client
                    .list_offers(
                        &session.package,
                        product_id,
                        base_plan_id,
                        Some(opts.page_size),
                        None,
                    )
                    .await?
            };
            ctx.print(&offers)
        }
        OffersCommand::Get(opts) => {
            let (product_id, base_plan_id, offer_id) = opts.resolve()?;
            let session = ctx.session(&opts.base_plan.package).await?;
            let offer = session
                .client
                .get_offer(&session.package, product_id, base_plan_id, offer_id)
                .await?;
            ctx.print(&offer)
        }
        OffersCommand::Create(opts) => {
            let (product_id, base_plan_id, offer_id) = opts.offer.resolve()?;
            let offer = request_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.offer.base_plan.package).await?;
            let result = session
                .client
                .create_offer(
                    &session.package,
                    product_id,
                    base_plan_id,
                    offer_id,
                    offer,
                    &opts.regions_version,
                )
                .await?;
            success!("Offer {} created", offer_id);
            ctx.print(&result)
        }
        OffersCommand::Update(opts) => {
            let (product_id, base_plan_id, offer_id) = opts.offer.resolve()?;
            let offer = request_json(opts.json.as_deref()).await?;
            let update_mask = match opts.update_mask.as_deref().map(str::trim) {
                Some(mask) if !mask.is_empty() => mask.to_string(),
                _ => offer_update_mask(&offer)
                    .ok_or_else(|| Error::usage("--update-mask is required"))?,
            };

            let session = ctx.session(&opts.offer.base_plan.package).await?;
            let result = session
                .client
                .update_offer(
                    &session.package,
                    product_id,
                    base_plan_id,
                    offer_id,
                    offer,
                    &update_mask,
                    &opts.regions_version,
                    opts.allow_missing,
                )
                .await?;
            ctx.print(&result)
        }
        OffersCommand::Activate(opts) => {
            let (product_id, base_plan_id, offer_id) = opts.resolve()?;
            let session = ctx.session(&opts.base_plan.package).await?;
            let result = session
                .client
                .activate_offer(&session.package, product_id, base_plan_id, offer_id)
                .await?;
            success!("Offer {} activated", offer_id);
            ctx.print(&result)
        }
        OffersCommand::Deactivate(opts) => {
            let (product_id, base_plan_id, offer_id) = opts.resolve()?;
            let session = ctx.session(&opts.base_plan.package).await?;
            let result = session
                .client
                .deactivate_offer(&session.package, product_id, base_plan_id, offer_id)
                .await?;
            success!("Offer {} deactivated", offer_id);
            ctx.print(&result)
        }
        OffersCommand::Delete(opts) => {
            let (product_id, base_plan_id, offer_id) = opts.offer.resolve()?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.offer.base_plan.package).await?;
            session
                .client
                .delete_offer(&session.package, product_id, base_plan_id, offer_id)
                .await?;
            ctx.print(&json!({
                "deleted": true,
                "productId": product_id,
                "basePlanId": base_plan_id,
                "offerId": offer_id,
            }))
        }
        OffersCommand::BatchGet(opts) => {
            let (product_id, base_plan_id) = opts.base_plan.resolve()?;
            let offer_ids =
                utils::split_csv(utils::require(opts.offer_ids.as_deref(), "--offer-ids")?);
            if offer_ids.is_empty() {
                return Err(Error::usage("--offer-ids is required"));
            }
            let session = ctx.session(&opts.base_plan.package).await?;
            let result = session
                .client
                .batch_get_offers(&session.package, product_id, base_plan_id, &offer_ids)
                .await?;
            ctx.print(&result)
        }
        OffersCommand::BatchUpdate(opts) => {
            let (product_id, base_plan_id) = opts.base_plan.resolve()?;
            let request = request_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.base_plan.package).await?;
            let result = session
                .client
                .batch_update_offers(&session.package, product_id, base_plan_id, request)
                .await?;
            ctx.print(&result)
        }
        OffersCommand::BatchUpdateStates(opts) => {
            let (product_id, base_plan_id) = opts.base_plan.resolve()?;
            let request = request_json(opts.json.as_deref()).await?;
            let session = ctx.session(&opts.base_plan.package).await?;
            let result = session
                .client
                .batch_update_offer_states(&session.package, product_id, base_plan_id, request)
                .await?;
            ctx.print(&result)
        }
    }
}
