use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg},
    error::ResultExt,
    play::purchases::VoidedQuery,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum PurchasesCommand {
    /// One-time product purchases
    #[command(subcommand)]
    Products(ProductsCommand),

    /// One-time product purchases (v2 API)
    #[command(subcommand)]
    Productsv2(ProductsV2Command),

    /// Subscription purchases
    #[command(subcommand)]
    Subscriptions(SubscriptionPurchasesCommand),

    /// Voided purchases
    #[command(subcommand)]
    Voided(VoidedCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductsCommand {
    /// Get a product purchase
    Get(ProductTokenOpts),

    /// Acknowledge a product purchase
    Acknowledge(AcknowledgeOpts),

    /// Consume a product purchase
    Consume(ProductTokenOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductsV2Command {
    /// Get a product purchase by token
    Get(TokenOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubscriptionPurchasesCommand {
    /// Get a subscription purchase by token
    Get(TokenOpts),

    /// Cancel a subscription purchase
    Cancel(ConfirmSubscriptionOpts),

    /// Defer the next billing date of a subscription purchase
    Defer(DeferOpts),

    /// Revoke a subscription purchase and refund it
    Revoke(ConfirmSubscriptionOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum VoidedCommand {
    /// List voided purchases
    List(VoidedOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum OrdersCommand {
    /// Get an order
    Get(OrderOpts),

    /// Get several orders at once
    BatchGet(OrderIdsOpts),

    /// Refund an order
    Refund(RefundOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct TokenOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Purchase token
    #[clap(long)]
    pub token: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ProductTokenOpts {
    #[command(flatten)]
    pub token: TokenOpts,

    /// Product ID (SKU)
    #[clap(long)]
    pub product_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AcknowledgeOpts {
    #[command(flatten)]
    pub product: ProductTokenOpts,

    /// Optional developer payload
    #[clap(long)]
    pub developer_payload: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SubscriptionTokenOpts {
    #[command(flatten)]
    pub token: TokenOpts,

    /// Subscription ID
    #[clap(long)]
    pub subscription_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfirmSubscriptionOpts {
    #[command(flatten)]
    pub subscription: SubscriptionTokenOpts,

    /// Confirm the operation
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeferOpts {
    #[command(flatten)]
    pub subscription: SubscriptionTokenOpts,

    /// SubscriptionPurchasesDeferRequest JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct VoidedOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Start time in milliseconds since epoch
    #[clap(long)]
    pub start_time: Option<i64>,

    /// End time in milliseconds since epoch
    #[clap(long)]
    pub end_time: Option<i64>,

    /// Maximum results per page
    #[clap(long, default_value_t = 100)]
    pub max_results: u32,

    /// Voided source: 0 = all, 1 = refund, 2 = chargeback
    #[clap(long = "type", value_parser = clap::value_parser!(u8).range(0..=2))]
    pub voided_type: Option<u8>,

    /// Include quantity-based partial refunds
    #[clap(long)]
    pub include_quantity: bool,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct OrderOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Order ID (e.g. GPA.1234-5678-9012-34567)
    #[clap(long)]
    pub order_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct OrderIdsOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Comma-separated list of order IDs
    #[clap(long)]
    pub order_ids: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct RefundOpts {
    #[command(flatten)]
    pub order: OrderOpts,

    /// Revoke the entitlement (the user loses access)
    #[clap(long)]
    pub revoke: bool,

    /// Confirm the refund
    #[clap(long)]
    pub confirm: bool,
}

impl ProductTokenOpts {
    fn resolve(&self) -> Res<(&str, &str)> {
        let product_id = utils::require(self.product_id.as_deref(), "--product-id")?;
        let token = utils::require(self.token.token.as_deref(), "--token")?;
        Ok((product_id, token))
    }
}

impl SubscriptionTokenOpts {
    fn resolve(&self) -> Res<(&str, &str)> {
        let subscription_id = utils::require(self.subscription_id.as_deref(), "--subscription-id")?;
        let token = utils::require(self.token.token.as_deref(), "--token")?;
        Ok((subscription_id, token))
    }
}

pub async fn run(ctx: &AppContext, command: PurchasesCommand) -> Res<()> {
    match command {
        PurchasesCommand::Products(command) => run_products(ctx, command).await,
        PurchasesCommand::Productsv2(ProductsV2Command::Get(opts)) => {
            let token = utils::require(opts.token.as_deref(), "--token")?;
            let session = ctx.session(&opts.package).await?;
            let purchase = session
                .client
                .get_product_purchase_v2(&session.package, token)
                .await?;
            ctx.print(&purchase)
        }
        PurchasesCommand::Subscriptions(command) => run_subscriptions(ctx, command).await,
        PurchasesCommand::Voided(VoidedCommand::List(opts)) => {
            let session = ctx.session(&opts.package).await?;
            let query = VoidedQuery {
                max_results: Some(opts.max_results),
                start_time: opts.start_time,
                end_time: opts.end_time,
                voided_type: opts.voided_type,
                include_quantity_based_partial_refund: opts.include_quantity,
            };
            let voided = if opts.paginate {
                session
                    .client
                    .list_all_voided_purchases(&session.package, &query)
                    .await?
            } else {
                session
                    .client
                    .list_voided_purchases(&session.package, &query, None)
                    .await?
            };
            ctx.print(&voided)
        }
    }
}

async fn run_products(ctx: &AppContext, command: ProductsCommand) -> Res<()> {
    match command {
        ProductsCommand::Get(opts) => {
            let (product_id, token) = opts.resolve()?;
            let session = ctx.session(&opts.token.package).await?;
            let purchase = session
                .client
                .get_product_purchase(&session.package, product_id, token)
                .await?;
            ctx.print(&purchase)
        }
        ProductsCommand::Acknowledge(opts) => {
            let (product_id, token) = opts.product.resolve()?;
            let session = ctx.session(&opts.product.token.package).await?;
            session
                .client
                .acknowledge_product_purchase(
                    &session.package,
                    product_id,
                    token,
                    opts.developer_payload.as_deref(),
                )
                .await?;
            success!("Purchase acknowledged");
            ctx.print(&json!({ "acknowledged": true, "productId": product_id }))
        }
        ProductsCommand::Consume(opts) => {
            let (product_id, token) = opts.resolve()?;
            let session = ctx.session(&opts.token.package).await?;
            session
                .client
                .consume_product_purchase(&session.package, product_id, token)
                .await?;
            ctx.print(&json!({ "consumed": true, "productId": product_id }))
        }
    }
}

async fn run_subscriptions(ctx: &AppContext, command: SubscriptionPurchasesCommand) -> Res<()> {
    match command {
        SubscriptionPurchasesCommand::Get(opts) => {
            let token = utils::require(opts.token.as_deref(), "--token")?;
            let session = ctx.session(&opts.package).await?;
            let purchase = session
                .client
                .get_subscription_purchase(&session.package, token)
                .await?;
            ctx.print(&purchase)
        }
        SubscriptionPurchasesCommand::Cancel(opts) => {
            let (subscription_id, token) = opts.subscription.resolve()?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.subscription.token.package).await?;
            session
                .client
                .cancel_subscription_purchase(&session.package, subscription_id, token)
                .await?;
            ctx.print(&json!({ "cancelled": true, "subscriptionId": subscription_id }))
        }
        SubscriptionPurchasesCommand::Defer(opts) => {
            let (subscription_id, token) = opts.subscription.resolve()?;
            let json = utils::require(opts.json.as_deref(), "--json")?;
            let request: Value = utils::load_json_arg(json).await.context("invalid JSON")?;
            let session = ctx.session(&opts.subscription.token.package).await?;
            let result = session
                .client
                .defer_subscription_purchase(&session.package, subscription_id, token, request)
                .await?;
            ctx.print(&result)
        }
        SubscriptionPurchasesCommand::Revoke(opts) => {
            let (subscription_id, token) = opts.subscription.resolve()?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.subscription.token.package).await?;
            session
                .client
                .revoke_subscription_purchase(&session.package, subscription_id, token)
                .await?;
            ctx.print(&json!({ "revoked": true, "subscriptionId": subscription_id }))
        }
    }
}

pub async fn run_orders(ctx: &AppContext, command: OrdersCommand) -> Res<()> {
    match command {
        OrdersCommand::Get(opts) => {
            let order_id = utils::require(opts.order_id.as_deref(), "--order-id")?;
            let session = ctx.session(&opts.package).await?;
            let order = session.client.get_order(&session.package, order_id).await?;
            ctx.print(&order)
        }
        OrdersCommand::BatchGet(opts) => {
            let order_ids = utils::split_csv(utils::require(opts.order_ids.as_deref(), "--order-ids")?);
            if order_ids.is_empty() {
                return Err(Error::usage("--order-ids is required"));
            }
            let session = ctx.session(&opts.package).await?;
            let orders = session
                .client
                .batch_get_orders(&session.package, &order_ids)
                .await?;
            ctx.print(&orders)
        }
        OrdersCommand::Refund(opts) => {
            let order_id = utils::require(opts.order.order_id.as_deref(), "--order-id")?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.order.package).await?;
            session
                .client
                .refund_order(&session.package, order_id, opts.revoke)
                .await?;
            success!("Order {} refunded", order_id);
            ctx.print(&json!({
                "refunded": true,
                "orderId": order_id,
                "revoked": opts.revoke,
            }))
        }
    }
}
