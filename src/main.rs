use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use gplay::{
    Res,
    cli::{
        self, AppContext,
        artifacts::{ApksCommand, BundlesCommand, DeobfuscationCommand},
        auth::AuthCommand,
        baseplans::BasePlansCommand,
        details::DetailsCommand,
        edits::EditsCommand,
        iap::IapCommand,
        images::ImagesCommand,
        listings::ListingsCommand,
        offers::OffersCommand,
        purchases::{OrdersCommand, PurchasesCommand},
        release::ReleaseOpts,
        reviews::ReviewsCommand,
        rollout::{PromoteOpts, RolloutCommand},
        subscriptions::SubscriptionsCommand,
        testers::TestersCommand,
        tracks::{AvailabilityCommand, TracksCommand},
        vitals::VitalsCommand,
    },
    config, error,
    output::{OutputFormat, OutputOptions},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Output format (default: json, or GPLAY_DEFAULT_OUTPUT)
    #[clap(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[clap(long, global = true)]
    pretty: bool,

    /// Print write requests instead of sending them
    #[clap(long, global = true)]
    dry_run: bool,

    /// Log every API request to stderr
    #[clap(long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage authentication profiles
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Manage edits (create, validate, commit)
    #[command(subcommand)]
    Edits(EditsCommand),

    /// Manage track releases
    #[command(subcommand)]
    Tracks(TracksCommand),

    /// Show country availability of a track
    #[command(subcommand)]
    Availability(AvailabilityCommand),

    /// Manage store listings
    #[command(subcommand)]
    Listings(ListingsCommand),

    /// Manage store listing images
    #[command(subcommand)]
    Images(ImagesCommand),

    /// Manage app contact details
    #[command(subcommand)]
    Details(DetailsCommand),

    /// Manage tester groups
    #[command(subcommand)]
    Testers(TestersCommand),

    /// Upload and list app bundles
    #[command(subcommand)]
    Bundles(BundlesCommand),

    /// Upload and list APKs
    #[command(subcommand)]
    Apks(ApksCommand),

    /// Upload deobfuscation files
    #[command(subcommand)]
    Deobfuscation(DeobfuscationCommand),

    /// Upload a bundle or APK and release it to a track in one step
    Release(ReleaseOpts),

    /// Manage staged rollouts
    #[command(subcommand)]
    Rollout(RolloutCommand),

    /// Promote a release from one track to another
    Promote(PromoteOpts),

    /// Read and reply to user reviews
    #[command(subcommand)]
    Reviews(ReviewsCommand),

    /// Manage in-app products
    #[command(subcommand)]
    Iap(IapCommand),

    /// Manage subscription products
    #[command(subcommand)]
    Subscriptions(SubscriptionsCommand),

    /// Manage subscription base plans
    #[command(subcommand)]
    Baseplans(BasePlansCommand),

    /// Manage subscription offers
    #[command(subcommand)]
    Offers(OffersCommand),

    /// Look up and refund orders
    #[command(subcommand)]
    Orders(OrdersCommand),

    /// Verify and manage purchases
    #[command(subcommand)]
    Purchases(PurchasesCommand),

    /// Query Android vitals
    #[command(subcommand)]
    Vitals(VitalsCommand),

    /// Get shell completions
    Completions(CompletionsOption),

    /// Print the version
    Version,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn dispatch(ctx: &AppContext, command: Command) -> Res<()> {
    match command {
        Command::Auth(cmd) => cli::auth::run(ctx, cmd).await,
        Command::Edits(cmd) => cli::edits::run(ctx, cmd).await,
        Command::Tracks(cmd) => cli::tracks::run(ctx, cmd).await,
        Command::Availability(cmd) => cli::tracks::run_availability(ctx, cmd).await,
        Command::Listings(cmd) => cli::listings::run(ctx, cmd).await,
        Command::Images(cmd) => cli::images::run(ctx, cmd).await,
        Command::Details(cmd) => cli::details::run(ctx, cmd).await,
        Command::Testers(cmd) => cli::testers::run(ctx, cmd).await,
        Command::Bundles(cmd) => cli::artifacts::run_bundles(ctx, cmd).await,
        Command::Apks(cmd) => cli::artifacts::run_apks(ctx, cmd).await,
        Command::Deobfuscation(cmd) => cli::artifacts::run_deobfuscation(ctx, cmd).await,
        Command::Release(opts) => cli::release::run(ctx, opts).await,
        Command::Rollout(cmd) => cli::rollout::run(ctx, cmd).await,
        Command::Promote(opts) => cli::rollout::run_promote_command(ctx, opts).await,
        Command::Reviews(cmd) => cli::reviews::run(ctx, cmd).await,
        Command::Iap(cmd) => cli::iap::run(ctx, cmd).await,
        Command::Subscriptions(cmd) => cli::subscriptions::run(ctx, cmd).await,
        Command::Baseplans(cmd) => cli::baseplans::run(ctx, cmd).await,
        Command::Offers(cmd) => cli::offers::run(ctx, cmd).await,
        Command::Orders(cmd) => cli::purchases::run_orders(ctx, cmd).await,
        Command::Purchases(cmd) => cli::purchases::run(ctx, cmd).await,
        Command::Vitals(cmd) => cli::vitals::run(ctx, cmd).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        Command::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    config::load_env().await;

    let cli = Cli::parse();
    let env = config::Environment::from_process();

    let cfg = config::load_optional(&env).await.ok().flatten();
    gplay::set_debug(cli.debug || config::debug_enabled(cfg.as_ref(), &env));

    let output = match OutputOptions::resolve(cli.output, env.default_output(), cli.pretty) {
        Ok(output) => output,
        Err(e) => error!("{}", e.report()),
    };

    let ctx = AppContext::new(env, output, cli.dry_run);
    if let Err(e) = dispatch(&ctx, cli.command).await {
        error!("{}", e.report());
    }
}
