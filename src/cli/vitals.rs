use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    Error, Res,
    cli::{AppContext, PackageArg},
    play::reporting::{VitalsMetric, VitalsQuery},
    utils,
};

/// Default query window, counted in days and ending with `--to`.
const DEFAULT_WINDOW_DAYS: u64 = 30;

#[derive(Subcommand, Debug, Clone)]
pub enum VitalsCommand {
    /// Crash and ANR rate metrics
    #[command(subcommand)]
    Crashes(CrashesCommand),

    /// Anomalies detected in vitals metrics
    #[command(subcommand)]
    Anomalies(AnomaliesCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CrashesCommand {
    /// Query daily crash or ANR rates
    Query(QueryOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnomaliesCommand {
    /// List anomalies
    List(AnomaliesOpts),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Crash,
    Anr,
}

impl From<MetricType> for VitalsMetric {
    fn from(value: MetricType) -> Self {
        match value {
            MetricType::Crash => VitalsMetric::Crash,
            MetricType::Anr => VitalsMetric::Anr,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct QueryOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Start date (YYYY-MM-DD); defaults to 29 days before --to
    #[clap(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD); defaults to yesterday
    #[clap(long)]
    pub to: Option<String>,

    /// Dimension to group by (versionCode, deviceModel, ...); can be repeated
    #[clap(long)]
    pub dimension: Vec<String>,

    /// Metric type
    #[clap(long = "type", value_enum, default_value = "crash")]
    pub metric: MetricType,

    /// Rows per page
    #[clap(long)]
    pub page_size: Option<u32>,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AnomaliesOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Filter expression (e.g. activeBetween("2025-01-01T00:00:00Z", UNBOUNDED))
    #[clap(long)]
    pub filter: Option<String>,

    /// Anomalies per page
    #[clap(long)]
    pub page_size: Option<u32>,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

/// Resolves the reporting window. `today` is injected so callers can test it.
pub fn date_range(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> Res<(NaiveDate, NaiveDate)> {
    let to = match to {
        Some(to) => utils::parse_date(to)?,
        None => today - Days::new(1),
    };
    let from = match from {
        Some(from) => utils::parse_date(from)?,
        None => to - Days::new(DEFAULT_WINDOW_DAYS - 1),
    };
    if from > to {
        return Err(Error::usage("--from must not be after --to"));
    }
    Ok((from, to))
}

pub async fn run(ctx: &AppContext, command: VitalsCommand) -> Res<()> {
    match command {
        VitalsCommand::Crashes(CrashesCommand::Query(opts)) => {
            let (from, to) = date_range(
                opts.from.as_deref(),
                opts.to.as_deref(),
                Utc::now().date_naive(),
            )?;
            let query = VitalsQuery {
                metric: opts.metric.into(),
                from,
                to,
                dimensions: opts
                    .dimension
                    .iter()
                    .flat_map(|d| utils::split_csv(d))
                    .collect(),
                page_size: opts.page_size,
            };

            let session = ctx.session(&opts.package).await?;
            let rows = if opts.paginate {
                session.client.query_all_vitals(&session.package, &query).await?
            } else {
                session
                    .client
                    .query_vitals(&session.package, &query, None)
                    .await?
            };
            ctx.print(&rows)
        }
        VitalsCommand::Anomalies(AnomaliesCommand::List(opts)) => {
            let session = ctx.session(&opts.package).await?;
            let filter = opts.filter.as_deref();
            let anomalies = if opts.paginate {
                session
                    .client
                    .list_all_anomalies(&session.package, filter, opts.page_size)
                    .await?
            } else {
                session
                    .client
                    .list_anomalies(&session.package, filter, opts.page_size, None)
                    .await?
            };
            ctx.print(&anomalies)
        }
    }
}
