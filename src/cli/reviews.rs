use clap::{Parser, Subcommand};

use crate::{
    Res,
    cli::{AppContext, PackageArg},
    play::reviews::ReviewQuery,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum ReviewsCommand {
    /// List recent user reviews
    List(ListOpts),

    /// Get a single review
    Get(GetOpts),

    /// Reply to a review
    Reply(ReplyOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct ListOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Maximum results per page
    #[clap(long, default_value_t = 50)]
    pub max_results: u32,

    /// Start index
    #[clap(long)]
    pub start_index: Option<u32>,

    /// Translate review text into this language (e.g. en-US)
    #[clap(long)]
    pub translation_language: Option<String>,

    /// Fetch all pages
    #[clap(long)]
    pub paginate: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct GetOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Review ID
    #[clap(long)]
    pub review: Option<String>,

    /// Translate review text into this language (e.g. en-US)
    #[clap(long)]
    pub translation_language: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ReplyOpts {
    #[command(flatten)]
    pub package: PackageArg,

    /// Review ID
    #[clap(long)]
    pub review: Option<String>,

    /// Reply text
    #[clap(long)]
    pub text: Option<String>,
}

pub async fn run(ctx: &AppContext, command: ReviewsCommand) -> Res<()> {
    match command {
        ReviewsCommand::List(opts) => {
            let session = ctx.session(&opts.package).await?;
            let query = ReviewQuery {
                max_results: Some(opts.max_results),
                start_index: opts.start_index,
                translation_language: opts.translation_language,
                token: None,
            };
            let reviews = if opts.paginate {
                session.client.list_all_reviews(&session.package, &query).await?
            } else {
                session.client.list_reviews(&session.package, &query).await?
            };
            ctx.print(&reviews)
        }
        ReviewsCommand::Get(opts) => {
            let review = utils::require(opts.review.as_deref(), "--review")?;
            let session = ctx.session(&opts.package).await?;
            let result = session
                .client
                .get_review(
                    &session.package,
                    review,
                    opts.translation_language.as_deref(),
                )
                .await?;
            ctx.print(&result)
        }
        ReviewsCommand::Reply(opts) => {
            let review = utils::require(opts.review.as_deref(), "--review")?;
            let text = utils::require(opts.text.as_deref(), "--text")?;
            let session = ctx.session(&opts.package).await?;
            let result = session
                .client
                .reply_review(&session.package, review, text)
                .await?;
            success!("Replied to review {}", review);
            ctx.print(&result)
        }
    }
}
