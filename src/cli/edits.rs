use clap::{Parser, Subcommand};
use serde_json::json;

use crate::{
    Res,
    cli::{AppContext, EditArgs, PackageArg},
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum EditsCommand {
    /// Create a new edit
    Create(PackageArg),

    /// Get an edit
    Get(EditArgs),

    /// Validate an edit without committing it
    Validate(EditArgs),

    /// Commit an edit
    Commit(CommitOpts),

    /// Delete an edit
    Delete(DeleteOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct CommitOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Do not send the changes for review
    #[clap(long)]
    pub changes_not_sent_for_review: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

pub async fn run(ctx: &AppContext, command: EditsCommand) -> Res<()> {
    match command {
        EditsCommand::Create(package) => {
            let session = ctx.session(&package).await?;
            let edit = session.client.insert_edit(&session.package).await?;
            success!("Edit created: {}", edit.id);
            ctx.print(&edit)
        }
        EditsCommand::Get(args) => {
            let session = ctx.session(&args.package).await?;
            let edit = session.client.get_edit(&session.package, &args.edit).await?;
            ctx.print(&edit)
        }
        EditsCommand::Validate(args) => {
            let session = ctx.session(&args.package).await?;
            let result = session
                .client
                .validate_edit(&session.package, &args.edit)
                .await?;
            ctx.print(&result)
        }
        EditsCommand::Commit(opts) => {
            let session = ctx.session(&opts.edit.package).await?;
            let result = session
                .client
                .commit_edit(
                    &session.package,
                    &opts.edit.edit,
                    opts.changes_not_sent_for_review,
                )
                .await?;
            success!("Edit {} committed", opts.edit.edit);
            ctx.print(&result)
        }
        EditsCommand::Delete(opts) => {
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.edit.package).await?;
            session
                .client
                .delete_edit(&session.package, &opts.edit.edit)
                .await?;
            ctx.print(&json!({ "deleted": true, "editId": opts.edit.edit }))
        }
    }
}
