//! Bundle, APK and deobfuscation-file commands.
//!
//! Uploads read the whole artifact into memory, then send it as a single
//! media upload under the upload timeout while a spinner runs on stderr.

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::{
    Error, Res,
    cli::{AppContext, EditArgs, read_artifact, spinner},
    error::ResultExt,
    success, utils,
};

pub const DEOBFUSCATION_TYPES: &[&str] = &["proguard", "nativeCode"];

#[derive(Subcommand, Debug, Clone)]
pub enum BundlesCommand {
    /// Upload an Android App Bundle (.aab)
    Upload(UploadOpts),

    /// List the bundles of an edit
    List(EditArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ApksCommand {
    /// Upload an APK
    Upload(UploadOpts),

    /// List the APKs of an edit
    List(EditArgs),

    /// Register an externally hosted APK
    #[clap(name = "addexternallyhosted")]
    AddExternallyHosted(ExternallyHostedOpts),
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeobfuscationCommand {
    /// Upload a ProGuard mapping or native debug symbols file
    Upload(DeobfuscationOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct UploadOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Path to the artifact
    #[clap(long)]
    pub file: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ExternallyHostedOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// ExternallyHostedApk JSON (or @file)
    #[clap(long)]
    pub json: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeobfuscationOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Version code of the APK or bundle the file belongs to
    #[clap(long)]
    pub apk_version: Option<String>,

    /// Deobfuscation file type: proguard or nativeCode
    #[clap(long = "type", default_value = "proguard")]
    pub file_type: String,

    /// Path to the mapping file (e.g. mapping.txt)
    #[clap(long)]
    pub file: Option<String>,
}

pub async fn run_bundles(ctx: &AppContext, command: BundlesCommand) -> Res<()> {
    match command {
        BundlesCommand::Upload(opts) => {
            let file = utils::require(opts.file.as_deref(), "--file")?;
            let data = read_artifact(file).await?;
            let session = ctx.session(&opts.edit.package).await?;

            let pb = spinner(&format!("Uploading bundle {file} ({} bytes)...", data.len()));
            let result = session
                .client
                .upload_bundle(&session.package, &opts.edit.edit, data)
                .await;
            pb.finish_and_clear();
            let result = result.context("failed to upload bundle")?;
            announce("Bundle", &result);
            ctx.print(&result)
        }
        BundlesCommand::List(args) => {
            let session = ctx.session(&args.package).await?;
            let bundles = session
                .client
                .list_bundles(&session.package, &args.edit)
                .await?;
            ctx.print(&bundles)
        }
    }
}

pub async fn run_apks(ctx: &AppContext, command: ApksCommand) -> Res<()> {
    match command {
        ApksCommand::Upload(opts) => {
            let file = utils::require(opts.file.as_deref(), "--file")?;
            let data = read_artifact(file).await?;
            let session = ctx.session(&opts.edit.package).await?;

            let pb = spinner(&format!("Uploading APK {file} ({} bytes)...", data.len()));
            let result = session
                .client
                .upload_apk(&session.package, &opts.edit.edit, data)
                .await;
            pb.finish_and_clear();
            let result = result.context("failed to upload APK")?;
            announce("APK", &result);
            ctx.print(&result)
        }
        ApksCommand::List(args) => {
            let session = ctx.session(&args.package).await?;
            let apks = session.client.list_apks(&session.package, &args.edit).await?;
            ctx.print(&apks)
        }
        ApksCommand::AddExternallyHosted(opts) => {
            let json = utils::require(opts.json.as_deref(), "--json")?;
            let apk: Value = utils::load_json_arg(json).await.context("invalid JSON")?;
            let session = ctx.session(&opts.edit.package).await?;
            let result = session
                .client
                .add_externally_hosted_apk(&session.package, &opts.edit.edit, apk)
                .await?;
            ctx.print(&result)
        }
    }
}

pub async fn run_deobfuscation(ctx: &AppContext, command: DeobfuscationCommand) -> Res<()> {
    match command {
        DeobfuscationCommand::Upload(opts) => {
            let version = utils::require(opts.apk_version.as_deref(), "--apk-version")?;
            let version_code: i64 = version.parse().map_err(|_| {
                Error::usage(format!("--apk-version must be an integer, got {version:?}"))
            })?;
            if !DEOBFUSCATION_TYPES.contains(&opts.file_type.as_str()) {
                return Err(Error::usage("--type must be proguard or nativeCode"));
            }
            let file = utils::require(opts.file.as_deref(), "--file")?;
            let data = read_artifact(file).await?;
            let session = ctx.session(&opts.edit.package).await?;

            let pb = spinner(&format!("Uploading {} file {file}...", opts.file_type));
            let result = session
                .client
                .upload_deobfuscation_file(
                    &session.package,
                    &opts.edit.edit,
                    version_code,
                    &opts.file_type,
                    data,
                )
                .await;
            pb.finish_and_clear();
            let result = result.context("failed to upload deobfuscation file")?;
            success!("Deobfuscation file uploaded for version {}", version_code);
            ctx.print(&result)
        }
    }
}

fn announce(kind: &str, result: &Value) {
    match result.get("versionCode") {
        Some(code) => success!("{} uploaded with version code {}", kind, code),
        None => success!("{} uploaded", kind),
    }
}
