use std::path::Path;

use clap::{Parser, Subcommand};
use serde_json::json;

use crate::{
    Error, Res,
    cli::{AppContext, EditArgs, read_artifact, spinner},
    play::edits::IMAGE_TYPES,
    success, utils,
};

#[derive(Subcommand, Debug, Clone)]
pub enum ImagesCommand {
    /// List the images of one type for a locale
    List(ImageTypeOpts),

    /// Upload an image to a listing
    Upload(UploadOpts),

    /// Delete one image
    Delete(DeleteOpts),

    /// Delete every image of one type for a locale
    DeleteAll(DeleteAllOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct ImageTypeOpts {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Locale (e.g. en-US)
    #[clap(long)]
    pub locale: Option<String>,

    /// Image type (phoneScreenshots, featureGraphic, icon, ...)
    #[clap(long = "type")]
    pub image_type: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct UploadOpts {
    #[command(flatten)]
    pub target: ImageTypeOpts,

    /// Path to the image file (PNG or JPEG)
    #[clap(long)]
    pub file: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    #[command(flatten)]
    pub target: ImageTypeOpts,

    /// Image ID
    #[clap(long)]
    pub image: Option<String>,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteAllOpts {
    #[command(flatten)]
    pub target: ImageTypeOpts,

    /// Confirm deletion
    #[clap(long)]
    pub confirm: bool,
}

impl ImageTypeOpts {
    fn resolve(&self) -> Res<(&str, &str)> {
        let locale = utils::require(self.locale.as_deref(), "--locale")?;
        let image_type = utils::require(self.image_type.as_deref(), "--type")?;
        if !IMAGE_TYPES.contains(&image_type) {
            return Err(Error::usage(format!(
                "--type must be one of: {}",
                IMAGE_TYPES.join(", ")
            )));
        }
        Ok((locale, image_type))
    }
}

/// Maps a file extension to the media type sent with the upload.
pub fn image_content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub async fn run(ctx: &AppContext, command: ImagesCommand) -> Res<()> {
    match command {
        ImagesCommand::List(opts) => {
            let (locale, image_type) = opts.resolve()?;
            let session = ctx.session(&opts.edit.package).await?;
            let images = session
                .client
                .list_images(&session.package, &opts.edit.edit, locale, image_type)
                .await?;
            ctx.print(&images)
        }
        ImagesCommand::Upload(opts) => {
            let (locale, image_type) = opts.target.resolve()?;
            let file = utils::require(opts.file.as_deref(), "--file")?;
            let data = read_artifact(file).await?;
            let session = ctx.session(&opts.target.edit.package).await?;

            let pb = spinner(&format!("Uploading {file}..."));
            let result = session
                .client
                .upload_image(
                    &session.package,
                    &opts.target.edit.edit,
                    locale,
                    image_type,
                    image_content_type(file),
                    data,
                )
                .await;
            pb.finish_and_clear();
            let result = result?;
            success!("Uploaded {} to {}/{}", file, locale, image_type);
            ctx.print(&result)
        }
        ImagesCommand::Delete(opts) => {
            let (locale, image_type) = opts.target.resolve()?;
            let image = utils::require(opts.image.as_deref(), "--image")?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.target.edit.package).await?;
            session
                .client
                .delete_image(
                    &session.package,
                    &opts.target.edit.edit,
                    locale,
                    image_type,
                    image,
                )
                .await?;
            ctx.print(&json!({ "deleted": true, "imageId": image }))
        }
        ImagesCommand::DeleteAll(opts) => {
            let (locale, image_type) = opts.target.resolve()?;
            utils::require_confirm(opts.confirm)?;
            let session = ctx.session(&opts.target.edit.package).await?;
            let result = session
                .client
                .delete_all_images(&session.package, &opts.target.edit.edit, locale, image_type)
                .await?;
            ctx.print(&result)
        }
    }
}
