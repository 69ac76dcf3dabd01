//! One-shot release workflow.
//!
//! Creates an edit, uploads a bundle or APK, points the target track at the
//! uploaded version code, then validates and commits. With `wait` set the
//! track is polled afterwards until the version code shows up in it.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tokio::time::{Instant, sleep};

use crate::{
    Error, Res,
    error::ResultExt,
    info,
    management::rollout::{STATUS_COMPLETED, STATUS_IN_PROGRESS, step_spinner, validate_and_commit},
    play::PlayClient,
    success,
    types::{LocalizedText, ReleaseResult, Track, TrackRelease},
    utils, warning,
};

/// Version code reported for uploads skipped by `--dry-run`.
pub const DRY_RUN_VERSION_CODE: &str = "0";

#[derive(Debug, Clone)]
pub enum Artifact {
    Bundle(Vec<u8>),
    Apk(Vec<u8>),
}

impl Artifact {
    fn label(&self) -> &'static str {
        match self {
            Artifact::Bundle(_) => "bundle",
            Artifact::Apk(_) => "APK",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub package: String,
    pub track: String,
    pub artifact: Artifact,
    pub release_notes: Vec<LocalizedText>,
    pub rollout: f64,
    pub status: String,
    pub version_name: Option<String>,
    pub changes_not_sent_for_review: bool,
    pub wait: Option<WaitOptions>,
}

/// Parses release notes given as plain text (en-US), a JSON array or an `@file`.
pub async fn parse_release_notes(input: &str) -> Res<Vec<LocalizedText>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::usage("release notes input is empty"));
    }
    if !trimmed.starts_with('@') && !trimmed.starts_with('[') {
        return Ok(vec![LocalizedText {
            language: "en-US".to_string(),
            text: trimmed.to_string(),
        }]);
    }

    let notes: Vec<LocalizedText> = utils::load_json_arg(trimmed)
        .await
        .context("invalid release notes JSON")?;
    if notes.is_empty() {
        return Err(Error::usage("release notes JSON array is empty"));
    }
    for (i, note) in notes.iter().enumerate() {
        if note.language.trim().is_empty() {
            return Err(Error::usage(format!(
                "release note at index {i} is missing language"
            )));
        }
        if note.text.trim().is_empty() {
            return Err(Error::usage(format!(
                "release note at index {i} is missing text"
            )));
        }
    }
    Ok(notes)
}

/// Builds the single release written to the target track.
///
/// A fraction below 1 turns a completed or in-progress release into a staged
/// rollout. Draft and halted releases ignore the fraction.
pub fn build_release(version_code: &str, request: &ReleaseRequest) -> TrackRelease {
    let mut release = TrackRelease {
        name: request.version_name.clone().unwrap_or_default(),
        version_codes: vec![version_code.to_string()],
        status: request.status.clone(),
        release_notes: request.release_notes.clone(),
        ..TrackRelease::default()
    };

    if request.rollout < 1.0
        && (release.status == STATUS_IN_PROGRESS || release.status == STATUS_COMPLETED)
    {
        release.user_fraction = Some(request.rollout);
        release.status = STATUS_IN_PROGRESS.to_string();
    }
    release
}

/// Reads `versionCode` from an upload response; the API returns it as a number.
pub fn uploaded_version_code(response: &Value) -> Option<String> {
    match response.get("versionCode")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub async fn run_release(client: &PlayClient, request: &ReleaseRequest) -> Res<ReleaseResult> {
    let package = request.package.as_str();

    let pb = step_spinner("Creating edit...".to_string());
    let edit = client.insert_edit(package).await;
    pb.finish_and_clear();
    let edit = edit.context("failed to create edit")?;
    info!("Edit created: {}", edit.id);

    let label = request.artifact.label();
    let pb = step_spinner(format!("Uploading {label}..."));
    let uploaded = match &request.artifact {
        Artifact::Bundle(data) => client.upload_bundle(package, &edit.id, data.clone()).await,
        Artifact::Apk(data) => client.upload_apk(package, &edit.id, data.clone()).await,
    };
    pb.finish_and_clear();
    let uploaded = uploaded.context(&format!("failed to upload {label}"))?;

    let version_code = match uploaded_version_code(&uploaded) {
        Some(code) => code,
        None if client.is_dry_run() => DRY_RUN_VERSION_CODE.to_string(),
        None => {
            return Err(Error::usage(format!(
                "{label} upload response did not include a versionCode"
            )));
        }
    };
    info!("{} uploaded: version code {}", label, version_code);

    let release = build_release(&version_code, request);
    let track = Track {
        track: request.track.clone(),
        releases: vec![release.clone()],
    };
    let pb = step_spinner(format!("Configuring track: {}", request.track));
    let updated = client
        .write_track(Method::PUT, package, &edit.id, &track)
        .await;
    pb.finish_and_clear();
    updated.context("failed to update track")?;
    info!("Track configured");

    let edit_id =
        validate_and_commit(client, package, &edit.id, request.changes_not_sent_for_review).await?;
    success!("Edit committed successfully");

    if let Some(wait) = request.wait {
        if client.is_dry_run() {
            info!("Skipping --wait in dry-run mode");
        } else {
            wait_for_release(client, package, &request.track, &version_code, wait).await?;
        }
    }

    Ok(ReleaseResult {
        edit_id,
        package_name: request.package.clone(),
        track: request.track.clone(),
        version_code,
        status: release.status,
        rollout_fraction: release.user_fraction.filter(|f| *f > 0.0 && *f < 1.0),
    })
}

/// Polls `track` through throwaway edits until `version_code` appears in one of its releases.
pub async fn wait_for_release(
    client: &PlayClient,
    package: &str,
    track: &str,
    version_code: &str,
    wait: WaitOptions,
) -> Res<String> {
    let deadline = Instant::now() + wait.timeout;
    info!(
        "Waiting for the release to appear on {} (poll interval: {:?})",
        track, wait.poll_interval
    );

    loop {
        if Instant::now() >= deadline {
            return Err(Error::usage(format!(
                "timed out after {:?} waiting for version code {version_code} on {track}",
                wait.timeout
            )));
        }
        sleep(wait.poll_interval).await;

        let edit = match client.insert_edit(package).await {
            Ok(edit) => edit,
            Err(e) => {
                warning!("failed to check status: {}", e);
                continue;
            }
        };
        let current = client.get_track(package, &edit.id, track).await;
        if let Err(e) = client.delete_edit(package, &edit.id).await {
            warning!("failed to delete status edit {}: {}", edit.id, e);
        }

        match current {
            Ok(current) => {
                let live = current
                    .releases
                    .iter()
                    .find(|r| r.version_codes.iter().any(|c| c == version_code));
                if let Some(release) = live {
                    success!("Release is live with status: {}", release.status);
                    return Ok(release.status.clone());
                }
            }
            Err(e) => warning!("failed to get track status: {}", e),
        }
    }
}
