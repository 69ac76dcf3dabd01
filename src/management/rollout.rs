//! Staged-rollout and promotion workflows.
//!
//! Both workflows run the same five sequential steps against one edit:
//! create the edit, read the track, write the modified track, validate and
//! commit. A failing step aborts the workflow with the step name as context.
//! Nothing is retried or rolled back; an uncommitted edit simply expires.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Method;

use crate::{
    Error, Res,
    error::ResultExt,
    info,
    play::PlayClient,
    success,
    types::{LocalizedText, PromoteResult, RolloutResult, Track, TrackRelease},
    utils,
};

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_IN_PROGRESS: &str = "inProgress";
pub const STATUS_HALTED: &str = "halted";
pub const STATUS_DRAFT: &str = "draft";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RolloutAction {
    Halt,
    Resume { fraction: Option<f64> },
    Update { fraction: f64 },
    Complete,
}

impl RolloutAction {
    pub fn status(self) -> &'static str {
        match self {
            RolloutAction::Halt => STATUS_HALTED,
            RolloutAction::Resume { .. } | RolloutAction::Update { .. } => STATUS_IN_PROGRESS,
            RolloutAction::Complete => STATUS_COMPLETED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RolloutRequest {
    pub package: String,
    pub track: String,
    pub action: RolloutAction,
    pub changes_not_sent_for_review: bool,
}

#[derive(Debug, Clone)]
pub struct PromoteRequest {
    pub package: String,
    pub from_track: String,
    pub to_track: String,
    pub rollout: Option<f64>,
    pub status: String,
    pub release_notes: Option<Vec<LocalizedText>>,
    pub changes_not_sent_for_review: bool,
}

pub(crate) fn step_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

/// Applies `action` to the first in-progress or halted release of `track`.
///
/// Returns the index of the modified release. Every other release is left
/// untouched so that writing the track back does not drop them.
pub fn apply_rollout(track: &mut Track, action: RolloutAction) -> Res<usize> {
    let index = track
        .releases
        .iter()
        .position(|r| r.status == STATUS_IN_PROGRESS || r.status == STATUS_HALTED)
        .ok_or_else(|| {
            Error::usage(format!(
                "no active or halted release found in {} track",
                track.track
            ))
        })?;

    let release = &mut track.releases[index];
    match action {
        RolloutAction::Halt => {}
        RolloutAction::Resume { fraction } => {
            if let Some(fraction) = fraction {
                release.user_fraction = Some(utils::validate_fraction("--rollout", fraction, false)?);
            }
        }
        RolloutAction::Update { fraction } => {
            let fraction = utils::validate_fraction("--rollout", fraction, false)?;
            if let Some(current) = release.user_fraction {
                if fraction <= current {
                    return Err(Error::usage(format!(
                        "--rollout {fraction} must be greater than the current rollout fraction {current}"
                    )));
                }
            }
            release.user_fraction = Some(fraction);
        }
        RolloutAction::Complete => release.user_fraction = None,
    }
    release.status = action.status().to_string();

    Ok(index)
}

/// Builds the release written to the destination track of a promotion.
pub fn promoted_release(source: &Track, request: &PromoteRequest) -> Res<TrackRelease> {
    let source_release = source
        .releases
        .iter()
        .find(|r| r.status == STATUS_COMPLETED || r.status == STATUS_IN_PROGRESS)
        .ok_or_else(|| {
            Error::usage(format!(
                "no active release found in {} track",
                request.from_track
            ))
        })?;

    let mut release = TrackRelease {
        name: source_release.name.clone(),
        version_codes: source_release.version_codes.clone(),
        status: request.status.clone(),
        release_notes: request
            .release_notes
            .clone()
            .unwrap_or_else(|| source_release.release_notes.clone()),
        ..TrackRelease::default()
    };

    if let Some(fraction) = request.rollout {
        let fraction = utils::validate_fraction("--rollout", fraction, true)?;
        if fraction < 1.0 {
            release.user_fraction = Some(fraction);
            if release.status == STATUS_COMPLETED {
                release.status = STATUS_IN_PROGRESS.to_string();
            }
        }
    }

    Ok(release)
}

pub(crate) async fn validate_and_commit(client: &PlayClient, package: &str, edit_id: &str, changes_not_sent_for_review: bool) -> Res<String> {
    let pb = step_spinner("Validating edit...".to_string());
    let validated = client.validate_edit(package, edit_id).await;
    pb.finish_and_clear();
    validated.context("validation failed")?;
    info!("Edit validated");

    let pb = step_spinner("Committing edit...".to_string());
    let committed = client
        .commit_edit(package, edit_id, changes_not_sent_for_review)
        .await;
    pb.finish_and_clear();
    let committed = committed.context("commit failed")?;

    // dry-run commits come back as `{}`
    Ok(committed
        .get("id")
        .and_then(|id| id.as_str())
        .unwrap_or(edit_id)
        .to_string())
}

pub async fn run_rollout(client: &PlayClient, request: &RolloutRequest) -> Res<RolloutResult> {
    let package = request.package.as_str();

    let pb = step_spinner("Creating edit...".to_string());
    let edit = client.insert_edit(package).await;
    pb.finish_and_clear();
    let edit = edit.context("failed to create edit")?;
    info!("Edit created: {}", edit.id);

    let pb = step_spinner(format!("Getting current {} track state...", request.track));
    let current = client.get_track(package, &edit.id, &request.track).await;
    pb.finish_and_clear();
    let mut track = current.context("failed to get track")?;
    if track.track.is_empty() {
        track.track = request.track.clone();
    }

    let index = apply_rollout(&mut track, request.action)?;
    info!("Updating rollout status to: {}", request.action.status());

    let pb = step_spinner("Updating track...".to_string());
    let updated = client
        .write_track(Method::PUT, package, &edit.id, &track)
        .await;
    pb.finish_and_clear();
    updated.context("failed to update track")?;

    let edit_id =
        validate_and_commit(client, package, &edit.id, request.changes_not_sent_for_review).await?;
    success!("Rollout updated successfully");

    let release = &track.releases[index];
    Ok(RolloutResult {
        edit_id,
        package_name: request.package.clone(),
        track: request.track.clone(),
        status: release.status.clone(),
        version_codes: release.version_codes.clone(),
        rollout_fraction: release.user_fraction.filter(|f| *f > 0.0 && *f < 1.0),
    })
}

pub async fn run_promote(client: &PlayClient, request: &PromoteRequest) -> Res<PromoteResult> {
    let package = request.package.as_str();

    let pb = step_spinner("Creating edit...".to_string());
    let edit = client.insert_edit(package).await;
    pb.finish_and_clear();
    let edit = edit.context("failed to create edit")?;
    info!("Edit created: {}", edit.id);

    let pb = step_spinner(format!("Getting source track: {}", request.from_track));
    let source = client.get_track(package, &edit.id, &request.from_track).await;
    pb.finish_and_clear();
    let source = source.context("failed to get source track")?;

    let release = promoted_release(&source, request)?;
    info!(
        "Found release with version codes: {}",
        release.version_codes.join(", ")
    );

    let destination = Track {
        track: request.to_track.clone(),
        releases: vec![release.clone()],
    };
    let pb = step_spinner(format!("Configuring destination track: {}", request.to_track));
    let updated = client
        .write_track(Method::PUT, package, &edit.id, &destination)
        .await;
    pb.finish_and_clear();
    updated.context("failed to update destination track")?;

    let edit_id =
        validate_and_commit(client, package, &edit.id, request.changes_not_sent_for_review).await?;
    success!(
        "Promoted {} to {}",
        request.from_track,
        request.to_track
    );

    Ok(PromoteResult {
        edit_id,
        package_name: request.package.clone(),
        from_track: request.from_track.clone(),
        to_track: request.to_track.clone(),
        version_codes: release.version_codes,
        status: release.status,
        rollout_fraction: release.user_fraction.filter(|f| *f > 0.0 && *f < 1.0),
    })
}
