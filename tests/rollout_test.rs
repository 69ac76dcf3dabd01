use std::time::Duration;

use gplay::{
    management::{
        credentials::TokenSource,
        rollout::{
            PromoteRequest, RolloutAction, RolloutRequest, STATUS_COMPLETED, STATUS_HALTED,
            STATUS_IN_PROGRESS, apply_rollout, promoted_release, run_promote, run_rollout,
        },
    },
    play::{ClientSettings, PlayClient},
    types::{LocalizedText, Track, TrackRelease},
};
use httpmock::prelude::*;
use serde_json::json;

const PACKAGE: &str = "com.example.app";

fn release(status: &str, codes: &[&str], fraction: Option<f64>) -> TrackRelease {
    TrackRelease {
        name: format!("release {}", codes.join(",")),
        version_codes: codes.iter().map(|c| c.to_string()).collect(),
        status: status.to_string(),
        user_fraction: fraction,
        ..Default::default()
    }
}

fn track(name: &str, releases: Vec<TrackRelease>) -> Track {
    Track {
        track: name.to_string(),
        releases,
    }
}

fn promote_request(rollout: Option<f64>, status: &str) -> PromoteRequest {
    PromoteRequest {
        package: PACKAGE.to_string(),
        from_track: "beta".to_string(),
        to_track: "production".to_string(),
        rollout,
        status: status.to_string(),
        release_notes: None,
        changes_not_sent_for_review: false,
    }
}

fn client_for(server: &MockServer) -> PlayClient {
    let settings = ClientSettings {
        publisher_root: server.base_url(),
        retry_backoff: Duration::ZERO,
        ..Default::default()
    };
    PlayClient::new(settings, TokenSource::Static("test-token".to_string()))
}

fn edit_path(path: &str) -> String {
    format!("/androidpublisher/v3/applications/{PACKAGE}/edits/e1{path}")
}

// ---------------------------------------------------------------------------
// Track transformations
// ---------------------------------------------------------------------------

#[test]
fn test_apply_rollout_halt_keeps_other_releases() {
    let mut production = track(
        "production",
        vec![
            release(STATUS_COMPLETED, &["40"], None),
            release(STATUS_IN_PROGRESS, &["41"], Some(0.2)),
        ],
    );

    let index = apply_rollout(&mut production, RolloutAction::Halt).unwrap();
    assert_eq!(index, 1);
    assert_eq!(production.releases.len(), 2);
    assert_eq!(production.releases[0].status, STATUS_COMPLETED);
    assert_eq!(production.releases[1].status, STATUS_HALTED);
    assert_eq!(production.releases[1].user_fraction, Some(0.2));
}

#[test]
fn test_apply_rollout_resume() {
    let mut production = track(
        "production",
        vec![release(STATUS_HALTED, &["41"], Some(0.2))],
    );
    apply_rollout(&mut production, RolloutAction::Resume { fraction: None }).unwrap();
    assert_eq!(production.releases[0].status, STATUS_IN_PROGRESS);
    assert_eq!(production.releases[0].user_fraction, Some(0.2));

    let mut production = track(
        "production",
        vec![release(STATUS_HALTED, &["41"], Some(0.2))],
    );
    apply_rollout(
        &mut production,
        RolloutAction::Resume {
            fraction: Some(0.3),
        },
    )
    .unwrap();
    assert_eq!(production.releases[0].user_fraction, Some(0.3));
}

#[test]
fn test_apply_rollout_update_must_increase() {
    let mut production = track(
        "production",
        vec![release(STATUS_IN_PROGRESS, &["41"], Some(0.2))],
    );

    let err = apply_rollout(&mut production, RolloutAction::Update { fraction: 0.1 }).unwrap_err();
    assert!(err.to_string().contains("must be greater than the current rollout fraction"));
    assert_eq!(production.releases[0].user_fraction, Some(0.2));

    apply_rollout(&mut production, RolloutAction::Update { fraction: 0.5 }).unwrap();
    assert_eq!(production.releases[0].user_fraction, Some(0.5));
    assert_eq!(production.releases[0].status, STATUS_IN_PROGRESS);

    let err = apply_rollout(&mut production, RolloutAction::Update { fraction: 1.0 }).unwrap_err();
    assert_eq!(err.to_string(), "--rollout must be in (0, 1)");
}

#[test]
fn test_apply_rollout_complete_clears_fraction() {
    let mut production = track(
        "production",
        vec![release(STATUS_IN_PROGRESS, &["41"], Some(0.5))],
    );
    apply_rollout(&mut production, RolloutAction::Complete).unwrap();
    assert_eq!(production.releases[0].status, STATUS_COMPLETED);
    assert_eq!(production.releases[0].user_fraction, None);
}

#[test]
fn test_apply_rollout_without_staged_release() {
    let mut production = track(
        "production",
        vec![release(STATUS_COMPLETED, &["40"], None)],
    );
    let err = apply_rollout(&mut production, RolloutAction::Halt).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no active or halted release found in production track"
    );
}

#[test]
fn test_promoted_release_copies_source() {
    let mut source_release = release(STATUS_COMPLETED, &["42", "43"], None);
    source_release.release_notes = vec![LocalizedText {
        language: "en-US".to_string(),
        text: "Bug fixes".to_string(),
    }];
    let beta = track("beta", vec![source_release.clone()]);

    let promoted = promoted_release(&beta, &promote_request(None, STATUS_COMPLETED)).unwrap();
    assert_eq!(promoted.version_codes, source_release.version_codes);
    assert_eq!(promoted.name, source_release.name);
    assert_eq!(promoted.release_notes, source_release.release_notes);
    assert_eq!(promoted.status, STATUS_COMPLETED);
    assert_eq!(promoted.user_fraction, None);
}

#[test]
fn test_promoted_release_staged() {
    let beta = track("beta", vec![release(STATUS_IN_PROGRESS, &["42"], Some(0.5))]);

    let promoted = promoted_release(&beta, &promote_request(Some(0.1), STATUS_COMPLETED)).unwrap();
    assert_eq!(promoted.status, STATUS_IN_PROGRESS);
    assert_eq!(promoted.user_fraction, Some(0.1));

    // a full rollout is a plain completed release
    let promoted = promoted_release(&beta, &promote_request(Some(1.0), STATUS_COMPLETED)).unwrap();
    assert_eq!(promoted.status, STATUS_COMPLETED);
    assert_eq!(promoted.user_fraction, None);

    let err = promoted_release(&beta, &promote_request(Some(1.5), STATUS_COMPLETED)).unwrap_err();
    assert_eq!(err.to_string(), "--rollout must be in (0, 1]");
}

#[test]
fn test_promoted_release_overrides_notes() {
    let beta = track("beta", vec![release(STATUS_COMPLETED, &["42"], None)]);
    let notes = vec![LocalizedText {
        language: "de-DE".to_string(),
        text: "Fehlerbehebungen".to_string(),
    }];
    let request = PromoteRequest {
        release_notes: Some(notes.clone()),
        ..promote_request(None, "draft")
    };

    let promoted = promoted_release(&beta, &request).unwrap();
    assert_eq!(promoted.release_notes, notes);
    assert_eq!(promoted.status, "draft");
}

#[test]
fn test_promoted_release_requires_active_source() {
    let beta = track("beta", vec![release(STATUS_HALTED, &["42"], Some(0.1))]);
    let err = promoted_release(&beta, &promote_request(None, STATUS_COMPLETED)).unwrap_err();
    assert_eq!(err.to_string(), "no active release found in beta track");
}

#[test]
fn test_unknown_release_fields_survive() {
    let value = json!({
        "track": "production",
        "releases": [{
            "versionCodes": ["41"],
            "status": "inProgress",
            "userFraction": 0.1,
            "countryTargeting": { "countries": ["DE"] }
        }]
    });
    let mut production: Track = serde_json::from_value(value).unwrap();
    apply_rollout(&mut production, RolloutAction::Halt).unwrap();

    let written = serde_json::to_value(&production).unwrap();
    assert_eq!(written["releases"][0]["status"], "halted");
    assert_eq!(written["releases"][0]["countryTargeting"]["countries"][0], "DE");
}

// ---------------------------------------------------------------------------
// Workflows against a mock API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_run_rollout_updates_fraction() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/androidpublisher/v3/applications/{PACKAGE}/edits"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    let get_track = server
        .mock_async(|when, then| {
            when.method(GET).path(edit_path("/tracks/production"));
            then.status(200).json_body(json!({
                "track": "production",
                "releases": [
                    { "versionCodes": ["40"], "status": "completed" },
                    { "versionCodes": ["41"], "status": "inProgress", "userFraction": 0.1 }
                ]
            }));
        })
        .await;
    let put_track = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(edit_path("/tracks/production"))
                .body_includes(r#""versionCodes":["40"],"status":"completed""#)
                .body_includes(r#""status":"inProgress","userFraction":0.5"#);
            then.status(200).json_body(json!({ "track": "production" }));
        })
        .await;
    let validate = server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":validate"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(edit_path(":commit"))
                .query_param("changesNotSentForReview", "true");
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let client = client_for(&server);
    let request = RolloutRequest {
        package: PACKAGE.to_string(),
        track: "production".to_string(),
        action: RolloutAction::Update { fraction: 0.5 },
        changes_not_sent_for_review: true,
    };
    let result = run_rollout(&client, &request).await.unwrap();

    assert_eq!(result.edit_id, "e1");
    assert_eq!(result.track, "production");
    assert_eq!(result.status, STATUS_IN_PROGRESS);
    assert_eq!(result.version_codes, vec!["41".to_string()]);
    assert_eq!(result.rollout_fraction, Some(0.5));

    insert.assert_async().await;
    get_track.assert_async().await;
    put_track.assert_async().await;
    validate.assert_async().await;
    commit.assert_async().await;
}

#[tokio::test]
async fn test_run_rollout_stops_at_failing_step() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/androidpublisher/v3/applications/{PACKAGE}/edits"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(edit_path("/tracks/production"));
            then.status(404)
                .json_body(json!({ "error": { "message": "Track not found" } }));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":commit"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let client = client_for(&server);
    let request = RolloutRequest {
        package: PACKAGE.to_string(),
        track: "production".to_string(),
        action: RolloutAction::Halt,
        changes_not_sent_for_review: false,
    };
    let err = run_rollout(&client, &request).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to get track: GET "));
    assert!(err.to_string().ends_with("returned 404: Track not found"));
    commit.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_run_promote_writes_single_release() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/androidpublisher/v3/applications/{PACKAGE}/edits"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(edit_path("/tracks/beta"));
            then.status(200).json_body(json!({
                "track": "beta",
                "releases": [{
                    "name": "2.1.0",
                    "versionCodes": ["42"],
                    "status": "completed",
                    "releaseNotes": [{ "language": "en-US", "text": "New stuff" }]
                }]
            }));
        })
        .await;
    let put_production = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(edit_path("/tracks/production"))
                .json_body(json!({
                    "track": "production",
                    "releases": [{
                        "name": "2.1.0",
                        "versionCodes": ["42"],
                        "releaseNotes": [{ "language": "en-US", "text": "New stuff" }],
                        "status": "inProgress",
                        "userFraction": 0.1
                    }]
                }));
            then.status(200).json_body(json!({ "track": "production" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":validate"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":commit"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let client = client_for(&server);
    let result = run_promote(&client, &promote_request(Some(0.1), STATUS_COMPLETED))
        .await
        .unwrap();

    assert_eq!(result.from_track, "beta");
    assert_eq!(result.to_track, "production");
    assert_eq!(result.version_codes, vec!["42".to_string()]);
    assert_eq!(result.status, STATUS_IN_PROGRESS);
    assert_eq!(result.rollout_fraction, Some(0.1));

    put_production.assert_async().await;
    commit.assert_async().await;
}

#[tokio::test]
async fn test_run_promote_validation_failure_skips_commit() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/androidpublisher/v3/applications/{PACKAGE}/edits"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(edit_path("/tracks/beta"));
            then.status(200).json_body(json!({
                "track": "beta",
                "releases": [{ "versionCodes": ["42"], "status": "completed" }]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path(edit_path("/tracks/production"));
            then.status(200).json_body(json!({ "track": "production" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":validate"));
            then.status(400)
                .json_body(json!({ "error": { "message": "APK version code 42 is already in production" } }));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":commit"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let client = client_for(&server);
    let err = run_promote(&client, &promote_request(None, STATUS_COMPLETED))
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("validation failed: POST "));
    commit.assert_calls_async(0).await;
}
