use std::time::Duration;

use gplay::{
    management::{
        credentials::TokenSource,
        release::{
            Artifact, DRY_RUN_VERSION_CODE, ReleaseRequest, WaitOptions, build_release,
            parse_release_notes, run_release, uploaded_version_code, wait_for_release,
        },
    },
    play::{ClientSettings, PlayClient},
    types::LocalizedText,
};
use httpmock::prelude::*;
use serde_json::json;

const PACKAGE: &str = "com.example.app";

fn client_for(server: &MockServer, dry_run: bool) -> PlayClient {
    let settings = ClientSettings {
        publisher_root: server.base_url(),
        retry_backoff: Duration::ZERO,
        dry_run,
        ..Default::default()
    };
    PlayClient::new(settings, TokenSource::Static("test-token".to_string()))
}

fn edit_path(path: &str) -> String {
    format!("/androidpublisher/v3/applications/{PACKAGE}/edits/e1{path}")
}

fn request(rollout: f64, status: &str) -> ReleaseRequest {
    ReleaseRequest {
        package: PACKAGE.to_string(),
        track: "beta".to_string(),
        artifact: Artifact::Bundle(b"bundle-bytes".to_vec()),
        release_notes: vec![LocalizedText {
            language: "en-US".to_string(),
            text: "Bug fixes".to_string(),
        }],
        rollout,
        status: status.to_string(),
        version_name: Some("1.2.0".to_string()),
        changes_not_sent_for_review: false,
        wait: None,
    }
}

#[tokio::test]
async fn test_parse_release_notes_plain_text() {
    let notes = parse_release_notes("  Bug fixes and improvements ").await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].language, "en-US");
    assert_eq!(notes[0].text, "Bug fixes and improvements");
}

#[tokio::test]
async fn test_parse_release_notes_json_array() {
    let notes = parse_release_notes(
        r#"[{"language":"en-US","text":"Fixes"},{"language":"de-DE","text":"Fehlerbehebungen"}]"#,
    )
    .await
    .unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[1].language, "de-DE");
    assert_eq!(notes[1].text, "Fehlerbehebungen");
}

#[tokio::test]
async fn test_parse_release_notes_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.json");
    std::fs::write(&path, r#"[{"language":"fr-FR","text":"Corrections"}]"#).unwrap();

    let notes = parse_release_notes(&format!("@{}", path.display())).await.unwrap();
    assert_eq!(notes[0].language, "fr-FR");
}

#[tokio::test]
async fn test_parse_release_notes_rejects_bad_input() {
    let err = parse_release_notes("   ").await.unwrap_err();
    assert_eq!(err.to_string(), "release notes input is empty");

    let err = parse_release_notes("[]").await.unwrap_err();
    assert_eq!(err.to_string(), "release notes JSON array is empty");

    let err = parse_release_notes(r#"[{"language":"en-US","text":"ok"},{"text":"missing"}]"#)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "release note at index 1 is missing language");

    let err = parse_release_notes(r#"[{"language":"en-US","text":" "}]"#)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "release note at index 0 is missing text");

    let err = parse_release_notes("[not json").await.unwrap_err();
    assert!(err.to_string().starts_with("invalid release notes JSON"));
}

#[test]
fn test_build_release_staged_rollout() {
    let release = build_release("42", &request(0.1, "completed"));
    assert_eq!(release.version_codes, vec!["42".to_string()]);
    assert_eq!(release.status, "inProgress");
    assert_eq!(release.user_fraction, Some(0.1));
    assert_eq!(release.name, "1.2.0");
    assert_eq!(release.release_notes.len(), 1);
}

#[test]
fn test_build_release_full_rollout_and_draft() {
    let full = build_release("42", &request(1.0, "completed"));
    assert_eq!(full.status, "completed");
    assert_eq!(full.user_fraction, None);

    let draft = build_release("42", &request(0.3, "draft"));
    assert_eq!(draft.status, "draft");
    assert_eq!(draft.user_fraction, None);
}

#[test]
fn test_uploaded_version_code() {
    assert_eq!(uploaded_version_code(&json!({ "versionCode": 42 })), Some("42".to_string()));
    assert_eq!(uploaded_version_code(&json!({ "versionCode": "43" })), Some("43".to_string()));
    assert_eq!(uploaded_version_code(&json!({ "versionCode": "" })), None);
    assert_eq!(uploaded_version_code(&json!({})), None);
}

#[tokio::test]
async fn test_run_release_uploads_and_commits() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/androidpublisher/v3/applications/{PACKAGE}/edits"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!(
                    "/upload/androidpublisher/v3/applications/{PACKAGE}/edits/e1/bundles"
                ))
                .query_param("uploadType", "media")
                .body("bundle-bytes");
            then.status(200)
                .json_body(json!({ "versionCode": 42, "sha256": "abc" }));
        })
        .await;
    let put_track = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(edit_path("/tracks/beta"))
                .body_includes(r#""versionCodes":["42"]"#)
                .body_includes(r#""status":"inProgress","userFraction":0.25"#);
            then.status(200).json_body(json!({ "track": "beta" }));
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
                .query_param_missing("changesNotSentForReview");
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let client = client_for(&server, false);
    let result = run_release(&client, &request(0.25, "completed")).await.unwrap();

    assert_eq!(result.edit_id, "e1");
    assert_eq!(result.package_name, PACKAGE);
    assert_eq!(result.track, "beta");
    assert_eq!(result.version_code, "42");
    assert_eq!(result.status, "inProgress");
    assert_eq!(result.rollout_fraction, Some(0.25));

    insert.assert_async().await;
    upload.assert_async().await;
    put_track.assert_async().await;
    validate.assert_async().await;
    commit.assert_async().await;
}

#[tokio::test]
async fn test_run_release_upload_failure_stops_before_track() {
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
            when.method(POST).path(format!(
                "/upload/androidpublisher/v3/applications/{PACKAGE}/edits/e1/apks"
            ));
            then.status(400)
                .json_body(json!({ "error": { "message": "APK is not signed" } }));
        })
        .await;
    let put_track = server
        .mock_async(|when, then| {
            when.method(PUT).path(edit_path("/tracks/beta"));
            then.status(200).json_body(json!({}));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":commit"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let mut req = request(1.0, "completed");
    req.artifact = Artifact::Apk(b"apk-bytes".to_vec());
    let client = client_for(&server, false);
    let err = run_release(&client, &req).await.unwrap_err();

    assert!(err.to_string().starts_with("failed to upload APK: "));
    assert!(err.to_string().ends_with("APK is not signed"));
    put_track.assert_calls_async(0).await;
    commit.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_run_release_requires_version_code() {
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
            when.method(POST).path(format!(
                "/upload/androidpublisher/v3/applications/{PACKAGE}/edits/e1/bundles"
            ));
            then.status(200).json_body(json!({ "sha256": "abc" }));
        })
        .await;

    let client = client_for(&server, false);
    let err = run_release(&client, &request(1.0, "completed")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "bundle upload response did not include a versionCode"
    );
}

#[tokio::test]
async fn test_run_release_dry_run_only_creates_edit() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/androidpublisher/v3/applications/{PACKAGE}/edits"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.path_includes("/bundles");
            then.status(200).json_body(json!({ "versionCode": 42 }));
        })
        .await;
    let commit = server
        .mock_async(|when, then| {
            when.method(POST).path(edit_path(":commit"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let mut req = request(1.0, "completed");
    req.wait = Some(WaitOptions {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_secs(1),
    });
    let client = client_for(&server, true);
    let result = run_release(&client, &req).await.unwrap();

    assert_eq!(result.edit_id, "e1");
    assert_eq!(result.version_code, DRY_RUN_VERSION_CODE);
    insert.assert_calls_async(1).await;
    upload.assert_calls_async(0).await;
    commit.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_wait_for_release_polls_until_live() {
    let server = MockServer::start_async().await;
    let insert = server
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
                "releases": [
                    { "versionCodes": ["41"], "status": "completed" },
                    { "versionCodes": ["42"], "status": "inProgress", "userFraction": 0.25 }
                ]
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path(edit_path(""));
            then.status(204);
        })
        .await;

    let client = client_for(&server, false);
    let wait = WaitOptions {
        poll_interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };
    let status = wait_for_release(&client, PACKAGE, "beta", "42", wait).await.unwrap();

    assert_eq!(status, "inProgress");
    insert.assert_calls_async(1).await;
    delete.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_wait_for_release_times_out() {
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
            then.status(200).json_body(json!({ "track": "beta", "releases": [] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path(edit_path(""));
            then.status(204);
        })
        .await;

    let client = client_for(&server, false);
    let wait = WaitOptions {
        poll_interval: Duration::from_millis(5),
        timeout: Duration::from_millis(20),
    };
    let err = wait_for_release(&client, PACKAGE, "beta", "42", wait).await.unwrap_err();
    assert!(err.to_string().starts_with("timed out after 20ms waiting for version code 42"));
}
