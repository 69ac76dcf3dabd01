use std::time::Duration;

use gplay::{
    Error,
    error::ErrorKind,
    management::credentials::TokenSource,
    play::{
        self, ClientSettings, PlayClient, collect_pages, dry_run_report, next_page_token,
        purchases::VoidedQuery, reviews::ReviewQuery, segment,
    },
};
use httpmock::prelude::*;
use reqwest::{Method, StatusCode};
use serde_json::json;

const PACKAGE: &str = "com.example.app";

fn client_for(server: &MockServer, dry_run: bool) -> PlayClient {
    let settings = ClientSettings {
        publisher_root: server.base_url(),
        reporting_root: server.base_url(),
        retry_backoff: Duration::ZERO,
        dry_run,
        ..Default::default()
    };
    PlayClient::new(settings, TokenSource::Static("test-token".to_string()))
}

fn app_path(path: &str) -> String {
    format!("/androidpublisher/v3/applications/{PACKAGE}{path}")
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/edits/e1"))
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;

    let client = client_for(&server, false);
    let edit = client.get_edit(PACKAGE, "e1").await.unwrap();
    assert_eq!(edit["id"], "e1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_api_error_envelope() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/edits/missing"));
            then.status(404).json_body(json!({
                "error": { "code": 404, "message": "Edit not found", "status": "NOT_FOUND" }
            }));
        })
        .await;

    let client = client_for(&server, false);
    let err = client.get_edit(PACKAGE, "missing").await.unwrap_err();

    match &err {
        Error::Api {
            method,
            path,
            status,
            message,
        } => {
            assert_eq!(method, "GET");
            assert_eq!(path, &app_path("/edits/missing"));
            assert_eq!(*status, 404);
            assert_eq!(message, "Edit not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.report().contains("Hint: Check that the package name"));
}

#[tokio::test]
async fn test_get_retried_on_service_unavailable() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/edits/e1/tracks"));
            then.status(503).body("backend unavailable");
        })
        .await;

    let client = client_for(&server, false);
    let err = client.list_tracks(PACKAGE, "e1").await.unwrap_err();

    // one attempt plus three retries
    mock.assert_calls_async(4).await;
    assert!(matches!(err, Error::Api { status: 503, .. }));
    assert!(err.to_string().ends_with("returned 503: backend unavailable"));
}

#[tokio::test]
async fn test_writes_are_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(app_path("/edits/e1:validate"));
            then.status(503);
        })
        .await;

    let client = client_for(&server, false);
    let err = client.validate_edit(PACKAGE, "e1").await.unwrap_err();

    mock.assert_calls_async(1).await;
    match err {
        Error::Api { message, .. } => assert_eq!(message, "Service Unavailable"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_success_body_is_empty_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path(app_path("/edits/e1"));
            then.status(204);
        })
        .await;

    let client = client_for(&server, false);
    let value = client.delete_edit(PACKAGE, "e1").await.unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_dry_run_skips_writes() {
    let server = MockServer::start_async().await;
    let validate = server
        .mock_async(|when, then| {
            when.method(POST).path(app_path("/edits/e1:validate"));
            then.status(200).json_body(json!({ "id": "e1" }));
        })
        .await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path(app_path("/edits"));
            then.status(200).json_body(json!({ "id": "draft-1" }));
        })
        .await;

    let client = client_for(&server, true);

    let value = client.validate_edit(PACKAGE, "e1").await.unwrap();
    assert_eq!(value, json!({}));
    validate.assert_calls_async(0).await;

    // edits are private drafts, so creating one still reaches the API
    let edit = client.insert_edit(PACKAGE).await.unwrap();
    assert_eq!(edit.id, "draft-1");
    insert.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_upload_sends_media_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!(
                    "/upload/androidpublisher/v3/applications/{PACKAGE}/edits/e1/bundles"
                ))
                .query_param("uploadType", "media")
                .header("content-type", "application/octet-stream")
                .body("bundle-bytes");
            then.status(200).json_body(json!({ "versionCode": 42 }));
        })
        .await;

    let client = client_for(&server, false);
    let bundle = client
        .upload_bundle(PACKAGE, "e1", b"bundle-bytes".to_vec())
        .await
        .unwrap();
    assert_eq!(bundle["versionCode"], 42);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_paginated_listing_collects_every_page() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/inappproducts"))
                .query_param_missing("token");
            then.status(200).json_body(json!({
                "inappproduct": [{ "sku": "coins_100" }, { "sku": "coins_500" }],
                "tokenPagination": { "nextPageToken": "page-2" }
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/inappproducts"))
                .query_param("token", "page-2");
            then.status(200).json_body(json!({
                "inappproduct": [{ "sku": "premium" }]
            }));
        })
        .await;

    let client = client_for(&server, false);
    let products = client
        .list_all_in_app_products(PACKAGE, Some(2))
        .await
        .unwrap();

    let skus: Vec<&str> = products["inappproduct"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["sku"].as_str().unwrap())
        .collect();
    assert_eq!(skus, vec!["coins_100", "coins_500", "premium"]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_collect_pages_stops_without_token() {
    let mut seen = Vec::new();
    let result = collect_pages("items", |token| {
        seen.push(token.clone());
        async move {
            Ok(match token.as_deref() {
                None => json!({ "items": [1, 2], "nextPageToken": "b" }),
                Some("b") => json!({ "items": [3], "nextPageToken": "" }),
                Some(other) => panic!("unexpected token {other}"),
            })
        }
    })
    .await
    .unwrap();

    assert_eq!(result, json!({ "items": [1, 2, 3] }));
    assert_eq!(seen, vec![None, Some("b".to_string())]);
}

#[tokio::test]
async fn test_collect_pages_rejects_repeated_token() {
    let mut calls = 0;
    let err = collect_pages("items", |_| {
        calls += 1;
        let n = calls;
        async move { Ok(json!({ "items": [n], "nextPageToken": "same" })) }
    })
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "pagination stopped: page token \"same\" was returned twice"
    );
    assert_eq!(calls, 2);
}

#[tokio::test]
async fn test_collect_pages_rejects_cycling_tokens() {
    let mut calls = 0;
    let result = collect_pages("items", |token| {
        calls += 1;
        async move {
            let next = match token.as_deref() {
                None | Some("b") => "a",
                _ => "b",
            };
            Ok(json!({ "items": [], "nextPageToken": next }))
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls, 3);
}

#[test]
fn test_next_page_token_locations() {
    assert_eq!(
        next_page_token(&json!({ "tokenPagination": { "nextPageToken": "r2" } })).as_deref(),
        Some("r2")
    );
    assert_eq!(
        next_page_token(&json!({ "nextPageToken": "s2" })).as_deref(),
        Some("s2")
    );
    assert_eq!(next_page_token(&json!({ "nextPageToken": "" })), None);
    assert_eq!(next_page_token(&json!({})), None);
}

#[test]
fn test_error_message_fallbacks() {
    assert_eq!(
        play::error_message(
            StatusCode::FORBIDDEN,
            r#"{"error":{"message":"The caller does not have permission"}}"#
        ),
        "The caller does not have permission"
    );
    assert_eq!(
        play::error_message(StatusCode::BAD_REQUEST, "  plain text  "),
        "plain text"
    );
    assert_eq!(
        play::error_message(StatusCode::UNAUTHORIZED, ""),
        "Unauthorized"
    );
}

#[test]
fn test_dry_run_report() {
    let report = dry_run_report(
        Method::POST.as_str(),
        "https://example.test/edits/e1:commit",
        Some(r#"{"a":1}"#),
    );
    assert_eq!(
        report,
        "[DRY RUN] POST https://example.test/edits/e1:commit\n\
         [DRY RUN] Body: {\"a\":1}\n\
         [DRY RUN] No changes were made.\n"
    );

    let long_body = "x".repeat(3000);
    let report = dry_run_report("PUT", "https://example.test", Some(&long_body));
    assert!(report.contains("... (truncated)"));

    let report = dry_run_report("DELETE", "https://example.test", None);
    assert!(!report.contains("Body"));
}

#[test]
fn test_url_builders() {
    let client = PlayClient::new(
        ClientSettings {
            publisher_root: "https://publisher.test/".to_string(),
            reporting_root: "https://reporting.test".to_string(),
            ..Default::default()
        },
        TokenSource::Static(String::new()),
    );

    assert_eq!(
        client.app_url(PACKAGE, "/reviews"),
        "https://publisher.test/androidpublisher/v3/applications/com.example.app/reviews"
    );
    assert_eq!(
        client.upload_url(PACKAGE, "/edits/e1/apks"),
        "https://publisher.test/upload/androidpublisher/v3/applications/com.example.app/edits/e1/apks"
    );
    assert_eq!(
        client.app_url(PACKAGE, &format!("/orders/{}:refund", segment("GPA.12/34:5"))),
        "https://publisher.test/androidpublisher/v3/applications/com.example.app/orders/GPA.12%2F34%3A5:refund"
    );
    assert_eq!(
        client.reporting_url("/apps/com.example.app/crashRateMetricSet:query"),
        "https://reporting.test/v1beta1/apps/com.example.app/crashRateMetricSet:query"
    );
}

#[test]
fn test_segment_encoding() {
    assert_eq!(segment("coins_100"), "coins_100");
    assert_eq!(segment("en-US"), "en-US");
    assert_eq!(segment("abc.DEF-1_2"), "abc.DEF-1_2");
    assert_eq!(segment("a/b"), "a%2Fb");
    assert_eq!(segment("id?x=1#frag"), "id%3Fx=1%23frag");
    assert_eq!(segment("100% off"), "100%25%20off");
}

// ---------------------------------------------------------------------------
// Endpoint mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_listing_endpoints() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/edits/e1/listings"));
            then.status(200)
                .json_body(json!({ "listings": [{ "language": "en-US", "title": "App" }] }));
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(app_path("/edits/e1/listings/de-DE"))
                .json_body(json!({ "title": "Anwendung" }));
            then.status(200).json_body(json!({ "language": "de-DE", "title": "Anwendung" }));
        })
        .await;
    let delete_all = server
        .mock_async(|when, then| {
            when.method(DELETE).path(app_path("/edits/e1/listings"));
            then.status(204);
        })
        .await;

    let client = client_for(&server, false);
    let listings = client.list_listings(PACKAGE, "e1").await.unwrap();
    assert_eq!(listings["listings"][0]["language"], "en-US");

    let patched = client
        .write_listing(
            Method::PATCH,
            PACKAGE,
            "e1",
            "de-DE",
            json!({ "title": "Anwendung" }),
        )
        .await
        .unwrap();
    assert_eq!(patched["title"], "Anwendung");

    assert_eq!(client.delete_all_listings(PACKAGE, "e1").await.unwrap(), json!({}));

    list.assert_async().await;
    patch.assert_async().await;
    delete_all.assert_async().await;
}

#[tokio::test]
async fn test_details_and_testers_endpoints() {
    let server = MockServer::start_async().await;
    let details = server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/edits/e1/details"));
            then.status(200).json_body(json!({ "contactEmail": "dev@example.com" }));
        })
        .await;
    let testers = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(app_path("/edits/e1/testers/beta"))
                .json_body(json!({ "googleGroups": ["qa@example.com"] }));
            then.status(200).json_body(json!({ "googleGroups": ["qa@example.com"] }));
        })
        .await;

    let client = client_for(&server, false);
    let value = client.get_details(PACKAGE, "e1").await.unwrap();
    assert_eq!(value["contactEmail"], "dev@example.com");

    let value = client
        .write_testers(
            Method::PUT,
            PACKAGE,
            "e1",
            "beta",
            json!({ "googleGroups": ["qa@example.com"] }),
        )
        .await
        .unwrap();
    assert_eq!(value["googleGroups"][0], "qa@example.com");

    details.assert_async().await;
    testers.assert_async().await;
}

#[tokio::test]
async fn test_review_endpoints() {
    let server = MockServer::start_async().await;
    let get = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/reviews/r-1"))
                .query_param("translationLanguage", "en");
            then.status(200).json_body(json!({ "reviewId": "r-1" }));
        })
        .await;
    let reply = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/reviews/r-1:reply"))
                .json_body(json!({ "replyText": "Thanks!" }));
            then.status(200).json_body(json!({ "result": { "replyText": "Thanks!" } }));
        })
        .await;

    let client = client_for(&server, false);
    let review = client.get_review(PACKAGE, "r-1", Some("en")).await.unwrap();
    assert_eq!(review["reviewId"], "r-1");

    let result = client.reply_review(PACKAGE, "r-1", "Thanks!").await.unwrap();
    assert_eq!(result["result"]["replyText"], "Thanks!");

    get.assert_async().await;
    reply.assert_async().await;
}

#[tokio::test]
async fn test_reviews_paginate_through_token_pagination() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/reviews"))
                .query_param("maxResults", "1")
                .query_param_missing("token");
            then.status(200).json_body(json!({
                "reviews": [{ "reviewId": "r-1" }],
                "tokenPagination": { "nextPageToken": "next-1" }
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/reviews"))
                .query_param("maxResults", "1")
                .query_param("token", "next-1");
            then.status(200).json_body(json!({
                "reviews": [{ "reviewId": "r-2" }],
                "tokenPagination": {}
            }));
        })
        .await;

    let client = client_for(&server, false);
    let query = ReviewQuery {
        max_results: Some(1),
        ..Default::default()
    };
    let reviews = client.list_all_reviews(PACKAGE, &query).await.unwrap();

    assert_eq!(
        reviews,
        json!({ "reviews": [{ "reviewId": "r-1" }, { "reviewId": "r-2" }] })
    );
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_order_endpoints() {
    let server = MockServer::start_async().await;
    let get = server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/orders/GPA.1111"));
            then.status(200).json_body(json!({ "orderId": "GPA.1111" }));
        })
        .await;
    let batch = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/orders:batchGet"))
                .query_param("orderIds", "GPA.1111")
                .query_param("orderIds", "GPA.2222");
            then.status(200)
                .json_body(json!({ "orders": [{ "orderId": "GPA.1111" }, { "orderId": "GPA.2222" }] }));
        })
        .await;
    let refund = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/orders/GPA.1111:refund"))
                .query_param("revoke", "true");
            then.status(204);
        })
        .await;

    let client = client_for(&server, false);
    let order = client.get_order(PACKAGE, "GPA.1111").await.unwrap();
    assert_eq!(order["orderId"], "GPA.1111");

    let ids = vec!["GPA.1111".to_string(), "GPA.2222".to_string()];
    let orders = client.batch_get_orders(PACKAGE, &ids).await.unwrap();
    assert_eq!(orders["orders"].as_array().unwrap().len(), 2);

    assert_eq!(client.refund_order(PACKAGE, "GPA.1111", true).await.unwrap(), json!({}));

    get.assert_async().await;
    batch.assert_async().await;
    refund.assert_async().await;
}

#[tokio::test]
async fn test_purchase_endpoints() {
    let server = MockServer::start_async().await;
    let product = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/purchases/products/coins_100/tokens/tok-1"));
            then.status(200).json_body(json!({ "purchaseState": 0 }));
        })
        .await;
    let acknowledge = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/purchases/products/coins_100/tokens/tok-1:acknowledge"))
                .json_body(json!({ "developerPayload": "p" }));
            then.status(204);
        })
        .await;
    let product_v2 = server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/purchases/productsv2/tokens/tok-2"));
            then.status(200).json_body(json!({ "productLineItem": [] }));
        })
        .await;
    let subscription = server
        .mock_async(|when, then| {
            when.method(GET).path(app_path("/purchases/subscriptionsv2/tokens/tok-3"));
            then.status(200)
                .json_body(json!({ "subscriptionState": "SUBSCRIPTION_STATE_ACTIVE" }));
        })
        .await;
    let voided = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/purchases/voidedpurchases"))
                .query_param("type", "1")
                .query_param("startTime", "1700000000000");
            then.status(200)
                .json_body(json!({ "voidedPurchases": [{ "orderId": "GPA.9" }] }));
        })
        .await;

    let client = client_for(&server, false);
    let value = client
        .get_product_purchase(PACKAGE, "coins_100", "tok-1")
        .await
        .unwrap();
    assert_eq!(value["purchaseState"], 0);

    client
        .acknowledge_product_purchase(PACKAGE, "coins_100", "tok-1", Some("p"))
        .await
        .unwrap();

    let value = client.get_product_purchase_v2(PACKAGE, "tok-2").await.unwrap();
    assert!(value["productLineItem"].is_array());

    let value = client.get_subscription_purchase(PACKAGE, "tok-3").await.unwrap();
    assert_eq!(value["subscriptionState"], "SUBSCRIPTION_STATE_ACTIVE");

    let query = VoidedQuery {
        start_time: Some(1_700_000_000_000),
        voided_type: Some(1),
        ..Default::default()
    };
    let value = client.list_voided_purchases(PACKAGE, &query, None).await.unwrap();
    assert_eq!(value["voidedPurchases"][0]["orderId"], "GPA.9");

    product.assert_async().await;
    acknowledge.assert_async().await;
    product_v2.assert_async().await;
    subscription.assert_async().await;
    voided.assert_async().await;
}

#[tokio::test]
async fn test_base_plan_endpoints() {
    let server = MockServer::start_async().await;
    let activate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/subscriptions/premium/basePlans/monthly:activate"))
                .json_body(json!({}));
            then.status(200)
                .json_body(json!({ "productId": "premium", "basePlans": [] }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path(app_path("/subscriptions/premium/basePlans/monthly"));
            then.status(204);
        })
        .await;
    let batch = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/subscriptions/premium/basePlans:batchUpdateStates"))
                .body_includes(r#""requests""#);
            then.status(200).json_body(json!({ "subscriptions": [] }));
        })
        .await;

    let client = client_for(&server, false);
    client
        .activate_base_plan(PACKAGE, "premium", "monthly")
        .await
        .unwrap();
    client
        .delete_base_plan(PACKAGE, "premium", "monthly")
        .await
        .unwrap();
    client
        .batch_update_base_plan_states(PACKAGE, "premium", json!({ "requests": [] }))
        .await
        .unwrap();

    activate.assert_async().await;
    delete.assert_async().await;
    batch.assert_async().await;
}

#[tokio::test]
async fn test_offers_paginate() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/subscriptions/premium/basePlans/monthly/offers"))
                .query_param("pageSize", "1")
                .query_param_missing("pageToken");
            then.status(200).json_body(json!({
                "subscriptionOffers": [{ "offerId": "trial" }],
                "nextPageToken": "p2"
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(app_path("/subscriptions/premium/basePlans/monthly/offers"))
                .query_param("pageToken", "p2");
            then.status(200).json_body(json!({
                "subscriptionOffers": [{ "offerId": "intro" }]
            }));
        })
        .await;

    let client = client_for(&server, false);
    let offers = client
        .list_all_offers(PACKAGE, "premium", "monthly", Some(1))
        .await
        .unwrap();

    assert_eq!(
        offers,
        json!({ "subscriptionOffers": [{ "offerId": "trial" }, { "offerId": "intro" }] })
    );
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_create_offer_sets_identity_fields() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/subscriptions/premium/basePlans/monthly/offers"))
                .query_param("offerId", "trial")
                .query_param("regionsVersion.version", "2022/02")
                .json_body(json!({
                    "phases": [{ "duration": "P1W" }],
                    "packageName": PACKAGE,
                    "productId": "premium",
                    "basePlanId": "monthly",
                    "offerId": "trial"
                }));
            then.status(200).json_body(json!({ "offerId": "trial" }));
        })
        .await;

    let client = client_for(&server, false);
    let offer = client
        .create_offer(
            PACKAGE,
            "premium",
            "monthly",
            "trial",
            json!({ "phases": [{ "duration": "P1W" }] }),
            "2022/02",
        )
        .await
        .unwrap();

    assert_eq!(offer, json!({ "offerId": "trial" }));
    create.assert_async().await;
}

#[tokio::test]
async fn test_batch_get_offers_runs_in_dry_run() {
    let server = MockServer::start_async().await;
    let batch = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/subscriptions/premium/basePlans/monthly/offers:batchGet"))
                .body_includes(r#""offerId":"trial""#)
                .body_includes(r#""offerId":"intro""#);
            then.status(200)
                .json_body(json!({ "subscriptionOffers": [{ "offerId": "trial" }] }));
        })
        .await;
    let activate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(app_path("/subscriptions/premium/basePlans/monthly/offers/trial:activate"));
            then.status(200).json_body(json!({}));
        })
        .await;

    let client = client_for(&server, true);
    let ids = vec!["trial".to_string(), "intro".to_string()];
    let result = client
        .batch_get_offers(PACKAGE, "premium", "monthly", &ids)
        .await
        .unwrap();
    assert_eq!(result["subscriptionOffers"][0]["offerId"], "trial");

    client
        .activate_offer(PACKAGE, "premium", "monthly", "trial")
        .await
        .unwrap();

    batch.assert_async().await;
    activate.assert_calls_async(0).await;
}
