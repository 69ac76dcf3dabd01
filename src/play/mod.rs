//! # Google Play Integration Module
//!
//! This module provides the interface to the Google Play Android Publisher API
//! (v3) and the Play Developer Reporting API (v1beta1). It is the layer between
//! the CLI commands and Google's REST endpoints and owns every HTTP detail:
//! bearer authentication, timeouts, error decoding, retries and dry-run mode.
//!
//! ## Architecture
//!
//! ```text
//! CLI commands / release workflows
//!          ↓
//! PlayClient (this module)
//!     ├── edits       - edits, tracks, listings, images, details, testers
//!     ├── artifacts   - bundles, APKs, deobfuscation files
//!     ├── reviews     - user reviews and replies
//!     ├── monetization - in-app products and subscriptions
//!     ├── purchases   - purchases, voided purchases, orders
//!     └── reporting   - vitals metric sets and anomalies
//!          ↓
//! reqwest (HTTPS, JSON)
//! ```
//!
//! Responses are returned as `serde_json::Value` unless a workflow needs to
//! read and modify them, in which case the typed structs from
//! [`crate::types`] are used.
//!
//! ## Error Handling
//!
//! Non-2xx responses become [`Error::Api`] carrying the HTTP status and the
//! message from Google's `{"error": {"message": ...}}` envelope. Idempotent
//! GET requests answered with 502 or 503 are retried a few times with a
//! linear backoff. Writes are never retried.
//!
//! ## Dry Run
//!
//! With `--dry-run`, POST/PUT/PATCH/DELETE requests are printed to stderr and
//! answered locally with `{}`. Creating an edit is the one exception: an edit
//! is a private draft until it is committed, and the release workflows need a
//! real edit ID to read the current track state.

pub mod artifacts;
pub mod auth;
pub mod edits;
pub mod monetization;
pub mod purchases;
pub mod reporting;
pub mod reviews;

use std::{collections::HashSet, sync::Arc, time::Duration};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, Method, StatusCode, Url, header::CONTENT_TYPE};
use serde_json::{Value, json};
use tokio::{sync::Mutex, time::sleep};

use crate::{Error, Res, debug, management::credentials::TokenSource};

pub const PUBLISHER_ROOT: &str = "https://androidpublisher.googleapis.com";
pub const REPORTING_ROOT: &str = "https://playdeveloperreporting.googleapis.com";

const MAX_RETRIES: u32 = 3;

/// Characters escaped inside a single path segment. `:` is included because
/// Google uses it to separate custom methods (`/orders/{id}:refund`).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');
const MAX_DRY_RUN_BODY: usize = 2048;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub publisher_root: String,
    pub reporting_root: String,
    pub timeout: Option<Duration>,
    pub upload_timeout: Option<Duration>,
    pub retry_backoff: Duration,
    pub dry_run: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            publisher_root: PUBLISHER_ROOT.to_string(),
            reporting_root: REPORTING_ROOT.to_string(),
            timeout: None,
            upload_timeout: None,
            retry_backoff: Duration::from_secs(1),
            dry_run: false,
        }
    }
}

enum Body {
    Empty,
    Json(Value),
    Media { content_type: String, data: Vec<u8> },
}

struct Call<'a> {
    method: Method,
    url: &'a str,
    query: &'a [(&'a str, String)],
    body: Body,
    timeout: Option<Duration>,
    dry_run_exempt: bool,
}

pub struct PlayClient {
    http: Client,
    settings: ClientSettings,
    tokens: Arc<Mutex<TokenSource>>,
}

impl PlayClient {
    pub fn new(settings: ClientSettings, tokens: TokenSource) -> Self {
        PlayClient {
            http: Client::new(),
            settings,
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    /// Writes are answered locally instead of reaching the API.
    pub fn is_dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// `{root}/androidpublisher/v3/applications/{package}{path}`
    pub fn app_url(&self, package: &str, path: &str) -> String {
        format!(
            "{}/androidpublisher/v3/applications/{}{}",
            self.settings.publisher_root.trim_end_matches('/'),
            package,
            path
        )
    }

    /// Media upload endpoint for the same resource path as [`Self::app_url`].
    pub fn upload_url(&self, package: &str, path: &str) -> String {
        format!(
            "{}/upload/androidpublisher/v3/applications/{}{}",
            self.settings.publisher_root.trim_end_matches('/'),
            package,
            path
        )
    }

    pub fn reporting_url(&self, path: &str) -> String {
        format!(
            "{}/v1beta1/{}",
            self.settings.reporting_root.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Res<Value> {
        self.execute(Call {
            method: Method::GET,
            url,
            query,
            body: Body::Empty,
            timeout: self.settings.timeout,
            dry_run_exempt: false,
        })
        .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Res<Value> {
        self.execute(Call {
            method,
            url,
            query,
            body: body.map(Body::Json).unwrap_or(Body::Empty),
            timeout: self.settings.timeout,
            dry_run_exempt: false,
        })
        .await
    }

    /// Sends a write that still reaches the API in dry-run mode.
    pub(crate) async fn send_json_always(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Res<Value> {
        self.execute(Call {
            method,
            url,
            query: &[],
            body: body.map(Body::Json).unwrap_or(Body::Empty),
            timeout: self.settings.timeout,
            dry_run_exempt: true,
        })
        .await
    }

    /// Uploads raw bytes to a media endpoint (`uploadType=media`).
    pub async fn upload(
        &self,
        url: &str,
        query: &[(&str, String)],
        content_type: &str,
        data: Vec<u8>,
    ) -> Res<Value> {
        let mut params = vec![("uploadType", "media".to_string())];
        params.extend(query.iter().cloned());
        self.execute(Call {
            method: Method::POST,
            url,
            query: &params,
            body: Body::Media {
                content_type: content_type.to_string(),
                data,
            },
            timeout: self.settings.upload_timeout,
            dry_run_exempt: false,
        })
        .await
    }

    async fn execute(&self, call: Call<'_>) -> Res<Value> {
        if self.settings.dry_run && call.method != Method::GET && !call.dry_run_exempt {
            let body = match &call.body {
                Body::Empty => None,
                Body::Json(value) => Some(value.to_string()),
                Body::Media { content_type, data } => {
                    Some(format!("<{} bytes of {}>", data.len(), content_type))
                }
            };
            let url = display_url(call.url, call.query);
            eprint!("{}", dry_run_report(call.method.as_str(), &url, body.as_deref()));
            return Ok(json!({}));
        }

        let mut body = Some(call.body);
        let mut attempt = 0;
        loop {
            let token = self.tokens.lock().await.access_token().await?;
            let mut request = self
                .http
                .request(call.method.clone(), call.url)
                .bearer_auth(token);
            if !call.query.is_empty() {
                request = request.query(call.query);
            }
            if let Some(timeout) = call.timeout {
                request = request.timeout(timeout);
            }
            request = match body.take() {
                None | Some(Body::Empty) => request,
                Some(Body::Json(value)) => request.json(&value),
                Some(Body::Media { content_type, data }) => {
                    request.header(CONTENT_TYPE, content_type).body(data)
                }
            };

            debug!("{} {}", call.method, call.url);
            let response = request.send().await?;
            let status = response.status();
            debug!("{} {} -> {}", call.method, call.url, status.as_u16());

            if status.is_success() {
                let text = response.text().await?;
                if text.trim().is_empty() {
                    return Ok(json!({}));
                }
                return Ok(serde_json::from_str(&text)?);
            }

            if call.method == Method::GET
                && matches!(status, StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE)
                && attempt < MAX_RETRIES
            {
                attempt += 1;
                debug!("retrying {} (attempt {})", call.url, attempt + 1);
                sleep(self.settings.retry_backoff * attempt).await;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(api_error(&call.method, call.url, status, &text));
        }
    }
}

/// Percent-encodes an ID before it is placed in a URL path.
pub fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

fn display_url(url: &str, query: &[(&str, String)]) -> String {
    match Url::parse_with_params(url, query) {
        Ok(parsed) if !query.is_empty() => parsed.to_string(),
        _ => url.to_string(),
    }
}

/// The lines printed for a write intercepted by `--dry-run`.
pub fn dry_run_report(method: &str, url: &str, body: Option<&str>) -> String {
    let mut report = format!("[DRY RUN] {method} {url}\n");
    if let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) {
        if body.chars().count() > MAX_DRY_RUN_BODY {
            let short: String = body.chars().take(MAX_DRY_RUN_BODY).collect();
            report.push_str(&format!("[DRY RUN] Body: {short}... (truncated)\n"));
        } else {
            report.push_str(&format!("[DRY RUN] Body: {body}\n"));
        }
    }
    report.push_str("[DRY RUN] No changes were made.\n");
    report
}

fn api_error(method: &Method, url: &str, status: StatusCode, body: &str) -> Error {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    Error::Api {
        method: method.to_string(),
        path,
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

/// Extracts the message from Google's error envelope, falling back to the raw body.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Follows page tokens until the API stops returning one, collecting `field` from every page.
///
/// A token the API already handed out ends the walk with an error.
///
/// Reviews report their token under `tokenPagination.nextPageToken`, the other
/// list endpoints use a top-level `nextPageToken`.
pub async fn collect_pages<F, Fut>(field: &str, mut fetch: F) -> Res<Value>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Res<Value>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = fetch(page_token.take()).await?;
        if let Some(Value::Array(page_items)) = page.get(field) {
            items.extend(page_items.iter().cloned());
        }

        match next_page_token(&page) {
            None => break,
            Some(token) if !seen.insert(token.clone()) => {
                return Err(Error::usage(format!(
                    "pagination stopped: page token {token:?} was returned twice"
                )));
            }
            Some(token) => page_token = Some(token),
        }
    }

    let mut result = serde_json::Map::new();
    result.insert(field.to_string(), Value::Array(items));
    Ok(Value::Object(result))
}

pub fn next_page_token(page: &Value) -> Option<String> {
    page.pointer("/tokenPagination/nextPageToken")
        .or_else(|| page.get("nextPageToken"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
