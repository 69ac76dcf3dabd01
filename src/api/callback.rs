use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::PkceState;

const SUCCESS_PAGE: &str = "<h2>Authentication successful.</h2><p>You can close this window and return to the terminal.</p>";

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<PkceState>>>,
) -> Html<String> {
    let mut state = shared_state.lock().await;

    if let Some(error) = params.get("error") {
        let message = match params.get("error_description") {
            Some(description) => format!("{error}: {description}"),
            None => error.clone(),
        };
        state.error = Some(format!("authorization failed: {message}"));
        return failure_page("Authorization was denied.");
    }

    if params.get("state").map(String::as_str) != Some(state.state.as_str()) {
        state.error = Some("state mismatch in OAuth callback".to_string());
        return failure_page("Invalid state parameter.");
    }

    match params.get("code").filter(|code| !code.is_empty()) {
        Some(code) => {
            state.code = Some(code.clone());
            Html(SUCCESS_PAGE.to_string())
        }
        None => {
            state.error = Some("missing authorization code in OAuth callback".to_string());
            failure_page("Missing authorization code.")
        }
    }
}

fn failure_page(reason: &str) -> Html<String> {
    Html(format!(
        "<h2>Authentication failed.</h2><p>{reason}</p><p>Return to the terminal for details.</p>"
    ))
}
