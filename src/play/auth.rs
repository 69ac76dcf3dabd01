use std::{sync::Arc, time::Duration};

use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    Error, Res, info,
    management::{
        service_account::SCOPES,
        token::{self, StoredToken},
    },
    server::{bind_loopback, start_callback_server},
    types::PkceState,
    utils, warning,
};

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct BrowserLoginOptions {
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub auth_url: String,
    pub token_url: String,
}

impl BrowserLoginOptions {
    pub fn new(client_id: &str, client_secret: &str, timeout: Duration) -> Self {
        BrowserLoginOptions {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            timeout,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: token::GOOGLE_TOKEN_URL.to_string(),
        }
    }
}

/// Runs the installed-app OAuth flow with PKCE and returns the obtained token.
///
/// The flow:
/// 1. Binds a callback server on `127.0.0.1` with an ephemeral port
/// 2. Generates the PKCE verifier/challenge pair and a random `state`
/// 3. Opens the consent page in the default browser (or prints the URL)
/// 4. Waits for the callback to deliver the authorization code
/// 5. Exchanges the code together with the verifier for tokens
///
/// The callback server is stopped before this function returns, whether the
/// login succeeded or not.
///
/// # Errors
///
/// Fails when the user denies access, the callback carries a mismatched
/// `state`, no callback arrives within `options.timeout`, or the token
/// endpoint rejects the exchange.
pub async fn browser_login(options: &BrowserLoginOptions) -> Res<StoredToken> {
    let (listener, port) = bind_loopback().await?;
    let redirect_uri = format!("http://127.0.0.1:{port}/callback");

    // generate PKCE verifier and challenge
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let state = utils::generate_state();

    let shared_state = Arc::new(Mutex::new(PkceState {
        state: state.clone(),
        ..PkceState::default()
    }));

    let server_state = Arc::clone(&shared_state);
    let server = tokio::spawn(async move { start_callback_server(listener, server_state).await });

    let auth_url = authorization_url(
        &options.auth_url,
        &options.client_id,
        &redirect_uri,
        &state,
        &code_challenge,
    )?;

    info!("Opening browser for Google sign-in...");
    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let code = wait_for_code(shared_state, options.timeout).await;
    server.abort();
    let code = code?;

    exchange_code(
        &options.token_url,
        &options.client_id,
        &options.client_secret,
        &code,
        &code_verifier,
        &redirect_uri,
    )
    .await
}

/// Builds the Google consent URL for an offline-access PKCE login.
pub fn authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    code_challenge: &str,
) -> Res<String> {
    let scope = SCOPES.join(" ");
    let url = Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| Error::usage(format!("invalid authorization URL: {e}")))?;
    Ok(url.to_string())
}

/// Polls the shared state until the callback recorded a code or an error.
pub async fn wait_for_code(shared_state: Arc<Mutex<PkceState>>, max_wait: Duration) -> Res<String> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(error) = &lock.error {
            return Err(Error::auth("browser authentication failed", error, ""));
        }
        if let Some(code) = &lock.code {
            return Ok(code.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Err(Error::auth(
        "browser authentication failed",
        format!("timed out after {}s waiting for the OAuth callback", max_wait.as_secs()),
        "Re-run `gplay auth login` and complete the sign-in in the browser, or raise --timeout.",
    ))
}

/// Exchanges an authorization code and its PKCE verifier for tokens.
pub async fn exchange_code(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Res<StoredToken> {
    let client = Client::new();
    let res = token::request_token(
        &client,
        token_url,
        &[
            ("grant_type", "authorization_code"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await?;

    Ok(StoredToken {
        expiry: res.expiry(),
        access_token: res.access_token,
        token_type: res.token_type,
        refresh_token: res.refresh_token.unwrap_or_default(),
    })
}
