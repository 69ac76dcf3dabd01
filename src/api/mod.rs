//! # API Module
//!
//! HTTP handlers for the short-lived local server started by `gplay auth login`.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the redirect from Google's consent page. It checks
//!   the `state` parameter against the one generated for this login, records
//!   the authorization code (or the error Google reported) in the shared
//!   [`PkceState`](crate::types::PkceState), and renders a small page telling
//!   the user to return to the terminal.
//!
//! The code exchange itself happens in [`crate::play::auth`] once the login
//! flow sees the code, so the handler never performs network calls.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//!
//! let app = Router::new().route("/callback", get(api::callback).layer(Extension(state)));
//! ```

mod callback;

pub use callback::callback;
