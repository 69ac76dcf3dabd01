//! Google Play Console CLI Library
//!
//! This library provides the building blocks of the `gplay` command-line tool:
//! configuration and credential resolution, an authenticated transport for the
//! Android Publisher and Play Developer Reporting APIs, the release workflows
//! built on top of edits, and output rendering.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration file, profiles and environment settings
//! - `error` - Crate error type and the `Res` alias
//! - `management` - Credentials, token lifecycle and release workflows
//! - `output` - JSON, table and markdown rendering
//! - `play` - Google Play API client implementation
//! - `server` - Local HTTP server for OAuth callbacks
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```ignore
//! use gplay::{config, management::credentials};
//!
//! #[tokio::main]
//! async fn main() -> gplay::Res<()> {
//!     config::load_env().await;
//!     let env = config::Environment::from_process();
//!     let cfg = config::load_optional(&env).await?;
//!     let resolved = credentials::resolve_credentials(cfg.as_ref(), &env)?;
//!     println!("using {:?}", resolved.source);
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod output;
pub mod play;
pub mod server;
pub mod types;
pub mod utils;

pub use error::{Error, Res};

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Turns request tracing on or off for the rest of the process.
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

/// Returns whether request tracing was enabled with `--debug` or `GPLAY_DEBUG`.
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Prints an informational message with a blue bullet point.
///
/// Status output goes to stderr so that stdout only ever carries the
/// rendered API response.
///
/// # Example
///
/// ```ignore
/// info!("Creating edit...");
/// info!("Found {} releases", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```ignore
/// success!("Rollout updated successfully");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only `main` uses this; library code returns [`Error`] instead.
///
/// # Behavior
///
/// This macro will cause the program to exit with status 1 immediately
/// after printing the error message.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```ignore
/// warning!("invalid GPLAY_DEFAULT_OUTPUT value {:?}, falling back to json", value);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a dimmed trace line when debugging is enabled.
#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => ({
    if $crate::debug_enabled() {
      use colored::Colorize;
      eprintln!("[{}] {}", "·".dimmed(), std::format_args!($($arg)*).to_string().dimmed());
    }
  })
}
