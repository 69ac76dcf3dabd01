//! Error type shared by every layer of the CLI.
//!
//! Errors carry enough context to print an actionable message: the operation
//! that failed, the underlying cause and, where one is known, a hint telling
//! the user what to check next.

use thiserror::Error;

/// A convenient Result type alias for operations that may fail.
pub type Res<T> = std::result::Result<T, Error>;

/// Broad classification used to pick hints and exit messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Config,
    Auth,
    Permission,
    NotFound,
    Validation,
    Other,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing command-line input.
    #[error("{0}")]
    Usage(String),

    #[error("configuration not found")]
    ConfigNotFound,

    #[error("{op}: {cause}")]
    Config {
        op: String,
        cause: String,
        hint: Option<String>,
    },

    #[error("{op}: {cause}")]
    Auth {
        op: String,
        cause: String,
        hint: Option<String>,
    },

    /// A non-2xx response from a Google API.
    #[error("{method} {path} returned {status}: {message}")]
    Api {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    #[error("{op}: {source}")]
    Context {
        op: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    pub fn auth(op: impl Into<String>, cause: impl ToString, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        Error::Auth {
            op: op.into(),
            cause: cause.to_string(),
            hint: (!hint.trim().is_empty()).then_some(hint),
        }
    }

    pub fn config(op: impl Into<String>, cause: impl ToString, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        Error::Config {
            op: op.into(),
            cause: cause.to_string(),
            hint: (!hint.trim().is_empty()).then_some(hint),
        }
    }

    /// Wraps the error with the name of the step that failed.
    pub fn context(self, op: impl Into<String>) -> Self {
        Error::Context {
            op: op.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_) => ErrorKind::Usage,
            Error::ConfigNotFound | Error::Config { .. } => ErrorKind::Config,
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Api { status, .. } => match *status {
                401 => ErrorKind::Auth,
                403 => ErrorKind::Permission,
                404 => ErrorKind::NotFound,
                400 => ErrorKind::Validation,
                _ => ErrorKind::Other,
            },
            Error::Context { source, .. } => source.kind(),
            Error::Json(_) => ErrorKind::Validation,
            Error::Io(_) | Error::Http(_) => ErrorKind::Other,
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            Error::Auth { hint, .. } | Error::Config { hint, .. } => hint.clone(),
            Error::ConfigNotFound => {
                Some("Run `gplay auth init` or `gplay auth login` to create one.".to_string())
            }
            Error::Api { .. } => match self.kind() {
                ErrorKind::Auth => Some(
                    "Check that the service account or OAuth token is valid and has access to the Play Console."
                        .to_string(),
                ),
                ErrorKind::Permission => Some(
                    "Check that the account has access to the app and the required Play Console permission (for uploads, Release Manager is typically required)."
                        .to_string(),
                ),
                ErrorKind::NotFound => Some(
                    "Check that the package name, edit ID, and resource IDs are correct."
                        .to_string(),
                ),
                ErrorKind::Validation => Some(
                    "Check request parameters and file type. Use --help to verify flags."
                        .to_string(),
                ),
                _ => None,
            },
            Error::Context { source, .. } => source.hint(),
            _ => None,
        }
    }

    /// Renders the error and its hint the way `main` prints it.
    pub fn report(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n\nHint: {hint}"),
            None => self.to_string(),
        }
    }
}

/// Adds step context to fallible results.
pub trait ResultExt<T> {
    fn context(self, op: &str) -> Res<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, op: &str) -> Res<T> {
        self.map_err(|e| e.into().context(op))
    }
}
