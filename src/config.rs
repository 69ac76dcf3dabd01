//! Configuration management for the Google Play Console CLI.
//!
//! This module handles loading and saving `config.json`, the optional `.env`
//! file, and every `GPLAY_*` environment variable the CLI reads. It provides a
//! centralized way to resolve the active auth profile, the target package and
//! request timeouts.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Command-line flags (highest priority)
//! 2. Environment variables
//! 3. `config.json` (local `./.gplay/config.json` before `~/.gplay/config.json`)
//! 4. Application defaults (where applicable)

use std::{
    env, fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Res};

pub const CONFIG_DIR_NAME: &str = ".gplay";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const CONFIG_PATH_ENV: &str = "GPLAY_CONFIG_PATH";
pub const PROFILE_ENV: &str = "GPLAY_PROFILE";
pub const PACKAGE_ENV: &str = "GPLAY_PACKAGE_NAME";
pub const STRICT_AUTH_ENV: &str = "GPLAY_STRICT_AUTH";
pub const TIMEOUT_ENV: &str = "GPLAY_TIMEOUT";
pub const TIMEOUT_SECONDS_ENV: &str = "GPLAY_TIMEOUT_SECONDS";
pub const UPLOAD_TIMEOUT_ENV: &str = "GPLAY_UPLOAD_TIMEOUT";
pub const UPLOAD_TIMEOUT_SECONDS_ENV: &str = "GPLAY_UPLOAD_TIMEOUT_SECONDS";
pub const DEFAULT_OUTPUT_ENV: &str = "GPLAY_DEFAULT_OUTPUT";
pub const DEBUG_ENV: &str = "GPLAY_DEBUG";
pub const SERVICE_ACCOUNT_ENV: &str = "GPLAY_SERVICE_ACCOUNT_JSON";
pub const OAUTH_TOKEN_ENV: &str = "GPLAY_OAUTH_TOKEN_PATH";
pub const OAUTH_CLIENT_ID_ENV: &str = "GPLAY_OAUTH_CLIENT_ID";
pub const OAUTH_CLIENT_SECRET_ENV: &str = "GPLAY_OAUTH_CLIENT_SECRET";

/// A duration stored together with the raw text it was parsed from.
///
/// Accepts Go-style durations (`90s`, `1h30m`, `250ms`) or a bare number of
/// seconds, and serializes back to the raw text so that hand-edited config
/// files survive a load/save cycle unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationValue {
    pub duration: Option<Duration>,
    pub raw: String,
}

impl DurationValue {
    pub fn parse(raw: &str) -> Res<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let duration = parse_duration(raw)?;
        Ok(Self {
            duration: Some(duration),
            raw: raw.to_string(),
        })
    }

    /// Returns the duration if it is positive.
    pub fn value(&self) -> Option<Duration> {
        self.duration.filter(|d| !d.is_zero())
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.raw.trim().is_empty() {
            return write!(f, "{}", self.raw);
        }
        match self.duration {
            Some(d) => write!(f, "{}s", d.as_secs()),
            None => Ok(()),
        }
    }
}

impl Serialize for DurationValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DurationValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawDuration {
            Text(String),
            Seconds(u64),
        }

        let raw = match Option::<RawDuration>::deserialize(deserializer)? {
            Some(RawDuration::Text(s)) => s.trim().to_string(),
            Some(RawDuration::Seconds(n)) => n.to_string(),
            None => String::new(),
        };
        // an unparsable value disables the timeout instead of rejecting the file
        let duration = if raw.is_empty() {
            None
        } else {
            parse_duration(&raw).ok()
        };
        Ok(DurationValue { duration, raw })
    }
}

/// Parses a Go-style duration string or an integer number of seconds.
///
/// # Example
///
/// ```ignore
/// assert_eq!(parse_duration("1m30s")?, Duration::from_secs(90));
/// assert_eq!(parse_duration("45")?, Duration::from_secs(45));
/// ```
pub fn parse_duration(raw: &str) -> Res<Duration> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    let invalid = || Error::usage(format!("invalid duration {raw:?}"));
    if raw.is_empty() {
        return Err(invalid());
    }

    let mut total = 0f64;
    let mut rest = raw;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let factor = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total += value * factor;
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

/// Stores a named auth profile in config.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
}

/// Holds the application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_profile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_name: String,
    #[serde(default)]
    pub timeout: DurationValue,
    #[serde(default)]
    pub timeout_seconds: DurationValue,
    #[serde(default)]
    pub upload_timeout: DurationValue,
    #[serde(default)]
    pub upload_timeout_seconds: DurationValue,
    #[serde(default)]
    pub debug: String,
}

impl Config {
    pub fn find_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Inserts the profile, replacing any existing profile with the same name.
    pub fn upsert_profile(&mut self, profile: Profile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Removes the named profile and clears it as default. Returns whether it existed.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.name != name);
        let removed = self.profiles.len() != before;
        if removed && self.default_profile == name {
            self.default_profile.clear();
        }
        removed
    }
}

/// Snapshot of every environment variable the CLI reads.
///
/// Resolution logic takes this struct instead of calling `std::env` so that
/// it can be exercised without touching process state.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub config_path: Option<String>,
    pub profile: Option<String>,
    pub package_name: Option<String>,
    pub strict_auth: Option<String>,
    pub timeout: Option<String>,
    pub timeout_seconds: Option<String>,
    pub upload_timeout: Option<String>,
    pub upload_timeout_seconds: Option<String>,
    pub default_output: Option<String>,
    pub debug: Option<String>,
    pub service_account_path: Option<String>,
    pub oauth_token_path: Option<String>,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub cwd: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            config_path: non_empty_var(CONFIG_PATH_ENV),
            profile: non_empty_var(PROFILE_ENV),
            package_name: non_empty_var(PACKAGE_ENV),
            strict_auth: non_empty_var(STRICT_AUTH_ENV),
            timeout: non_empty_var(TIMEOUT_ENV),
            timeout_seconds: non_empty_var(TIMEOUT_SECONDS_ENV),
            upload_timeout: non_empty_var(UPLOAD_TIMEOUT_ENV),
            upload_timeout_seconds: non_empty_var(UPLOAD_TIMEOUT_SECONDS_ENV),
            default_output: non_empty_var(DEFAULT_OUTPUT_ENV),
            debug: non_empty_var(DEBUG_ENV),
            service_account_path: non_empty_var(SERVICE_ACCOUNT_ENV),
            oauth_token_path: non_empty_var(OAUTH_TOKEN_ENV),
            oauth_client_id: non_empty_var(OAUTH_CLIENT_ID_ENV),
            oauth_client_secret: non_empty_var(OAUTH_CLIENT_SECRET_ENV),
            cwd: env::current_dir().ok(),
            home: dirs::home_dir(),
        }
    }

    /// Returns true when either env credential variable is set.
    pub fn auth_present(&self) -> bool {
        non_empty(&self.service_account_path).is_some() || non_empty(&self.oauth_token_path).is_some()
    }

    pub fn service_account_path(&self) -> Option<&str> {
        non_empty(&self.service_account_path)
    }

    pub fn oauth_token_path(&self) -> Option<&str> {
        non_empty(&self.oauth_token_path)
    }

    pub fn oauth_client_id(&self) -> Option<&str> {
        non_empty(&self.oauth_client_id)
    }

    pub fn oauth_client_secret(&self) -> Option<&str> {
        non_empty(&self.oauth_client_secret)
    }

    pub fn default_output(&self) -> Option<&str> {
        non_empty(&self.default_output)
    }

    fn home_dir(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Parses a boolean the way Go's `strconv.ParseBool` does.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Returns the directory holding the global config, tokens and `.env`.
pub fn config_dir(env: &Environment) -> PathBuf {
    env.home_dir().join(CONFIG_DIR_NAME)
}

/// Returns the global configuration file path (`~/.gplay/config.json`).
pub fn global_path(env: &Environment) -> PathBuf {
    config_dir(env).join(CONFIG_FILE_NAME)
}

/// Returns the repository-local configuration file path (`./.gplay/config.json`).
pub fn local_path(env: &Environment) -> PathBuf {
    env.cwd
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Returns the active configuration file path.
///
/// `GPLAY_CONFIG_PATH` wins, then an existing local config, then the global one.
pub fn resolve_path(env: &Environment) -> PathBuf {
    if let Some(path) = non_empty(&env.config_path) {
        return PathBuf::from(path);
    }

    let local = local_path(env);
    if local.is_file() {
        return local;
    }

    global_path(env)
}

/// Loads environment variables from `~/.gplay/.env` when the file exists.
///
/// Variables already present in the process environment are not overridden.
pub async fn load_env() {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(CONFIG_DIR_NAME);
    path.push(".env");
    if async_fs::metadata(&path).await.is_ok() {
        if let Err(e) = dotenv::from_path(&path) {
            crate::warning!("Cannot load {}: {}", path.display(), e);
        }
    }
}

/// Reads configuration from a specific path.
pub async fn load_at(path: &Path) -> Res<Config> {
    let content = match async_fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::ConfigNotFound),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| {
        Error::config(
            "failed to load config",
            format!("{}: {}", path.display(), e),
            "Check that your config file is valid JSON and readable. Use `gplay auth init` to recreate it.",
        )
    })
}

/// Reads the active configuration file.
pub async fn load(env: &Environment) -> Res<Config> {
    load_at(&resolve_path(env)).await
}

/// Reads the active configuration, treating a missing file as no configuration.
pub async fn load_optional(env: &Environment) -> Res<Option<Config>> {
    match load(env).await {
        Ok(cfg) => Ok(Some(cfg)),
        Err(Error::ConfigNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes configuration to a specific path with owner-only permissions.
pub async fn save_at(path: &Path, cfg: &Config) -> Res<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(cfg)?;
    write_private(path, json.as_bytes()).await
}

/// Writes a file readable only by the current user.
pub async fn write_private(path: &Path, content: &[u8]) -> Res<()> {
    async_fs::write(path, content).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        async_fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

/// Returns the selected profile name.
pub fn resolve_profile_name(cfg: Option<&Config>, env: &Environment) -> Option<String> {
    if let Some(profile) = non_empty(&env.profile) {
        return Some(profile.to_string());
    }

    let cfg = cfg?;
    let default = cfg.default_profile.trim();
    if !default.is_empty() {
        return Some(default.to_string());
    }
    if cfg.profiles.len() == 1 {
        return Some(cfg.profiles[0].name.clone());
    }
    None
}

/// Returns a package name from flag, environment or config, in that order.
pub fn resolve_package_name(
    flag: Option<&str>,
    cfg: Option<&Config>,
    env: &Environment,
) -> Option<String> {
    if let Some(flag) = flag.map(str::trim).filter(|f| !f.is_empty()) {
        return Some(flag.to_string());
    }
    if let Some(package) = non_empty(&env.package_name) {
        return Some(package.to_string());
    }
    cfg.map(|c| c.package_name.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

pub fn strict_auth_enabled(env: &Environment) -> bool {
    non_empty(&env.strict_auth)
        .and_then(parse_bool)
        .unwrap_or(false)
}

pub fn debug_enabled(cfg: Option<&Config>, env: &Environment) -> bool {
    if let Some(value) = non_empty(&env.debug) {
        return parse_bool(value).unwrap_or(false);
    }
    cfg.and_then(|c| parse_bool(&c.debug)).unwrap_or(false)
}

/// Request and upload timeouts. `None` means the request may take as long as it needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Option<Duration>,
    pub upload: Option<Duration>,
}

pub fn resolve_timeouts(cfg: Option<&Config>, env: &Environment) -> Timeouts {
    let defaults = Config::default();
    let cfg = cfg.unwrap_or(&defaults);
    Timeouts {
        request: resolve_timeout(
            &env.timeout,
            &env.timeout_seconds,
            &cfg.timeout,
            &cfg.timeout_seconds,
        ),
        upload: resolve_timeout(
            &env.upload_timeout,
            &env.upload_timeout_seconds,
            &cfg.upload_timeout,
            &cfg.upload_timeout_seconds,
        ),
    }
}

fn resolve_timeout(
    env_value: &Option<String>,
    env_seconds: &Option<String>,
    value: &DurationValue,
    seconds: &DurationValue,
) -> Option<Duration> {
    let positive = |d: Duration| (!d.is_zero()).then_some(d);

    if let Some(raw) = non_empty(env_value) {
        if let Ok(d) = parse_duration(raw) {
            return positive(d);
        }
    }
    if let Some(raw) = non_empty(env_seconds) {
        if let Ok(n) = raw.parse::<u64>() {
            return positive(Duration::from_secs(n));
        }
    }
    value.value().or_else(|| seconds.value())
}
