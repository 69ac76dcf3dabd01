use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::NaiveDate;
use rand::{Rng, RngCore, distr::Alphanumeric};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::{Error, Res};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random, URL-safe value used to tie a callback to the login that started it.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Parses a JSON flag value given either inline or as `@path/to/file.json`.
pub async fn load_json_arg<T: DeserializeOwned>(value: &str) -> Res<T> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::usage("empty json value"));
    }

    if let Some(path) = trimmed.strip_prefix('@') {
        let path = path.trim();
        if path.is_empty() {
            return Err(Error::usage("invalid @file path"));
        }
        let content = async_fs::read_to_string(path).await?;
        return Ok(serde_json::from_str(&content)?);
    }

    Ok(serde_json::from_str(trimmed)?)
}

/// Splits a comma separated flag value, dropping empty entries.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_date(value: &str) -> Res<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::usage(format!("invalid date {value:?}, expected YYYY-MM-DD")))
}

/// Checks that a rollout fraction lies in `(0, 1)`, or `(0, 1]` when `allow_full` is set.
pub fn validate_fraction(flag: &str, fraction: f64, allow_full: bool) -> Res<f64> {
    let in_range = if allow_full {
        fraction > 0.0 && fraction <= 1.0
    } else {
        fraction > 0.0 && fraction < 1.0
    };
    if !in_range || !fraction.is_finite() {
        let range = if allow_full { "(0, 1]" } else { "(0, 1)" };
        return Err(Error::usage(format!("{flag} must be in {range}")));
    }
    Ok(fraction)
}

/// Fails with a usage error unless `value` is set and non-blank.
pub fn require<'a>(value: Option<&'a str>, flag: &str) -> Res<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::usage(format!("{flag} is required")))
}

pub fn require_confirm(confirm: bool) -> Res<()> {
    if confirm {
        Ok(())
    } else {
        Err(Error::usage("--confirm is required"))
    }
}
