use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEdit {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expiry_time_seconds: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalizedText {
    pub language: String,
    pub text: String,
}

/// A release on a track. Fields this CLI does not touch are kept in `extra`
/// so that an update sends them back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_notes: Vec<LocalizedText>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_fraction: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub video: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetails {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact_phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact_website: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testers {
    #[serde(default)]
    pub google_groups: Vec<String>,
}

/// Result of one of the staged-rollout commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutResult {
    pub edit_id: String,
    pub package_name: String,
    pub track: String,
    pub status: String,
    pub version_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_fraction: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResult {
    pub edit_id: String,
    pub package_name: String,
    pub from_track: String,
    pub to_track: String,
    pub version_codes: Vec<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_fraction: Option<f64>,
}

/// Result of the one-shot `release` command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResult {
    pub edit_id: String,
    pub package_name: String,
    pub track: String,
    pub version_code: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_fraction: Option<f64>,
}

/// Authorization state shared between the login flow and the callback handler.
#[derive(Debug, Clone, Default)]
pub struct PkceState {
    pub state: String,
    pub code: Option<String>,
    pub error: Option<String>,
}
