//! Typed views of Transistor JSON:API documents.
//!
//! Resource operations return raw [`serde_json::Value`] documents; only
//! the all-episodes analytics report is modelled. Decoding is lenient:
//! missing or malformed download data becomes zero instead of failing
//! the whole report.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Extra query parameters forwarded verbatim.
pub type Query<'a> = &'a [(&'a str, String)];

/// Response from `analytics/{show_id}/episodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodesAnalyticsDocument {
    /// Top-level resource.
    pub data: EpisodesAnalyticsData,
}

/// `data` member of the all-episodes analytics report.
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodesAnalyticsData {
    /// Analytics resource id.
    #[serde(default, deserialize_with = "id_to_string")]
    pub id: String,
    /// Report attributes.
    pub attributes: EpisodesAnalyticsAttributes,
}

/// `data.attributes` of the all-episodes analytics report.
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodesAnalyticsAttributes {
    /// Every episode of the show, uncapped.
    #[serde(default)]
    pub episodes: Vec<EpisodeAnalytics>,
    /// Report start date (`dd-mm-yyyy`).
    #[serde(default)]
    pub start_date: Option<String>,
    /// Report end date (`dd-mm-yyyy`).
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Per-episode entry of the all-episodes analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeAnalytics {
    /// Episode id (numeric or string upstream, empty if absent).
    #[serde(default, deserialize_with = "id_to_string")]
    pub id: String,
    /// Episode title.
    #[serde(default)]
    pub title: Option<String>,
    /// Daily download counts.
    #[serde(default, deserialize_with = "lenient_days")]
    pub downloads: Vec<DailyDownloads>,
}

impl EpisodeAnalytics {
    /// Sum of downloads across the report period.
    #[must_use]
    pub fn total_downloads(&self) -> u64 {
        self.downloads
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.downloads))
    }
}

/// Downloads on a single day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDownloads {
    /// Day (`dd-mm-yyyy`).
    #[serde(default)]
    pub date: String,
    /// Download count (`null` or non-numeric reads as 0).
    #[serde(default, deserialize_with = "lenient_count")]
    pub downloads: u64,
}

/// Accepts a JSON string or number and yields its string form.
fn id_to_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Reads a download list, dropping entries that are not objects.
fn lenient_days<'de, D>(deserializer: D) -> std::result::Result<Vec<DailyDownloads>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Reads a download count, treating anything but an unsigned integer as 0.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_u64().unwrap_or(0))
}
