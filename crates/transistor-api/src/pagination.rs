//! Workaround for the capped episode listing.
//!
//! `GET episodes` returns at most 20 items and ignores page parameters.
//! The all-episodes analytics report is not capped, so it is used to
//! discover every episode id, and each episode is then fetched on its own.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::api::LocalTransistorApi;
use crate::error::Result;
use crate::params::DateRange;

/// Default number of fetches between pauses.
///
/// One below the rate limit, so a request stays in reserve.
const DEFAULT_PAUSE_EVERY: usize = 9;

/// Default pause length.
const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Pacing of the per-episode fetch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkFetchOptions {
    /// Pause after every n-th fetch (0 disables pausing).
    pub pause_every: usize,
    /// Pause length.
    pub pause: Duration,
}

impl Default for BulkFetchOptions {
    fn default() -> Self {
        Self {
            pause_every: DEFAULT_PAUSE_EVERY,
            pause: DEFAULT_PAUSE,
        }
    }
}

impl BulkFetchOptions {
    /// Returns `true` if the loop should pause after the 1-based
    /// `position` out of `total` items.
    const fn should_pause(&self, position: usize, total: usize) -> bool {
        self.pause_every > 0
            && !self.pause.is_zero()
            && position % self.pause_every == 0
            && position < total
    }
}

/// Result of [`all_episodes_full_data`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeBatch {
    /// Fetched episode records, in request order.
    pub episodes: Vec<Value>,
    /// Summary of the batch.
    pub meta: EpisodeBatchMeta,
}

/// Summary of a bulk episode fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeBatchMeta {
    /// Number of ids discovered.
    pub requested: usize,
    /// Number of episodes fetched.
    pub succeeded: usize,
    /// Fetches that failed.
    pub failed: Vec<FailedFetch>,
}

/// One failed per-episode fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFetch {
    /// Episode id.
    pub id: String,
    /// Error message.
    pub error: String,
}

/// Returns every episode id of a show, in analytics report order.
///
/// Ids are read from `data.attributes.episodes[].id` of the all-episodes
/// analytics report. A report without that structure yields no ids.
///
/// # Errors
///
/// Returns an error if the analytics request fails.
#[instrument(skip_all, fields(show_id = show_id))]
pub async fn all_episode_ids(
    api: &(impl LocalTransistorApi + Sync),
    show_id: &str,
) -> Result<Vec<String>> {
    let report = api
        .all_episodes_analytics(show_id, &DateRange::default())
        .await?;
    let ids = extract_episode_ids(&report);

    tracing::info!(total = ids.len(), "Episode ids discovered via analytics");
    Ok(ids)
}

/// Fetches the full record of every episode of a show.
///
/// Pauses 1s after every 9th fetch. See [`all_episodes_full_data_with`].
///
/// # Errors
///
/// Returns an error only if the id discovery fails; per-episode
/// failures are reported in [`EpisodeBatchMeta::failed`].
pub async fn all_episodes_full_data(
    api: &(impl LocalTransistorApi + Sync),
    show_id: &str,
) -> Result<EpisodeBatch> {
    all_episodes_full_data_with(api, show_id, &BulkFetchOptions::default()).await
}

/// Fetches the full record of every episode of a show with custom pacing.
///
/// Issues one request per discovered id. A failed fetch is recorded and
/// the loop moves on to the next id.
///
/// # Errors
///
/// Returns an error only if the id discovery fails.
#[instrument(skip_all, fields(show_id = show_id))]
pub async fn all_episodes_full_data_with(
    api: &(impl LocalTransistorApi + Sync),
    show_id: &str,
    options: &BulkFetchOptions,
) -> Result<EpisodeBatch> {
    let ids = all_episode_ids(api, show_id).await?;
    let total = ids.len();

    let mut episodes: Vec<Value> = Vec::with_capacity(total);
    let mut failed: Vec<FailedFetch> = Vec::new();

    for (index, id) in ids.into_iter().enumerate() {
        let position = index.saturating_add(1);

        match api.get_episode(&id, &[]).await {
            Ok(document) => {
                tracing::debug!(position = position, total = total, id = %id, "Episode fetched");
                episodes.push(into_record(document));

                if options.should_pause(position, total) {
                    tracing::debug!(
                        position = position,
                        pause_ms = u64::try_from(options.pause.as_millis()).unwrap_or(u64::MAX),
                        "Pausing bulk fetch"
                    );
                    tokio::time::sleep(options.pause).await;
                }
            }
            Err(e) => {
                tracing::warn!(position = position, id = %id, error = %e, "Episode fetch failed");
                failed.push(FailedFetch {
                    id,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        requested = total,
        succeeded = episodes.len(),
        failed = failed.len(),
        "Bulk episode fetch completed"
    );

    Ok(EpisodeBatch {
        meta: EpisodeBatchMeta {
            requested: total,
            succeeded: episodes.len(),
            failed,
        },
        episodes,
    })
}

/// Pulls episode ids out of an all-episodes analytics report.
///
/// Only `data.attributes.episodes[].id` is read, so malformed download
/// data on one entry does not hide the others. Entries without a usable
/// id are skipped.
fn extract_episode_ids(report: &Value) -> Vec<String> {
    let Some(episodes) = report
        .pointer("/data/attributes/episodes")
        .and_then(Value::as_array)
    else {
        tracing::warn!("Analytics report has no episode list");
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut ids: Vec<String> = Vec::with_capacity(episodes.len());
    for (index, episode) in episodes.iter().enumerate() {
        let Some(id) = episode.get("id").and_then(id_string) else {
            tracing::warn!(index = index, "Analytics entry without a usable episode id skipped");
            continue;
        };
        if seen.insert(id.clone()) {
            ids.push(id);
        } else {
            tracing::debug!(id = %id, "duplicate episode id skipped");
        }
    }
    ids
}

/// Returns a non-empty string or numeric id as a string.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unwraps the `data` member of a single-episode document.
fn into_record(document: Value) -> Value {
    match document {
        Value::Object(mut map) => map
            .remove("data")
            .unwrap_or_else(|| Value::Object(map)),
        other => other,
    }
}
