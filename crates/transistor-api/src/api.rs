//! `TransistorApi` trait definition.
#![allow(clippy::future_not_send)]

use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::params::DateRange;
use crate::types::Query;

/// Transistor.fm API trait.
///
/// One method per REST action. Every method returns the raw JSON:API
/// document, or an empty object when the server answers with no body.
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
///
/// # Errors
///
/// Every method fails with a [`crate::TransistorError`] whose kind
/// follows the response status (429, 401, 404, 422, or generic).
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TransistorApi: Send)]
pub trait LocalTransistorApi {
    /// Fetches the authenticated account (`GET /`).
    async fn account(&self) -> Result<Value>;

    /// Lists shows (`GET shows`).
    async fn list_shows(&self, query: Query<'_>) -> Result<Value>;

    /// Fetches one show (`GET shows/{id}`).
    async fn get_show(&self, show_id: &str, query: Query<'_>) -> Result<Value>;

    /// Creates a show (`POST shows`).
    async fn create_show(&self, body: &Value) -> Result<Value>;

    /// Updates a show (`PATCH shows/{id}`).
    async fn update_show(&self, show_id: &str, body: &Value) -> Result<Value>;

    /// Deletes a show (`DELETE shows/{id}`).
    async fn delete_show(&self, show_id: &str) -> Result<Value>;

    /// Lists episodes, optionally filtered by show (`GET episodes`).
    ///
    /// The upstream endpoint ignores pagination parameters and returns
    /// at most the first 20 episodes, even when `meta.totalCount` is
    /// larger. Use [`crate::all_episode_ids`] or
    /// [`crate::all_episodes_full_data`] to reach every episode.
    async fn list_episodes(&self, show_id: Option<&str>, query: Query<'_>) -> Result<Value>;

    /// Fetches one episode (`GET episodes/{id}`).
    async fn get_episode(&self, episode_id: &str, query: Query<'_>) -> Result<Value>;

    /// Creates an episode under a show (`POST shows/{id}/episodes`).
    async fn create_episode(&self, show_id: &str, body: &Value) -> Result<Value>;

    /// Updates an episode (`PATCH episodes/{id}`).
    async fn update_episode(&self, episode_id: &str, body: &Value) -> Result<Value>;

    /// Deletes an episode (`DELETE episodes/{id}`).
    async fn delete_episode(&self, episode_id: &str) -> Result<Value>;

    /// Publishes an episode (`PATCH episodes/{id}/publish`).
    async fn publish_episode(&self, episode_id: &str) -> Result<Value>;

    /// Unpublishes an episode (`PATCH episodes/{id}/unpublish`).
    async fn unpublish_episode(&self, episode_id: &str) -> Result<Value>;

    /// Fetches analytics by analytics id (`GET analytics/{id}`).
    async fn analytics(&self, analytics_id: &str, range: &DateRange) -> Result<Value>;

    /// Fetches show-level analytics (`GET analytics/{show_id}`).
    ///
    /// Defaults to the last 14 days.
    async fn show_analytics(&self, show_id: &str, range: &DateRange) -> Result<Value>;

    /// Fetches analytics for one episode (`GET analytics/episodes/{id}`).
    ///
    /// Defaults to the last 14 days.
    async fn episode_analytics(&self, episode_id: &str, range: &DateRange) -> Result<Value>;

    /// Fetches analytics for every episode of a show
    /// (`GET analytics/{show_id}/episodes`).
    ///
    /// Not capped like [`LocalTransistorApi::list_episodes`]. Defaults to
    /// the last 7 days.
    async fn all_episodes_analytics(&self, show_id: &str, range: &DateRange) -> Result<Value>;

    /// Lists private subscribers of a show.
    async fn list_subscribers(&self, show_id: &str, query: Query<'_>) -> Result<Value>;

    /// Adds a private subscriber to a show.
    async fn create_subscriber(&self, show_id: &str, body: &Value) -> Result<Value>;

    /// Removes a private subscriber from a show.
    async fn delete_subscriber(&self, show_id: &str, subscriber_id: &str) -> Result<Value>;

    /// Uploads a local audio file (`POST uploads`, multipart).
    async fn upload_audio(&self, path: &Path, query: Query<'_>) -> Result<Value>;
}
