//! API client library for the Transistor.fm podcast hosting API.
//!
//! Provides a rate-limited client with one operation per REST action,
//! a typed error taxonomy, and a workaround for the capped episode
//! listing endpoint.

mod api;
mod client;
mod error;
mod pagination;
mod params;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTransistorApi, TransistorApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{DEFAULT_BASE_URL, TransistorClient, TransistorClientBuilder};
pub use error::{ErrorKind, ErrorResponse, Result, TransistorError};
pub use pagination::{
    BulkFetchOptions, EpisodeBatch, EpisodeBatchMeta, FailedFetch, all_episode_ids,
    all_episodes_full_data, all_episodes_full_data_with,
};
pub use params::DateRange;
pub use rate_limiter::RateLimiter;
pub use types::{DailyDownloads, EpisodeAnalytics, EpisodesAnalyticsDocument, Query};
