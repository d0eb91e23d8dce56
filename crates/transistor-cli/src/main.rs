//! transistor - command-line front end for the Transistor.fm API.

/// Application configuration (TOML).
mod config;
/// Interactive mode.
mod interactive;
/// JSON and table rendering.
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, config_path};
use crate::output::{OutputFormat, TableKind, emit, render, to_pretty_json};
use transistor_api::{
    DateRange, LocalTransistorApi, TransistorClient, all_episode_ids, all_episodes_full_data,
};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Transistor API key.
    #[arg(long, global = true, env = "TRANSISTOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL override.
    #[arg(long, global = true, env = "TRANSISTOR_BASE_URL", hide = true)]
    base_url: Option<String>,

    /// Disable client-side rate limiting.
    #[arg(long, global = true)]
    no_rate_limit: bool,

    /// Output format (default: config value, then json).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show the authenticated account.
    Account,
    /// Manage shows.
    Shows(ShowsCommand),
    /// Manage episodes.
    Episodes(EpisodesCommand),
    /// Query download analytics.
    Analytics(AnalyticsCommand),
    /// Manage private subscribers.
    Subscribers(SubscribersCommand),
    /// Upload a local audio file.
    Upload(UploadArgs),
    /// Read commands from stdin, one per line.
    Interactive,
}

/// Arguments for the `shows` subcommand.
#[derive(clap::Args)]
struct ShowsCommand {
    /// Shows subcommand to run.
    #[command(subcommand)]
    command: ShowsSubcommands,
}

/// Available shows subcommands.
#[derive(Subcommand)]
enum ShowsSubcommands {
    /// List shows.
    List,
    /// Get show details.
    Get {
        /// Show ID.
        id: String,
    },
    /// Create a show.
    Create(ContentArgs),
    /// Update a show.
    Update {
        /// Show ID.
        id: String,
        #[command(flatten)]
        content: UpdateArgs,
    },
    /// Delete a show.
    Delete {
        /// Show ID.
        id: String,
    },
}

/// Required title plus optional description.
#[derive(clap::Args)]
struct ContentArgs {
    /// Title.
    #[arg(long, required = true)]
    title: String,
    /// Description.
    #[arg(long)]
    description: Option<String>,
}

/// Optional title and description for updates.
#[derive(clap::Args)]
struct UpdateArgs {
    /// New title.
    #[arg(long)]
    title: Option<String>,
    /// New description.
    #[arg(long)]
    description: Option<String>,
}

/// Arguments for the `episodes` subcommand.
#[derive(clap::Args)]
struct EpisodesCommand {
    /// Episodes subcommand to run.
    #[command(subcommand)]
    command: EpisodesSubcommands,
}

/// Available episodes subcommands.
#[derive(Subcommand)]
enum EpisodesSubcommands {
    /// List episodes (the API returns at most 20).
    List {
        /// Only list episodes of this show.
        #[arg(long)]
        show_id: Option<String>,
    },
    /// Get episode details.
    Get {
        /// Episode ID.
        id: String,
    },
    /// Create an episode.
    Create {
        /// Show ID.
        show_id: String,
        #[command(flatten)]
        content: ContentArgs,
        /// Remote audio file URL.
        #[arg(long)]
        audio_url: Option<String>,
    },
    /// Update an episode.
    Update {
        /// Episode ID.
        id: String,
        #[command(flatten)]
        content: UpdateArgs,
    },
    /// Delete an episode.
    Delete {
        /// Episode ID.
        id: String,
    },
    /// Publish an episode.
    Publish {
        /// Episode ID.
        id: String,
    },
    /// Unpublish an episode.
    Unpublish {
        /// Episode ID.
        id: String,
    },
    /// List every episode id of a show (not capped at 20).
    Ids {
        /// Show ID.
        show_id: String,
    },
    /// Fetch every episode of a show (not capped at 20).
    All {
        /// Show ID.
        show_id: String,
    },
}

/// Arguments for the `analytics` subcommand.
#[derive(clap::Args)]
struct AnalyticsCommand {
    /// Analytics subcommand to run.
    #[command(subcommand)]
    command: AnalyticsSubcommands,
}

/// Available analytics subcommands.
#[derive(Subcommand)]
enum AnalyticsSubcommands {
    /// Get analytics by analytics ID.
    Get {
        /// Analytics ID.
        id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Show-level analytics.
    Show {
        /// Show ID.
        show_id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Analytics of a single episode.
    Episode {
        /// Episode ID.
        episode_id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Analytics of every episode of a show.
    AllEpisodes {
        /// Show ID.
        show_id: String,
        #[command(flatten)]
        range: RangeArgs,
    },
}

/// Analytics date filter.
#[derive(clap::Args)]
struct RangeArgs {
    /// First day, "dd-mm-yyyy".
    #[arg(long)]
    start_date: Option<String>,
    /// Last day, "dd-mm-yyyy".
    #[arg(long)]
    end_date: Option<String>,
}

/// Arguments for the `subscribers` subcommand.
#[derive(clap::Args)]
struct SubscribersCommand {
    /// Subscribers subcommand to run.
    #[command(subcommand)]
    command: SubscribersSubcommands,
}

/// Available subscribers subcommands.
#[derive(Subcommand)]
enum SubscribersSubcommands {
    /// List private subscribers of a show.
    List {
        /// Show ID.
        show_id: String,
    },
    /// Add a private subscriber.
    Create {
        /// Show ID.
        show_id: String,
        /// Subscriber email.
        #[arg(long, required = true)]
        email: String,
    },
    /// Remove a private subscriber.
    Delete {
        /// Show ID.
        show_id: String,
        /// Subscriber ID.
        subscriber_id: String,
    },
}

/// Arguments for the `upload` subcommand.
#[derive(clap::Args)]
struct UploadArgs {
    /// Audio file to upload.
    file: PathBuf,
}

/// Effective settings after merging flags, environment and config file.
#[derive(Debug, PartialEq, Eq)]
struct Settings {
    api_key: String,
    base_url: Option<String>,
    rate_limiting: bool,
    format: OutputFormat,
}

/// Merges CLI values over the config file.
///
/// `cli.api_key` already holds `--api-key` or `TRANSISTOR_API_KEY`.
fn resolve_settings(cli: &Cli, config: AppConfig) -> Result<Settings> {
    let api_key = cli
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or(config.api.key.filter(|k| !k.is_empty()));
    let Some(api_key) = api_key else {
        bail!("API key required. Set TRANSISTOR_API_KEY env var or use --api-key");
    };

    Ok(Settings {
        api_key,
        base_url: cli.base_url.clone().or(config.api.base_url),
        rate_limiting: !cli.no_rate_limit && config.api.rate_limiting.unwrap_or(true),
        format: cli
            .format
            .or(config.output.format)
            .unwrap_or(OutputFormat::Json),
    })
}

/// Builds the API client from resolved settings.
fn build_client(settings: &Settings) -> Result<TransistorClient> {
    let mut builder = TransistorClient::builder()
        .api_key(settings.api_key.as_str())
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .rate_limiting(settings.rate_limiting);
    if let Some(base_url) = &settings.base_url {
        let url = Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build Transistor client")
}

/// Builds a JSON:API request document.
fn document(kind: &str, attributes: Map<String, Value>) -> Value {
    json!({ "data": { "type": kind, "attributes": attributes } })
}

/// Attributes for a create command.
fn content_attributes(content: &ContentArgs) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert(String::from("title"), Value::from(content.title.as_str()));
    if let Some(description) = &content.description {
        attrs.insert(String::from("description"), Value::from(description.as_str()));
    }
    attrs
}

/// Attributes for an update command. At least one field must be given.
fn update_attributes(update: &UpdateArgs) -> Result<Map<String, Value>> {
    let mut attrs = Map::new();
    if let Some(title) = &update.title {
        attrs.insert(String::from("title"), Value::from(title.as_str()));
    }
    if let Some(description) = &update.description {
        attrs.insert(String::from("description"), Value::from(description.as_str()));
    }
    if attrs.is_empty() {
        bail!("nothing to update: pass --title and/or --description");
    }
    Ok(attrs)
}

/// Parses the analytics date filter.
fn date_range(range: &RangeArgs) -> Result<DateRange> {
    DateRange::parse(range.start_date.as_deref(), range.end_date.as_deref())
        .context("invalid analytics date range")
}

/// Prints a response in the selected format.
fn print_document(document: &Value, format: OutputFormat, table: TableKind) -> Result<()> {
    emit(&render(document, format, table)?);
    Ok(())
}

/// Prints a response as JSON regardless of the selected format.
fn print_json(value: &impl serde::Serialize) -> Result<()> {
    emit(&to_pretty_json(value)?);
    Ok(())
}

/// Runs the `account` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_account(client: &TransistorClient) -> Result<()> {
    let account = client
        .account()
        .await
        .context("failed to fetch account")?;
    print_json(&account)
}

/// Runs the `shows` subcommands.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the API request fails.
#[instrument(skip_all)]
async fn run_shows(
    client: &TransistorClient,
    command: &ShowsSubcommands,
    format: OutputFormat,
) -> Result<()> {
    let response = match command {
        ShowsSubcommands::List => client.list_shows(&[]).await.context("failed to list shows")?,
        ShowsSubcommands::Get { id } => client
            .get_show(id, &[])
            .await
            .with_context(|| format!("failed to fetch show {id}"))?,
        ShowsSubcommands::Create(content) => client
            .create_show(&document("show", content_attributes(content)))
            .await
            .context("failed to create show")?,
        ShowsSubcommands::Update { id, content } => client
            .update_show(id, &document("show", update_attributes(content)?))
            .await
            .with_context(|| format!("failed to update show {id}"))?,
        ShowsSubcommands::Delete { id } => {
            let response = client
                .delete_show(id)
                .await
                .with_context(|| format!("failed to delete show {id}"))?;
            tracing::info!("Deleted show {id}");
            return print_json(&response);
        }
    };
    print_document(&response, format, TableKind::Resources)
}

/// Warns when the capped listing endpoint hides episodes.
fn warn_if_truncated(response: &Value) {
    let returned = response
        .get("data")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let total = response
        .pointer("/meta/totalCount")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok());
    if let Some(total) = total.filter(|&total| total > returned) {
        tracing::warn!(
            "Showing {returned} of {total} episodes. Use `episodes ids` or `episodes all` to reach every episode"
        );
    }
}

/// Runs the `episodes` subcommands.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the API request fails.
#[instrument(skip_all)]
async fn run_episodes(
    client: &TransistorClient,
    command: &EpisodesSubcommands,
    format: OutputFormat,
) -> Result<()> {
    let response = match command {
        EpisodesSubcommands::List { show_id } => {
            let response = client
                .list_episodes(show_id.as_deref(), &[])
                .await
                .context("failed to list episodes")?;
            warn_if_truncated(&response);
            response
        }
        EpisodesSubcommands::Get { id } => client
            .get_episode(id, &[])
            .await
            .with_context(|| format!("failed to fetch episode {id}"))?,
        EpisodesSubcommands::Create {
            show_id,
            content,
            audio_url,
        } => {
            let mut attrs = content_attributes(content);
            if let Some(audio_url) = audio_url {
                attrs.insert(String::from("media_url"), Value::from(audio_url.as_str()));
            }
            client
                .create_episode(show_id, &document("episode", attrs))
                .await
                .with_context(|| format!("failed to create episode in show {show_id}"))?
        }
        EpisodesSubcommands::Update { id, content } => client
            .update_episode(id, &document("episode", update_attributes(content)?))
            .await
            .with_context(|| format!("failed to update episode {id}"))?,
        EpisodesSubcommands::Delete { id } => {
            let response = client
                .delete_episode(id)
                .await
                .with_context(|| format!("failed to delete episode {id}"))?;
            tracing::info!("Deleted episode {id}");
            return print_json(&response);
        }
        EpisodesSubcommands::Publish { id } => client
            .publish_episode(id)
            .await
            .with_context(|| format!("failed to publish episode {id}"))?,
        EpisodesSubcommands::Unpublish { id } => client
            .unpublish_episode(id)
            .await
            .with_context(|| format!("failed to unpublish episode {id}"))?,
        EpisodesSubcommands::Ids { show_id } => {
            let ids = all_episode_ids(client, show_id)
                .await
                .with_context(|| format!("failed to discover episodes of show {show_id}"))?;
            return print_json(&ids);
        }
        EpisodesSubcommands::All { show_id } => {
            let batch = all_episodes_full_data(client, show_id)
                .await
                .with_context(|| format!("failed to fetch episodes of show {show_id}"))?;
            tracing::info!(
                "Fetched {}/{} episodes ({} failed)",
                batch.meta.succeeded,
                batch.meta.requested,
                batch.meta.failed.len()
            );
            return print_json(&batch);
        }
    };
    print_document(&response, format, TableKind::Resources)
}

/// Runs the `analytics` subcommands.
///
/// # Errors
///
/// Returns an error if a date is malformed or the API request fails.
#[instrument(skip_all)]
async fn run_analytics(
    client: &TransistorClient,
    command: &AnalyticsSubcommands,
    format: OutputFormat,
) -> Result<()> {
    let (response, table) = match command {
        AnalyticsSubcommands::Get { id, range } => (
            client
                .analytics(id, &date_range(range)?)
                .await
                .with_context(|| format!("failed to fetch analytics {id}"))?,
            TableKind::Analytics,
        ),
        AnalyticsSubcommands::Show { show_id, range } => (
            client
                .show_analytics(show_id, &date_range(range)?)
                .await
                .with_context(|| format!("failed to fetch analytics of show {show_id}"))?,
            TableKind::Analytics,
        ),
        AnalyticsSubcommands::Episode { episode_id, range } => (
            client
                .episode_analytics(episode_id, &date_range(range)?)
                .await
                .with_context(|| format!("failed to fetch analytics of episode {episode_id}"))?,
            TableKind::Analytics,
        ),
        AnalyticsSubcommands::AllEpisodes { show_id, range } => (
            client
                .all_episodes_analytics(show_id, &date_range(range)?)
                .await
                .with_context(|| format!("failed to fetch episode analytics of show {show_id}"))?,
            TableKind::EpisodesAnalytics,
        ),
    };
    print_document(&response, format, table)
}

/// Runs the `subscribers` subcommands.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_subscribers(client: &TransistorClient, command: &SubscribersSubcommands) -> Result<()> {
    let response = match command {
        SubscribersSubcommands::List { show_id } => client
            .list_subscribers(show_id, &[])
            .await
            .with_context(|| format!("failed to list subscribers of show {show_id}"))?,
        SubscribersSubcommands::Create { show_id, email } => {
            let mut attrs = Map::new();
            attrs.insert(String::from("email"), Value::from(email.as_str()));
            client
                .create_subscriber(show_id, &document("private_subscriber", attrs))
                .await
                .with_context(|| format!("failed to add subscriber to show {show_id}"))?
        }
        SubscribersSubcommands::Delete {
            show_id,
            subscriber_id,
        } => client
            .delete_subscriber(show_id, subscriber_id)
            .await
            .with_context(|| format!("failed to remove subscriber {subscriber_id}"))?,
    };
    print_json(&response)
}

/// Runs the `upload` subcommand.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the upload fails.
#[instrument(skip_all)]
async fn run_upload(client: &TransistorClient, args: &UploadArgs) -> Result<()> {
    let response = client
        .upload_audio(&args.file, &[])
        .await
        .with_context(|| format!("failed to upload {}", args.file.display()))?;
    tracing::info!("Uploaded {}", args.file.display());
    print_json(&response)
}

/// Initializes `tracing` output on stderr.
fn init_tracing() {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let path = config_path(cli.dir.as_deref()).context("failed to resolve config path")?;
    let config = AppConfig::load(&path).context("failed to load config")?;
    let settings = resolve_settings(&cli, config)?;
    let client = build_client(&settings)?;

    match &cli.command {
        Commands::Account => run_account(&client).await,
        Commands::Shows(cmd) => run_shows(&client, &cmd.command, settings.format).await,
        Commands::Episodes(cmd) => run_episodes(&client, &cmd.command, settings.format).await,
        Commands::Analytics(cmd) => run_analytics(&client, &cmd.command, settings.format).await,
        Commands::Subscribers(cmd) => run_subscribers(&client, &cmd.command).await,
        Commands::Upload(args) => run_upload(&client, args).await,
        Commands::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive::run_interactive(&client, stdin).await
        }
    }
}
