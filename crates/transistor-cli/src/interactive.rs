//! Line-oriented interactive mode.
//!
//! Reads one command per line and runs it against the shared client.
//! A failing command is reported on stderr and the loop keeps going;
//! `quit`, `exit` or end of input ends the session.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::instrument;
use transistor_api::TransistorClient;

use crate::output::{OutputFormat, emit};
use crate::{
    AnalyticsSubcommands, EpisodesSubcommands, RangeArgs, ShowsSubcommands, run_account,
    run_analytics, run_episodes, run_shows,
};

const BANNER: &str = "Transistor API Interactive Mode\nType 'help' for commands, 'quit' to exit";

const HELP: &str = "Available commands:
  account                  - Get account info
  shows                    - List shows
  episodes                 - List episodes
  show <id>                - Get show details
  episode <id>             - Get episode details
  analytics <id>           - Get analytics by ID
  show-analytics <id>      - Get show analytics
  episode-analytics <id>   - Get episode analytics
  all-episodes <id>        - Get all episodes analytics
  quit                     - Exit";

const UNKNOWN: &str = "Unknown command. Type 'help' for available commands.";

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Blank,
    Help,
    Quit,
    Account,
    Shows,
    Episodes,
    Show(String),
    Episode(String),
    Analytics(String),
    ShowAnalytics(String),
    EpisodeAnalytics(String),
    AllEpisodes(String),
    /// Known command given without its id.
    MissingId(&'static str),
    Unknown,
}

/// Parses a line into a command. Extra whitespace is ignored.
fn parse_line(input: &str) -> Line {
    let mut words = input.split_whitespace();
    let Some(head) = words.next() else {
        return Line::Blank;
    };
    let id = words.next().map(String::from);
    if words.next().is_some() {
        return Line::Unknown;
    }

    let with_id = |usage: &'static str, make: fn(String) -> Line| match id.clone() {
        Some(id) => make(id),
        None => Line::MissingId(usage),
    };
    match (head, id.is_some()) {
        ("help", false) => Line::Help,
        ("quit" | "exit", false) => Line::Quit,
        ("account", false) => Line::Account,
        ("shows", false) => Line::Shows,
        ("episodes", false) => Line::Episodes,
        ("show", _) => with_id("show <id>", Line::Show),
        ("episode", _) => with_id("episode <id>", Line::Episode),
        ("analytics", _) => with_id("analytics <id>", Line::Analytics),
        ("show-analytics", _) => with_id("show-analytics <id>", Line::ShowAnalytics),
        ("episode-analytics", _) => with_id("episode-analytics <id>", Line::EpisodeAnalytics),
        ("all-episodes", _) => with_id("all-episodes <id>", Line::AllEpisodes),
        _ => Line::Unknown,
    }
}

/// Empty analytics date filter.
fn no_range() -> RangeArgs {
    RangeArgs {
        start_date: None,
        end_date: None,
    }
}

/// Runs one command. Listings and analytics print tables, single
/// resources print JSON.
async fn dispatch(client: &TransistorClient, line: Line) -> Result<()> {
    match line {
        Line::Blank | Line::Quit => Ok(()),
        Line::Help => {
            emit(HELP);
            Ok(())
        }
        Line::Unknown => {
            emit(UNKNOWN);
            Ok(())
        }
        Line::MissingId(usage) => anyhow::bail!("usage: {usage}"),
        Line::Account => run_account(client).await,
        Line::Shows => run_shows(client, &ShowsSubcommands::List, OutputFormat::Table).await,
        Line::Episodes => {
            let command = EpisodesSubcommands::List { show_id: None };
            run_episodes(client, &command, OutputFormat::Table).await
        }
        Line::Show(id) => {
            run_shows(client, &ShowsSubcommands::Get { id }, OutputFormat::Json).await
        }
        Line::Episode(id) => {
            run_episodes(client, &EpisodesSubcommands::Get { id }, OutputFormat::Json).await
        }
        Line::Analytics(id) => {
            let command = AnalyticsSubcommands::Get {
                id,
                range: no_range(),
            };
            run_analytics(client, &command, OutputFormat::Table).await
        }
        Line::ShowAnalytics(show_id) => {
            let command = AnalyticsSubcommands::Show {
                show_id,
                range: no_range(),
            };
            run_analytics(client, &command, OutputFormat::Table).await
        }
        Line::EpisodeAnalytics(episode_id) => {
            let command = AnalyticsSubcommands::Episode {
                episode_id,
                range: no_range(),
            };
            run_analytics(client, &command, OutputFormat::Table).await
        }
        Line::AllEpisodes(show_id) => {
            let command = AnalyticsSubcommands::AllEpisodes {
                show_id,
                range: no_range(),
            };
            run_analytics(client, &command, OutputFormat::Table).await
        }
    }
}

/// Writes the prompt without a trailing newline.
#[allow(clippy::print_stdout)]
fn prompt() -> Result<()> {
    print!("transistor> ");
    std::io::stdout().flush().context("failed to flush stdout")
}

/// Reports a failed command without ending the session.
#[allow(clippy::print_stderr)]
fn report(error: &anyhow::Error) {
    eprintln!("Error: {error:#}");
}

/// Runs the interactive loop over `input` until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if reading input or writing the prompt fails.
#[instrument(skip_all)]
pub async fn run_interactive<R>(client: &TransistorClient, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    emit(BANNER);
    let mut lines = input.lines();
    loop {
        prompt()?;
        let Some(raw) = lines.next_line().await.context("failed to read input")? else {
            tracing::debug!("End of input, leaving interactive mode");
            break;
        };
        let line = parse_line(&raw);
        if line == Line::Quit {
            break;
        }
        if let Err(e) = dispatch(client, line).await {
            report(&e);
        }
    }
    Ok(())
}
