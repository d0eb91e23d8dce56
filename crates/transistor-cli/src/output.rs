//! JSON and fixed-width table rendering.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use transistor_api::EpisodeAnalytics;

/// Width of the `Episode` column in the all-episodes analytics table.
const EPISODE_COLUMN: usize = 50;

/// Longest title shown before truncating with `...`.
const EPISODE_TITLE_MAX: usize = 47;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Fixed-width table.
    Table,
}

/// Kind of table to render for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `ID / Title / Status` listing of shows or episodes.
    Resources,
    /// Per-item analytics blocks.
    Analytics,
    /// All-episodes analytics with download totals.
    EpisodesAnalytics,
}

/// Pretty-prints any serializable value as 2-space indented JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_pretty_json(value: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

/// Renders `document` in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(document: &Value, format: OutputFormat, table: TableKind) -> Result<String> {
    match format {
        OutputFormat::Json => to_pretty_json(document),
        OutputFormat::Table => Ok(match table {
            TableKind::Resources => resources_table(document),
            TableKind::Analytics => analytics_table(document),
            TableKind::EpisodesAnalytics => episodes_analytics_table(document),
        }),
    }
}

/// Writes rendered output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    println!("{text}");
}

/// Renders a string-ish JSON value as a table cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Returns the items of a document's `data` member, list or single.
fn data_items(document: &Value) -> Option<Vec<&Value>> {
    match document.get("data") {
        Some(Value::Array(items)) => Some(items.iter().collect()),
        Some(item @ Value::Object(_)) => Some(vec![item]),
        _ => None,
    }
}

/// Renders shows or episodes as an `ID / Title / Status` table.
#[must_use]
pub fn resources_table(document: &Value) -> String {
    let Some(items) = data_items(document) else {
        return String::from("No data found");
    };

    let mut lines = vec![
        format!("{:<10} {:<30} {:<10}", "ID", "Title", "Status"),
        "-".repeat(52),
    ];
    lines.extend(items.into_iter().map(|item| {
        let attrs = item.get("attributes");
        format!(
            "{:<10} {:<30} {:<10}",
            cell(item.get("id")),
            cell(attrs.and_then(|a| a.get("title"))),
            cell(attrs.and_then(|a| a.get("status"))),
        )
    }));
    lines.join("\n")
}

/// Like [`cell`], but shows `N/A` for missing values.
fn cell_or_na(value: Option<&Value>) -> String {
    let text = cell(value);
    if text.is_empty() {
        String::from("N/A")
    } else {
        text
    }
}

/// Renders one analytics item as a `---`-terminated block.
fn analytics_block(item: &Value) -> Vec<String> {
    let attrs = item.get("attributes");
    let field = |name: &str| attrs.and_then(|a| a.get(name));

    let mut lines = vec![format!("Analytics ID: {}", cell_or_na(item.get("id")))];
    if let Some(Value::Array(days)) = field("downloads") {
        lines.push(String::from("Downloads:"));
        lines.extend(days.iter().map(|day| {
            format!(
                "  {:<12} {}",
                cell(day.get("date")),
                cell_or_na(day.get("downloads"))
            )
        }));
    } else {
        lines.push(format!("Downloads: {}", cell_or_na(field("downloads"))));
    }
    lines.push(format!("Date: {}", cell_or_na(field("date"))));
    if let Some(country) = field("country") {
        lines.push(format!("Country: {}", cell(Some(country))));
    }
    if let Some(app) = field("app") {
        lines.push(format!("App: {}", cell(Some(app))));
    }
    lines.push(String::from("---"));
    lines
}

/// Renders analytics documents as `---`-separated blocks.
#[must_use]
pub fn analytics_table(document: &Value) -> String {
    let Some(items) = data_items(document) else {
        return String::from("No analytics data found");
    };
    items
        .into_iter()
        .flat_map(analytics_block)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the all-episodes analytics report with per-episode totals.
#[must_use]
pub fn episodes_analytics_table(document: &Value) -> String {
    let Some(episodes) = document
        .pointer("/data/attributes/episodes")
        .and_then(Value::as_array)
    else {
        return String::from("No episodes analytics data found");
    };

    let mut lines = vec![
        format!(
            "{:<width$} {:<15}",
            "Episode",
            "Total Downloads",
            width = EPISODE_COLUMN
        ),
        "-".repeat(65),
    ];
    for raw in episodes {
        let (title, total) = match EpisodeAnalytics::deserialize(raw) {
            Ok(episode) => (
                truncate_title(episode.title.as_deref().unwrap_or("Unknown")),
                episode.total_downloads(),
            ),
            Err(_) => (String::from("Unknown"), 0),
        };
        lines.push(format!(
            "{:<width$} {:<15}",
            title,
            total,
            width = EPISODE_COLUMN
        ));
    }
    lines.join("\n")
}

/// Shortens titles longer than the column allows.
fn truncate_title(title: &str) -> String {
    if title.chars().count() > EPISODE_TITLE_MAX {
        let mut short: String = title.chars().take(EPISODE_TITLE_MAX).collect();
        short.push_str("...");
        short
    } else {
        String::from(title)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_pretty_json_uses_two_spaces() {
        // Arrange
        let doc = json!({"data": {"id": "1"}});

        // Act
        let text = render(&doc, OutputFormat::Json, TableKind::Resources).unwrap();

        // Assert
        assert_eq!(text, "{\n  \"data\": {\n    \"id\": \"1\"\n  }\n}");
    }

    #[test]
    fn test_resources_table() {
        // Arrange
        let doc: Value =
            serde_json::from_str(include_str!("../../../fixtures/transistor/shows.json")).unwrap();

        // Act
        let table = resources_table(&doc);
        let lines: Vec<&str> = table.lines().collect();

        // Assert
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID         Title"));
        assert_eq!(lines[1], "-".repeat(52));
        assert!(lines[2].starts_with("31926      Example Podcast"));
        assert!(lines[2].trim_end().ends_with("published"));
        assert!(lines[3].trim_end().ends_with("draft"));
    }

    #[test]
    fn test_resources_table_without_data() {
        // Arrange & Act
        let table = resources_table(&json!({}));

        // Assert
        assert_eq!(table, "No data found");
    }

    #[test]
    fn test_analytics_table_show_report() {
        // Arrange
        let doc: Value = serde_json::from_str(include_str!(
            "../../../fixtures/transistor/analytics_show.json"
        ))
        .unwrap();

        // Act
        let table = analytics_table(&doc);

        // Assert
        assert!(table.starts_with("Analytics ID: 31926"));
        assert!(table.contains("  11-09-2025   12"));
        assert!(table.contains("Date: N/A"));
        assert!(!table.contains("05-09-2025"));
        assert!(table.ends_with("---"));
    }

    #[test]
    fn test_analytics_table_flat_items() {
        // Arrange
        let doc = json!({"data": [
            {"id": "a1", "attributes": {"downloads": 5, "date": "01-09-2025", "country": "NL"}}
        ]});

        // Act
        let table = analytics_table(&doc);

        // Assert
        assert!(table.contains("Downloads: 5"));
        assert!(table.contains("Date: 01-09-2025"));
        assert!(table.contains("Country: NL"));
        assert!(!table.contains("App:"));
    }

    #[test]
    fn test_analytics_table_without_data() {
        // Arrange & Act
        let table = analytics_table(&json!({"errors": []}));

        // Assert
        assert_eq!(table, "No analytics data found");
    }

    #[test]
    fn test_episodes_analytics_table_totals_and_truncation() {
        // Arrange
        let doc: Value = serde_json::from_str(include_str!(
            "../../../fixtures/transistor/analytics_all_episodes.json"
        ))
        .unwrap();

        // Act
        let table = episodes_analytics_table(&doc);
        let lines: Vec<&str> = table.lines().collect();

        // Assert
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "-".repeat(65));
        assert!(lines[2].starts_with("Pilot "));
        assert_eq!(lines[2].trim_end().split_whitespace().last(), Some("17"));
        assert_eq!(lines[3].trim_end().split_whitespace().last(), Some("3"));
        assert!(lines[4].starts_with("A Rather Long Episode Title That Will Not Fit I..."));
    }

    #[test]
    fn test_truncate_title_keeps_short_titles() {
        // Arrange & Act & Assert
        assert_eq!(truncate_title("Pilot"), "Pilot");
        assert_eq!(truncate_title(&"x".repeat(48)).len(), 50);
    }

    #[test]
    fn test_analytics_table_missing_fields_show_na() {
        // Arrange
        let doc = json!({"data": [{"attributes": {}}, {"id": "b2", "attributes": {"downloads": 1, "app": "Overcast"}}]});

        // Act
        let table = analytics_table(&doc);
        let lines: Vec<&str> = table.lines().collect();

        // Assert
        assert_eq!(
            lines,
            vec![
                "Analytics ID: N/A",
                "Downloads: N/A",
                "Date: N/A",
                "---",
                "Analytics ID: b2",
                "Downloads: 1",
                "Date: N/A",
                "App: Overcast",
                "---",
            ]
        );
    }

    #[test]
    fn test_episodes_analytics_table_tolerates_null_counts() {
        // Arrange
        let doc = json!({"data": {"attributes": {"episodes": [
            {"id": 1, "title": "Pilot", "downloads": [{"date": "11-09-2025", "downloads": null}, {"date": "12-09-2025", "downloads": 4}]}
        ]}}});

        // Act
        let table = episodes_analytics_table(&doc);

        // Assert
        let last = table.lines().last().unwrap();
        assert!(last.starts_with("Pilot "));
        assert_eq!(last.split_whitespace().last(), Some("4"));
    }
}
