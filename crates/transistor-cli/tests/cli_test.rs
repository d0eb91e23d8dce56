#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command with a clean environment and an empty config directory.
fn transistor(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("transistor");
    cmd.env_remove("TRANSISTOR_API_KEY")
        .env_remove("TRANSISTOR_BASE_URL")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .arg("--dir")
        .arg(dir.path());
    cmd
}

/// Command pointed at a mock server with rate limiting off.
fn transistor_against(dir: &tempfile::TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = transistor(dir);
    cmd.env("TRANSISTOR_API_KEY", "test-key")
        .env("TRANSISTOR_BASE_URL", format!("{}/", server.uri()))
        .arg("--no-rate-limit");
    cmd
}

#[test]
fn test_help_lists_commands() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("transistor");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("episodes"))
        .stdout(predicate::str::contains("analytics"))
        .stdout(predicate::str::contains("--api-key"));
}

#[test]
fn test_episodes_help_mentions_workaround() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("transistor");
    cmd.args(["episodes", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ids"))
        .stdout(predicate::str::contains("all"));
}

#[test]
fn test_missing_api_key() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor(&dir)
        .args(["shows", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key required"));
}

#[test]
fn test_shows_create_requires_title() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor(&dir)
        .args(["shows", "create"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--title"));
}

#[test]
fn test_invalid_config_is_reported() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[api\nkey = ").unwrap();

    // Act & Assert
    transistor(&dir)
        .args(["account"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn test_analytics_rejects_bad_date() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor(&dir)
        .args(["--api-key", "k", "analytics", "show", "31926"])
        .args(["--start-date", "2025-09-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dd-mm-yyyy"));
}

#[tokio::test]
async fn test_shows_get_prints_json() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shows/31926"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/show.json"
        )))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .args(["shows", "get", "31926"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Example Podcast\""));
}

#[tokio::test]
async fn test_shows_list_table_from_config() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/shows.json"
        )))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[output]\nformat = \"table\"\n",
    )
    .unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .args(["shows", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status"))
        .stdout(predicate::str::contains("Second Show"));
}

#[tokio::test]
async fn test_not_found_is_reported() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/episodes/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"errors\":[]}"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .args(["episodes", "get", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch episode 999"))
        .stderr(predicate::str::contains("Resource not found"));
}

#[tokio::test]
async fn test_episodes_all_fetches_every_episode() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analytics/31926/episodes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/analytics_all_episodes.json"
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/episodes/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/episode.json"
        )))
        .expect(3)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .args(["episodes", "all", "31926"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"requested\": 3"))
        .stdout(predicate::str::contains("\"succeeded\": 3"));
}

#[tokio::test]
async fn test_episodes_ids_lists_ids() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analytics/31926/episodes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/analytics_all_episodes.json"
        )))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .args(["episodes", "ids", "31926"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"1001\""))
        .stdout(predicate::str::contains("\"1003\""));
}

#[tokio::test]
async fn test_analytics_all_episodes_table() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analytics/31926/episodes"))
        .and(query_param("start_date", "11-09-2025"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/analytics_all_episodes.json"
        )))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .args(["analytics", "all-episodes", "31926"])
        .args(["--start-date", "11-09-2025", "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Downloads"))
        .stdout(predicate::str::contains("Pilot"));
}

#[tokio::test]
async fn test_interactive_keeps_going_after_errors() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shows"))
        .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
            "../../../fixtures/transistor/shows.json"
        )))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shows/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"errors\":[]}"))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor_against(&dir, &server)
        .arg("interactive")
        .write_stdin("shows\nshow 999\nbogus\nshows\nquit\naccount\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Transistor API Interactive Mode"))
        .stdout(predicate::str::contains("Second Show"))
        .stdout(predicate::str::contains("Unknown command"))
        .stderr(predicate::str::contains("Error: failed to fetch show 999"))
        .stderr(predicate::str::contains("Resource not found"));
}

#[test]
fn test_interactive_exits_at_end_of_input() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    transistor(&dir)
        .env("TRANSISTOR_API_KEY", "test-key")
        .arg("interactive")
        .write_stdin("help\nshow\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("all-episodes <id>"))
        .stderr(predicate::str::contains("Error: usage: show <id>"));
}
