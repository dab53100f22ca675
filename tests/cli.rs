mod common;

use predicates::prelude::*;

use common::{company_body, filings, page_body, write_settings, FakeApi};

const EMPTY_PAGE: &str =
    r#"{"data":{"taxFilings":[]},"meta":{"totalCount":0,"page":1,"totalPages":0}}"#;

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    filings(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("browse"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_list_empty_result() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![(200, EMPTY_PAGE.to_string())]);

    filings(home.path())
        .args(["--api-url", &api.url, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tax filings found."))
        .stdout(predicate::str::contains("Showing").not());

    assert_eq!(api.requests(), vec!["GET /companies?page=1&q= HTTP/1.1"]);
}

#[test]
fn test_list_sends_page_and_search() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![(200, page_body(&["Acme Foods"], 3, 21))]);

    filings(home.path())
        .args(["--api-url", &api.url, "list", "--page", "3", "--q", "acme foods"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Foods"))
        .stdout(predicate::str::contains("Page 3 of 3"))
        .stdout(predicate::str::contains("Showing 21 to 21 of 21 results"));

    assert_eq!(api.requests(), vec!["GET /companies?page=3&q=acme+foods HTTP/1.1"]);
}

#[test]
fn test_list_rejects_page_zero() {
    let home = tempfile::tempdir().unwrap();
    filings(home.path())
        .args(["list", "--page", "0"])
        .assert()
        .failure();
}

#[test]
fn test_server_errors_are_retried_then_succeed() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![
        (500, "{}".to_string()),
        (503, "busy".to_string()),
        (200, page_body(&["Acme Foods"], 1, 1)),
    ]);

    filings(home.path())
        .args(["--api-url", &api.url, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Foods"));

    assert_eq!(api.requests().len(), 3);
}

#[test]
fn test_retry_budget_exhausted() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![
        (500, "{}".to_string()),
        (500, "{}".to_string()),
        (500, "{}".to_string()),
    ]);

    filings(home.path())
        .args(["--api-url", &api.url, "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Request failed: HTTP 500"));

    assert_eq!(api.requests().len(), 3);
}

#[test]
fn test_retry_count_follows_settings() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), r#""retries": 0"#);
    let api = FakeApi::start(vec![(500, "{}".to_string()), (200, EMPTY_PAGE.to_string())]);

    filings(home.path())
        .args(["--api-url", &api.url, "list"])
        .assert()
        .failure();

    assert_eq!(api.requests().len(), 1);
}

#[test]
fn test_show_application_error_is_not_retried() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![
        (200, r#"{"error":"not found"}"#.to_string()),
        (200, company_body("Never", &[2023])),
    ]);

    filings(home.path())
        .args(["--api-url", &api.url, "show", "99-0000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: not found"));

    assert_eq!(api.requests(), vec!["GET /companies/99-0000000 HTTP/1.1"]);
}

#[test]
fn test_client_errors_are_not_retried() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![
        (404, r#"{"message":"no such page"}"#.to_string()),
        (200, EMPTY_PAGE.to_string()),
    ]);

    filings(home.path())
        .args(["--api-url", &api.url, "list"])
        .assert()
        .failure();

    assert_eq!(api.requests().len(), 1);
}

#[test]
fn test_show_history() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![(200, company_body("Acme Foods", &[2023, 2022]))]);

    filings(home.path())
        .args(["--api-url", &api.url, "show", "12-3456701"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Foods"))
        .stdout(predicate::str::contains("Total Filings: 2"))
        .stdout(predicate::str::contains("2022"))
        .stdout(predicate::str::contains("(23.46%)"));
}

#[test]
fn test_show_empty_company() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![(200, company_body("x", &[]))]);

    filings(home.path())
        .args(["--api-url", &api.url, "show", "12-3456701"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tax filings found for this company."));
}

#[test]
fn test_api_url_from_environment() {
    let home = tempfile::tempdir().unwrap();
    write_settings(home.path(), "");
    let api = FakeApi::start(vec![(200, EMPTY_PAGE.to_string())]);

    filings(home.path())
        .env("FILINGS_API_URL", &api.url)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tax filings found."));
}

#[test]
fn test_config_set_url_is_saved() {
    let home = tempfile::tempdir().unwrap();

    filings(home.path())
        .args(["config", "set-url", "https://filings.example.org/api"])
        .assert()
        .success();

    filings(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://filings.example.org/api/"));

    let saved =
        std::fs::read_to_string(home.path().join(".config/filings/settings.json")).unwrap();
    assert!(saved.contains("https://filings.example.org/api/"));
}

#[test]
fn test_config_set_url_rejects_garbage() {
    let home = tempfile::tempdir().unwrap();
    filings(home.path())
        .args(["config", "set-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API URL"));
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    filings(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filings"));
}
