//! End-to-end tests for the page-scraping jobs against a mock HTTP server

#![allow(clippy::unwrap_used, clippy::expect_used)]

use etl_common::EtlError;
use etl_ingest::db::Database;
use etl_ingest::{banks, gdp, BanksConfig, GdpConfig};
use std::path::Path;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const BANKS_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<h2>By market capitalization</h2>
<table class="wikitable sortable">
<tbody>
<tr><th>Rank</th><th>Bank name</th><th>Market cap<br/>(US$ billion)</th></tr>
<tr><td>1</td><td><a href="/wiki/JPMorgan_Chase">JPMorgan Chase</a></td><td>432.92
</td></tr>
<tr><td>2</td><td><a href="/wiki/Bank_of_America">Bank of America</a></td><td>231.52
</td></tr>
<tr><td>3</td><td><a href="/wiki/ICBC">Industrial and Commercial Bank of China</a></td><td>194.56
</td></tr>
</tbody>
</table>
</body></html>"#;

const RATES: &str = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";

const GDP_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<table><tbody><tr><td>Largest economies</td></tr></tbody></table>
<table><tbody><tr><td>Legend</td></tr></tbody></table>
<table class="wikitable">
<tbody>
<tr><th>Country/Territory</th><th>UN region</th><th>IMF estimate</th><th>Year</th></tr>
<tr><td>World</td><td>—</td><td>105,568,776</td><td>2023</td></tr>
<tr><td><a href="/wiki/United_States">United States</a></td><td>Americas</td><td>26,854,599</td><td>2023</td></tr>
<tr><td><a href="/wiki/China">China</a></td><td>Asia</td><td>19,373,586</td><td>2023</td></tr>
<tr><td><a href="/wiki/Syria">Syria</a></td><td>Asia</td><td>—</td><td>—</td></tr>
<tr><td><a href="/wiki/Tuvalu">Tuvalu</a></td><td>Oceania</td><td>64</td><td>2023</td></tr>
</tbody>
</table>
</body></html>"#;

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn banks_config(server: &MockServer, dir: &Path) -> BanksConfig {
    BanksConfig {
        url: format!("{}/wiki/List_of_largest_banks", server.uri()),
        exchange_rates: format!("{}/exchange_rate.csv", server.uri()),
        csv_path: dir.join("Largest_banks_data.csv"),
        db_path: dir.join("Bank_Project.db"),
        log_file: dir.join("code_log.txt"),
        http_timeout: Duration::from_secs(5),
        ..BanksConfig::default()
    }
}

fn log_messages(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split_once(" : ").unwrap().1.to_string())
        .collect()
}

// ============================================================================
// Largest banks
// ============================================================================

#[tokio::test]
async fn test_banks_job() {
    let server = MockServer::start().await;
    serve(&server, "/wiki/List_of_largest_banks", BANKS_PAGE).await;
    serve(&server, "/exchange_rate.csv", RATES).await;

    let dir = tempfile::tempdir().unwrap();
    let config = banks_config(&server, dir.path());

    let report = banks::run(&config).await.unwrap();

    assert_eq!(report.banks.len(), 3);
    assert_eq!(report.banks[0].mc_gbp_billion, 346.34);

    let csv = std::fs::read_to_string(&config.csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion")
    );
    assert_eq!(lines.next(), Some("JPMorgan Chase,432.92,346.34,402.62,35910.71"));

    let names: Vec<&str> = report.queries[2].output.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        names,
        vec!["JPMorgan Chase", "Bank of America", "Industrial and Commercial Bank of China"]
    );
    assert_eq!(report.queries[0].statement, "SELECT * FROM Largest_banks");
    assert_eq!(report.queries[0].output.rows.len(), 3);

    assert_eq!(
        log_messages(&config.log_file),
        vec![
            "Preliminaries complete. Initiating ETL process",
            "Data extraction complete. Initiating Transformation process",
            "Data transformation complete. Initiating Loading process",
            "Data saved to CSV file",
            "SQL Connection initiated",
            "Data loaded to Database as table. Running the query",
            "Process Complete",
            "Server Connection closed",
        ]
    );
}

#[tokio::test]
async fn test_banks_rerun_replaces_table() {
    let server = MockServer::start().await;
    serve(&server, "/wiki/List_of_largest_banks", BANKS_PAGE).await;
    serve(&server, "/exchange_rate.csv", RATES).await;

    let dir = tempfile::tempdir().unwrap();
    let config = banks_config(&server, dir.path());

    banks::run(&config).await.unwrap();
    banks::run(&config).await.unwrap();

    let db = Database::open(&config.db_path).unwrap();
    assert_eq!(db.row_count("Largest_banks").unwrap(), 3);
}

#[tokio::test]
async fn test_banks_page_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = banks_config(&server, dir.path());

    let err = banks::run(&config).await.unwrap_err();

    assert!(matches!(err, EtlError::Network(_)));
    assert!(!config.csv_path.exists());
    assert_eq!(log_messages(&config.log_file).len(), 1);
}

#[tokio::test]
async fn test_banks_rates_missing_currency() {
    let server = MockServer::start().await;
    serve(&server, "/wiki/List_of_largest_banks", BANKS_PAGE).await;
    serve(&server, "/exchange_rate.csv", "Currency,Rate\nEUR,0.93\n").await;

    let dir = tempfile::tempdir().unwrap();
    let config = banks_config(&server, dir.path());

    let err = banks::run(&config).await.unwrap_err();
    assert!(matches!(err, EtlError::Config(_)));
}

// ============================================================================
// Countries by GDP
// ============================================================================

#[tokio::test]
async fn test_gdp_job() {
    let server = MockServer::start().await;
    serve(&server, "/wiki/List_of_countries_by_GDP", GDP_PAGE).await;

    let dir = tempfile::tempdir().unwrap();
    let config = GdpConfig {
        url: format!("{}/wiki/List_of_countries_by_GDP", server.uri()),
        csv_path: dir.path().join("Countries_by_GDP.csv"),
        db_path: dir.path().join("World_Economies.db"),
        log_file: dir.path().join("etl_project_log.txt"),
        http_timeout: Duration::from_secs(5),
        ..GdpConfig::default()
    };

    let report = gdp::run(&config).await.unwrap();

    let countries: Vec<&str> = report.countries.iter().map(|c| c.country.as_str()).collect();
    assert_eq!(countries, vec!["United States", "China", "Tuvalu"]);

    // Tuvalu is under the 100 billion threshold
    let queried: Vec<&str> = report.query.output.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(queried, vec!["United States", "China"]);
    assert_eq!(report.query.output.columns, vec!["Country", "GDP_USD_billions"]);

    let csv = std::fs::read_to_string(&config.csv_path).unwrap();
    assert!(csv.starts_with("Country,GDP_USD_billions\nUnited States,26854.6\n"));

    let messages = log_messages(&config.log_file);
    assert_eq!(messages.len(), 7);
    assert_eq!(messages[4], "SQL Connection initiated.");
    assert_eq!(messages[6], "Process Complete.");
}
