//! Largest banks by market capitalization
//!
//! Scrapes the first ranking table of the archived "List of largest banks"
//! page, converts each market cap from USD into GBP, EUR and INR using an
//! exchange rate file, then stores the result as CSV and as a SQLite table.

use crate::config::BanksConfig;
use crate::db::{Column, Database, IfExists, QueryRun, SqlType, TableRow};
use crate::html::{cells, selector, stripped_text};
use crate::http::{build_client, fetch_text};
use crate::load::{load_to_db, write_rows_csv};
use etl_common::numeric::round_to;
use etl_common::progress::{ProgressLog, Separator};
use etl_common::{EtlError, Result};
use reqwest::Client;
use rusqlite::types::Value;
use scraper::Html;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// A bank as scraped, before currency conversion
#[derive(Debug, Clone, PartialEq)]
pub struct BankMarketCap {
    pub name: String,
    pub mc_usd_billion: f64,
}

/// A bank with its market cap in every reported currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MC_USD_Billion")]
    pub mc_usd_billion: f64,
    #[serde(rename = "MC_GBP_Billion")]
    pub mc_gbp_billion: f64,
    #[serde(rename = "MC_EUR_Billion")]
    pub mc_eur_billion: f64,
    #[serde(rename = "MC_INR_Billion")]
    pub mc_inr_billion: f64,
}

impl TableRow for BankRecord {
    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 5] = [
            Column::new("Name", SqlType::Text),
            Column::new("MC_USD_Billion", SqlType::Real),
            Column::new("MC_GBP_Billion", SqlType::Real),
            Column::new("MC_EUR_Billion", SqlType::Real),
            Column::new("MC_INR_Billion", SqlType::Real),
        ];
        &COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Real(self.mc_usd_billion),
            Value::Real(self.mc_gbp_billion),
            Value::Real(self.mc_eur_billion),
            Value::Real(self.mc_inr_billion),
        ]
    }
}

/// Units of each currency per US dollar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRates {
    pub gbp: f64,
    pub eur: f64,
    pub inr: f64,
}

/// Parse the bank ranking out of the page, keeping at most `top_n` rows
///
/// Uses the first `table.wikitable`: the name is the second cell of each row
/// and the market cap (USD billions) the third. Rows whose market cap is not
/// a number are skipped.
pub fn parse_banks_html(html: &str, top_n: usize) -> Result<Vec<BankMarketCap>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table.wikitable")?;
    let tr = selector("tr")?;
    let td = selector("td")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| EtlError::parse("page has no table.wikitable"))?;

    let mut banks = Vec::new();

    // First row is the header
    for (index, row) in table.select(&tr).enumerate().skip(1) {
        if banks.len() == top_n {
            break;
        }

        let row_cells = cells(row, &td);
        if row_cells.is_empty() {
            continue;
        }
        let (Some(name_cell), Some(cap_cell)) = (row_cells.get(1), row_cells.get(2)) else {
            return Err(EtlError::parse(format!(
                "bank table row {} has {} cells, expected at least 3",
                index,
                row_cells.len()
            )));
        };

        let name = stripped_text(*name_cell);
        let raw_cap = stripped_text(*cap_cell).replace(',', "");
        match raw_cap.split_whitespace().next().map(str::parse::<f64>) {
            Some(Ok(mc_usd_billion)) => banks.push(BankMarketCap { name, mc_usd_billion }),
            _ => debug!(row = index, name = %name, value = %raw_cap, "Skipping row without a numeric market cap"),
        }
    }

    if banks.is_empty() {
        warn!("No banks found in the ranking table");
    }

    Ok(banks)
}

/// Parse a `Currency,Rate` file; the first column is the currency code
pub fn parse_exchange_rates(content: &str) -> Result<ExchangeRates> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let (mut gbp, mut eur, mut inr) = (None, None, None);

    for record in reader.records() {
        let record = record.map_err(|e| EtlError::parse(format!("exchange rate file: {}", e)))?;
        let (Some(code), Some(raw_rate)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let rate = raw_rate
            .parse::<f64>()
            .map_err(|e| EtlError::parse(format!("invalid rate '{}' for {}: {}", raw_rate, code, e)))?;

        match code {
            "GBP" => gbp = Some(rate),
            "EUR" => eur = Some(rate),
            "INR" => inr = Some(rate),
            _ => {},
        }
    }

    let missing = |code: &str| EtlError::config(format!("exchange rate file has no {} rate", code));
    Ok(ExchangeRates {
        gbp: gbp.ok_or_else(|| missing("GBP"))?,
        eur: eur.ok_or_else(|| missing("EUR"))?,
        inr: inr.ok_or_else(|| missing("INR"))?,
    })
}

/// Load exchange rates from an `http(s)://` URL or a local file
pub async fn load_exchange_rates(client: &Client, source: &str) -> Result<ExchangeRates> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_text(client, source).await?
    } else {
        let path = Path::new(source);
        std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?
    };
    parse_exchange_rates(&content)
}

/// Add the converted market caps, each rounded to two decimals
pub fn transform(banks: &[BankMarketCap], rates: &ExchangeRates) -> Vec<BankRecord> {
    banks
        .iter()
        .map(|bank| BankRecord {
            name: bank.name.clone(),
            mc_usd_billion: bank.mc_usd_billion,
            mc_gbp_billion: round_to(bank.mc_usd_billion * rates.gbp, 2),
            mc_eur_billion: round_to(bank.mc_usd_billion * rates.eur, 2),
            mc_inr_billion: round_to(bank.mc_usd_billion * rates.inr, 2),
        })
        .collect()
}

/// Statements run against the loaded table
pub fn report_queries(table: &str) -> Vec<String> {
    vec![
        format!("SELECT * FROM {}", table),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
        format!("SELECT Name FROM {} LIMIT 5", table),
    ]
}

#[derive(Debug, Clone)]
pub struct BanksReport {
    pub banks: Vec<BankRecord>,
    pub queries: Vec<QueryRun>,
}

/// Run the whole job once
pub async fn run(config: &BanksConfig) -> Result<BanksReport> {
    let log = ProgressLog::new(&config.log_file, Separator::Colon);
    log.log("Preliminaries complete. Initiating ETL process")?;

    let client = build_client(config.http_timeout)?;
    let page = fetch_text(&client, &config.url).await?;
    let scraped = parse_banks_html(&page, config.top_n)?;
    info!(banks = scraped.len(), url = %config.url, "Extracted bank ranking");
    log.log("Data extraction complete. Initiating Transformation process")?;

    let rates = load_exchange_rates(&client, &config.exchange_rates).await?;
    let banks = transform(&scraped, &rates);
    log.log("Data transformation complete. Initiating Loading process")?;

    write_rows_csv(&config.csv_path, &banks)?;
    log.log("Data saved to CSV file")?;

    let mut db = Database::open(&config.db_path)?;
    log.log("SQL Connection initiated")?;

    load_to_db(&mut db, &config.table_name, &banks, IfExists::Replace)?;
    log.log("Data loaded to Database as table. Running the query")?;

    let queries = report_queries(&config.table_name)
        .into_iter()
        .map(|statement| db.run_query(statement))
        .collect::<Result<Vec<_>>>()?;
    log.log("Process Complete")?;

    drop(db);
    log.log("Server Connection closed")?;

    Ok(BanksReport { banks, queries })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table class="wikitable">
  <tbody>
    <tr><th>Rank</th><th>Bank name</th><th>Market cap (US$ billion)</th></tr>
    <tr><td>1</td><td><a href="/jpm">JPMorgan Chase</a></td><td>432.92
</td></tr>
    <tr><td>2</td><td><span></span> <a href="/boa">Bank of America</a></td><td>231.52</td></tr>
    <tr><td>3</td><td>Broken Bank</td><td>n/a</td></tr>
    <tr><td>4</td><td>Industrial and Commercial Bank of China</td><td>1,194.56 [a]</td></tr>
  </tbody>
</table>
<table class="wikitable">
  <tr><th>Rank</th><th>Bank name</th><th>Total assets</th></tr>
  <tr><td>1</td><td>Other</td><td>9999</td></tr>
</table>
</body></html>"#;

    #[test]
    fn test_parse_banks_first_table_only() {
        let banks = parse_banks_html(PAGE, 10).unwrap();

        assert_eq!(
            banks,
            vec![
                BankMarketCap { name: "JPMorgan Chase".into(), mc_usd_billion: 432.92 },
                BankMarketCap { name: "Bank of America".into(), mc_usd_billion: 231.52 },
                BankMarketCap {
                    name: "Industrial and Commercial Bank of China".into(),
                    mc_usd_billion: 1194.56,
                },
            ]
        );
    }

    #[test]
    fn test_parse_banks_top_n() {
        let banks = parse_banks_html(PAGE, 2).unwrap();
        assert_eq!(banks.len(), 2);
        assert_eq!(banks[1].name, "Bank of America");
    }

    #[test]
    fn test_page_without_table_is_parse_error() {
        let err = parse_banks_html("<html><body><p>moved</p></body></html>", 10).unwrap_err();
        assert!(matches!(err, EtlError::Parse(_)));
    }

    #[test]
    fn test_short_row_is_parse_error() {
        let page = r#"<table class="wikitable"><tr><th>h</th></tr><tr><td>1</td><td>Only name</td></tr></table>"#;
        assert!(matches!(parse_banks_html(page, 10).unwrap_err(), EtlError::Parse(_)));
    }

    #[test]
    fn test_parse_exchange_rates() {
        let rates = parse_exchange_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();
        assert_eq!(rates, ExchangeRates { gbp: 0.8, eur: 0.93, inr: 82.95 });
    }

    #[test]
    fn test_missing_currency_is_config_error() {
        let err = parse_exchange_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\n").unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
        assert!(err.to_string().contains("INR"));
    }

    #[test]
    fn test_bad_rate_is_parse_error() {
        let err = parse_exchange_rates("Currency,Rate\nGBP,abc\n").unwrap_err();
        assert!(matches!(err, EtlError::Parse(_)));
    }

    #[test]
    fn test_transform_converts_and_rounds() {
        let rates = ExchangeRates { gbp: 0.8, eur: 0.93, inr: 82.95 };
        let banks = vec![BankMarketCap { name: "JPMorgan Chase".into(), mc_usd_billion: 432.92 }];

        let records = transform(&banks, &rates);

        assert_eq!(records[0].mc_gbp_billion, 346.34);
        assert_eq!(records[0].mc_eur_billion, 402.62);
        assert_eq!(records[0].mc_inr_billion, 35910.71);
        assert_eq!(records[0].mc_usd_billion, 432.92);
    }

    #[tokio::test]
    async fn test_load_exchange_rates_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange_rate.csv");
        std::fs::write(&path, "Currency,Rate\nGBP,0.8\nEUR,0.93\nINR,82.95\n").unwrap();

        let client = build_client(std::time::Duration::from_secs(1)).unwrap();
        let rates = load_exchange_rates(&client, path.to_str().unwrap()).await.unwrap();

        assert_eq!(rates.gbp, 0.8);
    }

    #[test]
    fn test_report_queries() {
        assert_eq!(
            report_queries("Largest_banks"),
            vec![
                "SELECT * FROM Largest_banks",
                "SELECT AVG(MC_GBP_Billion) FROM Largest_banks",
                "SELECT Name FROM Largest_banks LIMIT 5",
            ]
        );
    }
}
