//! Countries by nominal GDP
//!
//! Scrapes the IMF estimates from the archived "List of countries by GDP
//! (nominal)" page, converts them from millions to billions of USD and
//! stores the table as CSV and in SQLite.

use crate::config::GdpConfig;
use crate::db::{Column, Database, IfExists, QueryRun, SqlType, TableRow};
use crate::html::{cells, first_text, selector, stripped_text};
use crate::http::{build_client, fetch_text};
use crate::load::{load_to_db, write_rows_csv};
use etl_common::numeric::round_to;
use etl_common::progress::{ProgressLog, Separator};
use etl_common::{EtlError, Result};
use rusqlite::types::Value;
use scraper::Html;
use serde::Serialize;
use tracing::info;

/// Index of the `<tbody>` holding the ranking; earlier ones are layout tables
const RANKING_TBODY: usize = 2;

/// Marker used on the page for a missing estimate
const NO_ESTIMATE: char = '\u{2014}';

/// A country row as scraped, GDP still as page text in USD millions
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedGdp {
    pub country: String,
    pub gdp_usd_millions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryGdp {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "GDP_USD_billions")]
    pub gdp_usd_billions: f64,
}

impl TableRow for CountryGdp {
    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 2] = [
            Column::new("Country", SqlType::Text),
            Column::new("GDP_USD_billions", SqlType::Real),
        ];
        &COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.country.clone()), Value::Real(self.gdp_usd_billions)]
    }
}

/// Pull country rows from the ranking table
///
/// Only rows whose first cell links somewhere are countries; the "World"
/// aggregate has no link. Rows with no IMF estimate are dropped.
pub fn parse_gdp_html(html: &str) -> Result<Vec<ScrapedGdp>> {
    let document = Html::parse_document(html);
    let tbody = selector("tbody")?;
    let tr = selector("tr")?;
    let td = selector("td")?;
    let link = selector("a")?;

    let table = document.select(&tbody).nth(RANKING_TBODY).ok_or_else(|| {
        EtlError::parse(format!("page has fewer than {} tables", RANKING_TBODY + 1))
    })?;

    let mut rows = Vec::new();

    for (index, row) in table.select(&tr).enumerate() {
        let row_cells = cells(row, &td);
        if row_cells.is_empty() {
            continue;
        }
        if row_cells.len() < 3 {
            return Err(EtlError::parse(format!(
                "GDP table row {} has {} cells, expected at least 3",
                index,
                row_cells.len()
            )));
        }

        let Some(anchor) = row_cells[0].select(&link).next() else {
            continue;
        };
        if stripped_text(row_cells[2]).contains(NO_ESTIMATE) {
            continue;
        }

        let (Some(country), Some(gdp)) = (first_text(anchor), first_text(row_cells[2])) else {
            continue;
        };
        rows.push(ScrapedGdp {
            country,
            gdp_usd_millions: gdp,
        });
    }

    Ok(rows)
}

/// Convert `"26,854,599"` style millions into billions rounded to two decimals
pub fn transform(rows: &[ScrapedGdp]) -> Result<Vec<CountryGdp>> {
    rows.iter()
        .map(|row| {
            let millions = row
                .gdp_usd_millions
                .replace(',', "")
                .parse::<f64>()
                .map_err(|e| {
                    EtlError::parse(format!(
                        "invalid GDP '{}' for {}: {}",
                        row.gdp_usd_millions, row.country, e
                    ))
                })?;
            Ok(CountryGdp {
                country: row.country.clone(),
                gdp_usd_billions: round_to(millions / 1000.0, 2),
            })
        })
        .collect()
}

pub fn report_query(table: &str, min_gdp_billions: f64) -> String {
    format!("SELECT * FROM {} WHERE GDP_USD_billions >= {}", table, min_gdp_billions)
}

#[derive(Debug, Clone)]
pub struct GdpReport {
    pub countries: Vec<CountryGdp>,
    pub query: QueryRun,
}

/// Run the whole job once
pub async fn run(config: &GdpConfig) -> Result<GdpReport> {
    let log = ProgressLog::new(&config.log_file, Separator::Colon);
    log.log("Preliminaries complete. Initiating ETL process")?;

    let client = build_client(config.http_timeout)?;
    let page = fetch_text(&client, &config.url).await?;
    let scraped = parse_gdp_html(&page)?;
    info!(countries = scraped.len(), url = %config.url, "Extracted GDP table");
    log.log("Data extraction complete. Initiating Transformation process")?;

    let countries = transform(&scraped)?;
    log.log("Data transformation complete. Initiating loading process")?;

    write_rows_csv(&config.csv_path, &countries)?;
    log.log("Data saved to CSV file")?;

    let mut db = Database::open(&config.db_path)?;
    log.log("SQL Connection initiated.")?;

    load_to_db(&mut db, &config.table_name, &countries, IfExists::Replace)?;
    log.log("Data loaded to Database as table. Running the query")?;

    let query = db.run_query(report_query(&config.table_name, config.min_gdp_billions))?;
    log.log("Process Complete.")?;

    Ok(GdpReport { countries, query })
}
