//! Small helpers over `scraper` shared by the page-scraping jobs

use etl_common::{EtlError, Result};
use scraper::{ElementRef, Selector};

/// Compile a CSS selector
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EtlError::parse(format!("invalid selector '{}': {}", css, e)))
}

/// Text of `element` with each text node trimmed and empty ones dropped
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// First non-blank text node under `element`, trimmed
pub fn first_text(element: ElementRef<'_>) -> Option<String> {
    element
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// `<td>` cells of a table row
pub fn cells<'a>(row: ElementRef<'a>, td: &Selector) -> Vec<ElementRef<'a>> {
    row.select(td).collect()
}
