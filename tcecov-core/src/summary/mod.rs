//! Per-component summary pages rolled up into one report

mod render;
mod scraper;
mod stat;
mod tree;

pub use render::{escape_html, render_html};
pub use scraper::{parse_count, scrape_summary, tokenize, HtmlEvent, ScraperState, SummaryScraper};
pub use stat::{format_percent, SummaryStat};
pub use tree::{SummaryEntry, SummaryNode, SummaryTree};

use crate::config::Config;
use crate::CovError;
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, info};

/// Scrape every configured summary page into one tree.
///
/// Any unreadable or malformed page fails the whole roll-up.
pub fn collect_summaries(config: &Config) -> crate::Result<SummaryTree> {
    let mut tree = SummaryTree::new();
    for source in &config.sums {
        let path = config.summary_path(source);
        let html = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CovError::FileNotFound(path.clone()),
            _ => CovError::Io(e),
        })?;
        let stat = scrape_summary(&html).map_err(|e| e.at(path.display()))?;
        debug!(name = %source.name, files = stat.files, "scraped summary");
        tree.add(&source.name, &source.file.to_string_lossy(), stat);
    }
    info!(pages = config.sums.len(), "collected summaries");
    Ok(tree)
}
