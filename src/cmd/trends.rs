//! Trend tables command — `pricemap trends`.

use anyhow::Result;
use console::style;

use pricemap::config::Config;
use pricemap::report::{self, FetchParams};

use super::{fetch_spinner, format_gbp};

/// How many of the most recent months of the trend series to print.
const MONTHS_SHOWN: usize = 12;

pub async fn cmd_trends(cfg: &Config, params: FetchParams) -> Result<()> {
    let spinner = fetch_spinner(format!("Fetching transactions for {}...", params.town));
    let report = report::trends(cfg, &params).await;
    spinner.finish_and_clear();
    let report = report?;

    println!();
    println!(
        "{}",
        style(format!("Monthly mean sale price — {}", report.town)).bold()
    );
    let mut months: Vec<&str> = report.monthly.iter().map(|m| m.month.as_str()).collect();
    months.dedup();
    // "YYYY-MM" labels sort chronologically as strings.
    let cutoff = months.get(months.len().saturating_sub(MONTHS_SHOWN)).copied();
    for row in &report.monthly {
        if cutoff.is_some_and(|cutoff| row.month.as_str() < cutoff) {
            continue;
        }
        println!(
            "  {}  {:<16} {:>12}",
            row.month,
            row.property_type,
            format_gbp(row.mean_price)
        );
    }
    if months.len() > MONTHS_SHOWN {
        println!(
            "  ({} earlier months omitted)",
            months.len() - MONTHS_SHOWN
        );
    }

    println!();
    println!(
        "{}",
        style("Share of sales by dwelling type, last five years").bold()
    );
    let mut current_year = None;
    for row in &report.mix {
        if current_year != Some(row.year) {
            current_year = Some(row.year);
            println!("  {}", style(row.year).bold());
        }
        println!("    {:<16} {:>5.1}%", row.property_type, row.percentage);
    }

    Ok(())
}
