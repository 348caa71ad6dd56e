//! Key statistics command — `pricemap stats`.

use anyhow::Result;
use console::style;

use pricemap::config::Config;
use pricemap::report::{self, FetchParams};

use super::{fetch_spinner, format_gbp, month_heading};

pub async fn cmd_stats(cfg: &Config, params: FetchParams) -> Result<()> {
    let spinner = fetch_spinner(format!("Fetching transactions for {}...", params.town));
    let report = report::key_stats(cfg, &params).await;
    spinner.finish_and_clear();
    let report = report?;
    let table = &report.table;

    println!();
    println!("{}", style(format!("Key statistics — {}", report.town)).bold());
    println!(
        "{:<18} {:>22} {:>22} {:>22} {:>14} {:>10}",
        "Category",
        format!("Avg {}", month_heading(&table.months[0])),
        format!("Avg {}", month_heading(&table.months[1])),
        format!("Avg {}", month_heading(&table.months[2])),
        "YoY change",
        "YoY %"
    );
    for row in &table.rows {
        let cell = |mean: Option<f64>| match mean {
            Some(mean) => format_gbp(mean),
            None => "-".to_string(),
        };
        let (yoy_abs, yoy_pct) = match row.yoy {
            Some(change) => (
                format!(
                    "{}{}",
                    if change.absolute >= 0.0 { "+" } else { "" },
                    format_gbp(change.absolute)
                ),
                format!("{:+.1}%", change.percent),
            ),
            // No prior-year month to compare against.
            None => ("insufficient".to_string(), "history".to_string()),
        };
        println!(
            "{:<18} {:>22} {:>22} {:>22} {:>14} {:>10}",
            row.property_type,
            cell(row.months[0]),
            cell(row.months[1]),
            cell(row.months[2]),
            yoy_abs,
            yoy_pct
        );
    }
    println!();
    println!(
        "Year-over-year compares {} with {}.",
        month_heading(&table.months[2]),
        month_heading(&table.prior_month)
    );

    Ok(())
}
