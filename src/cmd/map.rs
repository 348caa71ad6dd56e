//! Choropleth dataset command — `pricemap map`.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use pricemap::config::Config;
use pricemap::report::{self, FetchParams};

use super::{fetch_spinner, format_gbp};

pub async fn cmd_map(
    cfg: &Config,
    params: FetchParams,
    year: i32,
    prefix: &str,
    out: Option<&Path>,
) -> Result<()> {
    let spinner = fetch_spinner(format!("Fetching transactions for {}...", params.town));
    let report = report::choropleth(cfg, &params, year, prefix).await;
    spinner.finish_and_clear();
    let report = report?;

    if report.records.is_empty() {
        println!(
            "No transactions for {} in {} matching outcode prefix {:?}.",
            report.town, report.year, report.prefix
        );
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style(format!(
            "Mean price by outcode — {} {} (area {})",
            report.town, report.year, report.area
        ))
        .bold()
    );
    for record in &report.records {
        println!("  {:<8} {:>12}", record.outcode, format_gbp(record.mean_price));
    }
    println!();

    // A report with records always carries a center (coordinates or
    // geocoded town); without one a map has no viewport.
    match report.center {
        Some(center) => println!("Map center: {:.4}, {:.4}", center.lat, center.lon),
        None => {
            println!("No map center available; not writing GeoJSON.");
            return Ok(());
        }
    }
    println!(
        "Polygons: {} priced, {} without data",
        report.annotation.matched, report.annotation.unmatched
    );

    if let Some(path) = out {
        let body = serde_json::to_string_pretty(&report.geojson)
            .context("Failed to serialize enriched GeoJSON")?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", style("Wrote").green().bold(), path.display());
    }

    Ok(())
}
