//! Request/response report handlers.
//!
//! Each user action is one async function producing a result object; the
//! display layer (the CLI, or anything else) decides how to render it. This
//! replaces the original dashboards' rerun-on-submit model with explicit
//! calls, and every aggregation names its [`YearFilter`] — the map filters
//! to the requested year, trends and key stats deliberately span the whole
//! fetched range.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::aggregate::{self, AggregateRecord, KeyStatsTable, MixRow, MonthlyMean, YearFilter};
use crate::config::Config;
use crate::errors::ReportError;
use crate::geocode::GeocodeClient;
use crate::geodata::{self, AnnotationSummary, PolygonClient};
use crate::landregistry::{Coordinates, PricePaidClient, Transaction};
use crate::postcode;

/// Parameters shared by every report: which town, over which inclusive
/// date range, and whether to invalidate cached fetches first.
#[derive(Debug, Clone)]
pub struct FetchParams {
    pub town: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub refresh: bool,
}

/// Everything the display layer needs for a choropleth map.
#[derive(Debug)]
pub struct ChoroplethReport {
    pub town: String,
    pub year: i32,
    pub prefix: String,
    /// Postcode area whose polygon file was fetched (empty when no
    /// transactions matched).
    pub area: String,
    pub records: Vec<AggregateRecord>,
    /// `None` when no transactions matched — do not render a map.
    pub center: Option<Coordinates>,
    pub geojson: Value,
    pub annotation: AnnotationSummary,
}

#[derive(Debug)]
pub struct TrendReport {
    pub town: String,
    pub monthly: Vec<MonthlyMean>,
    pub mix: Vec<MixRow>,
}

#[derive(Debug)]
pub struct KeyStatsReport {
    pub town: String,
    pub table: KeyStatsTable,
}

/// Build the choropleth dataset: fetch, filter to the requested year and
/// outcode prefix, aggregate mean prices, pick the polygon file, and
/// annotate its features.
///
/// When the filter leaves nothing, the report comes back with no records,
/// no center, and a null GeoJSON body rather than an error — an empty map
/// is a valid answer to a valid question.
pub async fn choropleth(
    cfg: &Config,
    params: &FetchParams,
    year: i32,
    prefix: &str,
) -> Result<ChoroplethReport, ReportError> {
    let transactions = fetch(cfg, params).await?;
    let filtered = aggregate::filter(&transactions, YearFilter::Only(year), prefix);
    debug!(year, prefix, matched = filtered.len(), "filtered transactions");

    let mut report = ChoroplethReport {
        town: params.town.clone(),
        year,
        prefix: prefix.to_string(),
        area: String::new(),
        records: aggregate::mean_price_by_outcode(&filtered),
        center: None,
        geojson: Value::Null,
        annotation: AnnotationSummary::default(),
    };
    if report.records.is_empty() {
        return Ok(report);
    }

    let Some(area) = modal_area(&filtered) else {
        return Ok(report);
    };

    let mut geojson = PolygonClient::new(cfg)?.fetch(&area, params.refresh).await?;
    let prices: HashMap<String, f64> = report
        .records
        .iter()
        .map(|r| (r.outcode.clone(), r.mean_price))
        .collect();
    report.annotation = geodata::annotate(&mut geojson, &prices);

    report.center = match aggregate::bounding_center(&filtered) {
        Some(center) => Some(center),
        None => Some(GeocodeClient::new(cfg)?.lookup(&params.town).await?),
    };
    report.area = area;
    report.geojson = geojson;
    Ok(report)
}

/// Monthly mean price per property type plus the five-year dwelling mix,
/// over the whole fetched range (`YearFilter::All`).
pub async fn trends(cfg: &Config, params: &FetchParams) -> Result<TrendReport, ReportError> {
    let transactions = fetch(cfg, params).await?;
    Ok(TrendReport {
        town: params.town.clone(),
        monthly: aggregate::monthly_mean_by_type(&transactions),
        mix: aggregate::dwelling_mix(&transactions),
    })
}

/// Three-month key statistics with year-over-year change, over the whole
/// fetched range (`YearFilter::All`).
pub async fn key_stats(cfg: &Config, params: &FetchParams) -> Result<KeyStatsReport, ReportError> {
    let transactions = fetch(cfg, params).await?;
    Ok(KeyStatsReport {
        town: params.town.clone(),
        table: aggregate::key_stats(&transactions)?,
    })
}

async fn fetch(cfg: &Config, params: &FetchParams) -> Result<Vec<Transaction>, ReportError> {
    let client = PricePaidClient::new(cfg)?;
    Ok(client
        .fetch(&params.town, params.start, params.end, params.refresh)
        .await?)
}

/// The postcode area ("WV") covering most of the filtered transactions.
/// One SPARQL result set can straddle areas; the polygon host serves one
/// file per area, so the dominant one wins and the rest are logged.
fn modal_area(transactions: &[&Transaction]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in transactions {
        *counts.entry(postcode::extract_outcode(&t.outcode)).or_insert(0) += 1;
    }
    if counts.len() > 1 {
        warn!(
            areas = ?counts.keys().collect::<Vec<_>>(),
            "transactions span multiple postcode areas; mapping the dominant one"
        );
    }
    counts
        .into_iter()
        .filter(|(area, _)| !area.is_empty())
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(area, _)| area.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn txn(postcode: &str, amount: f64, date: &str) -> Transaction {
        Transaction {
            postcode: postcode.to_string(),
            outcode: postcode::district(postcode).to_string(),
            amount,
            date: date.parse().unwrap(),
            property_type: Some("Terraced".to_string()),
            point: None,
        }
    }

    #[test]
    fn test_modal_area_prefers_dominant_area() {
        let txns = vec![
            txn("WV1 1AA", 1.0, "2023-01-01"),
            txn("WV2 1AB", 1.0, "2023-01-02"),
            txn("B1 1AC", 1.0, "2023-01-03"),
        ];
        let refs: Vec<&Transaction> = txns.iter().collect();
        assert_eq!(modal_area(&refs).as_deref(), Some("WV"));
    }

    #[test]
    fn test_modal_area_tie_is_deterministic() {
        let txns = vec![txn("WV1 1AA", 1.0, "2023-01-01"), txn("B1 1AB", 1.0, "2023-01-02")];
        let refs: Vec<&Transaction> = txns.iter().collect();
        assert_eq!(modal_area(&refs).as_deref(), Some("B"));
    }

    #[test]
    fn test_modal_area_of_empty_set_is_none() {
        assert_eq!(modal_area(&[]), None);
    }

    /// The full pipeline on fixture data: Wolverhampton, 2023,
    /// prefix "WV" — aggregates only for matching outcodes and year, and
    /// enrichment leaves both a priced and an unpriced feature.
    #[test]
    fn test_filter_aggregate_enrich_pipeline() {
        let transactions = vec![
            txn("WV1 1AA", 150000.0, "2023-03-01"),
            txn("WV1 2BB", 250000.0, "2023-09-15"),
            txn("WV2 3CC", 180000.0, "2022-06-01"), // wrong year
            txn("B1 4DD", 300000.0, "2023-05-01"),  // wrong prefix
        ];
        let filtered = aggregate::filter(&transactions, YearFilter::Only(2023), "WV");
        let records = aggregate::mean_price_by_outcode(&filtered);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcode, "WV1");
        assert_eq!(records[0].mean_price, 200000.0);

        let mut geojson = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "WV1"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "WV2"}, "geometry": null},
            ]
        });
        let prices: HashMap<String, f64> = records
            .iter()
            .map(|r| (r.outcode.clone(), r.mean_price))
            .collect();
        let summary = geodata::annotate(&mut geojson, &prices);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(geojson["features"][0]["properties"]["average price"], json!(200000.0));
        assert_eq!(geojson["features"][1]["properties"]["average price"], Value::Null);
    }
}
