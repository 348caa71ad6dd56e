//! Aggregation over fetched transactions.
//!
//! Everything in this module is pure: filtering, mean price per outcode,
//! viewport center, monthly trend means, dwelling-type composition, and the
//! three-month key-statistics table with year-over-year change. Grouping uses
//! `BTreeMap` keys throughout so output ordering is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::errors::StatsError;
use crate::landregistry::{Coordinates, Transaction};

/// Year filtering is an explicit, always-present parameter — call sites
/// choose `All` or `Only`, never omit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFilter {
    All,
    Only(i32),
}

impl YearFilter {
    fn matches(self, date: NaiveDate) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Only(year) => date.year() == year,
        }
    }
}

/// Mean price for one outcode in the filtered set. Only outcodes that
/// actually occur in the transactions are present — never synthetic rows.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub outcode: String,
    pub mean_price: f64,
}

/// Mean price for one (calendar month, property type) pair, for trend lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyMean {
    /// "YYYY-MM"
    pub month: String,
    pub property_type: String,
    pub mean_price: f64,
}

/// Share of one property type within one year's sales, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct MixRow {
    pub year: i32,
    pub property_type: String,
    pub percentage: f64,
}

/// Year-over-year change for the latest key-stats month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoyChange {
    pub absolute: f64,
    pub percent: f64,
}

/// One property type's row in the key-statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStatsRow {
    pub property_type: String,
    /// Mean price in each of the table's three months; `None` when the
    /// type saw no sales that month.
    pub months: [Option<f64>; 3],
    /// `None` renders as "insufficient history".
    pub yoy: Option<YoyChange>,
}

/// The three latest calendar months in the data, with per-type means and
/// year-over-year change versus the same month one year earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStatsTable {
    /// "YYYY-MM" labels, oldest first; consecutive calendar months ending
    /// at the latest month present in the data.
    pub months: [String; 3],
    pub prior_month: String,
    pub rows: Vec<KeyStatsRow>,
}

/// Select transactions matching the year filter whose outcode starts with
/// `prefix`. An empty prefix matches everything.
pub fn filter<'a>(
    transactions: &'a [Transaction],
    year: YearFilter,
    prefix: &str,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| year.matches(t.date) && t.outcode.starts_with(prefix))
        .collect()
}

/// Arithmetic mean of `amount` per distinct outcode, outcode-sorted.
pub fn mean_price_by_outcode(transactions: &[&Transaction]) -> Vec<AggregateRecord> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for t in transactions {
        let entry = groups.entry(t.outcode.as_str()).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(outcode, (sum, count))| AggregateRecord {
            outcode: outcode.to_string(),
            mean_price: sum / count as f64,
        })
        .collect()
}

/// Mean of the coordinates present in the set, for the initial map
/// viewport. `None` when the set is empty or no transaction carries a
/// point — callers must not render a map without a center.
pub fn bounding_center(transactions: &[&Transaction]) -> Option<Coordinates> {
    let points: Vec<Coordinates> = transactions.iter().filter_map(|t| t.point).collect();
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    Some(Coordinates {
        lat: points.iter().map(|p| p.lat).sum::<f64>() / n,
        lon: points.iter().map(|p| p.lon).sum::<f64>() / n,
    })
}

/// Mean price per (calendar month, property type), month-then-type sorted.
/// Transactions without a property-type label are excluded, matching the
/// trend chart's grouping.
pub fn monthly_mean_by_type(transactions: &[Transaction]) -> Vec<MonthlyMean> {
    let mut groups: BTreeMap<((i32, u32), &str), (f64, usize)> = BTreeMap::new();
    for t in transactions {
        let Some(label) = t.property_type.as_deref() else {
            continue;
        };
        let entry = groups.entry((month_key(t.date), label)).or_insert((0.0, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|((month, label), (sum, count))| MonthlyMean {
            month: month_label(month),
            property_type: label.to_string(),
            mean_price: sum / count as f64,
        })
        .collect()
}

/// Percentage of sales per property type per year, over the most recent
/// five years present in the data. Within each year the percentages sum
/// to 100 (up to float rounding).
pub fn dwelling_mix(transactions: &[Transaction]) -> Vec<MixRow> {
    let mut counts: BTreeMap<(i32, &str), usize> = BTreeMap::new();
    let mut totals: BTreeMap<i32, usize> = BTreeMap::new();
    for t in transactions {
        let Some(label) = t.property_type.as_deref() else {
            continue;
        };
        let year = t.date.year();
        *counts.entry((year, label)).or_insert(0) += 1;
        *totals.entry(year).or_insert(0) += 1;
    }
    let Some(&max_year) = totals.keys().max() else {
        return Vec::new();
    };
    counts
        .into_iter()
        .filter(|((year, _), _)| *year >= max_year - 4)
        .map(|((year, label), count)| MixRow {
            year,
            property_type: label.to_string(),
            percentage: count as f64 / totals[&year] as f64 * 100.0,
        })
        .collect()
}

/// Year-over-year change of `current` against the same month one year
/// earlier. No prior-year mean (or a degenerate zero one, which cannot
/// anchor a percentage) is `StatsError::InsufficientHistory`, never NaN.
pub fn year_on_year(
    current: f64,
    prior: Option<f64>,
    prior_month: &str,
) -> Result<YoyChange, StatsError> {
    match prior {
        Some(prior) if prior > 0.0 => Ok(YoyChange {
            absolute: current - prior,
            percent: (current - prior) / prior * 100.0,
        }),
        _ => Err(StatsError::InsufficientHistory {
            month: prior_month.to_string(),
        }),
    }
}

/// Build the key-statistics table: the latest three calendar months in the
/// data (consecutive, whether or not every month saw sales), per-type mean
/// prices, and year-over-year change for the latest month.
pub fn key_stats(transactions: &[Transaction]) -> Result<KeyStatsTable, StatsError> {
    let latest = transactions
        .iter()
        .map(|t| month_key(t.date))
        .max()
        .ok_or(StatsError::NoTransactions)?;
    let middle = prev_month(latest);
    let oldest = prev_month(middle);
    let window = [oldest, middle, latest];
    let prior = (latest.0 - 1, latest.1);

    let mut means: BTreeMap<((i32, u32), &str), (f64, usize)> = BTreeMap::new();
    let mut types: BTreeSet<&str> = BTreeSet::new();
    for t in transactions {
        let Some(label) = t.property_type.as_deref() else {
            continue;
        };
        let month = month_key(t.date);
        if window.contains(&month) || month == prior {
            let entry = means.entry((month, label)).or_insert((0.0, 0));
            entry.0 += t.amount;
            entry.1 += 1;
        }
        if window.contains(&month) {
            types.insert(label);
        }
    }
    let prior_label = month_label(prior);
    let rows = types
        .into_iter()
        .map(|label| {
            let months = [
                mean_of(&means, oldest, label),
                mean_of(&means, middle, label),
                mean_of(&means, latest, label),
            ];
            let yoy = months[2].and_then(|current| {
                year_on_year(current, mean_of(&means, prior, label), &prior_label).ok()
            });
            KeyStatsRow {
                property_type: label.to_string(),
                months,
                yoy,
            }
        })
        .collect();

    Ok(KeyStatsTable {
        months: window.map(month_label),
        prior_month: prior_label,
        rows,
    })
}

fn mean_of<'a>(
    means: &BTreeMap<((i32, u32), &'a str), (f64, usize)>,
    month: (i32, u32),
    label: &'a str,
) -> Option<f64> {
    means
        .get(&(month, label))
        .map(|(sum, count)| sum / *count as f64)
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn prev_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

fn month_label((year, month): (i32, u32)) -> String {
    format!("{year:04}-{month:02}")
}
