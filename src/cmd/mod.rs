//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module   | Command handled            |
//! |----------|----------------------------|
//! | `map`    | `Map`                      |
//! | `trends` | `Trends`                   |
//! | `stats`  | `Stats`                    |
//! | `cache`  | `Cache` (status, clear)    |
//! | `config` | `Config`                   |
//!
//! The command layer only renders: every report is produced by the
//! request/response handlers in [`pricemap::report`].

use std::time::Duration;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};

use pricemap::report::FetchParams;

pub mod cache;
pub mod config;
pub mod map;
pub mod stats;
pub mod trends;

pub use cache::cmd_cache;
pub use config::cmd_config;
pub use map::cmd_map;
pub use stats::cmd_stats;
pub use trends::cmd_trends;

/// Assemble the shared fetch parameters; an omitted end date means today.
pub fn fetch_params(town: String, from: NaiveDate, to: Option<NaiveDate>, refresh: bool) -> FetchParams {
    FetchParams {
        town,
        start: from,
        end: to.unwrap_or_else(|| chrono::Local::now().date_naive()),
        refresh,
    }
}

/// Spinner shown while a report handler is fetching.
pub(crate) fn fetch_spinner(msg: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("spinner template is a valid static string"),
    );
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a price as whole pounds with thousands separators.
pub(crate) fn format_gbp(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let sign = if rounded < 0 { "-" } else { "" };
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}\u{a3}{grouped}")
}

/// "2023-06" → "June 2023" for table headings; unparseable labels pass
/// through unchanged.
pub(crate) fn month_heading(label: &str) -> String {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    let mut parts = label.splitn(2, '-');
    let (Some(year), Some(month)) = (parts.next(), parts.next()) else {
        return label.to_string();
    };
    match month.parse::<usize>() {
        Ok(m) if (1..=12).contains(&m) => format!("{} {}", MONTHS[m - 1], year),
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_gbp_groups_thousands() {
        assert_eq!(format_gbp(185000.0), "£185,000");
        assert_eq!(format_gbp(1234567.0), "£1,234,567");
        assert_eq!(format_gbp(950.0), "£950");
    }

    #[test]
    fn test_format_gbp_rounds() {
        assert_eq!(format_gbp(199999.6), "£200,000");
    }

    #[test]
    fn test_format_gbp_negative_change() {
        assert_eq!(format_gbp(-2500.0), "-£2,500");
    }

    #[test]
    fn test_month_heading() {
        assert_eq!(month_heading("2023-06"), "June 2023");
        assert_eq!(month_heading("2022-12"), "December 2022");
    }

    #[test]
    fn test_month_heading_passthrough_on_garbage() {
        assert_eq!(month_heading("whenever"), "whenever");
        assert_eq!(month_heading("2023-13"), "2023-13");
    }

    #[test]
    fn test_fetch_params_default_end_is_today() {
        let params = fetch_params("Leeds".to_string(), "2000-01-01".parse().unwrap(), None, false);
        assert_eq!(params.end, chrono::Local::now().date_naive());
        assert!(!params.refresh);
    }
}
