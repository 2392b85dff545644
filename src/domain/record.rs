//! Daily exchange-rate record.

use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One (date, rate) observation. `rate` is RUB per one INR; `None` marks a
/// missing value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub rate: Option<f64>,
}

impl Record {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self {
            date,
            rate: Some(rate),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, rate: None }
    }
}

/// Parse a date cell. Accepts `YYYY-MM-DD` and the `YYYY-MM-DD HH:MM:SS`
/// form some spreadsheet tools write back.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok().or_else(|| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    })
}

/// Parse a rate cell. Empty cells and `NaN` are missing values; anything
/// present must be a finite, positive number.
pub fn parse_rate(s: &str) -> Result<Option<f64>, String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = s
        .parse()
        .map_err(|e| format!("invalid rate {:?}: {}", s, e))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("rate must be positive, got {}", value));
    }
    Ok(Some(value))
}

pub fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| r.to_string()).unwrap_or_default()
}
