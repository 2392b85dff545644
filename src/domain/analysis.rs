//! Descriptive statistics over the rate series.
//!
//! Standard deviations are sample (n-1) deviations; quantiles use linear
//! interpolation between closest ranks. Missing rates are skipped by every
//! statistic and carried through row-level tables as `None`.

use crate::domain::error::FxError;
use crate::domain::record::Record;
use crate::domain::store::RecordStore;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Calendar month key, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FxError::validation(format!("invalid month {:?}, expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Sample standard deviation; `None` with fewer than two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationRow {
    pub date: NaiveDate,
    pub rate: Option<f64>,
    pub deviation_from_median: Option<f64>,
    pub deviation_from_mean: Option<f64>,
    pub abs_deviation_from_median: Option<f64>,
    pub abs_deviation_from_mean: Option<f64>,
}

/// The rate series with deviation columns against the global median and mean.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationTable {
    pub median: f64,
    pub mean: f64,
    pub rows: Vec<DeviationRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Deviations {
    Computed(DeviationTable),
    /// Every rate is missing, so median and mean are undefined.
    Undefined,
}

impl Deviations {
    pub fn into_table(self) -> Result<DeviationTable, FxError> {
        match self {
            Deviations::Computed(table) => Ok(table),
            Deviations::Undefined => Err(FxError::NoData {
                reason: "all rates are missing, deviations are undefined".into(),
            }),
        }
    }
}

pub fn deviations(records: &[Record]) -> Deviations {
    let rates: Vec<f64> = records.iter().filter_map(|r| r.rate).collect();
    let (Some(median), Some(mean)) = (median(&rates), mean(&rates)) else {
        return Deviations::Undefined;
    };

    let rows = records
        .iter()
        .map(|r| {
            let from_median = r.rate.map(|v| v - median);
            let from_mean = r.rate.map(|v| v - mean);
            DeviationRow {
                date: r.date,
                rate: r.rate,
                deviation_from_median: from_median,
                deviation_from_mean: from_mean,
                abs_deviation_from_median: from_median.map(f64::abs),
                abs_deviation_from_mean: from_mean.map(f64::abs),
            }
        })
        .collect();

    Deviations::Computed(DeviationTable { median, mean, rows })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMissing {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingReport {
    pub rows: usize,
    pub date: ColumnMissing,
    pub rate: ColumnMissing,
}

impl MissingReport {
    pub fn total(&self) -> usize {
        self.date.count + self.rate.count
    }
}

pub fn missing_values(records: &[Record]) -> MissingReport {
    let rows = records.len();
    let missing_rates = records.iter().filter(|r| r.rate.is_none()).count();
    let pct = |count: usize| {
        if rows == 0 {
            0.0
        } else {
            count as f64 / rows as f64 * 100.0
        }
    };
    MissingReport {
        rows,
        // Dates are validated on load and can never be missing.
        date: ColumnMissing {
            count: 0,
            percentage: 0.0,
        },
        rate: ColumnMissing {
            count: missing_rates,
            percentage: pct(missing_rates),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillOutcome {
    Filled { count: usize, median: f64 },
    NothingMissing,
    /// No present rate to take a median from.
    Undefined,
}

/// Replace missing rates with the median of the present ones.
pub fn fill_missing_with_median(store: &mut RecordStore) -> FillOutcome {
    if store.records().iter().all(|r| r.rate.is_some()) {
        return FillOutcome::NothingMissing;
    }
    let Some(m) = median(&store.rates()) else {
        return FillOutcome::Undefined;
    };
    let count = store.fill_missing(m);
    log::info!("filled {} missing rate(s) with median {:.4}", count, m);
    FillOutcome::Filled { count, median: m }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    pub year_month: YearMonth,
    pub mean: f64,
    pub median: f64,
    /// NaN for months with a single observation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub mean_deviation_from_mean: f64,
    pub mean_abs_deviation_from_mean: f64,
}

pub fn group_by_month(rows: &[DeviationRow]) -> Vec<MonthlyStats> {
    let mut groups: BTreeMap<YearMonth, Vec<&DeviationRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(YearMonth::of(row.date)).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(year_month, group)| {
            let rates: Vec<f64> = group.iter().filter_map(|r| r.rate).collect();
            let devs: Vec<f64> = group.iter().filter_map(|r| r.deviation_from_mean).collect();
            let abs_devs: Vec<f64> = group
                .iter()
                .filter_map(|r| r.abs_deviation_from_mean)
                .collect();
            let or_nan = |v: Option<f64>| round4(v.unwrap_or(f64::NAN));
            MonthlyStats {
                year_month,
                mean: or_nan(mean(&rates)),
                median: or_nan(median(&rates)),
                std: or_nan(std_dev(&rates)),
                min: or_nan(rates.iter().copied().reduce(f64::min)),
                max: or_nan(rates.iter().copied().reduce(f64::max)),
                mean_deviation_from_mean: or_nan(mean(&devs)),
                mean_abs_deviation_from_mean: or_nan(mean(&abs_devs)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn of(name: &'static str, values: &[f64]) -> Self {
        let get = |v: Option<f64>| v.unwrap_or(f64::NAN);
        Self {
            name,
            count: values.len(),
            mean: get(mean(values)),
            std: get(std_dev(values)),
            min: get(quantile(values, 0.0)),
            q25: get(quantile(values, 0.25)),
            q50: get(quantile(values, 0.5)),
            q75: get(quantile(values, 0.75)),
            max: get(quantile(values, 1.0)),
        }
    }
}

/// Summary statistics of the rate and every deviation column.
pub fn describe(rows: &[DeviationRow]) -> Vec<ColumnSummary> {
    let column = |f: fn(&DeviationRow) -> Option<f64>| -> Vec<f64> {
        rows.iter().filter_map(f).collect()
    };
    vec![
        ColumnSummary::of("inr_rate", &column(|r| r.rate)),
        ColumnSummary::of("deviation_from_median", &column(|r| r.deviation_from_median)),
        ColumnSummary::of("deviation_from_mean", &column(|r| r.deviation_from_mean)),
        ColumnSummary::of(
            "abs_deviation_from_median",
            &column(|r| r.abs_deviation_from_median),
        ),
        ColumnSummary::of(
            "abs_deviation_from_mean",
            &column(|r| r.abs_deviation_from_mean),
        ),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviationFilter {
    pub threshold: f64,
    pub rows: Vec<DeviationRow>,
    /// Share of all rows that passed, in percent.
    pub share: f64,
}

/// Rows whose absolute deviation from the mean is at least `threshold`.
pub fn filter_by_deviation(rows: &[DeviationRow], threshold: f64) -> DeviationFilter {
    let kept: Vec<DeviationRow> = rows
        .iter()
        .filter(|r| r.abs_deviation_from_mean.is_some_and(|d| d >= threshold))
        .copied()
        .collect();
    let share = if rows.is_empty() {
        0.0
    } else {
        kept.len() as f64 / rows.len() as f64 * 100.0
    };
    DeviationFilter {
        threshold,
        rows: kept,
        share,
    }
}

pub fn filter_by_date_range(
    rows: &[DeviationRow],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DeviationRow>, FxError> {
    if start > end {
        return Err(FxError::validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(rows
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .copied()
        .collect())
}

/// One month of daily rates with its summary lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub year_month: YearMonth,
    pub points: Vec<(NaiveDate, f64)>,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub mean: f64,
    pub std: Option<f64>,
}

/// `None` when the month has no present rate.
pub fn month_summary(records: &[Record], year_month: YearMonth) -> Option<MonthSummary> {
    let points: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter(|r| year_month.contains(r.date))
        .filter_map(|r| r.rate.map(|v| (r.date, v)))
        .collect();
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    Some(MonthSummary {
        year_month,
        min: values.iter().copied().reduce(f64::min)?,
        max: values.iter().copied().reduce(f64::max)?,
        median: median(&values)?,
        mean: mean(&values)?,
        std: std_dev(&values),
        points,
    })
}
