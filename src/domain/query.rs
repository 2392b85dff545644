//! Point queries against an exported layout.
//!
//! Each variant reads only its own physical layout and scans linearly for an
//! exact date match. Lookups are total: a missing file, a malformed row or an
//! unparsable date all come back as `None`.

use crate::domain::error::FxError;
use crate::domain::layout::{
    is_partition_file, partition_file_name, LayoutKind, DATES_FILE, RATES_FILE,
};
use crate::domain::record::Record;
use crate::domain::store::DATASET_FILE;
use crate::ports::dataset_port::DatasetPort;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointQuery {
    Single,
    /// Relies on row i of `X.csv` and row i of `Y.csv` describing the same
    /// record. Re-sorting or filtering either file alone breaks lookups.
    SplitColumns,
    /// Same scan rule as `ByWeek`, over the partitions named for the year.
    ByYear,
    /// Scans partitions in name order. An unreadable partition ends the scan
    /// and the lookup reports not found, even if a later partition holds the
    /// date.
    ByWeek,
}

impl From<LayoutKind> for PointQuery {
    fn from(kind: LayoutKind) -> Self {
        match kind {
            LayoutKind::Single => PointQuery::Single,
            LayoutKind::SplitColumns => PointQuery::SplitColumns,
            LayoutKind::ByYear => PointQuery::ByYear,
            LayoutKind::ByWeek => PointQuery::ByWeek,
        }
    }
}

impl PointQuery {
    pub fn all() -> [PointQuery; 4] {
        LayoutKind::ALL.map(PointQuery::from)
    }

    /// The layout this query reads.
    pub fn layout(&self) -> LayoutKind {
        match self {
            PointQuery::Single => LayoutKind::Single,
            PointQuery::SplitColumns => LayoutKind::SplitColumns,
            PointQuery::ByYear => LayoutKind::ByYear,
            PointQuery::ByWeek => LayoutKind::ByWeek,
        }
    }

    pub fn name(&self) -> &'static str {
        self.layout().name()
    }

    pub fn lookup(&self, port: &dyn DatasetPort, date: NaiveDate) -> Option<f64> {
        match self.try_lookup(port, date) {
            Ok(rate) => rate,
            Err(e) => {
                log::debug!("{} lookup for {} treated as not found: {}", self, date, e);
                None
            }
        }
    }

    fn try_lookup(&self, port: &dyn DatasetPort, date: NaiveDate) -> Result<Option<f64>, FxError> {
        match self {
            PointQuery::Single => {
                let records = port.read_records(DATASET_FILE)?;
                Ok(scan(&records, date))
            }
            PointQuery::SplitColumns => {
                let dates = port.read_dates(DATES_FILE)?;
                let Some(index) = dates.iter().position(|d| *d == date) else {
                    return Ok(None);
                };
                let rates = port.read_rates(RATES_FILE)?;
                match rates.get(index) {
                    Some(rate) => Ok(*rate),
                    None => Err(FxError::parse(
                        RATES_FILE,
                        index + 2,
                        format!("{} has fewer rows than {}", RATES_FILE, DATES_FILE),
                    )),
                }
            }
            PointQuery::ByYear => {
                for name in year_candidates(port, date.year())? {
                    let records = port.read_records(&name)?;
                    if let Some(record) = records.iter().find(|r| r.date == date) {
                        return Ok(record.rate);
                    }
                }
                Ok(None)
            }
            PointQuery::ByWeek => {
                for name in port.list_partitions()? {
                    let records = port.read_records(&name)?;
                    if let Some(record) = records.iter().find(|r| r.date == date) {
                        return Ok(record.rate);
                    }
                }
                Ok(None)
            }
        }
    }
}

/// Partition files to try for `year`: the nominal full-year name first when
/// it exists, then every partition whose name starts with the year.
fn year_candidates(port: &dyn DatasetPort, year: i32) -> Result<Vec<String>, FxError> {
    let prefix = format!("{:04}", year);
    let mut candidates = Vec::new();

    if let (Some(jan1), Some(dec31)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        let nominal = partition_file_name(jan1, dec31);
        if port.exists(&nominal) {
            candidates.push(nominal);
        }
    }

    for name in port.list_partitions()? {
        if name.starts_with(&prefix) && is_partition_file(&name) && !candidates.contains(&name) {
            candidates.push(name);
        }
    }
    Ok(candidates)
}

fn scan(records: &[Record], date: NaiveDate) -> Option<f64> {
    records.iter().find(|r| r.date == date).and_then(|r| r.rate)
}

/// Run every query variant for `date`, in declaration order.
pub fn compare(port: &dyn DatasetPort, date: NaiveDate) -> Vec<(PointQuery, Option<f64>)> {
    PointQuery::all()
        .into_iter()
        .map(|q| (q, q.lookup(port, date)))
        .collect()
}

impl fmt::Display for PointQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PointQuery {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<LayoutKind>().map(PointQuery::from)
    }
}
