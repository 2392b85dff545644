//! Physical layouts of a record store and the exporter that writes them.
//!
//! Partitioned layouts name each file after the first and last date actually
//! present in the partition (`YYYYMMDD_YYYYMMDD.csv`), not after nominal
//! calendar boundaries. Year lookups rely on that convention.

use crate::domain::error::FxError;
use crate::domain::record::Record;
use crate::domain::store::{RecordStore, DATASET_FILE};
use crate::ports::dataset_port::DatasetPort;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DATES_FILE: &str = "X.csv";
pub const RATES_FILE: &str = "Y.csv";

/// Length of `YYYYMMDD_YYYYMMDD.csv`.
const PARTITION_NAME_LEN: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    Single,
    SplitColumns,
    ByYear,
    ByWeek,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 4] = [
        LayoutKind::Single,
        LayoutKind::SplitColumns,
        LayoutKind::ByYear,
        LayoutKind::ByWeek,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayoutKind::Single => "single",
            LayoutKind::SplitColumns => "xy",
            LayoutKind::ByYear => "years",
            LayoutKind::ByWeek => "weeks",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutKind {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "original" => Ok(LayoutKind::Single),
            "xy" | "split" => Ok(LayoutKind::SplitColumns),
            "years" | "year" => Ok(LayoutKind::ByYear),
            "weeks" | "week" => Ok(LayoutKind::ByWeek),
            other => Err(FxError::validation(format!(
                "unknown layout {:?} (expected single, xy, years or weeks)",
                other
            ))),
        }
    }
}

/// A contiguous group of records written to one partition file.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Grouping key: `2020` for years, `2020-01` (ISO year, week) for weeks.
    pub key: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub records: Vec<Record>,
}

impl Partition {
    fn from_group(key: String, records: Vec<Record>) -> Option<Self> {
        let start = records.iter().map(|r| r.date).min()?;
        let end = records.iter().map(|r| r.date).max()?;
        Some(Self {
            key,
            start,
            end,
            records,
        })
    }

    pub fn file_name(&self) -> String {
        partition_file_name(self.start, self.end)
    }
}

pub fn partition_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}_{}.csv", start.format("%Y%m%d"), end.format("%Y%m%d"))
}

/// Whether `name` looks like a partition file of a year or week layout.
pub fn is_partition_file(name: &str) -> bool {
    if name.len() != PARTITION_NAME_LEN || !name.ends_with(".csv") {
        return false;
    }
    let bytes = name.as_bytes();
    bytes[8] == b'_'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..17].iter().all(u8::is_ascii_digit)
}

pub fn partition_by_year(records: &[Record]) -> Vec<Partition> {
    let mut groups: BTreeMap<i32, Vec<Record>> = BTreeMap::new();
    for record in records {
        groups.entry(record.date.year()).or_default().push(*record);
    }
    groups
        .into_iter()
        .filter_map(|(year, group)| Partition::from_group(year.to_string(), group))
        .collect()
}

pub fn partition_by_week(records: &[Record]) -> Vec<Partition> {
    let mut groups: BTreeMap<(i32, u32), Vec<Record>> = BTreeMap::new();
    for record in records {
        let week = record.date.iso_week();
        groups
            .entry((week.year(), week.week()))
            .or_default()
            .push(*record);
    }
    groups
        .into_iter()
        .filter_map(|((year, week), group)| {
            Partition::from_group(format!("{}-{:02}", year, week), group)
        })
        .collect()
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub kind: LayoutKind,
    pub files: Vec<String>,
}

impl ExportReport {
    pub fn count(&self) -> usize {
        self.files.len()
    }
}

/// Write `store` to `port` in the given layout. The store is not modified.
///
/// If any file fails to write the export stops and the error lists the
/// files written before the failure.
pub fn export(
    store: &RecordStore,
    kind: LayoutKind,
    port: &dyn DatasetPort,
) -> Result<ExportReport, FxError> {
    let records = store.records();
    let mut written: Vec<String> = Vec::new();

    match kind {
        LayoutKind::Single => {
            write_step(&mut written, DATASET_FILE, || {
                port.write_records(DATASET_FILE, records)
            })?;
        }
        LayoutKind::SplitColumns => {
            let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
            let rates: Vec<Option<f64>> = records.iter().map(|r| r.rate).collect();
            write_step(&mut written, DATES_FILE, || port.write_dates(DATES_FILE, &dates))?;
            write_step(&mut written, RATES_FILE, || port.write_rates(RATES_FILE, &rates))?;
        }
        LayoutKind::ByYear | LayoutKind::ByWeek => {
            let partitions = if kind == LayoutKind::ByYear {
                partition_by_year(records)
            } else {
                partition_by_week(records)
            };
            for partition in &partitions {
                let name = partition.file_name();
                write_step(&mut written, &name, || {
                    port.write_records(&name, &partition.records)
                })?;
            }
        }
    }

    log::info!(
        "exported {} layout: {} file(s) in {}",
        kind,
        written.len(),
        port.location()
    );
    Ok(ExportReport {
        kind,
        files: written,
    })
}

fn write_step(
    written: &mut Vec<String>,
    name: &str,
    write: impl FnOnce() -> Result<(), FxError>,
) -> Result<(), FxError> {
    match write() {
        Ok(()) => {
            written.push(name.to_string());
            Ok(())
        }
        Err(e) => Err(FxError::ExportFailed {
            written: std::mem::take(written),
            failed: name.to_string(),
            reason: e.to_string(),
        }),
    }
}
