#![allow(dead_code)]

use chrono::NaiveDate;
use inrlab::domain::error::FxError;
use inrlab::domain::layout::is_partition_file;
pub use inrlab::domain::record::Record;
use inrlab::domain::store::RecordStore;
use inrlab::ports::dataset_port::DatasetPort;
use inrlab::ports::rate_port::RateSource;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Ten consecutive days from 2020-01-01 with rates 1.00, 1.10, ..., 1.90.
pub fn ramp_store() -> RecordStore {
    RecordStore::from_records(
        (0..10).map(|i| Record::new(date(2020, 1, 1 + i), 1.0 + 0.1 * i as f64)),
    )
}

/// Every day from `start` for `days` days, with a gently rising rate and
/// every seventh day missing.
pub fn daily_store(start: NaiveDate, days: u32) -> RecordStore {
    RecordStore::from_records(start.iter_days().take(days as usize).enumerate().map(|(i, d)| {
        if i % 7 == 6 {
            Record::missing(d)
        } else {
            Record::new(d, 1.0 + i as f64 * 0.001)
        }
    }))
}

#[derive(Debug, Clone)]
enum Table {
    Records(Vec<Record>),
    Dates(Vec<NaiveDate>),
    Rates(Vec<Option<f64>>),
}

/// In-memory dataset. Writes to names listed in `failing` return an error.
#[derive(Default)]
pub struct MemoryDataset {
    tables: RefCell<BTreeMap<String, Table>>,
    failing: HashSet<String>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.borrow().keys().cloned().collect()
    }

    fn put(&self, name: &str, table: Table) -> Result<(), FxError> {
        if self.failing.contains(name) {
            return Err(FxError::Io(std::io::Error::other(format!(
                "disk full writing {}",
                name
            ))));
        }
        self.tables.borrow_mut().insert(name.to_string(), table);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Table, FxError> {
        self.tables
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| FxError::NotFound {
                what: name.to_string(),
            })
    }

    fn shape_error(name: &str) -> FxError {
        FxError::parse(name, 1, "unexpected table shape")
    }
}

impl DatasetPort for MemoryDataset {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn exists(&self, name: &str) -> bool {
        self.tables.borrow().contains_key(name)
    }

    fn read_records(&self, name: &str) -> Result<Vec<Record>, FxError> {
        match self.get(name)? {
            Table::Records(r) => Ok(r),
            _ => Err(Self::shape_error(name)),
        }
    }

    fn write_records(&self, name: &str, records: &[Record]) -> Result<(), FxError> {
        self.put(name, Table::Records(records.to_vec()))
    }

    fn read_dates(&self, name: &str) -> Result<Vec<NaiveDate>, FxError> {
        match self.get(name)? {
            Table::Dates(d) => Ok(d),
            _ => Err(Self::shape_error(name)),
        }
    }

    fn write_dates(&self, name: &str, dates: &[NaiveDate]) -> Result<(), FxError> {
        self.put(name, Table::Dates(dates.to_vec()))
    }

    fn read_rates(&self, name: &str) -> Result<Vec<Option<f64>>, FxError> {
        match self.get(name)? {
            Table::Rates(r) => Ok(r),
            _ => Err(Self::shape_error(name)),
        }
    }

    fn write_rates(&self, name: &str, rates: &[Option<f64>]) -> Result<(), FxError> {
        self.put(name, Table::Rates(rates.to_vec()))
    }

    fn list_partitions(&self) -> Result<Vec<String>, FxError> {
        Ok(self
            .tables
            .borrow()
            .keys()
            .filter(|n| is_partition_file(n))
            .cloned()
            .collect())
    }

    fn row_count(&self, name: &str) -> Result<usize, FxError> {
        Ok(match self.get(name)? {
            Table::Records(r) => r.len(),
            Table::Dates(d) => d.len(),
            Table::Rates(r) => r.len(),
        })
    }
}

/// Rate source answering from a fixed table; dates in `errors` fail.
#[derive(Default)]
pub struct MockRateSource {
    pub rates: HashMap<NaiveDate, f64>,
    pub errors: HashSet<NaiveDate>,
}

impl MockRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, d: NaiveDate, rate: f64) -> Self {
        self.rates.insert(d, rate);
        self
    }

    pub fn with_error(mut self, d: NaiveDate) -> Self {
        self.errors.insert(d);
        self
    }
}

impl RateSource for MockRateSource {
    fn rate_on(&self, d: NaiveDate) -> Result<Option<f64>, FxError> {
        if self.errors.contains(&d) {
            return Err(FxError::Fetch {
                date: d,
                reason: "connection reset".to_string(),
            });
        }
        Ok(self.rates.get(&d).copied())
    }
}
