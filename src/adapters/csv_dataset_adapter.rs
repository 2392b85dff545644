//! CSV directory adapter implementing [`DatasetPort`].
//!
//! Every table is a CSV file directly inside `base_path`. Columns are looked
//! up by header name, so files carrying extra columns still read.

use crate::domain::error::FxError;
use crate::domain::layout::is_partition_file;
use crate::domain::record::{format_rate, parse_date, parse_rate, Record, DATE_FORMAT};
use crate::ports::dataset_port::DatasetPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub const DATE_COLUMN: &str = "Date";
pub const RATE_COLUMN: &str = "INR_Rate";

pub struct CsvDatasetAdapter {
    base_path: PathBuf,
}

impl CsvDatasetAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn reader(&self, name: &str) -> Result<csv::Reader<fs::File>, FxError> {
        let path = self.csv_path(name);
        let file = fs::File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FxError::NotFound {
                    what: path.display().to_string(),
                }
            } else {
                FxError::Io(e)
            }
        })?;
        Ok(csv::Reader::from_reader(file))
    }

    fn writer(&self, name: &str) -> Result<csv::Writer<fs::File>, FxError> {
        fs::create_dir_all(&self.base_path)?;
        let file = fs::File::create(self.csv_path(name))?;
        Ok(csv::Writer::from_writer(file))
    }

    /// Index of each requested column in the header row.
    fn column_indices<const N: usize>(
        rdr: &mut csv::Reader<fs::File>,
        name: &str,
        columns: [&str; N],
    ) -> Result<[usize; N], FxError> {
        let headers = rdr
            .headers()
            .map_err(|e| FxError::parse(name, 1, format!("unreadable header: {}", e)))?
            .clone();
        let mut indices = [0usize; N];
        for (slot, column) in indices.iter_mut().zip(columns) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| FxError::parse(name, 1, format!("missing {} column", column)))?;
        }
        Ok(indices)
    }

    fn read_column<T>(
        &self,
        name: &str,
        column: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<Vec<T>, FxError> {
        let mut rdr = self.reader(name)?;
        let [idx] = Self::column_indices(&mut rdr, name, [column])?;
        let mut values = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let row = result.map_err(|e| FxError::parse(name, line, e.to_string()))?;
            let cell = row
                .get(idx)
                .ok_or_else(|| FxError::parse(name, line, format!("missing {} value", column)))?;
            values.push(parse(cell).map_err(|reason| FxError::parse(name, line, reason))?);
        }
        Ok(values)
    }
}

fn date_cell(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date {:?}", s))
}

fn write_error(e: csv::Error) -> FxError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => FxError::Io(io),
        other => FxError::Io(std::io::Error::other(format!("{:?}", other))),
    }
}

impl DatasetPort for CsvDatasetAdapter {
    fn location(&self) -> String {
        self.base_path.display().to_string()
    }

    fn exists(&self, name: &str) -> bool {
        self.csv_path(name).is_file()
    }

    fn read_records(&self, name: &str) -> Result<Vec<Record>, FxError> {
        let mut rdr = self.reader(name)?;
        let [date_idx, rate_idx] = Self::column_indices(&mut rdr, name, [DATE_COLUMN, RATE_COLUMN])?;
        let mut records = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let row = result.map_err(|e| FxError::parse(name, line, e.to_string()))?;

            let date_str = row
                .get(date_idx)
                .ok_or_else(|| FxError::parse(name, line, "missing date value"))?;
            let date = date_cell(date_str).map_err(|reason| FxError::parse(name, line, reason))?;

            let rate_str = row.get(rate_idx).unwrap_or("");
            let rate = parse_rate(rate_str).map_err(|reason| FxError::parse(name, line, reason))?;

            records.push(Record { date, rate });
        }
        Ok(records)
    }

    fn write_records(&self, name: &str, records: &[Record]) -> Result<(), FxError> {
        let mut wtr = self.writer(name)?;
        wtr.write_record([DATE_COLUMN, RATE_COLUMN]).map_err(write_error)?;
        for record in records {
            wtr.write_record([
                record.date.format(DATE_FORMAT).to_string(),
                format_rate(record.rate),
            ])
            .map_err(write_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn read_dates(&self, name: &str) -> Result<Vec<NaiveDate>, FxError> {
        self.read_column(name, DATE_COLUMN, date_cell)
    }

    fn write_dates(&self, name: &str, dates: &[NaiveDate]) -> Result<(), FxError> {
        let mut wtr = self.writer(name)?;
        wtr.write_record([DATE_COLUMN]).map_err(write_error)?;
        for date in dates {
            wtr.write_record([date.format(DATE_FORMAT).to_string()])
                .map_err(write_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn read_rates(&self, name: &str) -> Result<Vec<Option<f64>>, FxError> {
        self.read_column(name, RATE_COLUMN, parse_rate)
    }

    fn write_rates(&self, name: &str, rates: &[Option<f64>]) -> Result<(), FxError> {
        let mut wtr = self.writer(name)?;
        wtr.write_record([RATE_COLUMN]).map_err(write_error)?;
        for rate in rates {
            wtr.write_record([format_rate(*rate)]).map_err(write_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn list_partitions(&self) -> Result<Vec<String>, FxError> {
        let entries = fs::read_dir(&self.base_path)?;
        let mut names = Vec::new();

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_partition_file(&name) && entry.path().is_file() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn row_count(&self, name: &str) -> Result<usize, FxError> {
        let mut rdr = self.reader(name)?;
        let mut count = 0;
        for (i, result) in rdr.records().enumerate() {
            result.map_err(|e| FxError::parse(name, i + 2, e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }
}
