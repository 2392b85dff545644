//! Dataset storage port.
//!
//! A dataset lives in one location (a directory for the CSV adapter) holding
//! named tables. The domain decides which names make up a layout; the
//! adapter only knows how to read and write the three table shapes.

use crate::domain::error::FxError;
use crate::domain::record::Record;
use chrono::NaiveDate;

pub trait DatasetPort {
    /// Human-readable location, used in logs and annotations.
    fn location(&self) -> String;

    fn exists(&self, name: &str) -> bool;

    /// Read a `Date,INR_Rate` table. Extra columns are ignored.
    fn read_records(&self, name: &str) -> Result<Vec<Record>, FxError>;

    fn write_records(&self, name: &str, records: &[Record]) -> Result<(), FxError>;

    /// Read a single-column `Date` table.
    fn read_dates(&self, name: &str) -> Result<Vec<NaiveDate>, FxError>;

    fn write_dates(&self, name: &str, dates: &[NaiveDate]) -> Result<(), FxError>;

    /// Read a single-column `INR_Rate` table.
    fn read_rates(&self, name: &str) -> Result<Vec<Option<f64>>, FxError>;

    fn write_rates(&self, name: &str, rates: &[Option<f64>]) -> Result<(), FxError>;

    /// Names of all partition tables, sorted.
    fn list_partitions(&self) -> Result<Vec<String>, FxError>;

    /// Number of data rows in a table of any shape.
    fn row_count(&self, name: &str) -> Result<usize, FxError>;
}
