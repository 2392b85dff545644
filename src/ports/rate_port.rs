//! Exchange-rate source port.

use crate::domain::error::FxError;
use chrono::NaiveDate;

pub trait RateSource {
    /// Rate in RUB per one unit of the currency on `date`. `Ok(None)` means
    /// the archive has no document for that day.
    fn rate_on(&self, date: NaiveDate) -> Result<Option<f64>, FxError>;
}
