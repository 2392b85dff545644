//! Day-by-day collection of rates from a [`RateSource`].
//!
//! One request per calendar day, strictly in order. A day that fails or has
//! no document is recorded as unavailable and the walk continues. Nothing is
//! retried.

use crate::domain::error::FxError;
use crate::domain::record::Record;
use crate::ports::rate_port::RateSource;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub records: Vec<Record>,
    pub unavailable: Vec<NaiveDate>,
}

impl CollectionReport {
    pub fn days(&self) -> usize {
        self.records.len() + self.unavailable.len()
    }
}

pub fn collect_rates(
    source: &dyn RateSource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CollectionReport, FxError> {
    if start > end {
        return Err(FxError::validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    log::info!("collecting rates from {} to {}", start, end);
    let mut report = CollectionReport {
        records: Vec::new(),
        unavailable: Vec::new(),
    };

    for date in start.iter_days().take_while(|d| *d <= end) {
        match source.rate_on(date) {
            Ok(Some(rate)) => {
                log::debug!("{}: {}", date, rate);
                report.records.push(Record::new(date, rate));
            }
            Ok(None) => {
                log::warn!("{}: no data", date);
                report.unavailable.push(date);
            }
            Err(e) => {
                log::warn!("{}: {}", date, e);
                report.unavailable.push(date);
            }
        }
    }

    log::info!(
        "collected {} rate(s), {} day(s) unavailable",
        report.records.len(),
        report.unavailable.len()
    );
    Ok(report)
}
