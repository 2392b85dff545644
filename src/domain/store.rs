//! Record store: the canonical, date-ordered INR rate series.

use crate::domain::error::FxError;
use crate::domain::record::Record;
use crate::ports::dataset_port::DatasetPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// File name of the Single layout; the store is always loaded from it.
pub const DATASET_FILE: &str = "dataset.csv";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Build a store from records in any order. Later duplicates of a date
    /// replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::default();
        store.append(records);
        store
    }

    /// Load the persisted Single layout from `port`.
    pub fn load(port: &dyn DatasetPort) -> Result<Self, FxError> {
        if !port.exists(DATASET_FILE) {
            return Err(FxError::NotFound {
                what: format!("{} in {}", DATASET_FILE, port.location()),
            });
        }
        let records = port.read_records(DATASET_FILE)?;
        let store = Self::from_records(records);
        log::info!(
            "loaded {} records from {}",
            store.len(),
            port.location()
        );
        Ok(store)
    }

    /// Merge `records` into the store, last write wins on duplicate dates.
    pub fn append(&mut self, records: impl IntoIterator<Item = Record>) {
        let mut by_date: BTreeMap<NaiveDate, Option<f64>> =
            self.records.iter().map(|r| (r.date, r.rate)).collect();
        for record in records {
            by_date.insert(record.date, record.rate);
        }
        self.records = by_date
            .into_iter()
            .map(|(date, rate)| Record { date, rate })
            .collect();
    }

    /// Exact-match lookup. A record with a missing rate counts as not found.
    pub fn lookup(&self, date: NaiveDate) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.date == date)
            .and_then(|r| r.rate)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Present (non-missing) rates in date order.
    pub fn rates(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.rate).collect()
    }

    /// Records with `start <= date <= end`.
    pub fn date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Record>, FxError> {
        if start > end {
            return Err(FxError::validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .copied()
            .collect())
    }

    /// Replace every missing rate with `value`. Returns how many were filled.
    pub fn fill_missing(&mut self, value: f64) -> usize {
        let mut filled = 0;
        for record in self.records.iter_mut().filter(|r| r.rate.is_none()) {
            record.rate = Some(value);
            filled += 1;
        }
        filled
    }

    /// Cursor over the records in date order, starting at the first one.
    pub fn cursor(&self) -> RecordCursor<'_> {
        RecordCursor {
            records: &self.records,
            position: 0,
        }
    }
}

/// Resettable forward cursor over a [`RecordStore`]. Records with a missing
/// rate are yielded too.
#[derive(Debug, Clone)]
pub struct RecordCursor<'a> {
    records: &'a [Record],
    position: usize,
}

impl RecordCursor<'_> {
    /// Number of records already yielded.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl Iterator for RecordCursor<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = self.records.get(self.position).copied()?;
        self.position += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.records.len().saturating_sub(self.position);
        (left, Some(left))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_records_sorts_by_date() {
        let store = RecordStore::from_records(vec![
            Record::new(d(2020, 1, 3), 1.2),
            Record::new(d(2020, 1, 1), 1.0),
            Record::new(d(2020, 1, 2), 1.1),
        ]);
        let dates: Vec<_> = store.records().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2020, 1, 1), d(2020, 1, 2), d(2020, 1, 3)]);
    }

    #[test]
    fn append_last_write_wins() {
        let mut store = RecordStore::from_records(vec![
            Record::new(d(2020, 1, 1), 1.0),
            Record::new(d(2020, 1, 2), 1.1),
        ]);
        store.append(vec![
            Record::new(d(2020, 1, 2), 2.2),
            Record::new(d(2020, 1, 3), 1.3),
            Record::new(d(2020, 1, 2), 3.3),
        ]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup(d(2020, 1, 2)), Some(3.3));
        assert_eq!(store.lookup(d(2020, 1, 3)), Some(1.3));
    }

    #[test]
    fn lookup_exact_match_only() {
        let store = RecordStore::from_records(vec![
            Record::new(d(2020, 1, 1), 1.0),
            Record::new(d(2020, 1, 3), 1.2),
        ]);
        assert_eq!(store.lookup(d(2020, 1, 1)), Some(1.0));
        assert_eq!(store.lookup(d(2020, 1, 2)), None);
    }

    #[test]
    fn lookup_missing_rate_is_not_found() {
        let store = RecordStore::from_records(vec![Record::missing(d(2020, 1, 1))]);
        assert_eq!(store.lookup(d(2020, 1, 1)), None);
    }

    #[test]
    fn first_and_last_date() {
        let store = RecordStore::from_records(vec![
            Record::new(d(2021, 6, 1), 1.0),
            Record::new(d(2020, 2, 1), 1.0),
        ]);
        assert_eq!(store.first_date(), Some(d(2020, 2, 1)));
        assert_eq!(store.last_date(), Some(d(2021, 6, 1)));
        assert_eq!(RecordStore::default().first_date(), None);
    }

    #[test]
    fn date_range_inclusive() {
        let store = RecordStore::from_records(
            (1..=10).map(|day| Record::new(d(2020, 1, day), day as f64)),
        );
        let slice = store.date_range(d(2020, 1, 3), d(2020, 1, 5)).unwrap();
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].date, d(2020, 1, 3));
        assert_eq!(slice[2].date, d(2020, 1, 5));
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let store = RecordStore::default();
        let err = store.date_range(d(2020, 2, 1), d(2020, 1, 1)).unwrap_err();
        assert!(matches!(err, FxError::Validation { .. }));
    }

    #[test]
    fn fill_missing_counts_filled() {
        let mut store = RecordStore::from_records(vec![
            Record::new(d(2020, 1, 1), 1.0),
            Record::missing(d(2020, 1, 2)),
            Record::missing(d(2020, 1, 3)),
        ]);
        assert_eq!(store.fill_missing(5.0), 2);
        assert_eq!(store.lookup(d(2020, 1, 2)), Some(5.0));
        assert_eq!(store.fill_missing(7.0), 0);
    }

    #[test]
    fn cursor_walks_in_date_order_then_ends() {
        let store = RecordStore::from_records(vec![
            Record::new(d(2020, 1, 2), 1.1),
            Record::missing(d(2020, 1, 3)),
            Record::new(d(2020, 1, 1), 1.0),
        ]);
        let mut cursor = store.cursor();
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.next(), Some(Record::new(d(2020, 1, 1), 1.0)));
        assert_eq!(cursor.next(), Some(Record::new(d(2020, 1, 2), 1.1)));
        assert_eq!(cursor.next(), Some(Record::missing(d(2020, 1, 3))));
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn cursor_reset_starts_over() {
        let store = RecordStore::from_records(
            (1..=5).map(|day| Record::new(d(2020, 1, day), day as f64)),
        );
        let mut cursor = store.cursor();
        assert_eq!(cursor.by_ref().take(4).count(), 4);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.size_hint(), (1, Some(1)));

        cursor.reset();
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.next().map(|r| r.date), Some(d(2020, 1, 1)));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn cursor_on_empty_store() {
        let store = RecordStore::default();
        let mut cursor = store.cursor();
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.position(), 0);
    }
}
