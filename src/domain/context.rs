//! The working dataset: where it lives and what is currently loaded.

use crate::domain::analysis::{self, Deviations};
use crate::domain::error::FxError;
use crate::domain::layout::{self, ExportReport, LayoutKind};
use crate::domain::query::PointQuery;
use crate::domain::store::RecordStore;
use crate::ports::dataset_port::DatasetPort;
use chrono::NaiveDate;

/// Owns the dataset location and the loaded [`RecordStore`]. Created by the
/// driver and passed explicitly to whatever needs it.
pub struct DatasetContext<P: DatasetPort> {
    port: P,
    store: RecordStore,
}

impl<P: DatasetPort> DatasetContext<P> {
    /// Load `dataset.csv` from the port's location.
    pub fn open(port: P) -> Result<Self, FxError> {
        let store = RecordStore::load(&port)?;
        Ok(Self { port, store })
    }

    /// Start a context with `store` and persist it as the Single layout,
    /// replacing whatever was there.
    pub fn create(port: P, store: RecordStore) -> Result<Self, FxError> {
        let ctx = Self { port, store };
        ctx.export(LayoutKind::Single)?;
        Ok(ctx)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn export(&self, kind: LayoutKind) -> Result<ExportReport, FxError> {
        layout::export(&self.store, kind, &self.port)
    }

    /// Export into another location; the context keeps its own.
    pub fn export_to(&self, kind: LayoutKind, target: &dyn DatasetPort) -> Result<ExportReport, FxError> {
        layout::export(&self.store, kind, target)
    }

    pub fn query(&self, query: PointQuery, date: NaiveDate) -> Option<f64> {
        query.lookup(&self.port, date)
    }

    pub fn deviations(&self) -> Deviations {
        analysis::deviations(self.store.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_dataset_adapter::CsvDatasetAdapter;
    use crate::domain::record::Record;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn create_then_open_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::from_records(vec![
            Record::new(d(2020, 1, 2), 1.1),
            Record::new(d(2020, 1, 1), 1.0),
        ]);
        DatasetContext::create(CsvDatasetAdapter::new(dir.path().to_path_buf()), store.clone())
            .unwrap();

        let ctx = DatasetContext::open(CsvDatasetAdapter::new(dir.path().to_path_buf())).unwrap();
        assert_eq!(ctx.store(), &store);
        assert_eq!(ctx.query(PointQuery::Single, d(2020, 1, 2)), Some(1.1));
    }

    #[test]
    fn open_missing_dataset_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = DatasetContext::open(CsvDatasetAdapter::new(dir.path().to_path_buf()));
        assert!(matches!(result, Err(FxError::NotFound { .. })));
    }
}
