//! All four layouts of one store answer point lookups identically.

mod common;

use approx::assert_relative_eq;
use common::*;
use inrlab::adapters::csv_dataset_adapter::CsvDatasetAdapter;
use inrlab::domain::context::DatasetContext;
use inrlab::domain::error::FxError;
use inrlab::domain::layout::{self, LayoutKind, DATES_FILE, RATES_FILE};
use inrlab::domain::query::{self, PointQuery};
use inrlab::domain::store::{RecordStore, DATASET_FILE};
use inrlab::ports::dataset_port::DatasetPort;
use proptest::prelude::*;
use tempfile::TempDir;

fn export_all(store: &RecordStore, port: &dyn DatasetPort) {
    for kind in LayoutKind::ALL {
        layout::export(store, kind, port).unwrap();
    }
}

#[test]
fn ramp_lookup_agrees_across_layouts() {
    let port = MemoryDataset::new();
    export_all(&ramp_store(), &port);

    for (q, rate) in query::compare(&port, date(2020, 1, 5)) {
        assert_relative_eq!(rate.unwrap_or_else(|| panic!("{} missed", q)), 1.4, epsilon = 1e-9);
    }
    for (q, rate) in query::compare(&port, date(2019, 12, 31)) {
        assert_eq!(rate, None, "{} found a date outside the store", q);
    }
}

#[test]
fn every_present_date_found_in_every_layout() {
    let store = daily_store(date(2019, 12, 20), 60);
    let port = MemoryDataset::new();
    export_all(&store, &port);

    for record in store.records() {
        for q in PointQuery::all() {
            assert_eq!(
                q.lookup(&port, record.date),
                record.rate,
                "{} disagrees on {}",
                q,
                record.date
            );
        }
    }
}

#[test]
fn split_columns_keep_row_alignment() {
    let store = daily_store(date(2021, 3, 1), 20);
    let port = MemoryDataset::new();
    layout::export(&store, LayoutKind::SplitColumns, &port).unwrap();

    let dates = port.read_dates(DATES_FILE).unwrap();
    let rates = port.read_rates(RATES_FILE).unwrap();
    assert_eq!(dates.len(), store.len());
    assert_eq!(rates.len(), store.len());
    let rebuilt = RecordStore::from_records(
        dates
            .into_iter()
            .zip(rates)
            .map(|(d, r)| Record { date: d, rate: r }),
    );
    assert_eq!(rebuilt, store);
}

#[test]
fn year_partitions_cover_every_record_once() {
    let store = daily_store(date(2019, 11, 1), 120);
    let port = MemoryDataset::new();
    let report = layout::export(&store, LayoutKind::ByYear, &port).unwrap();

    assert_eq!(report.count(), 2);
    let total: usize = report
        .files
        .iter()
        .map(|f| port.row_count(f).unwrap())
        .sum();
    assert_eq!(total, store.len());
    assert_eq!(report.files[0], "20191101_20191231.csv");
}

#[test]
fn partial_export_failure_lists_written_files() {
    let store = ramp_store();
    let port = MemoryDataset::new().failing_on(RATES_FILE);

    let err = layout::export(&store, LayoutKind::SplitColumns, &port).unwrap_err();
    match err {
        FxError::ExportFailed { written, failed, .. } => {
            assert_eq!(written, vec![DATES_FILE.to_string()]);
            assert_eq!(failed, RATES_FILE);
        }
        other => panic!("expected ExportFailed, got {:?}", other),
    }
    assert!(port.exists(DATES_FILE));
    assert!(!port.exists(RATES_FILE));
}

#[test]
fn csv_directory_round_trip_through_context() {
    let dir = TempDir::new().unwrap();
    let ctx = DatasetContext::create(CsvDatasetAdapter::new(dir.path().to_path_buf()), ramp_store())
        .unwrap();
    for kind in [LayoutKind::SplitColumns, LayoutKind::ByYear, LayoutKind::ByWeek] {
        ctx.export(kind).unwrap();
    }

    let reopened = DatasetContext::open(CsvDatasetAdapter::new(dir.path().to_path_buf())).unwrap();
    assert_eq!(reopened.store().len(), 10);
    assert!(dir.path().join(DATASET_FILE).exists());
    assert!(dir.path().join("20200101_20200105.csv").exists());
    assert!(dir.path().join("20200106_20200110.csv").exists());
    assert!(dir.path().join("20200101_20200110.csv").exists());

    for q in PointQuery::all() {
        let rate = reopened.query(q, date(2020, 1, 10)).unwrap();
        assert_relative_eq!(rate, 1.9, epsilon = 1e-9);
        assert_eq!(reopened.query(q, date(2020, 1, 11)), None);
    }
}

fn arb_store() -> impl Strategy<Value = RecordStore> {
    prop::collection::vec((0u32..900, prop::option::weighted(0.9, 0.5..2.5_f64)), 0..80).prop_map(
        |rows| {
            let base = date(2019, 6, 1);
            RecordStore::from_records(rows.into_iter().map(|(offset, rate)| Record {
                date: base + chrono::Duration::days(offset as i64),
                rate,
            }))
        },
    )
}

proptest! {
    #[test]
    fn layouts_agree_on_generated_stores(store in arb_store(), probe in 0u32..900) {
        let port = MemoryDataset::new();
        export_all(&store, &port);

        let probe = date(2019, 6, 1) + chrono::Duration::days(probe as i64);
        let expected = store.lookup(probe);
        for (q, rate) in query::compare(&port, probe) {
            prop_assert_eq!(rate, expected, "{} disagrees on {}", q, probe);
        }
        for record in store.records() {
            for q in PointQuery::all() {
                prop_assert_eq!(q.lookup(&port, record.date), record.rate);
            }
        }
    }
}

mod lookup_failures {
    use super::*;
    use std::fs;

    fn csv_dir(store: &RecordStore, kinds: &[LayoutKind]) -> (TempDir, CsvDatasetAdapter) {
        let dir = TempDir::new().unwrap();
        let port = CsvDatasetAdapter::new(dir.path().to_path_buf());
        for kind in kinds {
            layout::export(store, *kind, &port).unwrap();
        }
        (dir, port)
    }

    #[test]
    fn missing_split_files_are_not_found() {
        let (_dir, port) = csv_dir(&ramp_store(), &[LayoutKind::Single, LayoutKind::ByYear]);

        assert_eq!(PointQuery::SplitColumns.lookup(&port, date(2020, 1, 2)), None);
        assert_eq!(PointQuery::ByWeek.lookup(&port, date(2020, 1, 2)), Some(1.1));
        assert_eq!(PointQuery::Single.lookup(&port, date(2020, 1, 2)), Some(1.1));
    }

    #[test]
    fn no_partitions_is_not_found() {
        let (_dir, port) = csv_dir(&ramp_store(), &[LayoutKind::Single]);

        assert_eq!(PointQuery::ByYear.lookup(&port, date(2020, 1, 2)), None);
        assert_eq!(PointQuery::ByWeek.lookup(&port, date(2020, 1, 2)), None);
    }

    #[test]
    fn short_rates_column_is_not_found() {
        let (dir, port) = csv_dir(&ramp_store(), &[LayoutKind::SplitColumns]);
        fs::write(dir.path().join(RATES_FILE), "INR_Rate\n1.0\n1.1\n").unwrap();

        assert_eq!(PointQuery::SplitColumns.lookup(&port, date(2020, 1, 2)), Some(1.1));
        assert_eq!(PointQuery::SplitColumns.lookup(&port, date(2020, 1, 3)), None);
        assert_eq!(PointQuery::SplitColumns.lookup(&port, date(2020, 1, 10)), None);
    }

    #[test]
    fn malformed_single_table_is_not_found() {
        let (dir, port) = csv_dir(&ramp_store(), &[LayoutKind::Single]);
        fs::write(
            dir.path().join(DATASET_FILE),
            "Date,INR_Rate\n2020-01-01,1.0\n2020-01-02,abc\n",
        )
        .unwrap();

        assert_eq!(PointQuery::Single.lookup(&port, date(2020, 1, 1)), None);
    }

    #[test]
    fn partition_with_bad_date_is_not_found() {
        let (dir, port) = csv_dir(&ramp_store(), &[LayoutKind::ByWeek]);
        fs::write(
            dir.path().join("20200101_20200105.csv"),
            "Date,INR_Rate\n2020-01-01,1.0\n05.01.2020,1.4\n",
        )
        .unwrap();

        assert_eq!(PointQuery::ByWeek.lookup(&port, date(2020, 1, 1)), None);
        assert_eq!(PointQuery::ByYear.lookup(&port, date(2020, 1, 1)), None);
    }

    #[test]
    fn unreadable_partition_ends_the_scan() {
        let (dir, port) = csv_dir(&ramp_store(), &[LayoutKind::ByWeek]);
        fs::write(dir.path().join("20200101_20200102.csv"), "Date,INR_Rate\nbroken,1.0\n").unwrap();

        // 2020-01-08 sits in the intact 20200106_20200110.csv, which sorts later.
        assert!(port.exists("20200106_20200110.csv"));
        assert_eq!(PointQuery::ByWeek.lookup(&port, date(2020, 1, 8)), None);
        assert_eq!(PointQuery::ByYear.lookup(&port, date(2020, 1, 8)), None);
    }

    #[test]
    fn full_year_with_years_and_weeks_in_one_directory() {
        let store = daily_store(date(2020, 1, 1), 366);
        assert_eq!(store.last_date(), Some(date(2020, 12, 31)));
        let (dir, port) = csv_dir(
            &store,
            &[LayoutKind::Single, LayoutKind::ByYear, LayoutKind::ByWeek],
        );

        assert!(dir.path().join("20200101_20201231.csv").exists());
        assert!(dir.path().join("20200101_20200105.csv").exists());
        assert!(dir.path().join("20201228_20201231.csv").exists());

        let misses = store
            .records()
            .iter()
            .filter(|r| {
                PointQuery::ByYear.lookup(&port, r.date) != r.rate
                    || PointQuery::ByWeek.lookup(&port, r.date) != r.rate
            })
            .count();
        assert_eq!(misses, 0);
        assert_eq!(PointQuery::ByYear.lookup(&port, date(2021, 1, 1)), None);
        assert_eq!(PointQuery::ByYear.lookup(&port, date(2019, 12, 31)), None);
    }
}
