//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::chart_svg;
use crate::adapters::csv_dataset_adapter::CsvDatasetAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{self, FillOutcome, YearMonth};
use crate::domain::annotation::Annotation;
use crate::domain::collect::CollectionReport;
use crate::domain::config_validation::{parse_optional_date, validate_fetch_config};
use crate::domain::context::DatasetContext;
use crate::domain::error::FxError;
use crate::domain::layout::{LayoutKind, DATES_FILE, RATES_FILE};
use crate::domain::query::{self, PointQuery};
use crate::domain::record::{parse_date, Record, DATE_FORMAT};
use crate::domain::store::{RecordCursor, RecordStore, DATASET_FILE};
use crate::ports::config_port::ConfigPort;
use crate::ports::dataset_port::DatasetPort;

pub const DEFAULT_START_DATE: (i32, u32, u32) = (2016, 1, 1);
pub const DEFAULT_DEVIATION_THRESHOLD: f64 = 1.0;

#[derive(Parser, Debug)]
#[command(name = "inrlab", about = "INR/RUB exchange-rate dataset toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Dataset directory (falls back to [data] dir in the config)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download daily rates into dataset.csv
    Fetch {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, value_parser = parse_cli_date)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_cli_date)]
        end: Option<NaiveDate>,
        /// Merge into the existing dataset instead of replacing it
        #[arg(long)]
        merge: bool,
    },
    /// Show a summary of the dataset
    Info {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Write the dataset in another layout
    Export {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(short, long, value_parser = parse_layout)]
        layout: LayoutKind,
        /// Target directory (defaults to the dataset directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Look up the rate on a date
    Query {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, value_parser = parse_cli_date)]
        date: NaiveDate,
        #[arg(short, long, value_parser = parse_query, default_value = "single")]
        layout: PointQuery,
        /// Run the lookup against all four layouts
        #[arg(long)]
        all: bool,
    },
    /// Walk the dataset in date order
    Iterate {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Records to print before stopping
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
        /// After the first pass, reset the cursor and print this many again
        #[arg(long, default_value_t = 0)]
        replay: usize,
    },
    /// Write a manifest of a layout's files
    Annotate {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(short, long, value_parser = parse_layout)]
        layout: LayoutKind,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Descriptive statistics
    Analyze {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(subcommand)]
        action: AnalyzeAction,
    },
    /// Render an SVG chart of the full period or one month
    Plot {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long, value_parser = parse_month)]
        month: Option<YearMonth>,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnalyzeAction {
    /// Count missing values and fill them with the median
    Missing {
        /// Persist the filled series back to dataset.csv
        #[arg(long)]
        save: bool,
    },
    /// Deviation of every rate from the median and the mean
    Deviations,
    /// Count, mean, std and quartiles of each column
    Stats,
    /// Statistics grouped by calendar month
    Monthly,
    /// Rows whose absolute deviation from the mean reaches a threshold
    FilterDeviation {
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Rows between two dates, inclusive
    FilterDates {
        #[arg(long, value_parser = parse_cli_date)]
        start: NaiveDate,
        #[arg(long, value_parser = parse_cli_date)]
        end: NaiveDate,
    },
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date {:?}, expected YYYY-MM-DD", s))
}

fn parse_layout(s: &str) -> Result<LayoutKind, String> {
    s.parse().map_err(|e: FxError| e.to_string())
}

fn parse_query(s: &str) -> Result<PointQuery, String> {
    s.parse().map_err(|e: FxError| e.to_string())
}

fn parse_month(s: &str) -> Result<YearMonth, String> {
    s.parse().map_err(|e: FxError| e.to_string())
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Fetch {
            dataset,
            start,
            end,
            merge,
        } => run_fetch(&dataset, start, end, merge),
        Command::Info { dataset } => run_info(&dataset),
        Command::Export {
            dataset,
            layout,
            output,
        } => run_export(&dataset, layout, output.as_deref()),
        Command::Query {
            dataset,
            date,
            layout,
            all,
        } => run_query(&dataset, date, layout, all),
        Command::Iterate {
            dataset,
            limit,
            replay,
        } => run_iterate(&dataset, limit, replay),
        Command::Annotate {
            dataset,
            layout,
            output,
        } => run_annotate(&dataset, layout, &output),
        Command::Analyze { dataset, action } => run_analyze(&dataset, &action),
        Command::Plot {
            dataset,
            month,
            output,
        } => run_plot(&dataset, month, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, FxError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|e| FxError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// `--dir` wins over `[data] dir`.
pub fn resolve_dir(dir_override: Option<&Path>, config: &dyn ConfigPort) -> Result<PathBuf, FxError> {
    if let Some(dir) = dir_override {
        return Ok(dir.to_path_buf());
    }
    match config.get_string("data", "dir") {
        Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir.trim())),
        _ => Err(FxError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        }),
    }
}

fn open_dataset(args: &DatasetArgs) -> Result<(DatasetContext<CsvDatasetAdapter>, FileConfigAdapter), FxError> {
    let config = load_config(args.config.as_deref())?;
    let dir = resolve_dir(args.dir.as_deref(), &config)?;
    let ctx = DatasetContext::open(CsvDatasetAdapter::new(dir))?;
    Ok((ctx, config))
}

/// Download window: flags override config, which overrides the defaults
/// (2016-01-01 through `today`).
pub fn build_fetch_window(
    config: &dyn ConfigPort,
    start_override: Option<NaiveDate>,
    end_override: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), FxError> {
    let (y, m, d) = DEFAULT_START_DATE;
    let default_start = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(today);

    let start = match start_override {
        Some(s) => s,
        None => parse_optional_date(config, "start_date")?.unwrap_or(default_start),
    };
    let end = match end_override {
        Some(e) => e,
        None => parse_optional_date(config, "end_date")?.unwrap_or(today),
    };

    if start > end {
        return Err(FxError::validation(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok((start, end))
}

#[cfg(feature = "fetch")]
pub fn build_cbr_settings(config: &dyn ConfigPort) -> crate::adapters::cbr_adapter::CbrSettings {
    use crate::adapters::cbr_adapter::CbrSettings;

    let defaults = CbrSettings::default();
    CbrSettings {
        base_url: config.get_string("fetch", "base_url").unwrap_or(defaults.base_url),
        currency: config
            .get_string("fetch", "currency")
            .map(|c| c.trim().to_uppercase())
            .unwrap_or(defaults.currency),
        timeout: std::time::Duration::from_secs(
            config.get_int("fetch", "timeout_secs", defaults.timeout.as_secs() as i64).max(1) as u64,
        ),
        user_agent: config
            .get_string("fetch", "user_agent")
            .unwrap_or(defaults.user_agent),
    }
}

#[cfg_attr(not(feature = "fetch"), allow(unused_variables))]
fn run_fetch(
    args: &DatasetArgs,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    merge: bool,
) -> Result<(), FxError> {
    let config = load_config(args.config.as_deref())?;
    validate_fetch_config(&config)?;
    let dir = resolve_dir(args.dir.as_deref(), &config)?;
    let (start, end) = build_fetch_window(&config, start, end, Local::now().date_naive())?;

    #[cfg(feature = "fetch")]
    {
        use crate::adapters::cbr_adapter::CbrAdapter;
        use crate::domain::collect::collect_rates;

        let settings = build_cbr_settings(&config);
        eprintln!(
            "Collecting {} rates from {} to {}...",
            settings.currency, start, end
        );
        let source = CbrAdapter::new(settings)?;
        let report = collect_rates(&source, start, end)?;
        store_collected(&dir, report, merge)
    }

    #[cfg(not(feature = "fetch"))]
    {
        Err(FxError::validation(format!(
            "cannot download {} to {} into {}: built without the fetch feature",
            start,
            end,
            dir.display()
        )))
    }
}

/// Persist collected rates as `dataset.csv` in `dir`, replacing or merging.
pub fn store_collected(
    dir: &Path,
    report: CollectionReport,
    merge: bool,
) -> Result<(), FxError> {
    for date in &report.unavailable {
        eprintln!("--- {}: no data", date);
    }
    if report.records.is_empty() {
        return Err(FxError::NoData {
            reason: format!("no rates collected over {} day(s)", report.days()),
        });
    }

    let port = CsvDatasetAdapter::new(dir.to_path_buf());
    let collected = report.records.len();
    let ctx = if merge && port.exists(DATASET_FILE) {
        let mut ctx = DatasetContext::open(port)?;
        ctx.store_mut().append(report.records);
        ctx.export(LayoutKind::Single)?;
        ctx
    } else {
        DatasetContext::create(port, RecordStore::from_records(report.records))?
    };

    eprintln!(
        "Saved {} collected rate(s); dataset now holds {} record(s) in {}",
        collected,
        ctx.store().len(),
        dir.display()
    );
    Ok(())
}

fn run_info(args: &DatasetArgs) -> Result<(), FxError> {
    let (ctx, _) = open_dataset(args)?;
    let store = ctx.store();
    let missing = analysis::missing_values(store.records());

    println!("Records:   {}", store.len());
    match (store.first_date(), store.last_date()) {
        (Some(first), Some(last)) => println!("Range:     {} - {}", first, last),
        _ => println!("Range:     (empty)"),
    }
    println!(
        "Missing:   {} ({:.2}%)",
        missing.rate.count, missing.rate.percentage
    );

    let port = ctx.port();
    let split = port.exists(DATES_FILE) && port.exists(RATES_FILE);
    println!("X/Y files: {}", if split { "present" } else { "absent" });
    match port.list_partitions() {
        Ok(parts) => println!("Partition files: {}", parts.len()),
        Err(e) => log::warn!("could not list partitions: {}", e),
    }
    Ok(())
}

fn run_export(args: &DatasetArgs, kind: LayoutKind, output: Option<&Path>) -> Result<(), FxError> {
    let (ctx, _) = open_dataset(args)?;
    let report = match output {
        Some(dir) => ctx.export_to(kind, &CsvDatasetAdapter::new(dir.to_path_buf()))?,
        None => ctx.export(kind)?,
    };

    eprintln!("Exported {} layout: {} file(s)", report.kind, report.count());
    for file in &report.files {
        println!("{}", file);
    }
    Ok(())
}

fn run_query(args: &DatasetArgs, date: NaiveDate, layout: PointQuery, all: bool) -> Result<(), FxError> {
    let (ctx, _) = open_dataset(args)?;

    if all {
        let results = query::compare(ctx.port(), date);
        for (q, rate) in &results {
            println!("{}", format_lookup(date, *q, *rate));
        }
        if results.windows(2).any(|w| w[0].1 != w[1].1) {
            eprintln!("warning: layouts disagree for {}; re-export them from the same dataset", date);
        }
    } else {
        println!("{}", format_lookup(date, layout, ctx.query(layout, date)));
    }
    Ok(())
}

pub fn format_lookup(date: NaiveDate, query: PointQuery, rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{}: {:.4} RUB ({})", date.format(DATE_FORMAT), r, query),
        None => format!("{}: not found ({})", date.format(DATE_FORMAT), query),
    }
}

fn run_iterate(args: &DatasetArgs, limit: usize, replay: usize) -> Result<(), FxError> {
    let (ctx, _) = open_dataset(args)?;
    let mut cursor = ctx.store().cursor();

    print_records(&mut cursor, limit);
    eprintln!("Position: {} of {}", cursor.position(), ctx.store().len());

    if replay > 0 {
        cursor.reset();
        eprintln!("Cursor reset");
        print_records(&mut cursor, replay);
        eprintln!("Position: {} of {}", cursor.position(), ctx.store().len());
    }
    Ok(())
}

fn print_records(cursor: &mut RecordCursor<'_>, count: usize) {
    for i in 0..count {
        match cursor.next() {
            Some(record) => println!("{}", format_cursor_line(i + 1, &record)),
            None => {
                eprintln!("End of data");
                break;
            }
        }
    }
}

/// One numbered line of `iterate` output.
pub fn format_cursor_line(n: usize, record: &Record) -> String {
    match record.rate {
        Some(rate) => format!("{:2}. {} - {:.4} RUB", n, record.date.format(DATE_FORMAT), rate),
        None => format!("{:2}. {} - missing", n, record.date.format(DATE_FORMAT)),
    }
}

fn run_annotate(args: &DatasetArgs, kind: LayoutKind, output: &Path) -> Result<(), FxError> {
    let config = load_config(args.config.as_deref())?;
    let dir = resolve_dir(args.dir.as_deref(), &config)?;
    let port = CsvDatasetAdapter::new(dir);

    let annotation = Annotation::scan(&port, kind)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, annotation.render(Local::now().naive_local()))?;
    eprintln!(
        "Annotation for {} layout ({} file(s)) written to {}",
        kind,
        annotation.files.len(),
        output.display()
    );
    Ok(())
}

fn run_analyze(args: &DatasetArgs, action: &AnalyzeAction) -> Result<(), FxError> {
    let (mut ctx, config) = open_dataset(args)?;

    match action {
        AnalyzeAction::Missing { save } => {
            let report = analysis::missing_values(ctx.store().records());
            println!("{:<10} {:>13} {:>18}", "column", "missing_count", "missing_percentage");
            println!("{:<10} {:>13} {:>18.2}", "Date", report.date.count, report.date.percentage);
            println!("{:<10} {:>13} {:>18.2}", "INR_Rate", report.rate.count, report.rate.percentage);
            println!("Total missing: {}", report.total());

            match analysis::fill_missing_with_median(ctx.store_mut()) {
                FillOutcome::Filled { count, median } => {
                    eprintln!("Filled {} missing rate(s) with median {:.4}", count, median);
                    if *save {
                        ctx.export(LayoutKind::Single)?;
                        eprintln!("Saved filled dataset");
                    }
                }
                FillOutcome::NothingMissing => eprintln!("No missing rates"),
                FillOutcome::Undefined => {
                    return Err(FxError::NoData {
                        reason: "every rate is missing, no median to fill with".into(),
                    });
                }
            }
        }
        AnalyzeAction::Deviations => {
            let table = ctx.deviations().into_table()?;
            eprintln!("Median: {:.4}  Mean: {:.4}", table.median, table.mean);
            println!(
                "date,inr_rate,deviation_from_median,deviation_from_mean,abs_deviation_from_median,abs_deviation_from_mean"
            );
            for row in &table.rows {
                println!(
                    "{},{},{},{},{},{}",
                    row.date,
                    fmt_opt(row.rate),
                    fmt_opt(row.deviation_from_median),
                    fmt_opt(row.deviation_from_mean),
                    fmt_opt(row.abs_deviation_from_median),
                    fmt_opt(row.abs_deviation_from_mean),
                );
            }
        }
        AnalyzeAction::Stats => {
            let table = ctx.deviations().into_table()?;
            println!(
                "{:<26} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
                "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
            );
            for c in analysis::describe(&table.rows) {
                println!(
                    "{:<26} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
                    c.name, c.count, c.mean, c.std, c.min, c.q25, c.q50, c.q75, c.max
                );
            }
        }
        AnalyzeAction::Monthly => {
            let table = ctx.deviations().into_table()?;
            let months = analysis::group_by_month(&table.rows);
            println!("year_month,mean,median,std,min,max,deviation_from_mean_mean,abs_deviation_from_mean_mean");
            for m in &months {
                println!(
                    "{},{},{},{},{},{},{},{}",
                    m.year_month,
                    m.mean,
                    m.median,
                    m.std,
                    m.min,
                    m.max,
                    m.mean_deviation_from_mean,
                    m.mean_abs_deviation_from_mean
                );
            }
            eprintln!("Grouped into {} month(s)", months.len());
        }
        AnalyzeAction::FilterDeviation { threshold } => {
            let threshold = threshold.unwrap_or_else(|| {
                config.get_double("analysis", "deviation_threshold", DEFAULT_DEVIATION_THRESHOLD)
            });
            let table = ctx.deviations().into_table()?;
            let filtered = analysis::filter_by_deviation(&table.rows, threshold);
            println!("date,inr_rate,abs_deviation_from_mean");
            for row in &filtered.rows {
                println!("{},{},{}", row.date, fmt_opt(row.rate), fmt_opt(row.abs_deviation_from_mean));
            }
            eprintln!(
                "{} row(s) with |deviation| >= {} ({:.2}% of total)",
                filtered.rows.len(),
                filtered.threshold,
                filtered.share
            );
        }
        AnalyzeAction::FilterDates { start, end } => {
            let table = ctx.deviations().into_table()?;
            let rows = analysis::filter_by_date_range(&table.rows, *start, *end)?;
            println!("date,inr_rate,deviation_from_mean");
            for row in &rows {
                println!("{},{},{}", row.date, fmt_opt(row.rate), fmt_opt(row.deviation_from_mean));
            }
            eprintln!("{} row(s) between {} and {}", rows.len(), start, end);
        }
    }
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.4}", x)).unwrap_or_default()
}

fn run_plot(args: &DatasetArgs, month: Option<YearMonth>, output: &Path) -> Result<(), FxError> {
    let (ctx, _) = open_dataset(args)?;
    let records = ctx.store().records();

    let svg = match month {
        Some(ym) => {
            let summary = analysis::month_summary(records, ym).ok_or_else(|| FxError::NoData {
                reason: format!("no rates in {}", ym),
            })?;
            eprintln!(
                "{}: {} day(s), min {:.4}, max {:.4}, median {:.4}, mean {:.4}",
                ym,
                summary.points.len(),
                summary.min,
                summary.max,
                summary.median,
                summary.mean
            );
            chart_svg::render_month_chart(&summary)
        }
        None => {
            let svg = chart_svg::render_rate_chart(records);
            if svg.is_empty() {
                return Err(FxError::NoData {
                    reason: "no rates to plot".into(),
                });
            }
            svg
        }
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, svg)?;
    eprintln!("Chart written to: {}", output.display());
    Ok(())
}
