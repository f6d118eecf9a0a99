//! Stage orchestration: raw inputs → canonical tables → derived artifacts.
//!
//! Stages run strictly in sequence. Each one checks its inputs before
//! writing anything and replaces its artifacts whole.

use crate::analyzers::aggregate::{aggregate_quarterly, latest_snapshot};
use crate::analyzers::trend::analyze_trends;
use crate::config::PipelineConfig;
use crate::error::{Result, require_input};
use crate::normalize::{normalize_bonds, normalize_income};
use crate::output::{log_preview, read_records, stage_records, write_records};
use crate::parser::load_table;
use crate::records::{IncomeRecord, RentPeriodAggregate, RentSnapshot};
use crate::storage::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const INCOME_INPUT: &str = "2021Census_G02_NSW_POA.csv";
pub const BOND_INPUT: &str = "bond_data.xlsx";
pub const CLEAN_INCOME: &str = "clean_income_data.csv";
pub const RENT_TIME_SERIES: &str = "clean_rental_time_series.csv";
pub const RENT_SNAPSHOT: &str = "clean_rental_snapshot.csv";
pub const TREND_REPORT: &str = "rental_trends_analysis.csv";
pub const DATABASE: &str = "western_sydney_housing.db";
pub const BENCHMARK_EXPORT: &str = "market_benchmark_table.csv";

const VIEW_PREVIEW_ROWS: usize = 10;
const TREND_PREVIEW_ROWS: usize = 5;

/// Where each stage reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub income_input: PathBuf,
    pub bond_input: PathBuf,
    pub out_dir: PathBuf,
}

impl PipelinePaths {
    /// Default input file names under `raw_dir`, all outputs under `out_dir`.
    pub fn new(raw_dir: impl AsRef<Path>, out_dir: impl Into<PathBuf>) -> Self {
        let raw_dir = raw_dir.as_ref();
        Self {
            income_input: raw_dir.join(INCOME_INPUT),
            bond_input: raw_dir.join(BOND_INPUT),
            out_dir: out_dir.into(),
        }
    }

    pub fn clean_income(&self) -> PathBuf {
        self.out_dir.join(CLEAN_INCOME)
    }

    pub fn time_series(&self) -> PathBuf {
        self.out_dir.join(RENT_TIME_SERIES)
    }

    pub fn snapshot(&self) -> PathBuf {
        self.out_dir.join(RENT_SNAPSHOT)
    }

    pub fn trends(&self) -> PathBuf {
        self.out_dir.join(TREND_REPORT)
    }

    pub fn database(&self) -> PathBuf {
        self.out_dir.join(DATABASE)
    }

    pub fn benchmark(&self) -> PathBuf {
        self.out_dir.join(BENCHMARK_EXPORT)
    }
}

/// Row counts of one completed stage. `rows_in - rows_out` rows were
/// dropped or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
}

impl StageReport {
    fn log(self) -> Self {
        info!(
            stage = self.stage,
            rows_in = self.rows_in,
            rows_out = self.rows_out,
            "Stage complete"
        );
        self
    }
}

/// Census income → `clean_income_data.csv`.
#[tracing::instrument(skip_all, fields(input = %paths.income_input.display()))]
pub fn process_income(paths: &PipelinePaths, config: &PipelineConfig) -> Result<StageReport> {
    let table = load_table(&paths.income_input)?;
    let normalized = normalize_income(&table, config)?;
    normalized.dropped.log_summary("income");

    let rows_out = write_records(&paths.clean_income(), &normalized.records)?;
    info!(path = %paths.clean_income().display(), "Saved income data");

    Ok(StageReport {
        stage: "income",
        rows_in: normalized.rows_read,
        rows_out,
    }
    .log())
}

/// Bond lodgements → quarterly time series and current snapshot.
#[tracing::instrument(skip_all, fields(input = %paths.bond_input.display()))]
pub fn process_bonds(paths: &PipelinePaths, config: &PipelineConfig) -> Result<StageReport> {
    let table = load_table(&paths.bond_input)?;
    let normalized = normalize_bonds(&table, config)?;
    normalized.dropped.log_summary("bonds");

    info!(observations = normalized.records.len(), "Aggregating into quarterly time series");
    let quarterly = aggregate_quarterly(&normalized.records);
    let snapshot = latest_snapshot(&quarterly);

    // Both files are staged before either replaces its target.
    let series_file = stage_records(&paths.time_series(), &quarterly)?;
    let snapshot_file = stage_records(&paths.snapshot(), &snapshot)?;
    let rows_out = series_file.commit()?;
    snapshot_file.commit()?;
    info!(
        quarterly = quarterly.len(),
        localities = snapshot.len(),
        "Saved rental time series and snapshot"
    );

    Ok(StageReport {
        stage: "bonds",
        rows_in: normalized.rows_read,
        rows_out,
    }
    .log())
}

/// Clean income + snapshot → SQLite store with the affordability view.
///
/// The store is built in a sibling file and moved into place once the
/// transaction commits, so every run starts from an empty database.
#[tracing::instrument(skip_all, fields(db = %paths.database().display()))]
pub fn build_database(paths: &PipelinePaths) -> Result<StageReport> {
    let income_path = paths.clean_income();
    let snapshot_path = paths.snapshot();
    require_input(&income_path)?;
    require_input(&snapshot_path)?;

    let income: Vec<IncomeRecord> = read_records(&income_path)?;
    let snapshot: Vec<RentSnapshot> = read_records(&snapshot_path)?;

    let db_path = paths.database();
    let tmp_path = db_path.with_extension("db.tmp");
    if tmp_path.exists() {
        fs::remove_file(&tmp_path)?;
    }

    let built = SqliteStore::open(&tmp_path).and_then(|mut store| store.rebuild(&income, &snapshot));
    let view = match built {
        Ok(view) => view,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
    };
    fs::rename(&tmp_path, &db_path)?;

    log_preview("market_affordability_view", &view, VIEW_PREVIEW_ROWS)?;

    Ok(StageReport {
        stage: "database",
        rows_in: income.len(),
        rows_out: view.len(),
    }
    .log())
}

/// Quarterly time series → compound growth report.
///
/// An empty result still replaces the report, leaving only its header.
#[tracing::instrument(skip_all, fields(input = %paths.time_series().display()))]
pub fn process_trends(paths: &PipelinePaths, config: &PipelineConfig) -> Result<StageReport> {
    let quarterly: Vec<RentPeriodAggregate> = read_records(&paths.time_series())?;
    let trends = analyze_trends(&quarterly, &config.localities);

    let rows_out = write_records(&paths.trends(), &trends)?;
    if trends.is_empty() {
        warn!(path = %paths.trends().display(), "No valid trends found");
    } else {
        info!(path = %paths.trends().display(), "Trend analysis saved");
        log_preview("fastest growing localities", &trends, TREND_PREVIEW_ROWS)?;
    }

    Ok(StageReport {
        stage: "trends",
        rows_in: quarterly.len(),
        rows_out,
    }
    .log())
}

/// Store view → `market_benchmark_table.csv`, without recomputation.
#[tracing::instrument(skip_all, fields(db = %paths.database().display()))]
pub fn export_view(paths: &PipelinePaths) -> Result<StageReport> {
    let db_path = paths.database();
    require_input(&db_path)?;

    let store = SqliteStore::open(&db_path)?;
    let view = store.load_view()?;
    let rows_out = write_records(&paths.benchmark(), &view)?;
    info!(path = %paths.benchmark().display(), rows = rows_out, "Exported affordability view");

    Ok(StageReport {
        stage: "export",
        rows_in: view.len(),
        rows_out,
    }
    .log())
}

/// Every stage in order; stops at the first failure.
pub fn run_all(paths: &PipelinePaths, config: &PipelineConfig) -> Result<Vec<StageReport>> {
    Ok(vec![
        process_income(paths, config)?,
        process_bonds(paths, config)?,
        build_database(paths)?,
        process_trends(paths, config)?,
        export_view(paths)?,
    ])
}
