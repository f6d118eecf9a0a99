//! Census income table → [`IncomeRecord`]s.

use super::schema::{ColumnRole, INCOME_RULES, resolve_columns};
use super::values::{parse_amount, parse_postcode};
use super::{DropReason, DropTally, Normalized};
use crate::analyzers::utility::round2;
use crate::config::PipelineConfig;
use crate::error::SchemaError;
use crate::parser::RawTable;
use crate::records::IncomeRecord;
use tracing::debug;

/// Normalizes the census table, in input order.
///
/// The estimated income is the reported median times the configured wage
/// index factor, rounded to cents.
///
/// # Errors
///
/// Returns a [`SchemaError`] if the postcode or income column cannot be
/// resolved unambiguously.
pub fn normalize_income(
    table: &RawTable,
    config: &PipelineConfig,
) -> Result<Normalized<IncomeRecord>, SchemaError> {
    let cols = resolve_columns(&table.headers, INCOME_RULES)?;
    let postcode_col = cols.index(ColumnRole::Postcode)?;
    let income_col = cols.index(ColumnRole::Income)?;

    let mut records = Vec::new();
    let mut dropped = DropTally::default();

    for (line, row) in table.rows.iter().enumerate() {
        let outcome = parse_row(row, postcode_col, income_col, config);
        match outcome {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(line = line + 2, reason = %reason, "Income row dropped");
                dropped.record(reason);
            }
        }
    }

    Ok(Normalized {
        records,
        dropped,
        rows_read: table.rows.len(),
    })
}

fn parse_row(
    row: &[String],
    postcode_col: usize,
    income_col: usize,
    config: &PipelineConfig,
) -> Result<IncomeRecord, DropReason> {
    let postal_code =
        parse_postcode(RawTable::cell(row, postcode_col)).ok_or(DropReason::InvalidPostcode)?;
    if !config.localities.contains(postal_code) {
        return Err(DropReason::UnknownLocality);
    }
    let reported =
        parse_amount(RawTable::cell(row, income_col)).ok_or(DropReason::InvalidIncome)?;

    Ok(IncomeRecord {
        postal_code,
        name: config.localities.name_of(postal_code).to_string(),
        median_weekly_income_reported: reported,
        median_weekly_income_estimated: round2(reported * config.wage_index_factor),
    })
}
