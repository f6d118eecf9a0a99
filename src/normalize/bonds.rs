//! Rental bond lodgements → [`RentObservation`]s.

use super::schema::{BOND_RULES, ColumnRole, resolve_columns};
use super::values::{parse_amount, parse_date_dayfirst, parse_postcode};
use super::{DropReason, DropTally, Normalized};
use crate::config::PipelineConfig;
use crate::error::SchemaError;
use crate::parser::RawTable;
use crate::records::RentObservation;
use tracing::debug;

/// Normalizes the bond table, in input order.
///
/// A row is dropped when its rent is not numeric (e.g. `U`), its postcode is
/// not numeric or outside the locality set, or its lodgement date does not
/// parse.
pub fn normalize_bonds(
    table: &RawTable,
    config: &PipelineConfig,
) -> Result<Normalized<RentObservation>, SchemaError> {
    let cols = resolve_columns(&table.headers, BOND_RULES)?;
    let date_col = cols.index(ColumnRole::Date)?;
    let rent_col = cols.index(ColumnRole::Rent)?;
    let postcode_col = cols.index(ColumnRole::Postcode)?;

    let mut records = Vec::new();
    let mut dropped = DropTally::default();

    for (line, row) in table.rows.iter().enumerate() {
        match parse_row(row, date_col, rent_col, postcode_col, config) {
            Ok(obs) => records.push(obs),
            Err(reason) => {
                debug!(line = line + 2, reason = %reason, "Bond row dropped");
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
    date_col: usize,
    rent_col: usize,
    postcode_col: usize,
    config: &PipelineConfig,
) -> Result<RentObservation, DropReason> {
    let weekly_rent = parse_amount(RawTable::cell(row, rent_col)).ok_or(DropReason::InvalidRent)?;
    let postal_code =
        parse_postcode(RawTable::cell(row, postcode_col)).ok_or(DropReason::InvalidPostcode)?;
    if !config.localities.contains(postal_code) {
        return Err(DropReason::UnknownLocality);
    }
    let lodgement_date =
        parse_date_dayfirst(RawTable::cell(row, date_col)).ok_or(DropReason::InvalidDate)?;

    Ok(RentObservation {
        postal_code,
        lodgement_date,
        weekly_rent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bonds(rows: &[[&str; 4]]) -> RawTable {
        RawTable::new(
            vec![
                "Lodgement Date".into(),
                "Postcode".into(),
                "Bedrooms".into(),
                "Weekly Rent".into(),
            ],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_normalizes_valid_row() {
        let table = bonds(&[["03/04/2024", "2150", "2", "550"]]);
        let out = normalize_bonds(&table, &PipelineConfig::default()).unwrap();

        assert_eq!(
            out.records,
            vec![RentObservation {
                postal_code: 2150,
                lodgement_date: NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
                weekly_rent: 550.0,
            }]
        );
        assert_eq!(out.dropped.total(), 0);
    }

    #[test]
    fn test_drops_each_bad_row_only() {
        let table = bonds(&[
            ["03/04/2024", "2150", "2", "U"],
            ["03/04/2024", "2000", "2", "700"],
            ["03/04/2024", "NA", "2", "700"],
            ["not a date", "2148", "3", "480"],
            ["15/05/2024", "2148", "3", "480"],
        ]);
        let out = normalize_bonds(&table, &PipelineConfig::default()).unwrap();

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].postal_code, 2148);
        assert_eq!(out.dropped.count(DropReason::InvalidRent), 1);
        assert_eq!(out.dropped.count(DropReason::UnknownLocality), 1);
        assert_eq!(out.dropped.count(DropReason::InvalidPostcode), 1);
        assert_eq!(out.dropped.count(DropReason::InvalidDate), 1);
        assert_eq!(out.rows_read, 5);
    }

    #[test]
    fn test_output_postcodes_within_locality_set() {
        let table = bonds(&[
            ["01/01/2024", "2150", "1", "400"],
            ["01/01/2024", "2010", "1", "800"],
            ["01/01/2024", "2760", "1", "450"],
            ["01/01/2024", "3000", "1", "600"],
        ]);
        let config = PipelineConfig::default();
        let out = normalize_bonds(&table, &config).unwrap();
        assert!(out.records.iter().all(|r| config.localities.contains(r.postal_code)));
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn test_schema_error_on_missing_rent() {
        let table = RawTable::new(vec!["Lodgement Date".into(), "Postcode".into()], vec![]);
        assert!(normalize_bonds(&table, &PipelineConfig::default()).is_err());
    }
}
