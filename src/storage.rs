//! SQLite store holding the staged canonical tables and the materialized
//! affordability view.

use crate::analyzers::affordability::build_affordability;
use crate::analyzers::risk::RiskCategory;
use crate::error::Result;
use crate::records::{AffordabilityRow, IncomeRecord, RentSnapshot};
use rusqlite::{Connection, Row, Transaction, params};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = "
    DROP VIEW IF EXISTS market_affordability_view;
    DROP TABLE IF EXISTS market_affordability;
    DROP TABLE IF EXISTS staging_income;
    DROP TABLE IF EXISTS staging_rentals;

    CREATE TABLE staging_income (
        postcode INTEGER NOT NULL,
        suburb TEXT NOT NULL,
        median_income_2021 REAL NOT NULL,
        est_income_current REAL NOT NULL
    );

    CREATE TABLE staging_rentals (
        postcode INTEGER NOT NULL,
        date TEXT NOT NULL,
        median_rent_current REAL NOT NULL
    );
";

const VIEW_SCHEMA: &str = "
    DROP VIEW IF EXISTS market_affordability_view;
    DROP TABLE IF EXISTS market_affordability;

    CREATE TABLE market_affordability (
        position INTEGER NOT NULL,
        suburb TEXT NOT NULL,
        postcode INTEGER NOT NULL,
        rent_2025 REAL NOT NULL,
        income_2025 REAL NOT NULL,
        rental_stress_rate REAL NOT NULL,
        market_avg_stress REAL NOT NULL,
        variance_from_avg REAL NOT NULL,
        risk_rank INTEGER NOT NULL,
        risk_category TEXT NOT NULL
    );

    CREATE VIEW market_affordability_view AS
    SELECT suburb, postcode, rent_2025, income_2025, rental_stress_rate,
           market_avg_stress, variance_from_avg, risk_rank, risk_category
    FROM market_affordability
    ORDER BY risk_rank ASC, position ASC;
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replaces the staging tables and the view in a single transaction.
    ///
    /// Returns the view rows that were materialized.
    pub fn rebuild(
        &mut self,
        income: &[IncomeRecord],
        snapshot: &[RentSnapshot],
    ) -> Result<Vec<AffordabilityRow>> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        insert_income(&tx, income)?;
        insert_rentals(&tx, snapshot)?;
        info!(
            income = income.len(),
            rentals = snapshot.len(),
            "Staging tables loaded"
        );

        let view = build_affordability(income, snapshot);
        write_view(&tx, &view)?;
        tx.commit()?;

        info!(rows = view.len(), "Affordability view materialized");
        Ok(view)
    }

    /// Recomputes the view from the staging tables already in the store.
    pub fn refresh_view(&mut self) -> Result<Vec<AffordabilityRow>> {
        let income = self.load_income()?;
        let snapshot = self.load_rentals()?;
        let view = build_affordability(&income, &snapshot);

        let tx = self.conn.transaction()?;
        write_view(&tx, &view)?;
        tx.commit()?;

        info!(rows = view.len(), "Affordability view refreshed");
        Ok(view)
    }

    pub fn load_income(&self) -> Result<Vec<IncomeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT postcode, suburb, median_income_2021, est_income_current
             FROM staging_income ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(IncomeRecord {
                postal_code: row.get(0)?,
                name: row.get(1)?,
                median_weekly_income_reported: row.get(2)?,
                median_weekly_income_estimated: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    pub fn load_rentals(&self) -> Result<Vec<RentSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT postcode, date, median_rent_current FROM staging_rentals ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RentSnapshot {
                postal_code: row.get(0)?,
                period_end_date: row.get(1)?,
                median_rent: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Reads the view in its published order.
    pub fn load_view(&self) -> Result<Vec<AffordabilityRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT suburb, postcode, rent_2025, income_2025, rental_stress_rate,
                    market_avg_stress, variance_from_avg, risk_rank, risk_category
             FROM market_affordability_view",
        )?;
        let rows = stmt.query_map([], map_view_row)?;

        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }
}

fn insert_income(tx: &Transaction, income: &[IncomeRecord]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO staging_income (postcode, suburb, median_income_2021, est_income_current)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for rec in income {
        stmt.execute(params![
            rec.postal_code,
            rec.name,
            rec.median_weekly_income_reported,
            rec.median_weekly_income_estimated,
        ])?;
    }
    Ok(())
}

fn insert_rentals(tx: &Transaction, snapshot: &[RentSnapshot]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO staging_rentals (postcode, date, median_rent_current) VALUES (?1, ?2, ?3)",
    )?;
    for snap in snapshot {
        stmt.execute(params![snap.postal_code, snap.period_end_date, snap.median_rent])?;
    }
    Ok(())
}

fn write_view(tx: &Transaction, view: &[AffordabilityRow]) -> Result<()> {
    tx.execute_batch(VIEW_SCHEMA)?;
    let mut stmt = tx.prepare(
        "INSERT INTO market_affordability (
            position, suburb, postcode, rent_2025, income_2025, rental_stress_rate,
            market_avg_stress, variance_from_avg, risk_rank, risk_category
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for (position, row) in view.iter().enumerate() {
        stmt.execute(params![
            position as i64,
            row.name,
            row.postal_code,
            row.rent,
            row.income,
            row.stress_rate,
            row.market_avg_stress,
            row.variance_from_avg,
            row.risk_rank,
            row.risk_category.as_str(),
        ])?;
    }
    Ok(())
}

fn map_view_row(row: &Row) -> std::result::Result<AffordabilityRow, rusqlite::Error> {
    let label: String = row.get(8)?;
    let risk_category = RiskCategory::parse(&label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            rusqlite::types::Type::Text,
            format!("unknown risk category: {label}").into(),
        )
    })?;

    Ok(AffordabilityRow {
        name: row.get(0)?,
        postal_code: row.get(1)?,
        rent: row.get(2)?,
        income: row.get(3)?,
        stress_rate: row.get(4)?,
        market_avg_stress: row.get(5)?,
        variance_from_avg: row.get(6)?,
        risk_rank: row.get(7)?,
        risk_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn income(postal_code: u32, name: &str, est: f64) -> IncomeRecord {
        IncomeRecord {
            postal_code,
            name: name.to_string(),
            median_weekly_income_reported: est / 1.142,
            median_weekly_income_estimated: est,
        }
    }

    fn snap(postal_code: u32, rent: f64) -> RentSnapshot {
        RentSnapshot {
            postal_code,
            period_end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            median_rent: rent,
        }
    }

    #[test]
    fn test_rebuild_and_load_view() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let built = store
            .rebuild(
                &[income(2150, "Parramatta", 1200.0), income(2148, "Blacktown", 1500.0)],
                &[snap(2150, 420.0), snap(2148, 420.0)],
            )
            .unwrap();

        let loaded = store.load_view().unwrap();
        assert_eq!(loaded, built);
        assert_eq!(loaded[0].postal_code, 2150);
        assert_eq!(loaded[0].risk_category, RiskCategory::SevereRisk);
        assert_eq!(loaded[1].risk_rank, 2);
    }

    #[test]
    fn test_rebuild_replaces_prior_contents() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .rebuild(&[income(2150, "Parramatta", 1200.0)], &[snap(2150, 420.0)])
            .unwrap();
        store
            .rebuild(&[income(2148, "Blacktown", 1500.0)], &[snap(2148, 400.0)])
            .unwrap();

        let inc = store.load_income().unwrap();
        assert_eq!(inc.len(), 1);
        assert_eq!(inc[0].postal_code, 2148);
        assert_eq!(store.load_view().unwrap().len(), 1);
    }

    #[test]
    fn test_staging_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let snaps = vec![snap(2750, 530.0), snap(2150, 610.0)];
        store.rebuild(&[], &snaps).unwrap();

        assert_eq!(store.load_rentals().unwrap(), snaps);
        assert!(store.load_view().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_view_matches_rebuild() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let built = store
            .rebuild(
                &[income(2150, "Parramatta", 1200.0), income(2770, "Mt Druitt", 1100.0)],
                &[snap(2150, 420.0), snap(2770, 350.0)],
            )
            .unwrap();

        let refreshed = store.refresh_view().unwrap();
        assert_eq!(refreshed, built);
        assert_eq!(store.load_view().unwrap(), built);
    }
}
