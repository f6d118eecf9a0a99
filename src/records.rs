//! Canonical record shapes shared by every stage.
//!
//! Serde names match the column headers of the written artifacts.

use crate::analyzers::risk::RiskCategory;
use crate::output::CsvArtifact;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Household income for one locality, as published and inflation-adjusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    #[serde(rename = "postcode")]
    pub postal_code: u32,
    #[serde(rename = "suburb")]
    pub name: String,
    #[serde(rename = "median_income_2021")]
    pub median_weekly_income_reported: f64,
    #[serde(rename = "est_income_current")]
    pub median_weekly_income_estimated: f64,
}

/// One bond lodgement.
#[derive(Debug, Clone, PartialEq)]
pub struct RentObservation {
    pub postal_code: u32,
    pub lodgement_date: NaiveDate,
    pub weekly_rent: f64,
}

/// Median rent of one locality over one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentPeriodAggregate {
    #[serde(rename = "postcode")]
    pub postal_code: u32,
    #[serde(rename = "date")]
    pub period_end_date: NaiveDate,
    pub median_rent: f64,
}

/// The latest quarter of one locality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentSnapshot {
    #[serde(rename = "postcode")]
    pub postal_code: u32,
    #[serde(rename = "date")]
    pub period_end_date: NaiveDate,
    #[serde(rename = "median_rent_current")]
    pub median_rent: f64,
}

impl From<&RentPeriodAggregate> for RentSnapshot {
    fn from(agg: &RentPeriodAggregate) -> Self {
        Self {
            postal_code: agg.postal_code,
            period_end_date: agg.period_end_date,
            median_rent: agg.median_rent,
        }
    }
}

/// Annualized rent growth of one locality between its first and last quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    #[serde(rename = "suburb")]
    pub name: String,
    #[serde(rename = "postcode")]
    pub postal_code: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_rent: f64,
    #[serde(rename = "current_rent")]
    pub end_rent: f64,
    #[serde(rename = "total_growth_pct")]
    pub growth_pct: f64,
}

/// One row of the affordability view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityRow {
    #[serde(rename = "suburb")]
    pub name: String,
    #[serde(rename = "postcode")]
    pub postal_code: u32,
    #[serde(rename = "rent_2025")]
    pub rent: f64,
    #[serde(rename = "income_2025")]
    pub income: f64,
    #[serde(rename = "rental_stress_rate")]
    pub stress_rate: f64,
    pub market_avg_stress: f64,
    pub variance_from_avg: f64,
    pub risk_rank: u32,
    pub risk_category: RiskCategory,
}

impl CsvArtifact for IncomeRecord {
    const HEADERS: &'static [&'static str] =
        &["postcode", "suburb", "median_income_2021", "est_income_current"];
}

impl CsvArtifact for RentPeriodAggregate {
    const HEADERS: &'static [&'static str] = &["postcode", "date", "median_rent"];
}

impl CsvArtifact for RentSnapshot {
    const HEADERS: &'static [&'static str] = &["postcode", "date", "median_rent_current"];
}

impl CsvArtifact for TrendRecord {
    const HEADERS: &'static [&'static str] = &[
        "suburb",
        "postcode",
        "start_date",
        "end_date",
        "start_rent",
        "current_rent",
        "total_growth_pct",
    ];
}

impl CsvArtifact for AffordabilityRow {
    const HEADERS: &'static [&'static str] = &[
        "suburb",
        "postcode",
        "rent_2025",
        "income_2025",
        "rental_stress_rate",
        "market_avg_stress",
        "variance_from_avg",
        "risk_rank",
        "risk_category",
    ];
}
