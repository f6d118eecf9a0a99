//! Schema normalization of the raw source tables.
//!
//! Maps raw rows to canonical records, keeping only the configured
//! localities. Rows with unusable values are dropped and tallied, never
//! coerced.

pub mod bonds;
pub mod income;
pub mod schema;
pub mod values;

pub use bonds::normalize_bonds;
pub use income::normalize_income;

use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Why a source row was left out of a canonical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    InvalidPostcode,
    UnknownLocality,
    InvalidIncome,
    InvalidRent,
    InvalidDate,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::InvalidPostcode => "invalid_postcode",
            DropReason::UnknownLocality => "unknown_locality",
            DropReason::InvalidIncome => "invalid_income",
            DropReason::InvalidRent => "invalid_rent",
            DropReason::InvalidDate => "invalid_date",
        };
        f.write_str(s)
    }
}

/// Per-reason counts of dropped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropTally {
    counts: BTreeMap<DropReason, usize>,
}

impl DropTally {
    pub fn record(&mut self, reason: DropReason) {
        *self.counts.entry(reason).or_default() += 1;
    }

    pub fn count(&self, reason: DropReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn log_summary(&self, source: &str) {
        for (reason, count) in &self.counts {
            info!(source, reason = %reason, count, "Rows dropped");
        }
    }
}

/// Canonical records plus the tally of rows that did not make it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub dropped: DropTally,
    pub rows_read: usize,
}
