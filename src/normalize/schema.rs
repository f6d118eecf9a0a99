//! Declarative column resolution.
//!
//! Each [`ColumnRule`] names a role and the header fragments that identify
//! it. A rule resolves only when exactly one normalized header contains one
//! of its fragments.

use crate::error::SchemaError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Postcode,
    Income,
    Date,
    Rent,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::Postcode => "postcode",
            ColumnRole::Income => "income",
            ColumnRole::Date => "date",
            ColumnRole::Rent => "rent",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub role: ColumnRole,
    pub fragments: &'static [&'static str],
}

pub static INCOME_RULES: &[ColumnRule] = &[
    ColumnRule {
        role: ColumnRole::Postcode,
        fragments: &["poa_code", "postcode"],
    },
    ColumnRule {
        role: ColumnRole::Income,
        fragments: &["median_tot_hhd_inc_weekly"],
    },
];

pub static BOND_RULES: &[ColumnRule] = &[
    ColumnRule {
        role: ColumnRole::Date,
        fragments: &["date", "lodgement"],
    },
    ColumnRule {
        role: ColumnRole::Rent,
        fragments: &["rent"],
    },
    ColumnRule {
        role: ColumnRole::Postcode,
        fragments: &["postcode"],
    },
];

/// Lower-cases, trims and joins inner whitespace with `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Column indices for every role of a rule set, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    columns: Vec<(ColumnRole, usize)>,
}

impl ResolvedColumns {
    /// Index of the column playing `role`.
    ///
    /// A role outside the rule set that produced `self` is a missing column.
    pub fn index(&self, role: ColumnRole) -> Result<usize, SchemaError> {
        self.columns
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, idx)| *idx)
            .ok_or_else(|| SchemaError::MissingColumn {
                role: role.to_string(),
                fragments: Vec::new(),
                headers: Vec::new(),
            })
    }
}

/// Resolves one rule against raw headers.
pub fn resolve_column(headers: &[String], rule: &ColumnRule) -> Result<usize, SchemaError> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let candidates: Vec<usize> = normalized
        .iter()
        .enumerate()
        .filter(|(_, h)| rule.fragments.iter().any(|f| h.contains(f)))
        .map(|(idx, _)| idx)
        .collect();

    match candidates.as_slice() {
        [idx] => Ok(*idx),
        [] => Err(SchemaError::MissingColumn {
            role: rule.role.to_string(),
            fragments: rule.fragments.iter().map(|f| f.to_string()).collect(),
            headers: normalized,
        }),
        many => Err(SchemaError::AmbiguousColumn {
            role: rule.role.to_string(),
            candidates: many.iter().map(|&idx| headers[idx].clone()).collect(),
        }),
    }
}

/// Resolves every rule; fails on the first missing or ambiguous role.
pub fn resolve_columns(
    headers: &[String],
    rules: &[ColumnRule],
) -> Result<ResolvedColumns, SchemaError> {
    let columns = rules
        .iter()
        .map(|rule| resolve_column(headers, rule).map(|idx| (rule.role, idx)))
        .collect::<Result<_, _>>()?;
    Ok(ResolvedColumns { columns })
}
