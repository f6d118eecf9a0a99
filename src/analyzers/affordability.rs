//! Affordability view: income joined with the current rent snapshot,
//! annotated with stress rate, market average, rank and risk tier.
//!
//! The window columns are computed in two passes over the joined rows:
//! the first derives each stress rate and the market mean, the second
//! ranks rows and annotates deviation and tier. The result depends only on
//! the joined input.

use crate::analyzers::risk::risk_category;
use crate::analyzers::utility::{mean, round2};
use crate::records::{AffordabilityRow, IncomeRecord, RentSnapshot};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// One income/rent pair sharing a postcode.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub name: String,
    pub postal_code: u32,
    pub rent: f64,
    pub income: f64,
}

/// Inner join on postcode, in income order. Postcodes missing from either
/// side are left out.
pub fn join_income_rent(income: &[IncomeRecord], snapshot: &[RentSnapshot]) -> Vec<JoinedRow> {
    let rents: HashMap<u32, f64> = snapshot
        .iter()
        .map(|s| (s.postal_code, s.median_rent))
        .collect();

    income
        .iter()
        .filter_map(|inc| {
            let rent = rents.get(&inc.postal_code).copied();
            if rent.is_none() {
                debug!(postcode = inc.postal_code, "No rent snapshot for locality");
            }
            rent.map(|rent| JoinedRow {
                name: inc.name.clone(),
                postal_code: inc.postal_code,
                rent,
                income: inc.median_weekly_income_estimated,
            })
        })
        .collect()
}

/// Rent as a percentage of income, rounded to 2 decimals.
///
/// Returns `None` for a non-positive income.
pub fn stress_rate(rent: f64, income: f64) -> Option<f64> {
    (income > 0.0).then(|| round2(rent / income * 100.0))
}

/// Standard competition ranks (1-based, ties share a rank, the next distinct
/// value takes its position) for values already sorted descending.
fn competition_ranks(sorted_desc: &[f64]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted_desc.len());
    for (pos, value) in sorted_desc.iter().enumerate() {
        let rank = match (pos, ranks.last()) {
            (p, Some(&prev_rank)) if sorted_desc[p - 1] == *value => prev_rank,
            _ => pos as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

/// Builds the view rows from joined input, ordered by rank ascending.
///
/// Equal stress rates keep their join order. `variance_from_avg` is measured
/// against the unrounded market mean, not `market_avg_stress`.
pub fn affordability_view(joined: &[JoinedRow]) -> Vec<AffordabilityRow> {
    // Pass 1: per-row stress and the market mean over the full set.
    let mut scored: Vec<(&JoinedRow, f64)> = joined
        .iter()
        .filter_map(|row| match stress_rate(row.rent, row.income) {
            Some(stress) => Some((row, stress)),
            None => {
                debug!(postcode = row.postal_code, "Non-positive income, row skipped");
                None
            }
        })
        .collect();

    let stresses: Vec<f64> = scored.iter().map(|(_, s)| *s).collect();
    let market_mean = mean(&stresses);
    let market_avg_stress = round2(market_mean);

    // Pass 2: rank, deviation, tier.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let sorted_stress: Vec<f64> = scored.iter().map(|(_, s)| *s).collect();
    let ranks = competition_ranks(&sorted_stress);

    scored
        .into_iter()
        .zip(ranks)
        .map(|((row, stress), risk_rank)| AffordabilityRow {
            name: row.name.clone(),
            postal_code: row.postal_code,
            rent: row.rent,
            income: row.income,
            stress_rate: stress,
            market_avg_stress,
            variance_from_avg: round2(stress - market_mean),
            risk_rank,
            risk_category: risk_category(stress),
        })
        .collect()
}

/// Joins and computes the view in one call.
pub fn build_affordability(income: &[IncomeRecord], snapshot: &[RentSnapshot]) -> Vec<AffordabilityRow> {
    affordability_view(&join_income_rent(income, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::risk::RiskCategory;
    use chrono::NaiveDate;

    fn income(postal_code: u32, name: &str, est: f64) -> IncomeRecord {
        IncomeRecord {
            postal_code,
            name: name.to_string(),
            median_weekly_income_reported: est,
            median_weekly_income_estimated: est,
        }
    }

    fn snap(postal_code: u32, rent: f64) -> RentSnapshot {
        RentSnapshot {
            postal_code,
            period_end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            median_rent: rent,
        }
    }

    fn joined(postal_code: u32, rent: f64, income: f64) -> JoinedRow {
        JoinedRow {
            name: format!("L{postal_code}"),
            postal_code,
            rent,
            income,
        }
    }

    #[test]
    fn test_severe_risk_example() {
        let rows = build_affordability(&[income(2150, "Parramatta", 1200.0)], &[snap(2150, 420.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stress_rate, 35.0);
        assert_eq!(rows[0].risk_category, RiskCategory::SevereRisk);
        assert_eq!(rows[0].risk_rank, 1);
        assert_eq!(rows[0].market_avg_stress, 35.0);
        assert_eq!(rows[0].variance_from_avg, 0.0);
    }

    #[test]
    fn test_inner_join_excludes_unmatched() {
        let inc = vec![income(2150, "Parramatta", 1200.0), income(2148, "Blacktown", 1300.0)];
        let snaps = vec![snap(2150, 420.0), snap(2750, 500.0)];
        let rows = build_affordability(&inc, &snaps);

        let codes: Vec<u32> = rows.iter().map(|r| r.postal_code).collect();
        assert_eq!(codes, vec![2150]);
    }

    #[test]
    fn test_market_average_and_variance() {
        let rows = affordability_view(&[
            joined(1, 400.0, 1000.0),
            joined(2, 300.0, 1000.0),
            joined(3, 200.0, 1000.0),
        ]);

        assert!(rows.iter().all(|r| r.market_avg_stress == 30.0));
        let variances: Vec<f64> = rows.iter().map(|r| r.variance_from_avg).collect();
        assert_eq!(variances, vec![10.0, 0.0, -10.0]);
        let cats: Vec<RiskCategory> = rows.iter().map(|r| r.risk_category).collect();
        assert_eq!(
            cats,
            vec![RiskCategory::SevereRisk, RiskCategory::HighStress, RiskCategory::Moderate]
        );
    }

    #[test]
    fn test_variance_uses_unrounded_mean() {
        // Stresses 30.25 and 30.00: the mean 30.125 displays as 30.13.
        let rows = affordability_view(&[joined(1, 302.5, 1000.0), joined(2, 300.0, 1000.0)]);

        assert_eq!(rows[0].stress_rate, 30.25);
        assert_eq!(rows[0].market_avg_stress, 30.13);
        assert_eq!(rows[0].variance_from_avg, 0.13);
        assert_eq!(rows[1].variance_from_avg, -0.13);
    }

    #[test]
    fn test_rank_ties_share_rank_and_skip() {
        let rows = affordability_view(&[
            joined(1, 300.0, 1000.0),
            joined(2, 400.0, 1000.0),
            joined(3, 400.0, 1000.0),
            joined(4, 250.0, 1000.0),
        ]);

        let ranks: Vec<(u32, u32)> = rows.iter().map(|r| (r.postal_code, r.risk_rank)).collect();
        assert_eq!(ranks, vec![(2, 1), (3, 1), (1, 3), (4, 4)]);
    }

    #[test]
    fn test_competition_ranks() {
        assert_eq!(competition_ranks(&[]), Vec::<u32>::new());
        assert_eq!(competition_ranks(&[5.0, 5.0, 5.0]), vec![1, 1, 1]);
        assert_eq!(competition_ranks(&[9.0, 8.0, 8.0, 7.0, 7.0, 1.0]), vec![1, 2, 2, 4, 4, 6]);
    }

    #[test]
    fn test_view_is_pure() {
        let input = vec![joined(1, 350.0, 900.0), joined(2, 410.0, 1100.0)];
        assert_eq!(affordability_view(&input), affordability_view(&input));
    }

    #[test]
    fn test_zero_income_skipped() {
        let rows = affordability_view(&[joined(1, 350.0, 0.0), joined(2, 300.0, 1000.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].postal_code, 2);
    }

    #[test]
    fn test_stress_rate_non_negative() {
        assert_eq!(stress_rate(0.0, 1000.0), Some(0.0));
        assert_eq!(stress_rate(420.0, 1200.0), Some(35.0));
        assert_eq!(stress_rate(420.0, 0.0), None);
    }
}
