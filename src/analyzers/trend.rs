//! Compound annual rent growth per locality.

use crate::analyzers::aggregate::series_by_postcode;
use crate::analyzers::utility::round2;
use crate::config::LocalityMap;
use crate::records::{RentPeriodAggregate, TrendRecord};
use std::cmp::Ordering;

/// Average Gregorian year length in days.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Compound annual growth rate in percent, rounded to 2 decimals.
///
/// Returns `None` when the span is zero years or the start rent is not
/// positive, since the rate is undefined there.
pub fn cagr_pct(start_rent: f64, end_rent: f64, elapsed_years: f64) -> Option<f64> {
    if elapsed_years == 0.0 || start_rent <= 0.0 {
        return None;
    }
    let rate = (end_rent / start_rent).powf(1.0 / elapsed_years) - 1.0;
    rate.is_finite().then(|| round2(rate * 100.0))
}

/// Growth between the first and last point of one ascending series.
///
/// Series with fewer than two points yield `None`.
pub fn trend_for_series(series: &[RentPeriodAggregate], localities: &LocalityMap) -> Option<TrendRecord> {
    let (start, end) = match series {
        [] | [_] => return None,
        [start, .., end] => (start, end),
    };

    let days = (end.period_end_date - start.period_end_date).num_days();
    let elapsed_years = days as f64 / DAYS_PER_YEAR;
    let growth_pct = cagr_pct(start.median_rent, end.median_rent, elapsed_years)?;

    Some(TrendRecord {
        name: localities.name_of(start.postal_code).to_string(),
        postal_code: start.postal_code,
        start_date: start.period_end_date,
        end_date: end.period_end_date,
        start_rent: start.median_rent,
        end_rent: end.median_rent,
        growth_pct,
    })
}

/// Trend records for every postcode with a usable series, sorted by growth
/// descending. Equal growth keeps ascending postcode order.
pub fn analyze_trends(aggregates: &[RentPeriodAggregate], localities: &LocalityMap) -> Vec<TrendRecord> {
    let mut trends: Vec<TrendRecord> = series_by_postcode(aggregates)
        .values()
        .filter_map(|series| trend_for_series(series, localities))
        .collect();

    trends.sort_by(|a, b| {
        b.growth_pct
            .partial_cmp(&a.growth_pct)
            .unwrap_or(Ordering::Equal)
            .then(a.postal_code.cmp(&b.postal_code))
    });
    trends
}
