use crate::analyzers::utility::median;
use crate::records::{RentObservation, RentPeriodAggregate, RentSnapshot};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::warn;

/// Last day of the calendar quarter containing `date`, or `None` past the
/// end of the representable calendar.
pub fn quarter_end(date: NaiveDate) -> Option<NaiveDate> {
    let quarter_last_month = ((date.month0() / 3) + 1) * 3;
    let (year, next_month) = if quarter_last_month == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), quarter_last_month + 1)
    };
    NaiveDate::from_ymd_opt(year, next_month, 1).and_then(|first| first.pred_opt())
}

/// Buckets observations by `(postcode, quarter)` and takes the median rent of
/// each bucket.
///
/// Output is ordered by postcode, then quarter. Quarters without
/// observations are not emitted, so a locality's series may have gaps.
pub fn aggregate_quarterly(observations: &[RentObservation]) -> Vec<RentPeriodAggregate> {
    let mut buckets: BTreeMap<(u32, NaiveDate), Vec<f64>> = BTreeMap::new();

    for obs in observations {
        let Some(period_end) = quarter_end(obs.lodgement_date) else {
            warn!(date = %obs.lodgement_date, "Lodgement date has no quarter end, skipped");
            continue;
        };
        buckets
            .entry((obs.postal_code, period_end))
            .or_default()
            .push(obs.weekly_rent);
    }

    buckets
        .into_iter()
        .filter_map(|((postal_code, period_end_date), rents)| {
            median(&rents).map(|median_rent| RentPeriodAggregate {
                postal_code,
                period_end_date,
                median_rent,
            })
        })
        .collect()
}

/// The aggregate with the latest period end for each postcode, ordered by
/// postcode. Postcodes without aggregates are absent.
pub fn latest_snapshot(aggregates: &[RentPeriodAggregate]) -> Vec<RentSnapshot> {
    let mut latest: BTreeMap<u32, &RentPeriodAggregate> = BTreeMap::new();

    for agg in aggregates {
        latest
            .entry(agg.postal_code)
            .and_modify(|cur| {
                if agg.period_end_date > cur.period_end_date {
                    *cur = agg;
                }
            })
            .or_insert(agg);
    }

    latest.into_values().map(RentSnapshot::from).collect()
}

/// Splits aggregates into per-postcode series, each ascending by period end.
pub fn series_by_postcode(
    aggregates: &[RentPeriodAggregate],
) -> BTreeMap<u32, Vec<RentPeriodAggregate>> {
    let mut series: BTreeMap<u32, Vec<RentPeriodAggregate>> = BTreeMap::new();
    for agg in aggregates {
        series.entry(agg.postal_code).or_default().push(agg.clone());
    }
    for points in series.values_mut() {
        points.sort_by_key(|p| p.period_end_date);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(postal_code: u32, d: NaiveDate, weekly_rent: f64) -> RentObservation {
        RentObservation {
            postal_code,
            lodgement_date: d,
            weekly_rent,
        }
    }

    #[test]
    fn test_quarter_end() {
        assert_eq!(quarter_end(date(2024, 1, 1)), Some(date(2024, 3, 31)));
        assert_eq!(quarter_end(date(2024, 3, 31)), Some(date(2024, 3, 31)));
        assert_eq!(quarter_end(date(2024, 4, 1)), Some(date(2024, 6, 30)));
        assert_eq!(quarter_end(date(2024, 8, 15)), Some(date(2024, 9, 30)));
        assert_eq!(quarter_end(date(2024, 12, 31)), Some(date(2024, 12, 31)));
        assert_eq!(quarter_end(date(2025, 10, 2)), Some(date(2025, 12, 31)));
    }

    #[test]
    fn test_last_representable_quarter_is_skipped() {
        assert_eq!(quarter_end(NaiveDate::MAX), None);

        let aggs = aggregate_quarterly(&[
            obs(2150, NaiveDate::MAX, 900.0),
            obs(2150, date(2024, 2, 1), 500.0),
        ]);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].median_rent, 500.0);
    }

    #[test]
    fn test_aggregate_median_per_bucket() {
        let rows = vec![
            obs(2150, date(2024, 1, 5), 500.0),
            obs(2150, date(2024, 2, 5), 600.0),
            obs(2150, date(2024, 3, 5), 550.0),
            obs(2150, date(2024, 4, 5), 580.0),
            obs(2150, date(2024, 5, 5), 620.0),
        ];
        let aggs = aggregate_quarterly(&rows);

        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[0].period_end_date, date(2024, 3, 31));
        assert_eq!(aggs[0].median_rent, 550.0);
        assert_eq!(aggs[1].period_end_date, date(2024, 6, 30));
        assert_eq!(aggs[1].median_rent, 600.0);
    }

    #[test]
    fn test_aggregate_orders_by_postcode_then_date_with_gaps() {
        let rows = vec![
            obs(2750, date(2025, 2, 1), 520.0),
            obs(2148, date(2024, 11, 1), 480.0),
            obs(2148, date(2024, 2, 1), 450.0),
        ];
        let aggs = aggregate_quarterly(&rows);
        let keys: Vec<(u32, NaiveDate)> =
            aggs.iter().map(|a| (a.postal_code, a.period_end_date)).collect();

        assert_eq!(
            keys,
            vec![
                (2148, date(2024, 3, 31)),
                (2148, date(2024, 12, 31)),
                (2750, date(2025, 3, 31)),
            ]
        );
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_quarterly(&[]).is_empty());
        assert!(latest_snapshot(&[]).is_empty());
    }

    #[test]
    fn test_latest_snapshot_one_per_postcode() {
        let aggs = vec![
            RentPeriodAggregate { postal_code: 2150, period_end_date: date(2025, 3, 31), median_rent: 610.0 },
            RentPeriodAggregate { postal_code: 2148, period_end_date: date(2024, 3, 31), median_rent: 450.0 },
            RentPeriodAggregate { postal_code: 2150, period_end_date: date(2024, 3, 31), median_rent: 560.0 },
        ];
        let snap = latest_snapshot(&aggs);

        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].postal_code, 2148);
        assert_eq!(snap[0].median_rent, 450.0);
        assert_eq!(snap[1].postal_code, 2150);
        assert_eq!(snap[1].period_end_date, date(2025, 3, 31));
        assert_eq!(snap[1].median_rent, 610.0);
    }

    #[test]
    fn test_series_by_postcode_sorted() {
        let aggs = vec![
            RentPeriodAggregate { postal_code: 2150, period_end_date: date(2025, 3, 31), median_rent: 610.0 },
            RentPeriodAggregate { postal_code: 2150, period_end_date: date(2024, 3, 31), median_rent: 560.0 },
        ];
        let series = series_by_postcode(&aggs);
        let dates: Vec<NaiveDate> = series[&2150].iter().map(|p| p.period_end_date).collect();
        assert_eq!(dates, vec![date(2024, 3, 31), date(2025, 3, 31)]);
    }
}
