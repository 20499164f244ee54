use crate::models::{AggregationMethod, Indicator, ReportRow, Ward, WardAggregate};
use crate::period::DateRange;

#[derive(Debug)]
pub struct IndicatorAggregate {
    pub per_ward: Vec<WardAggregate>,
    pub stake_total: f64,
}

/// Rolls raw weekly rows up into one value per ward plus a stake-wide total.
///
/// `rows` may carry rows for other indicators and weeks before `range.start`;
/// the method decides what is in scope. Snapshot lookback is unbounded: the
/// most recent observation at or before the range end wins even when it
/// predates the range, so a ward that stopped reporting keeps its last known
/// value instead of dropping to zero.
pub fn aggregate_indicator(
    indicator: &Indicator,
    wards: &[Ward],
    rows: &[ReportRow],
    range: &DateRange,
) -> IndicatorAggregate {
    let mut per_ward = Vec::with_capacity(wards.len());

    for ward in wards {
        let mut in_range: Vec<&ReportRow> = rows
            .iter()
            .filter(|r| {
                r.indicator_id == indicator.id
                    && r.ward_id == ward.id
                    && r.week_start >= range.start
                    && r.week_start <= range.end
            })
            .collect();
        in_range.sort_by_key(|r| r.week_start);

        let (value, samples) = match indicator.aggregation {
            AggregationMethod::Sum => {
                let total: f64 = in_range.iter().map(|r| r.value).sum();
                (total, in_range.len())
            }
            AggregationMethod::Avg => {
                if in_range.is_empty() {
                    (0.0, 0)
                } else {
                    let total: f64 = in_range.iter().map(|r| r.value).sum();
                    ((total / in_range.len() as f64).round(), in_range.len())
                }
            }
            AggregationMethod::Snapshot => {
                let latest = rows
                    .iter()
                    .filter(|r| {
                        r.indicator_id == indicator.id
                            && r.ward_id == ward.id
                            && r.week_start <= range.end
                    })
                    .max_by_key(|r| r.week_start);
                match latest {
                    Some(row) => (row.value, 1),
                    None => (0.0, 0),
                }
            }
        };

        per_ward.push(WardAggregate {
            ward_id: ward.id,
            ward_name: ward.name.clone(),
            membership: ward.membership_count,
            value,
            samples,
        });
    }

    let stake_total = stake_total(indicator.aggregation, &per_ward);
    IndicatorAggregate {
        per_ward,
        stake_total,
    }
}

/// Stake rollup. Sum and snapshot indicators add across wards; avg indicators
/// take the mean of the per-ward averages, each reporting ward counting once
/// regardless of how many rows it contributed.
pub fn stake_total(method: AggregationMethod, per_ward: &[WardAggregate]) -> f64 {
    match method {
        AggregationMethod::Sum | AggregationMethod::Snapshot => {
            per_ward.iter().map(|w| w.value).sum()
        }
        AggregationMethod::Avg => {
            let reporting: Vec<&WardAggregate> =
                per_ward.iter().filter(|w| w.samples > 0).collect();
            if reporting.is_empty() {
                0.0
            } else {
                let total: f64 = reporting.iter().map(|w| w.value).sum();
                (total / reporting.len() as f64).round()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ward(name: &str, membership: u32) -> Ward {
        Ward {
            id: Uuid::new_v4(),
            name: name.to_string(),
            membership_count: membership,
            active: true,
        }
    }

    fn indicator(method: AggregationMethod) -> Indicator {
        Indicator {
            id: Uuid::new_v4(),
            slug: "test_indicator".to_string(),
            display_name: "Test Indicator".to_string(),
            indicator_type: "weekly".to_string(),
            aggregation: method,
            responsibility: "Bishopric".to_string(),
            order_index: 1,
            active: true,
        }
    }

    fn row(ind: &Indicator, ward: &Ward, week: NaiveDate, value: f64) -> ReportRow {
        ReportRow {
            ward_id: ward.id,
            ward_name: ward.name.clone(),
            ward_membership: ward.membership_count,
            indicator_id: ind.id,
            slug: ind.slug.clone(),
            display_name: ind.display_name.clone(),
            indicator_type: ind.indicator_type.clone(),
            aggregation: ind.aggregation,
            responsibility: ind.responsibility.clone(),
            order_index: ind.order_index,
            week_start: week,
            value,
        }
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange { start, end }
    }

    #[test]
    fn sum_of_empty_set_is_zero() {
        let ind = indicator(AggregationMethod::Sum);
        let wards = vec![ward("Riverside Ward", 200)];
        let agg = aggregate_indicator(
            &ind,
            &wards,
            &[],
            &range(date(2026, 1, 1), date(2026, 1, 31)),
        );
        assert_eq!(agg.per_ward[0].value, 0.0);
        assert_eq!(agg.stake_total, 0.0);
    }

    #[test]
    fn sum_adds_rows_in_range_only() {
        let ind = indicator(AggregationMethod::Sum);
        let a = ward("Riverside Ward", 200);
        let rows = vec![
            row(&ind, &a, date(2024, 1, 7), 120.0),
            row(&ind, &a, date(2023, 12, 31), 999.0),
        ];
        let agg = aggregate_indicator(
            &ind,
            &[a],
            &rows,
            &range(date(2024, 1, 1), date(2024, 1, 31)),
        );
        assert_eq!(agg.per_ward[0].value, 120.0);
        assert_eq!(agg.stake_total, 120.0);
    }

    #[test]
    fn avg_is_average_of_per_ward_averages() {
        let ind = indicator(AggregationMethod::Avg);
        let a = ward("Riverside Ward", 200);
        let b = ward("Lakeview Ward", 300);
        // A reports 3 weeks, B only one. Flattening all rows would give
        // round((90+100+110+40)/4) = 85; per-ward averaging gives
        // round((100 + 40) / 2) = 70.
        let rows = vec![
            row(&ind, &a, date(2026, 2, 1), 90.0),
            row(&ind, &a, date(2026, 2, 8), 100.0),
            row(&ind, &a, date(2026, 2, 15), 110.0),
            row(&ind, &b, date(2026, 2, 8), 40.0),
        ];
        let agg = aggregate_indicator(
            &ind,
            &[a, b],
            &rows,
            &range(date(2026, 2, 1), date(2026, 2, 28)),
        );
        assert_eq!(agg.per_ward[0].value, 100.0);
        assert_eq!(agg.per_ward[1].value, 40.0);
        assert_eq!(agg.stake_total, 70.0);
    }

    #[test]
    fn avg_excludes_silent_wards_from_the_denominator() {
        let ind = indicator(AggregationMethod::Avg);
        let a = ward("Riverside Ward", 200);
        let b = ward("Lakeview Ward", 300);
        let rows = vec![row(&ind, &a, date(2026, 2, 8), 80.0)];
        let agg = aggregate_indicator(
            &ind,
            &[a, b],
            &rows,
            &range(date(2026, 2, 1), date(2026, 2, 28)),
        );
        assert_eq!(agg.per_ward[1].samples, 0);
        // Mean over the single reporting ward, not over both.
        assert_eq!(agg.stake_total, 80.0);
    }

    #[test]
    fn snapshot_keeps_last_known_value_when_the_period_moves_on() {
        let ind = indicator(AggregationMethod::Snapshot);
        let a = ward("Riverside Ward", 200);
        let rows = vec![
            row(&ind, &a, date(2026, 1, 4), 55.0),
            row(&ind, &a, date(2026, 1, 11), 60.0),
        ];

        let january = aggregate_indicator(
            &ind,
            std::slice::from_ref(&a),
            &rows,
            &range(date(2026, 1, 1), date(2026, 1, 31)),
        );
        let march = aggregate_indicator(
            &ind,
            std::slice::from_ref(&a),
            &rows,
            &range(date(2026, 3, 1), date(2026, 3, 31)),
        );
        assert_eq!(january.stake_total, 60.0);
        // No new rows in March; the last known value persists.
        assert_eq!(march.stake_total, january.stake_total);
    }

    #[test]
    fn snapshot_stake_total_sums_per_ward_snapshots() {
        let ind = indicator(AggregationMethod::Snapshot);
        let a = ward("Riverside Ward", 200);
        let b = ward("Lakeview Ward", 300);
        let rows = vec![
            row(&ind, &a, date(2026, 1, 4), 55.0),
            row(&ind, &b, date(2026, 1, 11), 20.0),
        ];
        let agg = aggregate_indicator(
            &ind,
            &[a, b],
            &rows,
            &range(date(2026, 1, 1), date(2026, 1, 31)),
        );
        assert_eq!(agg.stake_total, 75.0);
    }
}
