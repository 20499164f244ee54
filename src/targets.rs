use crate::models::{Indicator, Target, TargetsResponse};
use std::collections::HashMap;
use uuid::Uuid;

/// Builds the per-(ward, indicator) matrix and the stake-wide totals for one
/// year. Every catalog indicator gets a total, zero when no ward has a target.
pub fn summarize(year: i32, targets: &[Target], indicators: &[Indicator]) -> TargetsResponse {
    let mut matrix: HashMap<Uuid, HashMap<Uuid, f64>> = HashMap::new();
    let mut stake_totals: HashMap<Uuid, f64> = indicators.iter().map(|i| (i.id, 0.0)).collect();

    for target in targets.iter().filter(|t| t.year == year) {
        matrix
            .entry(target.ward_id)
            .or_default()
            .insert(target.indicator_id, target.target_value);
        if let Some(total) = stake_totals.get_mut(&target.indicator_id) {
            *total += target.target_value;
        }
    }

    TargetsResponse {
        year,
        matrix,
        stake_totals,
    }
}

/// Progress toward an annual target, clamped to [0, 100]. A zero or missing
/// target reads as 0% rather than a division fault.
pub fn progress_percent(aggregate: f64, target: f64) -> u32 {
    if target <= 0.0 {
        return 0;
    }
    let percent = (aggregate / target * 100.0).round();
    percent.clamp(0.0, 100.0) as u32
}

/// Remaining distance to the target; exceeding the target reads as 0, never a
/// negative gap.
pub fn gap(aggregate: f64, target: f64) -> f64 {
    (target - aggregate).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ward: Uuid, indicator: Uuid, year: i32, value: f64) -> Target {
        Target {
            ward_id: ward,
            indicator_id: indicator,
            year,
            target_value: value,
        }
    }

    fn indicator(id: Uuid) -> Indicator {
        Indicator {
            id,
            slug: "test".to_string(),
            display_name: "Test".to_string(),
            indicator_type: "weekly".to_string(),
            aggregation: crate::models::AggregationMethod::Sum,
            responsibility: "Bishopric".to_string(),
            order_index: 1,
            active: true,
        }
    }

    #[test]
    fn stake_totals_sum_across_wards() {
        let ind = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let targets = vec![
            target(a, ind, 2026, 120.0),
            target(b, ind, 2026, 80.0),
            target(a, ind, 2025, 999.0),
        ];
        let summary = summarize(2026, &targets, &[indicator(ind)]);
        assert_eq!(summary.stake_totals[&ind], 200.0);
        assert_eq!(summary.matrix[&a][&ind], 120.0);
    }

    #[test]
    fn indicators_without_targets_total_zero() {
        let ind = Uuid::new_v4();
        let summary = summarize(2026, &[], &[indicator(ind)]);
        assert_eq!(summary.stake_totals[&ind], 0.0);
    }

    #[test]
    fn progress_is_clamped_and_gap_never_negative() {
        assert_eq!(progress_percent(50.0, 200.0), 25);
        assert_eq!(gap(50.0, 200.0), 150.0);

        assert_eq!(progress_percent(250.0, 200.0), 100);
        assert_eq!(gap(250.0, 200.0), 0.0);

        assert_eq!(progress_percent(150.0, 100.0), 100);
        assert_eq!(gap(150.0, 100.0), 0.0);
    }

    #[test]
    fn zero_target_reads_as_zero_progress() {
        assert_eq!(progress_percent(50.0, 0.0), 0);
        assert_eq!(gap(50.0, 0.0), 0.0);
    }
}
