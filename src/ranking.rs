use crate::models::{RankSlot, WardAggregate};
use std::cmp::Ordering;

/// Per-capita score: aggregated value per member, scaled to a per-thousand
/// figure. A zero membership count scores with a divisor of 1 so the result
/// stays finite.
pub fn score(value: f64, membership: u32) -> i64 {
    let divisor = membership.max(1) as f64;
    (value / divisor * 1000.0).round() as i64
}

#[derive(Debug, Clone)]
pub struct RankedWard {
    pub ward_id: uuid::Uuid,
    pub ward_name: String,
    pub membership: u32,
    pub value: f64,
    pub score: i64,
}

/// Orders wards by per-capita score, highest first. Equal scores order by
/// ward name so rankings are deterministic.
pub fn rank(per_ward: &[WardAggregate]) -> Vec<RankedWard> {
    let mut ranked: Vec<RankedWard> = per_ward
        .iter()
        .map(|w| RankedWard {
            ward_id: w.ward_id,
            ward_name: w.ward_name.clone(),
            membership: w.membership,
            value: w.value,
            score: score(w.value, w.membership),
        })
        .collect();
    ranked.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.ward_name.cmp(&b.ward_name),
        other => other,
    });
    ranked
}

/// Best and worst slots for a card. When no ward has any value the slots
/// degrade to a placeholder instead of pointing at an arbitrary ward.
pub fn extremes(ranked: &[RankedWard]) -> (RankSlot, RankSlot) {
    let all_zero = ranked.iter().all(|w| w.value == 0.0);
    if ranked.is_empty() || all_zero {
        let placeholder = RankSlot {
            name: "-".to_string(),
            value: 0.0,
            score: 0,
        };
        return (placeholder.clone(), placeholder);
    }

    let slot = |w: &RankedWard| RankSlot {
        name: w.ward_name.clone(),
        value: w.value,
        score: w.score,
    };
    (slot(&ranked[0]), slot(&ranked[ranked.len() - 1]))
}
