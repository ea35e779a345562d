//! Weighted performance scoring over the captains currently in scope.
//!
//! Each sub-score is on a 0-100 scale:
//!
//! | Sub-score   | Source                                              |
//! |-------------|-----------------------------------------------------|
//! | success     | success rate as-is                                  |
//! | volume      | shipments relative to the busiest captain in scope  |
//! | consistency | step function of success rate                       |
//! | companies   | companies served relative to the widest in scope    |
//! | packages    | packages handled relative to the widest in scope    |
//!
//! The composite is the weighted sum under a [`PerformanceWeights`] scheme.

use crate::config::{ConsistencyTiers, PerformanceWeights};
use crate::models::{CaptainStats, ScoredCaptain};
use crate::ranking::by_score_desc;

/// `100 * value / max`, or 0 when the population max is 0.
pub fn normalize(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        0.0
    } else {
        (value / max) * 100.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PopulationMax {
    shipments: f64,
    companies: f64,
    packages: f64,
}

impl PopulationMax {
    fn of(stats: &[CaptainStats]) -> Self {
        stats.iter().fold(Self::default(), |max, s| Self {
            shipments: max.shipments.max(s.total_shipments as f64),
            companies: max.companies.max(s.companies_served as f64),
            packages: max.packages.max(s.packages_handled as f64),
        })
    }
}

fn score_one(
    stats: &CaptainStats,
    max: PopulationMax,
    weights: &PerformanceWeights,
    tiers: &ConsistencyTiers,
) -> ScoredCaptain {
    let success_score = stats.success_rate;
    let volume_score = normalize(stats.total_shipments as f64, max.shipments);
    let consistency_score = tiers.score(stats.success_rate);
    let companies_score = normalize(stats.companies_served as f64, max.companies);
    let packages_score = normalize(stats.packages_handled as f64, max.packages);

    let performance_score = success_score * weights.success
        + volume_score * weights.volume
        + consistency_score * weights.consistency
        + companies_score * weights.companies
        + packages_score * weights.packages;

    ScoredCaptain {
        stats: stats.clone(),
        performance_score,
        success_score,
        volume_score,
        consistency_score,
        companies_score,
        packages_score,
    }
}

/// Scores every captain and returns them best first.
pub fn score_performance(
    stats: &[CaptainStats],
    weights: &PerformanceWeights,
    tiers: &ConsistencyTiers,
) -> Vec<ScoredCaptain> {
    let max = PopulationMax::of(stats);

    let mut scored: Vec<ScoredCaptain> = stats
        .iter()
        .map(|s| score_one(s, max, weights, tiers))
        .collect();

    scored.sort_by(|a, b| by_score_desc(a.performance_score, &a.stats, b.performance_score, &b.stats));
    scored
}

pub fn rank_top_performers(
    stats: &[CaptainStats],
    weights: &PerformanceWeights,
    tiers: &ConsistencyTiers,
    limit: usize,
) -> Vec<ScoredCaptain> {
    let mut scored = score_performance(stats, weights, tiers);
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::tests::stats;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn volume_against_success_composite() {
        // A: 100 shipments at 90%, B: 50 shipments at 95%
        let mut rows = vec![stats("B", 50, 47), stats("A", 100, 90)];
        rows[0].success_rate = 95.0;

        let scored = score_performance(&rows, &PerformanceWeights::balanced(), &ConsistencyTiers::default());

        assert_eq!(scored[0].stats.captain, "A");
        assert!(close(scored[0].volume_score, 100.0));
        assert!(close(scored[0].consistency_score, 95.0));
        assert!(close(scored[0].performance_score, 90.0 * 0.5 + 100.0 * 0.35 + 95.0 * 0.15));
        assert!(close(scored[0].performance_score, 94.25));

        assert_eq!(scored[1].stats.captain, "B");
        assert!(close(scored[1].volume_score, 50.0));
        assert!(close(scored[1].performance_score, 95.0 * 0.5 + 50.0 * 0.35 + 95.0 * 0.15));
        assert!(close(scored[1].performance_score, 79.25));
    }

    #[test]
    fn diversity_scheme_uses_companies_and_packages() {
        let mut wide = stats("Wide", 40, 36);
        wide.companies_served = 4;
        wide.packages_handled = 2;
        let mut narrow = stats("Narrow", 40, 36);
        narrow.companies_served = 1;
        narrow.packages_handled = 1;

        let scored = score_performance(
            &[narrow, wide],
            &PerformanceWeights::diversity(),
            &ConsistencyTiers::default(),
        );

        assert_eq!(scored[0].stats.captain, "Wide");
        assert!(close(scored[0].companies_score, 100.0));
        assert!(close(scored[1].companies_score, 25.0));
        assert!(close(scored[1].packages_score, 50.0));
        // 90*0.4 + 100*0.3 + 100*0.2 + 100*0.1
        assert!(close(scored[0].performance_score, 96.0));
        // 90*0.4 + 100*0.3 + 25*0.2 + 50*0.1
        assert!(close(scored[1].performance_score, 76.0));
    }

    #[test]
    fn zero_volume_population_scores_zero_volume() {
        let rows = vec![stats("Idle", 0, 0), stats("Quiet", 0, 0)];
        let scored = score_performance(&rows, &PerformanceWeights::balanced(), &ConsistencyTiers::default());
        assert!(scored.iter().all(|s| s.volume_score == 0.0));
        assert!(scored.iter().all(|s| s.performance_score.is_finite()));
        // 0*0.5 + 0*0.35 + 50*0.15
        assert!(close(scored[0].performance_score, 7.5));
    }

    #[test]
    fn ties_break_on_volume_then_name() {
        let weights = PerformanceWeights {
            success: 1.0,
            volume: 0.0,
            consistency: 0.0,
            ..PerformanceWeights::balanced()
        };
        let rows = vec![stats("Omar", 10, 8), stats("Faisal", 10, 8), stats("Saad", 20, 16)];
        let scored = score_performance(&rows, &weights, &ConsistencyTiers::default());
        let names: Vec<_> = scored.iter().map(|s| s.stats.captain.as_str()).collect();
        assert_eq!(names, vec!["Saad", "Faisal", "Omar"]);
    }

    #[test]
    fn limit_truncates() {
        let rows = vec![stats("A", 10, 9), stats("B", 10, 8), stats("C", 10, 7)];
        let top = rank_top_performers(&rows, &PerformanceWeights::balanced(), &ConsistencyTiers::default(), 2);
        assert_eq!(top.len(), 2);
        assert!(rank_top_performers(&[], &PerformanceWeights::balanced(), &ConsistencyTiers::default(), 5).is_empty());
    }

    proptest! {
        #[test]
        fn ranking_is_deterministic_and_order_free(
            raw in prop::collection::vec((0u64..200, 0u64..200), 1..25),
        ) {
            let rows: Vec<CaptainStats> = raw
                .iter()
                .enumerate()
                .map(|(i, (total, delivered))| stats(&format!("captain-{i}"), *total, (*delivered).min(*total)))
                .collect();
            let weights = PerformanceWeights::balanced();
            let tiers = ConsistencyTiers::default();

            let first = rank_top_performers(&rows, &weights, &tiers, rows.len());
            let second = rank_top_performers(&rows, &weights, &tiers, rows.len());
            prop_assert_eq!(&first, &second);

            let mut reversed = rows.clone();
            reversed.reverse();
            let from_reversed = rank_top_performers(&reversed, &weights, &tiers, rows.len());
            prop_assert_eq!(&first, &from_reversed);
        }
    }
}
