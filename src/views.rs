use std::cmp::Ordering;

use serde::Serialize;

use crate::aggregate::{aggregate_all, aggregate_by, by_company, by_package};
use crate::config::PackageBands;
use crate::models::{CaptainStats, ShipmentRecord};
use crate::rates::{pct, per_unit};

pub fn top_by_volume(stats: &[CaptainStats], limit: usize) -> Vec<CaptainStats> {
    let mut rows = stats.to_vec();
    rows.sort_by(|a, b| {
        b.total_shipments
            .cmp(&a.total_shipments)
            .then_with(|| a.captain.cmp(&b.captain))
    });
    rows.truncate(limit);
    rows
}

/// Lowest success rate first; ties favour the busier captain.
pub fn worst_by_success(stats: &[CaptainStats], limit: usize) -> Vec<CaptainStats> {
    let mut rows: Vec<CaptainStats> = stats
        .iter()
        .filter(|s| s.total_shipments > 0)
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        a.success_rate
            .total_cmp(&b.success_rate)
            .then_with(|| b.total_shipments.cmp(&a.total_shipments))
            .then_with(|| a.captain.cmp(&b.captain))
    });
    rows.truncate(limit);
    rows
}

/// Captains with enough volume to matter, highest failure rate first.
pub fn highest_failure(stats: &[CaptainStats], min_shipments: u64, limit: usize) -> Vec<CaptainStats> {
    let mut rows: Vec<CaptainStats> = stats
        .iter()
        .filter(|s| s.total_shipments >= min_shipments)
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.failure_rate
            .total_cmp(&a.failure_rate)
            .then_with(|| a.captain.cmp(&b.captain))
    });
    rows.truncate(limit);
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub range: String,
    /// Inclusive lower edge; `None` for the open bottom bucket
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub count: usize,
}

fn edge_label(value: f64) -> String {
    format!("{}", value)
}

/// `80-89%` for whole-number edges, `85.5-<90%` otherwise.
fn band_label(lower: f64, upper: f64) -> String {
    if lower.fract() == 0.0 && upper.fract() == 0.0 {
        format!("{}-{}%", edge_label(lower), edge_label(upper - 1.0))
    } else {
        format!("{}-<{}%", edge_label(lower), edge_label(upper))
    }
}

/// Success-rate histogram with descending lower `edges`.
///
/// With edges `[90, 80, 70]` the buckets are `90%+`, `80-89%`, `70-79%` and
/// `<70%`; each captain lands in exactly one.
pub fn success_histogram(stats: &[CaptainStats], edges: &[f64]) -> Vec<HistogramBucket> {
    let mut buckets: Vec<HistogramBucket> = Vec::with_capacity(edges.len() + 1);

    for (i, &lower) in edges.iter().enumerate() {
        let upper = if i == 0 { None } else { Some(edges[i - 1]) };
        let range = match upper {
            None => format!("{}%+", edge_label(lower)),
            Some(upper) => band_label(lower, upper),
        };
        buckets.push(HistogramBucket {
            range,
            lower: Some(lower),
            upper,
            count: 0,
        });
    }
    let bottom = edges.last().copied();
    buckets.push(HistogramBucket {
        range: bottom
            .map(|edge| format!("<{}%", edge_label(edge)))
            .unwrap_or_else(|| "all".to_string()),
        lower: None,
        upper: bottom,
        count: 0,
    });

    for s in stats {
        let index = edges
            .iter()
            .position(|&lower| s.success_rate >= lower)
            .unwrap_or(edges.len());
        buckets[index].count += 1;
    }

    buckets
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterTiers {
    pub top_performers: usize,
    pub good_performers: usize,
    pub needs_training: usize,
    pub inactive: usize,
}

/// Headline counts for the roster: >=90, 80-90, <80 and no shipments.
pub fn roster_tiers(stats: &[CaptainStats]) -> RosterTiers {
    stats.iter().fold(RosterTiers::default(), |mut tiers, s| {
        if s.success_rate >= 90.0 {
            tiers.top_performers += 1;
        } else if s.success_rate >= 80.0 {
            tiers.good_performers += 1;
        } else {
            tiers.needs_training += 1;
        }
        if s.total_shipments == 0 {
            tiers.inactive += 1;
        }
        tiers
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyShare {
    pub company: String,
    pub shipments: u64,
    /// Percent of the shipments in `records`
    pub share: f64,
}

/// Shipments per company, largest first.
pub fn company_share(records: &[ShipmentRecord]) -> Vec<CompanyShare> {
    let total = aggregate_all(records).shipments;

    let mut rows: Vec<CompanyShare> = aggregate_by(records, by_company)
        .into_iter()
        .map(|(company, agg)| CompanyShare {
            company,
            shipments: agg.shipments,
            share: pct(agg.shipments, total),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.shipments
            .cmp(&a.shipments)
            .then_with(|| a.company.cmp(&b.company))
    });
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl PerformanceBand {
    pub fn classify(success_rate: f64, bands: &PackageBands) -> Self {
        if success_rate >= bands.excellent_from {
            PerformanceBand::Excellent
        } else if success_rate >= bands.good_from {
            PerformanceBand::Good
        } else {
            PerformanceBand::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceBand::Excellent => "Excellent",
            PerformanceBand::Good => "Good",
            PerformanceBand::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagePerformance {
    pub package_code: String,
    pub shipments: u64,
    pub delivered: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub cost_per_delivered: f64,
    pub band: PerformanceBand,
}

/// Per-package delivery table, busiest package first.
pub fn package_performance(records: &[ShipmentRecord], bands: &PackageBands) -> Vec<PackagePerformance> {
    let mut rows: Vec<PackagePerformance> = aggregate_by(records, by_package)
        .into_iter()
        .map(|(package_code, agg)| {
            let success_rate = pct(agg.delivered, agg.shipments);
            PackagePerformance {
                package_code,
                shipments: agg.shipments,
                delivered: agg.delivered,
                failed: agg.failed,
                success_rate,
                failure_rate: pct(agg.failed, agg.shipments),
                cost_per_delivered: per_unit(agg.total_cost, agg.delivered),
                band: PerformanceBand::classify(success_rate, bands),
            }
        })
        .collect();

    rows.sort_by(|a, b| match b.shipments.cmp(&a.shipments) {
        Ordering::Equal => a.package_code.cmp(&b.package_code),
        other => other,
    });
    rows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAverage {
    pub success_rate: f64,
    pub failure_rate: f64,
    pub avg_shipments_per_record: f64,
}

pub fn overall_average(records: &[ShipmentRecord]) -> OverallAverage {
    let total = aggregate_all(records);
    OverallAverage {
        success_rate: pct(total.delivered, total.shipments),
        failure_rate: pct(total.failed, total.shipments),
        avg_shipments_per_record: per_unit(total.shipments as f64, total.record_count as u64),
    }
}
