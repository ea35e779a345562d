use std::fmt::Write;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::engine::{compute_captain_stats, compute_global_kpis, compute_time_series, top_performers};
use crate::filter::ShipmentFilter;
use crate::models::{Granularity, ShipmentRecord};
use crate::risk::rank_at_risk_drivers;
use crate::views::{highest_failure, roster_tiers, success_histogram};

const REPORT_LIMIT: usize = 10;

pub fn build_report(
    scope: Option<&str>,
    as_of: NaiveDate,
    records: &[ShipmentRecord],
    filter: &ShipmentFilter,
    config: &EngineConfig,
) -> String {
    let kpis = compute_global_kpis(records, filter);
    let stats = compute_captain_stats(records, filter);
    let tiers = roster_tiers(&stats);
    let histogram = success_histogram(&stats, &config.views.histogram_edges);
    let top = top_performers(records, filter, config, as_of, REPORT_LIMIT);
    let at_risk = rank_at_risk_drivers(&stats, config.risk.max_success_rate, &config.risk);
    let failing = highest_failure(
        &stats,
        config.views.high_failure_min_shipments,
        config.views.high_failure_limit,
    );
    let monthly = compute_time_series(records, filter, Granularity::Month);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all captains");

    let _ = writeln!(output, "# Captain Performance Report");
    let _ = writeln!(output, "Generated for {} (as of {})", scope_label, as_of);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Shipments: {} ({} delivered, {} failed)",
        kpis.total_shipments, kpis.total_delivered, kpis.total_failed
    );
    let _ = writeln!(
        output,
        "- Success rate: {:.1}% (failure {:.1}%)",
        kpis.success_rate, kpis.failure_rate
    );
    let _ = writeln!(
        output,
        "- Cost per delivered shipment: {:.2}",
        kpis.avg_cost_per_delivered
    );
    let _ = writeln!(
        output,
        "- {} captains across {} companies and {} packages",
        kpis.captain_count, kpis.companies_served, kpis.packages_handled
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Roster");
    let _ = writeln!(
        output,
        "- Top performers (90%+): {}\n- Good performers (80-89%): {}\n- Needs training (<80%): {}\n- Inactive: {}",
        tiers.top_performers, tiers.good_performers, tiers.needs_training, tiers.inactive
    );
    for bucket in &histogram {
        let _ = writeln!(output, "- Success {}: {} captains", bucket.range, bucket.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Top Performers ({} v{})",
        config.performance.scheme, config.performance.version
    );

    if top.is_empty() {
        let _ = writeln!(output, "No captains with shipments in scope.");
    } else {
        for (i, scored) in top.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} score {:.1} ({} shipments, {:.1}% success)",
                i + 1,
                scored.stats.captain,
                scored.performance_score,
                scored.stats.total_shipments,
                scored.stats.success_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## At-Risk Captains (success at or below {:.0}%)",
        config.risk.max_success_rate
    );

    if at_risk.is_empty() {
        let _ = writeln!(output, "No captains at or below the threshold.");
    } else {
        for assessment in at_risk.iter().take(REPORT_LIMIT) {
            let _ = writeln!(
                output,
                "- {} risk {:.1}: {} ({:.1}% success across {} shipments)",
                assessment.stats.captain,
                assessment.risk_score,
                assessment.recommendation,
                assessment.stats.success_rate,
                assessment.stats.total_shipments
            );
        }
    }

    if !failing.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Highest Failure Rates");
        for s in &failing {
            let _ = writeln!(
                output,
                "- {}: {:.1}% failed of {} shipments",
                s.captain, s.failure_rate, s.total_shipments
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Trend");

    if monthly.is_empty() {
        let _ = writeln!(output, "No shipments recorded for this scope.");
    } else {
        for point in &monthly {
            let _ = writeln!(
                output,
                "- {}: {} shipments, {:.1}% success",
                point.label, point.shipments, point.success_rate
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::record;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    #[test]
    fn report_lists_every_section() {
        let records = vec![
            record("Ahmed", "Aramco", "PKG-001", "2024-03-04", 100, 95, 5, 5.0),
            record("Khalid", "STC", "PKG-002", "2024-04-05", 40, 8, 32, 3.0),
        ];
        let report = build_report(None, as_of(), &records, &ShipmentFilter::all(), &EngineConfig::default());

        assert!(report.starts_with("# Captain Performance Report\n"));
        assert!(report.contains("Generated for all captains (as of 2024-12-31)"));
        assert!(report.contains("- Shipments: 140 (103 delivered, 37 failed)"));
        assert!(report.contains("## Top Performers (balanced-v2 v2)"));
        assert!(report.contains("1. Ahmed score"));
        assert!(report.contains("- Khalid risk "));
        assert!(report.contains("Stop Account"));
        assert!(report.contains("- Success 90%+: 1 captains"));
        assert!(report.contains("- Mar 2024: 100 shipments, 95.0% success"));
        assert!(!report.contains("## Highest Failure Rates"));
    }

    #[test]
    fn empty_scope_reports_placeholders() {
        let report = build_report(
            Some("Mobily"),
            as_of(),
            &[],
            &ShipmentFilter::all(),
            &EngineConfig::default(),
        );

        assert!(report.contains("Generated for Mobily"));
        assert!(report.contains("- Shipments: 0 (0 delivered, 0 failed)"));
        assert!(report.contains("No captains with shipments in scope."));
        assert!(report.contains("No captains at or below the threshold."));
        assert!(report.contains("No shipments recorded for this scope."));
    }
}
