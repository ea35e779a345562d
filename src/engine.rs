//! Query entry points used by the presentation layer.
//!
//! Every function here is a pure transform of its arguments: records and a
//! filter in, freshly derived values out. Nothing is cached between calls.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate_all, aggregate_by, bucket_key, bucket_label, by_captain};
use crate::config::{EngineConfig, ViewConfig};
use crate::filter::ShipmentFilter;
use crate::models::{CaptainStats, GlobalKpis, Granularity, ShipmentRecord, ScoredCaptain, TrendPoint};
use crate::ranking::{driver_rank, DriverRank};
use crate::rates::{cutoff_date, derive_global, derive_rates, pct, trailing_success_rate};
use crate::scoring::rank_top_performers;
use crate::views::{company_share, package_performance, CompanyShare, PackagePerformance};

pub fn compute_global_kpis(records: &[ShipmentRecord], filter: &ShipmentFilter) -> GlobalKpis {
    let filtered = filter.apply(records);
    let captain_count = aggregate_by(&filtered, by_captain).len();
    let kpis = derive_global(&aggregate_all(&filtered), captain_count);
    debug!(records = records.len(), matched = filtered.len(), "Computed global KPIs");
    kpis
}

/// Per-captain statistics, sorted by captain name.
pub fn compute_captain_stats(records: &[ShipmentRecord], filter: &ShipmentFilter) -> Vec<CaptainStats> {
    let filtered = filter.apply(records);
    let mut stats: Vec<CaptainStats> = aggregate_by(&filtered, by_captain)
        .iter()
        .map(|(captain, aggregate)| derive_rates(captain, aggregate))
        .collect();
    stats.sort_by(|a, b| a.captain.cmp(&b.captain));

    debug!(matched = filtered.len(), captains = stats.len(), "Computed captain stats");
    stats
}

/// Weekly or monthly buckets in ascending key order.
pub fn compute_time_series(
    records: &[ShipmentRecord],
    filter: &ShipmentFilter,
    granularity: Granularity,
) -> Vec<TrendPoint> {
    let filtered = filter.apply(records);
    let groups = aggregate_by(&filtered, |r| bucket_key(granularity, r.date));

    let mut points: Vec<TrendPoint> = groups
        .into_iter()
        .map(|(key, aggregate)| TrendPoint {
            label: String::new(),
            shipments: aggregate.shipments,
            delivered: aggregate.delivered,
            failed: aggregate.failed,
            success_rate: pct(aggregate.delivered, aggregate.shipments),
            efficiency: None,
            key,
        })
        .collect();
    points.sort_by(|a, b| a.key.cmp(&b.key));

    for point in &mut points {
        point.label = label_for_key(granularity, &point.key);
    }

    debug!(buckets = points.len(), ?granularity, "Computed time series");
    points
}

fn label_for_key(granularity: Granularity, key: &str) -> String {
    let parsed = match granularity {
        Granularity::Week => NaiveDate::parse_from_str(key, "%Y-%m-%d").ok(),
        Granularity::Month => NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d").ok(),
    };
    parsed
        .map(|date| bucket_label(granularity, date))
        .unwrap_or_else(|| key.to_string())
}

/// Top performers under the configured scheme.
///
/// Schemes with `trailing_days` only score records dated within that many
/// days before `as_of`, on top of the caller's filter.
pub fn top_performers(
    records: &[ShipmentRecord],
    filter: &ShipmentFilter,
    config: &EngineConfig,
    as_of: NaiveDate,
    limit: usize,
) -> Vec<ScoredCaptain> {
    let scoped = match config.performance.trailing_days {
        Some(days) => {
            let cutoff = cutoff_date(as_of, days);
            let from = filter.date_from.map_or(cutoff, |from| from.max(cutoff));
            let to = filter.date_to.map_or(as_of, |to| to.min(as_of));
            filter.clone().between(Some(from), Some(to))
        }
        None => filter.clone(),
    };

    let stats = compute_captain_stats(records, &scoped);
    rank_top_performers(&stats, &config.performance, &config.consistency, limit)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainProfile {
    pub stats: CaptainStats,
    pub overall_success_rate: f64,
    pub success_rate_30d: f64,
    pub success_rate_7d: f64,
    /// 30-day rate minus the overall rate, in percentage points
    pub delta_30d: f64,
    pub delta_7d: f64,
    pub rank: DriverRank,
    pub weekly: Vec<TrendPoint>,
    pub monthly: Vec<TrendPoint>,
    pub companies: Vec<CompanyShare>,
    pub packages: Vec<PackagePerformance>,
}

/// Drill-down for one captain over `records`, or `None` if they have none.
///
/// Rank and the overall rate are taken against every captain in `records`.
pub fn captain_profile(
    records: &[ShipmentRecord],
    captain: &str,
    as_of: NaiveDate,
    views: &ViewConfig,
) -> Option<CaptainProfile> {
    let all_stats = compute_captain_stats(records, &ShipmentFilter::all());
    let stats = all_stats.iter().find(|s| s.captain == captain)?.clone();
    let rank = driver_rank(&all_stats, captain)?;

    let overall = aggregate_all(records);
    let overall_success_rate = pct(overall.delivered, overall.shipments);

    let own = ShipmentFilter::for_captain(captain);
    let own_records = own.apply(records);

    let success_rate_30d = trailing_success_rate(records, captain, as_of, 30);
    let success_rate_7d = trailing_success_rate(records, captain, as_of, 7);

    let weekly = compute_time_series(&own_records, &ShipmentFilter::all(), Granularity::Week);
    let monthly = compute_time_series(&own_records, &ShipmentFilter::all(), Granularity::Month)
        .into_iter()
        .map(|mut point| {
            point.efficiency = Some(point.success_rate / 100.0 - overall_success_rate / 100.0);
            point
        })
        .collect();

    debug!(captain, records = own_records.len(), rank = rank.rank, "Built captain profile");

    Some(CaptainProfile {
        overall_success_rate,
        success_rate_30d,
        success_rate_7d,
        delta_30d: success_rate_30d - overall_success_rate,
        delta_7d: success_rate_7d - overall_success_rate,
        rank,
        weekly,
        monthly,
        companies: company_share(&own_records),
        packages: package_performance(&own_records, &views.package_bands),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformanceWeights;
    use crate::filter::tests::record;
    use crate::filter::Selection;
    use pretty_assertions::assert_eq;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn fleet() -> Vec<ShipmentRecord> {
        vec![
            record("Ahmed", "Aramco", "PKG-001", "2024-03-04", 10, 8, 2, 5.0),
            record("Ahmed", "SABIC", "PKG-002", "2024-03-06", 30, 27, 3, 4.0),
            record("Ahmed", "Aramco", "PKG-001", "2024-04-10", 20, 20, 0, 5.0),
            record("Khalid", "STC", "PKG-003", "2024-03-05", 40, 20, 20, 3.0),
            record("Khalid", "STC", "PKG-003", "2024-04-28", 10, 4, 6, 3.0),
            record("Omar", "NCB", "PKG-001", "2024-04-29", 0, 0, 0, 2.0),
        ]
    }

    #[test]
    fn global_kpis_match_sums() {
        let kpis = compute_global_kpis(&fleet(), &ShipmentFilter::all());
        assert_eq!(kpis.total_shipments, 110);
        assert_eq!(kpis.total_delivered, 79);
        assert_eq!(kpis.total_failed, 31);
        assert_eq!(kpis.captain_count, 3);
        assert_eq!(kpis.companies_served, 4);
        assert_eq!(kpis.packages_handled, 3);
    }

    #[test]
    fn empty_filter_result_is_zeroed() {
        let filter = ShipmentFilter {
            company: Selection::Only("Mobily".into()),
            ..ShipmentFilter::default()
        };
        assert_eq!(compute_global_kpis(&fleet(), &filter), GlobalKpis::default());
        assert!(compute_captain_stats(&fleet(), &filter).is_empty());
        assert!(compute_time_series(&fleet(), &filter, Granularity::Month).is_empty());
    }

    #[test]
    fn captain_stats_sorted_by_name() {
        let stats = compute_captain_stats(&fleet(), &ShipmentFilter::all());
        let names: Vec<_> = stats.iter().map(|s| s.captain.as_str()).collect();
        assert_eq!(names, vec!["Ahmed", "Khalid", "Omar"]);
        assert_eq!(stats[2].success_rate, 0.0);
        assert_eq!(stats[2].cost_per_delivered, 0.0);
    }

    #[test]
    fn monthly_series_is_ordered_with_labels() {
        let series = compute_time_series(&fleet(), &ShipmentFilter::all(), Granularity::Month);
        let keys: Vec<_> = series.iter().map(|p| (p.key.as_str(), p.label.as_str())).collect();
        assert_eq!(keys, vec![("2024-03", "Mar 2024"), ("2024-04", "Apr 2024")]);
        assert_eq!(series[0].shipments, 80);
        assert_eq!(series[1].shipments, 30);
    }

    #[test]
    fn weekly_series_merges_days_of_one_week() {
        let series = compute_time_series(&fleet(), &ShipmentFilter::all(), Granularity::Week);
        assert_eq!(series[0].key, "2024-03-03");
        assert_eq!(series[0].label, "Mar 3");
        assert_eq!(series[0].shipments, 80);
        // 2024-04-28 is a Sunday and 2024-04-29 falls in the same week
        let last = series.last().unwrap();
        assert_eq!(last.key, "2024-04-28");
        assert_eq!(last.shipments, 10);
    }

    #[test]
    fn quarterly_scheme_only_scores_trailing_window() {
        let mut config = EngineConfig::default();
        config.performance = PerformanceWeights::quarterly();
        config.performance.trailing_days = Some(10);

        let scored = top_performers(&fleet(), &ShipmentFilter::all(), &config, date("2024-04-30"), 10);
        let names: Vec<_> = scored.iter().map(|s| s.stats.captain.as_str()).collect();
        assert_eq!(names, vec!["Khalid", "Omar"]);
        assert_eq!(scored[0].stats.total_shipments, 10);
    }

    #[test]
    fn profile_tracks_windows_and_rank() {
        let profile = captain_profile(&fleet(), "Ahmed", date("2024-04-12"), &ViewConfig::default()).unwrap();

        assert_eq!(profile.stats.total_shipments, 60);
        assert_eq!(profile.rank, DriverRank { rank: 1, total_drivers: 3 });
        // only the 2024-04-10 record is within 7 days
        assert_eq!(profile.success_rate_7d, 100.0);
        assert!((profile.success_rate_30d - 100.0).abs() < 1e-9);
        assert!((profile.delta_7d - (100.0 - 7900.0 / 110.0)).abs() < 1e-9);

        assert_eq!(profile.monthly.len(), 2);
        let march = &profile.monthly[0];
        let expected = 35.0 / 40.0 - 79.0 / 110.0;
        assert!((march.efficiency.unwrap() - expected).abs() < 1e-9);
        assert!(profile.weekly.iter().all(|p| p.efficiency.is_none()));

        assert_eq!(profile.companies[0].company, "Aramco");
        assert_eq!(profile.companies[0].shipments, 30);
        assert_eq!(profile.packages.len(), 2);
    }

    #[test]
    fn profile_windows_ignore_later_records() {
        let mut records = fleet();
        records.push(record("Ahmed", "Aramco", "PKG-001", "2024-12-01", 40, 0, 40, 5.0));

        let profile = captain_profile(&records, "Ahmed", date("2024-04-12"), &ViewConfig::default()).unwrap();
        assert_eq!(profile.success_rate_7d, 100.0);
        assert_eq!(profile.success_rate_30d, 100.0);
    }

    #[test]
    fn profile_of_unknown_captain_is_none() {
        assert!(captain_profile(&fleet(), "Nobody", date("2024-04-12"), &ViewConfig::default()).is_none());
    }
}
