//! Rates derived from aggregate sums.
//!
//! Every rate here resolves to 0 when its denominator is 0. Rates can exceed
//! 100 when a record reports more delivered than shipped; that anomaly is
//! passed through rather than clamped.

use chrono::{Duration, NaiveDate};

use crate::aggregate::aggregate_all;
use crate::models::{CaptainAggregate, CaptainStats, GlobalKpis, ShipmentRecord};

/// `100 * part / total`, or 0 when `total` is 0.
pub fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// `amount / count`, or 0 when `count` is 0.
pub fn per_unit(amount: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        amount / count as f64
    }
}

pub fn derive_rates(captain: &str, aggregate: &CaptainAggregate) -> CaptainStats {
    CaptainStats {
        captain: captain.to_string(),
        total_shipments: aggregate.shipments,
        delivered: aggregate.delivered,
        failed: aggregate.failed,
        success_rate: pct(aggregate.delivered, aggregate.shipments),
        failure_rate: pct(aggregate.failed, aggregate.shipments),
        cost_per_delivered: per_unit(aggregate.total_cost, aggregate.delivered),
        companies_served: aggregate.companies.len(),
        packages_handled: aggregate.packages.len(),
    }
}

pub fn derive_global(aggregate: &CaptainAggregate, captain_count: usize) -> GlobalKpis {
    GlobalKpis {
        total_shipments: aggregate.shipments,
        total_delivered: aggregate.delivered,
        total_failed: aggregate.failed,
        success_rate: pct(aggregate.delivered, aggregate.shipments),
        failure_rate: pct(aggregate.failed, aggregate.shipments),
        avg_cost_per_delivered: per_unit(aggregate.total_cost, aggregate.delivered),
        companies_served: aggregate.companies.len(),
        packages_handled: aggregate.packages.len(),
        captain_count,
    }
}

/// First day included in a trailing window of `days` ending at `as_of`.
pub fn cutoff_date(as_of: NaiveDate, days: i64) -> NaiveDate {
    as_of - Duration::days(days.max(0))
}

/// Success rate over one captain's records dated from the cutoff through
/// `as_of`, both inclusive.
pub fn trailing_success_rate(
    records: &[ShipmentRecord],
    captain: &str,
    as_of: NaiveDate,
    days: i64,
) -> f64 {
    let cutoff = cutoff_date(as_of, days);
    let window = aggregate_all(
        records
            .iter()
            .filter(|record| {
                record.captain == captain && record.date >= cutoff && record.date <= as_of
            }),
    );
    pct(window.delivered, window.shipments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_by, by_captain};
    use crate::filter::tests::record;

    #[test]
    fn pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(0, 0), 0.0);
    }

    #[test]
    fn pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn single_record_rates() {
        let records = vec![record("Ahmed", "Aramco", "PKG-001", "2024-05-01", 10, 8, 2, 5.0)];
        let groups = aggregate_by(&records, by_captain);
        let stats = derive_rates("Ahmed", &groups["Ahmed"]);

        assert_eq!(stats.success_rate, 80.0);
        assert_eq!(stats.failure_rate, 20.0);
        assert_eq!(stats.cost_per_delivered, 5.0);
        assert_eq!(stats.companies_served, 1);
        assert_eq!(stats.packages_handled, 1);
    }

    #[test]
    fn zero_shipments_never_produce_nan() {
        let records = vec![record("Idle", "Aramco", "PKG-001", "2024-05-01", 0, 0, 0, 12.0)];
        let groups = aggregate_by(&records, by_captain);
        let stats = derive_rates("Idle", &groups["Idle"]);

        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.failure_rate, 0.0);
        assert_eq!(stats.cost_per_delivered, 0.0);
        assert!(stats.success_rate.is_finite());
    }

    #[test]
    fn delivered_above_shipments_passes_through() {
        let records = vec![record("Odd", "Aramco", "PKG-001", "2024-05-01", 10, 12, 0, 1.0)];
        let groups = aggregate_by(&records, by_captain);
        let stats = derive_rates("Odd", &groups["Odd"]);
        assert_eq!(stats.success_rate, 120.0);
    }

    #[test]
    fn empty_global_is_zero() {
        let kpis = derive_global(&CaptainAggregate::default(), 0);
        assert_eq!(kpis, GlobalKpis::default());
    }

    #[test]
    fn trailing_window_only_counts_recent_records() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let records = vec![
            record("Ahmed", "Aramco", "PKG-001", "2024-06-28", 10, 10, 0, 1.0),
            record("Ahmed", "Aramco", "PKG-001", "2024-06-23", 10, 5, 5, 1.0),
            record("Ahmed", "Aramco", "PKG-001", "2024-06-10", 10, 0, 10, 1.0),
            record("Khalid", "Aramco", "PKG-001", "2024-06-29", 10, 0, 10, 1.0),
        ];

        assert_eq!(trailing_success_rate(&records, "Ahmed", as_of, 7), 75.0);
        assert_eq!(trailing_success_rate(&records, "Ahmed", as_of, 30), 50.0);
        assert_eq!(trailing_success_rate(&records, "Ahmed", as_of, 0), 0.0);
    }

    #[test]
    fn records_after_as_of_are_outside_the_window() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let records = vec![
            record("Ahmed", "Aramco", "PKG-001", "2024-06-28", 10, 10, 0, 1.0),
            record("Ahmed", "Aramco", "PKG-001", "2024-12-01", 10, 0, 10, 1.0),
        ];

        assert_eq!(trailing_success_rate(&records, "Ahmed", as_of, 7), 100.0);
        assert_eq!(trailing_success_rate(&records, "Ahmed", as_of, 30), 100.0);
        let later = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(trailing_success_rate(&records, "Ahmed", later, 7), 0.0);
    }

    #[test]
    fn cutoff_date_respects_days() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(cutoff_date(as_of, 14), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(cutoff_date(as_of, -3), as_of);
    }
}
