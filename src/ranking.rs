use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::models::CaptainStats;

/// Higher score first, then higher volume, then captain name ascending.
pub fn by_score_desc(
    score_a: f64,
    a: &CaptainStats,
    score_b: f64,
    b: &CaptainStats,
) -> Ordering {
    score_b
        .total_cmp(&score_a)
        .then_with(|| b.total_shipments.cmp(&a.total_shipments))
        .then_with(|| a.captain.cmp(&b.captain))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortField {
    Captain,
    TotalShipments,
    Delivered,
    Failed,
    SuccessRate,
    FailureRate,
    CostPerDelivered,
    CompaniesServed,
    PackagesHandled,
}

impl SortField {
    pub const ALL: [SortField; 9] = [
        SortField::Captain,
        SortField::TotalShipments,
        SortField::Delivered,
        SortField::Failed,
        SortField::SuccessRate,
        SortField::FailureRate,
        SortField::CostPerDelivered,
        SortField::CompaniesServed,
        SortField::PackagesHandled,
    ];

    fn compare(self, a: &CaptainStats, b: &CaptainStats) -> Ordering {
        match self {
            SortField::Captain => a.captain.cmp(&b.captain),
            SortField::TotalShipments => a.total_shipments.cmp(&b.total_shipments),
            SortField::Delivered => a.delivered.cmp(&b.delivered),
            SortField::Failed => a.failed.cmp(&b.failed),
            SortField::SuccessRate => a.success_rate.total_cmp(&b.success_rate),
            SortField::FailureRate => a.failure_rate.total_cmp(&b.failure_rate),
            SortField::CostPerDelivered => a.cost_per_delivered.total_cmp(&b.cost_per_delivered),
            SortField::CompaniesServed => a.companies_served.cmp(&b.companies_served),
            SortField::PackagesHandled => a.packages_handled.cmp(&b.packages_handled),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "captain" | "name" => Ok(SortField::Captain),
            "totalshipments" | "shipments" => Ok(SortField::TotalShipments),
            "delivered" => Ok(SortField::Delivered),
            "failed" => Ok(SortField::Failed),
            "successrate" => Ok(SortField::SuccessRate),
            "failurerate" => Ok(SortField::FailureRate),
            "costperdelivered" => Ok(SortField::CostPerDelivered),
            "companiesserved" | "companies" => Ok(SortField::CompaniesServed),
            "packageshandled" | "packages" => Ok(SortField::PackagesHandled),
            _ => Err(format!("unknown sort field '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("unknown sort direction '{s}'")),
        }
    }
}

/// Stable sort: captains with equal keys keep their prior relative order.
pub fn sort_leaderboard(
    stats: &[CaptainStats],
    field: SortField,
    direction: SortDirection,
) -> Vec<CaptainStats> {
    let mut rows = stats.to_vec();
    match direction {
        SortDirection::Asc => rows.sort_by(|a, b| field.compare(a, b)),
        SortDirection::Desc => rows.sort_by(|a, b| field.compare(b, a)),
    }
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverRank {
    pub rank: usize,
    pub total_drivers: usize,
}

/// 1-based position by success rate descending, ties by name.
pub fn driver_rank(stats: &[CaptainStats], captain: &str) -> Option<DriverRank> {
    let mut ordered: Vec<&CaptainStats> = stats.iter().collect();
    ordered.sort_by(|a, b| {
        b.success_rate
            .total_cmp(&a.success_rate)
            .then_with(|| a.captain.cmp(&b.captain))
    });

    ordered
        .iter()
        .position(|s| s.captain == captain)
        .map(|index| DriverRank {
            rank: index + 1,
            total_drivers: ordered.len(),
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn stats(captain: &str, total: u64, delivered: u64) -> CaptainStats {
        let failed = total.saturating_sub(delivered);
        CaptainStats {
            captain: captain.to_string(),
            total_shipments: total,
            delivered,
            failed,
            success_rate: crate::rates::pct(delivered, total),
            failure_rate: crate::rates::pct(failed, total),
            cost_per_delivered: 0.0,
            companies_served: 1,
            packages_handled: 1,
        }
    }

    #[test]
    fn sorts_by_field_in_both_directions() {
        let rows = vec![stats("B", 50, 40), stats("A", 100, 90), stats("C", 10, 10)];

        let desc = sort_leaderboard(&rows, SortField::TotalShipments, SortDirection::Desc);
        let names: Vec<_> = desc.iter().map(|s| s.captain.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let asc = sort_leaderboard(&rows, SortField::SuccessRate, SortDirection::Asc);
        let names: Vec<_> = asc.iter().map(|s| s.captain.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);

        let by_name = sort_leaderboard(&rows, SortField::Captain, SortDirection::Asc);
        assert_eq!(by_name[0].captain, "A");
    }

    #[test]
    fn equal_keys_keep_prior_order() {
        let rows = vec![stats("Z", 10, 5), stats("Y", 10, 6), stats("X", 10, 7)];
        let asc = sort_leaderboard(&rows, SortField::TotalShipments, SortDirection::Asc);
        let desc = sort_leaderboard(&rows, SortField::TotalShipments, SortDirection::Desc);
        assert_eq!(asc, rows);
        assert_eq!(desc, rows);
    }

    #[test]
    fn rank_ties_broken_by_name() {
        let rows = vec![stats("Sultan", 10, 9), stats("Ahmed", 20, 18), stats("Omar", 10, 5)];
        assert_eq!(
            driver_rank(&rows, "Ahmed"),
            Some(DriverRank { rank: 1, total_drivers: 3 })
        );
        assert_eq!(driver_rank(&rows, "Sultan").unwrap().rank, 2);
        assert_eq!(driver_rank(&rows, "Omar").unwrap().rank, 3);
        assert_eq!(driver_rank(&rows, "Nobody"), None);
    }

    #[test]
    fn parses_fields_and_directions() {
        assert_eq!("successRate".parse::<SortField>(), Ok(SortField::SuccessRate));
        assert_eq!("total-shipments".parse::<SortField>(), Ok(SortField::TotalShipments));
        assert_eq!("ASC".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert!("speed".parse::<SortField>().is_err());
        assert_eq!(SortDirection::Asc.toggled().toggled(), SortDirection::Asc);
    }

    proptest! {
        #[test]
        fn toggling_twice_restores_order(
            rows in prop::collection::vec((0u64..5, 0u64..5), 0..30),
            field_index in 0usize..SortField::ALL.len(),
        ) {
            let rows: Vec<CaptainStats> = rows
                .iter()
                .enumerate()
                .map(|(i, (total, delivered))| stats(&format!("c{i:02}"), *total, (*delivered).min(*total)))
                .collect();
            let field = SortField::ALL[field_index];

            let first = sort_leaderboard(&rows, field, SortDirection::Desc);
            let flipped = sort_leaderboard(&first, field, SortDirection::Desc.toggled());
            let restored = sort_leaderboard(&flipped, field, SortDirection::Desc.toggled().toggled());

            prop_assert_eq!(restored, first);
        }
    }
}
