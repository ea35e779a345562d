use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_CAPTAIN: &str = "Unknown";

/// One row of shipment activity for a captain, company and package on a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    pub id: String,
    pub company_name: String,
    pub package_code: String,
    pub date: NaiveDate,
    pub shipments: u64,
    pub package_fare: f64,
    pub delivered_shipments: u64,
    pub failed_shipments: u64,
    pub captain: String,
}

impl ShipmentRecord {
    /// Fare earned by the delivered shipments on this row.
    pub fn delivered_cost(&self) -> f64 {
        self.package_fare * self.delivered_shipments as f64
    }
}

/// Running sums for one group of records. Built fresh on every pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptainAggregate {
    pub shipments: u64,
    pub delivered: u64,
    pub failed: u64,
    pub total_cost: f64,
    pub companies: BTreeSet<String>,
    pub packages: BTreeSet<String>,
    pub record_count: usize,
}

impl CaptainAggregate {
    pub fn absorb(&mut self, record: &ShipmentRecord) {
        self.shipments += record.shipments;
        self.delivered += record.delivered_shipments;
        self.failed += record.failed_shipments;
        self.total_cost += record.delivered_cost();
        self.record_count += 1;

        self.companies.insert(record.company_name.clone());
        self.packages.insert(record.package_code.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptainStats {
    pub captain: String,
    pub total_shipments: u64,
    pub delivered: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub cost_per_delivered: f64,
    pub companies_served: usize,
    pub packages_handled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalKpis {
    pub total_shipments: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub success_rate: f64,
    pub failure_rate: f64,
    pub avg_cost_per_delivered: f64,
    pub companies_served: usize,
    pub packages_handled: usize,
    pub captain_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Week,
    Month,
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity '{other}' (expected week or month)")),
        }
    }
}

/// One bucket of a weekly or monthly trend, ordered by `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// `YYYY-MM-DD` of the week start, or `YYYY-MM`
    pub key: String,
    pub label: String,
    pub shipments: u64,
    pub delivered: u64,
    pub failed: u64,
    pub success_rate: f64,
    /// Bucket success ratio minus the population's, set on captain profiles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

/// A captain with the performance composite and the sub-scores behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCaptain {
    #[serde(flatten)]
    pub stats: CaptainStats,
    pub performance_score: f64,
    pub success_score: f64,
    pub volume_score: f64,
    pub consistency_score: f64,
    pub companies_score: f64,
    pub packages_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    StopAccount,
    ImmediateRetraining,
    PerformanceReview,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StopAccount => "Stop Account",
            Recommendation::ImmediateRetraining => "Immediate Retraining",
            Recommendation::PerformanceReview => "Performance Review",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captain flagged for intervention, highest `risk_score` first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    #[serde(flatten)]
    pub stats: CaptainStats,
    pub risk_score: f64,
    pub failure_ratio: f64,
    pub low_activity_penalty: f64,
    pub recommendation: Recommendation,
    pub high_risk: bool,
}
