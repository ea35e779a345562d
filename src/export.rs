use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{RiskAssessment, ScoredCaptain};

#[derive(Debug, Serialize)]
struct PerformanceRow<'a> {
    rank: usize,
    captain: &'a str,
    total_shipments: u64,
    delivered: u64,
    failed: u64,
    success_rate: f64,
    failure_rate: f64,
    cost_per_delivered: f64,
    companies_served: usize,
    packages_handled: usize,
    performance_score: f64,
    volume_score: f64,
    consistency_score: f64,
}

impl<'a> PerformanceRow<'a> {
    fn new(rank: usize, scored: &'a ScoredCaptain) -> Self {
        let stats = &scored.stats;
        Self {
            rank,
            captain: &stats.captain,
            total_shipments: stats.total_shipments,
            delivered: stats.delivered,
            failed: stats.failed,
            success_rate: stats.success_rate,
            failure_rate: stats.failure_rate,
            cost_per_delivered: stats.cost_per_delivered,
            companies_served: stats.companies_served,
            packages_handled: stats.packages_handled,
            performance_score: scored.performance_score,
            volume_score: scored.volume_score,
            consistency_score: scored.consistency_score,
        }
    }
}

#[derive(Debug, Serialize)]
struct RiskRow<'a> {
    rank: usize,
    captain: &'a str,
    total_shipments: u64,
    delivered: u64,
    failed: u64,
    success_rate: f64,
    risk_score: f64,
    failure_ratio: f64,
    low_activity_penalty: f64,
    recommendation: &'static str,
    high_risk: bool,
}

impl<'a> RiskRow<'a> {
    fn new(rank: usize, assessment: &'a RiskAssessment) -> Self {
        let stats = &assessment.stats;
        Self {
            rank,
            captain: &stats.captain,
            total_shipments: stats.total_shipments,
            delivered: stats.delivered,
            failed: stats.failed,
            success_rate: stats.success_rate,
            risk_score: assessment.risk_score,
            failure_ratio: assessment.failure_ratio,
            low_activity_penalty: assessment.low_activity_penalty,
            recommendation: assessment.recommendation.as_str(),
            high_risk: assessment.high_risk,
        }
    }
}

fn write_rows<W: Write, T: Serialize>(sink: W, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    let mut written = 0;
    for row in rows {
        writer.serialize(row)?;
        written += 1;
    }
    writer
        .flush()
        .map_err(|e| Error::Csv(csv::Error::from(e)))?;
    Ok(written)
}

pub fn write_performance<W: Write>(sink: W, rows: &[ScoredCaptain]) -> Result<usize> {
    write_rows(
        sink,
        rows.iter()
            .enumerate()
            .map(|(i, scored)| PerformanceRow::new(i + 1, scored)),
    )
}

pub fn write_risk<W: Write>(sink: W, rows: &[RiskAssessment]) -> Result<usize> {
    write_rows(
        sink,
        rows.iter()
            .enumerate()
            .map(|(i, assessment)| RiskRow::new(i + 1, assessment)),
    )
}

/// Creates or truncates `path` and writes the performance rows.
pub fn export_performance(path: &Path, rows: &[ScoredCaptain]) -> Result<usize> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let written = write_performance(file, rows)?;
    info!(path = %path.display(), rows = written, "Exported top performers");
    Ok(written)
}

pub fn export_risk(path: &Path, rows: &[RiskAssessment]) -> Result<usize> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let written = write_risk(file, rows)?;
    info!(path = %path.display(), rows = written, "Exported at-risk captains");
    Ok(written)
}
