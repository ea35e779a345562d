use crate::config::RiskModel;
use crate::models::{CaptainStats, Recommendation, RiskAssessment};
use crate::ranking::by_score_desc;

/// Risk composite for one captain, higher is worse.
///
/// `w_s * (100 - success) + w_f * failure_ratio + w_a * penalty`, where the
/// penalty applies only below the low-activity threshold.
pub fn risk_score(stats: &CaptainStats, model: &RiskModel) -> (f64, f64, f64) {
    let failure_ratio = 100.0 * stats.failed as f64 / stats.total_shipments.max(1) as f64;
    let penalty = low_activity_penalty(stats.total_shipments, model);

    let score = (100.0 - stats.success_rate) * model.success_weight
        + failure_ratio * model.failure_weight
        + penalty * model.low_activity_weight;

    (score, failure_ratio, penalty)
}

pub fn low_activity_penalty(total_shipments: u64, model: &RiskModel) -> f64 {
    if total_shipments < model.low_activity_threshold {
        model.low_activity_penalty
    } else {
        0.0
    }
}

pub fn recommend(score: f64, model: &RiskModel) -> Recommendation {
    if score > model.stop_above {
        Recommendation::StopAccount
    } else if score >= model.retrain_from {
        Recommendation::ImmediateRetraining
    } else {
        Recommendation::PerformanceReview
    }
}

/// Captains with activity whose success rate is at or below
/// `max_success_rate`, riskiest first.
pub fn rank_at_risk_drivers(
    stats: &[CaptainStats],
    max_success_rate: f64,
    model: &RiskModel,
) -> Vec<RiskAssessment> {
    let mut values: Vec<RiskAssessment> = stats
        .iter()
        .filter(|s| s.total_shipments > 0 && s.success_rate <= max_success_rate)
        .map(|s| {
            let (risk_score, failure_ratio, low_activity_penalty) = risk_score(s, model);
            RiskAssessment {
                stats: s.clone(),
                risk_score,
                failure_ratio,
                low_activity_penalty,
                recommendation: recommend(risk_score, model),
                high_risk: risk_score > model.stop_above,
            }
        })
        .collect();

    values.sort_by(|a, b| by_score_desc(a.risk_score, &a.stats, b.risk_score, &b.stats));
    values
}
