//! Scoring and view configuration.
//!
//! Weights, thresholds and bands live here rather than in the scoring code so
//! that alternate schemes can be swapped in from a TOML file:
//!
//! ```toml
//! [performance]
//! scheme = "diversity-v1"
//! version = 1
//! success = 0.40
//! volume = 0.30
//! companies = 0.20
//! packages = 0.10
//!
//! [risk]
//! max_success_rate = 65.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub performance: PerformanceWeights,
    pub consistency: ConsistencyTiers,
    pub risk: RiskModel,
    pub views: ViewConfig,
}

impl EngineConfig {
    /// Reads `path` when given, otherwise returns the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), scheme = %config.performance.scheme, "Loaded config");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.performance.validate()?;
        self.consistency.validate()?;
        self.risk.validate()?;
        self.views.validate()?;
        Ok(())
    }
}

fn check_weight(value: f64, name: &str) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{name} weight must be between 0.0 and 1.0, got {value}"
        )))
    }
}

/// Versioned weighting of the performance sub-scores. Unused factors are 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceWeights {
    pub scheme: String,
    pub version: u32,
    pub success: f64,
    pub volume: f64,
    pub consistency: f64,
    pub companies: f64,
    pub packages: f64,
    /// Restricts scoring to the trailing N days before the as-of date
    pub trailing_days: Option<i64>,
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self::balanced()
    }
}

impl PerformanceWeights {
    pub const PRESETS: [&'static str; 3] = ["balanced-v2", "diversity-v1", "quarterly-v3"];

    /// Success 50, volume 35, consistency 15.
    pub fn balanced() -> Self {
        Self {
            scheme: "balanced-v2".to_string(),
            version: 2,
            success: 0.50,
            volume: 0.35,
            consistency: 0.15,
            companies: 0.0,
            packages: 0.0,
            trailing_days: None,
        }
    }

    /// Success 40, volume 30, companies served 20, packages handled 10.
    pub fn diversity() -> Self {
        Self {
            scheme: "diversity-v1".to_string(),
            version: 1,
            success: 0.40,
            volume: 0.30,
            consistency: 0.0,
            companies: 0.20,
            packages: 0.10,
            trailing_days: None,
        }
    }

    /// Success and volume only, over the last 90 days.
    pub fn quarterly() -> Self {
        Self {
            scheme: "quarterly-v3".to_string(),
            version: 3,
            success: 0.60,
            volume: 0.40,
            consistency: 0.0,
            companies: 0.0,
            packages: 0.0,
            trailing_days: Some(90),
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "balanced-v2" | "balanced" => Some(Self::balanced()),
            "diversity-v1" | "diversity" => Some(Self::diversity()),
            "quarterly-v3" | "quarterly" => Some(Self::quarterly()),
            _ => None,
        }
    }

    pub fn sum(&self) -> f64 {
        self.success + self.volume + self.consistency + self.companies + self.packages
    }

    pub fn validate(&self) -> Result<()> {
        check_weight(self.success, "success")?;
        check_weight(self.volume, "volume")?;
        check_weight(self.consistency, "consistency")?;
        check_weight(self.companies, "companies")?;
        check_weight(self.packages, "packages")?;

        let sum = self.sum();
        if (sum - 1.0).abs() > 0.001 {
            return Err(Error::Config(format!(
                "performance weights of scheme '{}' must sum to 1.0, but sum to {:.3}",
                self.scheme, sum
            )));
        }

        if matches!(self.trailing_days, Some(days) if days <= 0) {
            return Err(Error::Config("trailing_days must be positive".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyTier {
    pub min_success_rate: f64,
    pub score: f64,
}

/// Step function from success rate to a consistency score. Stands in for
/// day-level variance until per-day standard deviation is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyTiers {
    /// Highest threshold first
    pub tiers: Vec<ConsistencyTier>,
    pub floor: f64,
}

impl Default for ConsistencyTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                ConsistencyTier { min_success_rate: 90.0, score: 95.0 },
                ConsistencyTier { min_success_rate: 85.0, score: 80.0 },
                ConsistencyTier { min_success_rate: 80.0, score: 65.0 },
            ],
            floor: 50.0,
        }
    }
}

impl ConsistencyTiers {
    pub fn score(&self, success_rate: f64) -> f64 {
        self.tiers
            .iter()
            .find(|tier| success_rate >= tier.min_success_rate)
            .map(|tier| tier.score)
            .unwrap_or(self.floor)
    }

    pub fn validate(&self) -> Result<()> {
        let descending = self
            .tiers
            .windows(2)
            .all(|pair| pair[0].min_success_rate > pair[1].min_success_rate);
        if descending {
            Ok(())
        } else {
            Err(Error::Config(
                "consistency tiers must be ordered by descending min_success_rate".to_string(),
            ))
        }
    }
}

/// Risk weighting, eligibility threshold and recommendation bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskModel {
    /// Captains at or below this success rate are scored
    pub max_success_rate: f64,
    pub success_weight: f64,
    pub failure_weight: f64,
    pub low_activity_weight: f64,
    pub low_activity_penalty: f64,
    /// Fewer shipments than this counts as low activity
    pub low_activity_threshold: u64,
    /// Scores above this recommend stopping the account
    pub stop_above: f64,
    /// Scores from this up to `stop_above` recommend retraining
    pub retrain_from: f64,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self {
            max_success_rate: 70.0,
            success_weight: 0.5,
            failure_weight: 0.3,
            low_activity_weight: 0.2,
            low_activity_penalty: 20.0,
            low_activity_threshold: 10,
            stop_above: 60.0,
            retrain_from: 40.0,
        }
    }
}

impl RiskModel {
    pub fn validate(&self) -> Result<()> {
        check_weight(self.success_weight, "risk success")?;
        check_weight(self.failure_weight, "risk failure")?;
        check_weight(self.low_activity_weight, "risk low-activity")?;

        if self.retrain_from > self.stop_above {
            return Err(Error::Config(format!(
                "retrain_from ({}) must not exceed stop_above ({})",
                self.retrain_from, self.stop_above
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageBands {
    pub excellent_from: f64,
    pub good_from: f64,
}

impl Default for PackageBands {
    fn default() -> Self {
        Self {
            excellent_from: 90.0,
            good_from: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Lower edges of the success-rate histogram, descending
    pub histogram_edges: Vec<f64>,
    pub package_bands: PackageBands,
    pub top_volume_limit: usize,
    pub high_failure_min_shipments: u64,
    pub high_failure_limit: usize,
    pub worst_success_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            histogram_edges: vec![90.0, 80.0, 70.0],
            package_bands: PackageBands::default(),
            top_volume_limit: 10,
            high_failure_min_shipments: 200,
            high_failure_limit: 8,
            worst_success_limit: 10,
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<()> {
        if self.histogram_edges.is_empty() {
            return Err(Error::Config("histogram_edges must not be empty".to_string()));
        }
        if !self.histogram_edges.windows(2).all(|pair| pair[0] > pair[1]) {
            return Err(Error::Config(
                "histogram_edges must be strictly descending".to_string(),
            ));
        }
        if self.package_bands.good_from > self.package_bands.excellent_from {
            return Err(Error::Config(
                "package_bands.good_from must not exceed excellent_from".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
        for name in PerformanceWeights::PRESETS {
            PerformanceWeights::preset(name).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn consistency_steps() {
        let tiers = ConsistencyTiers::default();
        assert_eq!(tiers.score(100.0), 95.0);
        assert_eq!(tiers.score(90.0), 95.0);
        assert_eq!(tiers.score(89.9), 80.0);
        assert_eq!(tiers.score(85.0), 80.0);
        assert_eq!(tiers.score(80.0), 65.0);
        assert_eq!(tiers.score(79.9), 50.0);
        assert_eq!(tiers.score(0.0), 50.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [performance]
            scheme = "diversity-v1"
            version = 1
            success = 0.4
            volume = 0.3
            consistency = 0.0
            companies = 0.2
            packages = 0.1

            [risk]
            max_success_rate = 65.0
            "#,
        )
        .unwrap();

        assert_eq!(config.performance, PerformanceWeights::diversity());
        assert_eq!(config.risk.max_success_rate, 65.0);
        assert_eq!(config.risk.stop_above, 60.0);
        assert_eq!(config.views, ViewConfig::default());
    }

    #[test]
    fn view_limits_are_independent() {
        let config = EngineConfig::from_toml_str(
            r#"
            [views]
            worst_success_limit = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.views.worst_success_limit, 3);
        assert_eq!(config.views.top_volume_limit, 10);
        assert_eq!(ViewConfig::default().worst_success_limit, 10);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let err = EngineConfig::from_toml_str(
            r#"
            [performance]
            success = 0.9
            volume = 0.9
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must sum to 1.0"));
    }

    #[test]
    fn rejects_unordered_histogram_edges() {
        let err = EngineConfig::from_toml_str(
            r#"
            [views]
            histogram_edges = [70.0, 90.0]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = EngineConfig::from_toml_str("[performance\nsuccess = ").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
