//! Captain performance analytics: filtering, aggregation, rates, scoring and
//! the derived views built on top of them, plus the ingestion, snapshot and
//! export collaborators around that engine.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod models;
pub mod ranking;
pub mod rates;
pub mod report;
pub mod risk;
pub mod sample;
pub mod scoring;
pub mod store;
pub mod views;

pub use config::EngineConfig;
pub use engine::{
    captain_profile, compute_captain_stats, compute_global_kpis, compute_time_series, top_performers,
    CaptainProfile,
};
pub use error::{Error, Result};
pub use filter::{FilterOptions, Selection, ShipmentFilter};
pub use models::{
    CaptainStats, GlobalKpis, Granularity, Recommendation, RiskAssessment, ScoredCaptain, ShipmentRecord,
    TrendPoint,
};
pub use ranking::{driver_rank, sort_leaderboard, SortDirection, SortField};
pub use risk::rank_at_risk_drivers;
pub use scoring::rank_top_performers;
