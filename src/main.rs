use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use captain_insights::config::PerformanceWeights;
use captain_insights::export;
use captain_insights::ingest;
use captain_insights::report;
use captain_insights::sample;
use captain_insights::store::{DataSource, Dataset, DatasetStore};
use captain_insights::views;
use captain_insights::{
    captain_profile, compute_captain_stats, compute_global_kpis, compute_time_series, driver_rank,
    rank_at_risk_drivers, sort_leaderboard, top_performers, EngineConfig, FilterOptions, Granularity,
    Selection, ShipmentFilter, ShipmentRecord, SortDirection, SortField,
};

#[derive(Parser)]
#[command(name = "captain-insights")]
#[command(about = "Delivery captain performance analytics", long_about = None)]
struct Cli {
    /// Dataset snapshot file
    #[arg(long, global = true, env = "CAPTAIN_INSIGHTS_STORE", default_value = "captain-insights.json")]
    store: PathBuf,

    /// TOML file with scoring weights, thresholds and view settings
    #[arg(long, global = true, env = "CAPTAIN_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Built-in performance scheme, overriding the config file
    #[arg(long, global = true)]
    scheme: Option<String>,

    /// Reference date for trailing windows (defaults to the latest record)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, global = true)]
    company: Option<String>,
    #[arg(long, global = true)]
    captain: Option<String>,
    #[arg(long, global = true)]
    package: Option<String>,
    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long, global = true)]
    from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long, global = true)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn to_filter(&self) -> ShipmentFilter {
        ShipmentFilter {
            company: Selection::from_option(self.company.as_deref()),
            captain: Selection::from_option(self.captain.as_deref()),
            package_code: Selection::from_option(self.package.as_deref()),
            date_from: self.from,
            date_to: self.to,
        }
    }

    fn scope_label(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.company, &self.captain, &self.package]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .filter(|value| *value != "all")
            .collect();
        (!parts.is_empty()).then(|| parts.join(" / "))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Top,
    AtRisk,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the stored dataset with synthetic sample data
    Seed {
        #[arg(long, default_value_t = sample::DEFAULT_COUNT)]
        count: usize,
        #[arg(long, default_value_t = sample::DEFAULT_SEED)]
        seed: u64,
    },
    /// Replace the stored dataset with rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Remove the stored dataset
    Clear,
    /// Distinct companies, captains and packages available for filtering
    Options,
    /// Global KPIs for the filtered records
    Kpis,
    /// Per-captain statistics
    Captains,
    /// Weekly or monthly trend
    Trends {
        #[arg(long, default_value = "month")]
        granularity: Granularity,
    },
    /// Top performers under the active scoring scheme
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Captains at or below the risk threshold, riskiest first
    AtRisk {
        #[arg(long)]
        max_success_rate: Option<f64>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Captain table sorted by any column
    Leaderboard {
        #[arg(long, default_value = "success-rate")]
        sort: SortField,
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
    },
    /// Chart series: volume leaders, failure leaders, histogram, company share
    Charts,
    /// Drill-down for the captain given with --captain
    Analyze,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write ranked rows to CSV
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(name) = &cli.scheme {
        let Some(weights) = PerformanceWeights::preset(name) else {
            bail!(
                "unknown scheme '{name}' (expected one of {})",
                PerformanceWeights::PRESETS.join(", ")
            );
        };
        config.performance = weights;
    }
    Ok(config)
}

fn load_records(store: &DatasetStore) -> anyhow::Result<Vec<ShipmentRecord>> {
    let stored = store
        .load()
        .with_context(|| format!("failed to read dataset from {}", store.path().display()))?;

    Ok(match stored {
        Some(dataset) => dataset.records,
        None => {
            info!("No stored dataset, using sample data");
            sample::generate(sample::DEFAULT_COUNT, sample::DEFAULT_SEED)
        }
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = DatasetStore::new(&cli.store);
    let today = Local::now().date_naive();

    match &cli.command {
        Commands::Seed { count, seed } => {
            let dataset = Dataset::new(DataSource::Sample { seed: *seed }, sample::generate(*count, *seed));
            store.save(&dataset).context("failed to save sample dataset")?;
            println!("Stored {} sample records in {}.", dataset.records.len(), store.path().display());
            return Ok(());
        }
        Commands::Import { csv } => {
            let imported = ingest::read_csv_path(csv, today)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            let dataset = Dataset::new(
                DataSource::Upload {
                    file: csv.display().to_string(),
                },
                imported.records,
            );
            store.save(&dataset).context("failed to save imported dataset")?;
            println!(
                "Imported {} records from {} ({} dropped, {} dates defaulted, {} captains defaulted).",
                dataset.records.len(),
                csv.display(),
                imported.dropped_rows,
                imported.defaulted_dates,
                imported.defaulted_captains
            );
            return Ok(());
        }
        Commands::Clear => {
            if store.clear().context("failed to clear dataset")? {
                println!("Removed {}.", store.path().display());
            } else {
                println!("No stored dataset.");
            }
            return Ok(());
        }
        _ => {}
    }

    let records = load_records(&store)?;
    let filter = cli.filter.to_filter();
    let as_of = cli
        .as_of
        .or_else(|| records.iter().map(|r| r.date).max())
        .unwrap_or(today);

    match cli.command {
        Commands::Seed { .. } | Commands::Import { .. } | Commands::Clear => {}
        Commands::Options => {
            let options = FilterOptions::from_records(&records);
            emit(cli.json, &options, |o| {
                println!("Companies: {}", o.companies.join(", "));
                println!("Captains: {}", o.captains.join(", "));
                println!("Packages: {}", o.package_codes.join(", "));
            })?;
        }
        Commands::Kpis => {
            let kpis = compute_global_kpis(&records, &filter);
            let average = views::overall_average(&filter.apply(&records));
            emit(cli.json, &kpis, |k| {
                println!("Shipments: {}", k.total_shipments);
                println!("Delivered: {} ({:.1}%)", k.total_delivered, k.success_rate);
                println!("Failed: {} ({:.1}%)", k.total_failed, k.failure_rate);
                println!("Cost per delivered: {:.2}", k.avg_cost_per_delivered);
                println!(
                    "Captains: {}, companies: {}, packages: {}",
                    k.captain_count, k.companies_served, k.packages_handled
                );
                println!("Average shipments per record: {:.1}", average.avg_shipments_per_record);
            })?;
        }
        Commands::Captains => {
            let stats = compute_captain_stats(&records, &filter);
            emit(cli.json, &stats, |rows| {
                if rows.is_empty() {
                    println!("No captains match these filters.");
                }
                for s in rows {
                    println!(
                        "- {}: {} shipments, {:.1}% success, {:.2} per delivery, {} companies, {} packages",
                        s.captain,
                        s.total_shipments,
                        s.success_rate,
                        s.cost_per_delivered,
                        s.companies_served,
                        s.packages_handled
                    );
                }
            })?;
        }
        Commands::Trends { granularity } => {
            let series = compute_time_series(&records, &filter, granularity);
            emit(cli.json, &series, |points| {
                for p in points {
                    println!(
                        "- {}: {} shipments, {} delivered, {} failed, {:.1}% success",
                        p.label, p.shipments, p.delivered, p.failed, p.success_rate
                    );
                }
            })?;
        }
        Commands::Top { limit } => {
            let top = top_performers(&records, &filter, &config, as_of, limit);
            emit(cli.json, &top, |rows| {
                println!(
                    "Top captains by performance score ({} v{}):",
                    config.performance.scheme, config.performance.version
                );
                for (i, scored) in rows.iter().enumerate() {
                    println!(
                        "{}. {} score {:.1} (success {:.1}, volume {:.1}, consistency {:.1})",
                        i + 1,
                        scored.stats.captain,
                        scored.performance_score,
                        scored.success_score,
                        scored.volume_score,
                        scored.consistency_score
                    );
                }
            })?;
        }
        Commands::AtRisk {
            max_success_rate,
            limit,
        } => {
            let stats = compute_captain_stats(&records, &filter);
            let threshold = max_success_rate.unwrap_or(config.risk.max_success_rate);
            let mut flagged = rank_at_risk_drivers(&stats, threshold, &config.risk);
            flagged.truncate(limit);
            emit(cli.json, &flagged, |rows| {
                if rows.is_empty() {
                    println!("No captains at or below {threshold:.1}% success.");
                }
                for r in rows {
                    println!(
                        "- {} risk {:.1}{}: {} ({:.1}% success, {} shipments)",
                        r.stats.captain,
                        r.risk_score,
                        if r.high_risk { " [high]" } else { "" },
                        r.recommendation,
                        r.stats.success_rate,
                        r.stats.total_shipments
                    );
                }
            })?;
        }
        Commands::Leaderboard { sort, direction } => {
            let stats = compute_captain_stats(&records, &filter);
            let rows = sort_leaderboard(&stats, sort, direction);
            emit(cli.json, &rows, |rows| {
                for s in rows {
                    let rank = driver_rank(&stats, &s.captain).map(|r| r.rank).unwrap_or(0);
                    println!(
                        "#{} {}: {} shipments, {:.1}% success, {:.1}% failure",
                        rank, s.captain, s.total_shipments, s.success_rate, s.failure_rate
                    );
                }
            })?;
        }
        Commands::Charts => {
            let filtered = filter.apply(&records);
            let stats = compute_captain_stats(&filtered, &ShipmentFilter::all());
            let charts = serde_json::json!({
                "topByVolume": views::top_by_volume(&stats, config.views.top_volume_limit),
                "highestFailure": views::highest_failure(
                    &stats,
                    config.views.high_failure_min_shipments,
                    config.views.high_failure_limit,
                ),
                "worstBySuccess": views::worst_by_success(&stats, config.views.worst_success_limit),
                "successHistogram": views::success_histogram(&stats, &config.views.histogram_edges),
                "rosterTiers": views::roster_tiers(&stats),
                "companyShare": views::company_share(&filtered),
                "packages": views::package_performance(&filtered, &config.views.package_bands),
            });
            println!("{}", serde_json::to_string_pretty(&charts)?);
        }
        Commands::Analyze => {
            let Some(name) = cli.filter.captain.as_deref().filter(|c| *c != "all") else {
                bail!("analyze needs --captain <NAME>");
            };
            // rank is taken against every captain, so only the other filters apply
            let scope = ShipmentFilter {
                captain: Selection::All,
                ..filter.clone()
            };
            let scoped = scope.apply(&records);
            let Some(profile) = captain_profile(&scoped, name, as_of, &config.views) else {
                bail!("no records for captain '{name}'");
            };
            emit(cli.json, &profile, |p| {
                println!("{} (rank {} of {})", p.stats.captain, p.rank.rank, p.rank.total_drivers);
                println!(
                    "Shipments: {}, success {:.1}% (overall {:.1}%)",
                    p.stats.total_shipments, p.stats.success_rate, p.overall_success_rate
                );
                println!("Last 30 days: {:.1}% ({:+.1})", p.success_rate_30d, p.delta_30d);
                println!("Last 7 days: {:.1}% ({:+.1})", p.success_rate_7d, p.delta_7d);
                println!("Companies:");
                for c in &p.companies {
                    println!("- {}: {} shipments ({:.1}%)", c.company, c.shipments, c.share);
                }
                println!("Packages:");
                for pkg in &p.packages {
                    println!(
                        "- {}: {} shipments, {:.1}% success ({})",
                        pkg.package_code,
                        pkg.shipments,
                        pkg.success_rate,
                        pkg.band.as_str()
                    );
                }
                println!("Monthly:");
                for m in &p.monthly {
                    println!(
                        "- {}: {:.1}% success, efficiency {:+.3}",
                        m.label,
                        m.success_rate,
                        m.efficiency.unwrap_or_default()
                    );
                }
            })?;
        }
        Commands::Report { out } => {
            let label = cli.filter.scope_label();
            let report = report::build_report(label.as_deref(), as_of, &records, &filter, &config);
            std::fs::write(&out, report).with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { kind, out, limit } => {
            let written = match kind {
                ExportKind::Top => {
                    let top = top_performers(&records, &filter, &config, as_of, limit);
                    export::export_performance(&out, &top)
                }
                ExportKind::AtRisk => {
                    let stats = compute_captain_stats(&records, &filter);
                    let mut flagged = rank_at_risk_drivers(&stats, config.risk.max_success_rate, &config.risk);
                    flagged.truncate(limit);
                    export::export_risk(&out, &flagged)
                }
            }
            .with_context(|| format!("failed to export to {}", out.display()))?;
            println!("Wrote {written} rows to {}.", out.display());
        }
    }

    Ok(())
}
