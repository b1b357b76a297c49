//! report-runner: headless scouting report generation.
//!
//! Usage:
//!   report-runner --team Cloud9 --mock --seed 42
//!   report-runner --team Cloud9 --db tables.db --n 15 --out report.json
//!   report-runner --team LOUD --tables tables.json --config data/report_config.json

use anyhow::{bail, Context, Result};
use scout_core::{
    config::ReportConfig,
    engine::ReportEngine,
    mock_data,
    store::TableStore,
    tables::CanonicalTables,
};
use std::env;

const DEFAULT_MOCK_MATCHES: usize = 20;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let team = flag(&args, "--team").unwrap_or("Cloud9");
    let seed = parse_arg(&args, "--seed", 42u64);
    let mock = args.iter().any(|a| a == "--mock");

    let mut config = match flag(&args, "--config") {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(n) = flag(&args, "--n") {
        let n: usize = n.parse().with_context(|| format!("--n expects a count, got '{n}'"))?;
        config = config.with_matches(n);
    }

    let tables = load_tables(&args, team, seed, mock, config.matches_to_analyze)?;
    let engine = ReportEngine::build(config)?;
    let report = engine.generate_now(&tables, team)?;
    let json = report.to_json_pretty()?;

    match flag(&args, "--out") {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("Cannot write {path}"))?;
            log::info!("report written to {path}");
        }
        None => println!("{json}"),
    }

    let meta = &report.meta;
    eprintln!(
        "{team}: {} matches, {} insights ({} high), tier {}, {} rules faulted",
        meta.matches_found,
        meta.insight_summary.total,
        meta.insight_summary.count(scout_core::insight::Severity::High),
        meta.threshold_tier.as_str(),
        meta.rules_faulted.len()
    );
    Ok(())
}

fn load_tables(args: &[String], team: &str, seed: u64, mock: bool, n: usize) -> Result<CanonicalTables> {
    let db = flag(args, "--db");
    let json = flag(args, "--tables");
    match (db, json, mock) {
        (Some(path), None, false) => {
            let store = TableStore::open(path)?;
            Ok(store.load_tables()?)
        }
        (None, Some(path), false) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            Ok(serde_json::from_str(&content)?)
        }
        (None, None, _) => {
            let matches = n.max(DEFAULT_MOCK_MATCHES);
            log::info!("generating {matches} synthetic matches for {team} (seed {seed})");
            Ok(mock_data::generate_season(team, matches, seed))
        }
        _ => bail!("choose one of --db, --tables or --mock"),
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
