//! Identical inputs must produce byte-identical reports.
//! Any divergence is a blocker.

use scout_core::{config::ReportConfig, engine::ReportEngine, mock_data};

fn fixed_time() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc)
}

fn report_json(team: &str, matches: usize, seed: u64, config: ReportConfig) -> String {
    let engine = ReportEngine::build(config).expect("engine");
    let tables = mock_data::generate_season(team, matches, seed);
    engine
        .generate(&tables, team, fixed_time())
        .expect("report")
        .to_json_pretty()
        .expect("json")
}

#[test]
fn same_season_produces_identical_json() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let a = report_json("Cloud9", 20, SEED, ReportConfig::default().with_matches(20));
    let b = report_json("Cloud9", 20, SEED, ReportConfig::default().with_matches(20));

    assert_eq!(a.len(), b.len(), "report lengths differ: {} vs {}", a.len(), b.len());
    for (i, (x, y)) in a.lines().zip(b.lines()).enumerate() {
        assert_eq!(x, y, "report diverged at line {i}");
    }
}

#[test]
fn repeated_generation_on_one_engine_is_stateless() {
    let engine = ReportEngine::build(ReportConfig::default()).unwrap();
    let tables = mock_data::generate_season("LOUD", 12, 77);
    let first = engine.generate(&tables, "LOUD", fixed_time()).unwrap();
    let second = engine.generate(&tables, "LOUD", fixed_time()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rule_parallelism_does_not_change_the_report() {
    let parallel = ReportConfig::default().with_matches(15);
    let sequential = ReportConfig {
        parallel_rules: false,
        ..parallel.clone()
    };
    assert_eq!(
        report_json("Sentinels", 15, 3, parallel),
        report_json("Sentinels", 15, 3, sequential)
    );
}

#[test]
fn input_row_order_does_not_change_the_report() {
    let engine = ReportEngine::build(ReportConfig::default()).unwrap();
    let tables = mock_data::generate_season("Cloud9", 12, 8);
    let mut shuffled = tables.clone();
    shuffled.matches.reverse();
    shuffled.rounds.reverse();
    shuffled.player_match_stats.reverse();

    let a = engine.generate(&tables, "Cloud9", fixed_time()).unwrap();
    let b = engine.generate(&shuffled, "Cloud9", fixed_time()).unwrap();
    assert_eq!(a.to_json_pretty().unwrap(), b.to_json_pretty().unwrap());
}

#[test]
fn same_seed_same_season() {
    let a = mock_data::generate_season("Cloud9", 10, 42);
    let b = mock_data::generate_season("Cloud9", 10, 42);
    assert_eq!(a, b);
}

#[test]
fn different_seeds_produce_different_seasons() {
    let a = mock_data::generate_season("Cloud9", 10, 42);
    let b = mock_data::generate_season("Cloud9", 10, 99);
    let scores = |t: &scout_core::tables::CanonicalTables| {
        t.matches.iter().map(|m| (m.score_us, m.score_them, m.map.clone())).collect::<Vec<_>>()
    };
    assert_ne!(scores(&a), scores(&b), "different seeds produced identical seasons");
}
