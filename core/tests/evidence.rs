use proptest::prelude::*;
use scout_core::{
    config::ReportConfig,
    engine::ReportEngine,
    evidence::{row_matches, EvidenceRef, Filter, TableName, MAX_SAMPLE_ROWS},
    mock_data,
    tables::PreparedTables,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn fixed_time() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc)
}

fn view(team: &str, matches: usize, seed: u64, config: &ReportConfig) -> PreparedTables {
    let tables = mock_data::generate_season(team, matches, seed);
    PreparedTables::build(&tables, team, config.matches_to_analyze, &config.economy).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn sample_rows_are_capped_at_five() {
    let config = ReportConfig::default();
    let view = view("Cloud9", 10, 1, &config);
    let all_rounds = EvidenceRef::select(&view, TableName::Rounds, vec![], 50);

    assert_eq!(all_rounds.sample_rows.len(), MAX_SAMPLE_ROWS);
    assert_eq!(all_rounds.matching_rows, view.rounds.len());
}

#[test]
fn filters_select_exactly_the_matching_rows() {
    let config = ReportConfig::default();
    let view = view("Cloud9", 10, 2, &config);
    let first_half = EvidenceRef::select(
        &view,
        TableName::Rounds,
        vec![Filter::between("round_number", 1.0, 12.0), Filter::eq("winner", "team")],
        5,
    );

    let expected = view
        .rounds
        .iter()
        .filter(|r| r.round_number <= 12 && r.team_won())
        .count();
    assert_eq!(first_half.matching_rows, expected);
    for row in &first_half.sample_rows {
        assert!(row["round_number"].as_u64().unwrap() <= 12);
        assert_eq!(row["winner"], "team");
    }
}

#[test]
fn one_of_matches_any_listed_value() {
    let config = ReportConfig::default();
    let view = view("LOUD", 10, 3, &config);
    let ids: Vec<&str> = view.matches.iter().take(2).map(|m| m.match_id.as_str()).collect();
    let picked = EvidenceRef::select(&view, TableName::Matches, vec![Filter::one_of("match_id", ids)], 5);
    assert_eq!(picked.matching_rows, 2);
}

#[test]
fn evidence_from_another_view_does_not_reproduce() {
    let config = ReportConfig::default();
    let ours = view("Cloud9", 10, 4, &config);
    let theirs = view("Cloud9", 10, 5, &config);
    let sample = EvidenceRef::select(&ours, TableName::Matches, vec![Filter::eq("won", true)], 5);

    assert!(sample.reproduces_against(&ours));
    if !sample.sample_rows.is_empty() {
        assert!(!sample.reproduces_against(&theirs));
    }
}

// ── Properties ───────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Re-running every evidence filter against the prepared view returns
    /// the sampled rows, and only rows the filter accepts were sampled.
    #[test]
    fn every_insight_evidence_reproduces(seed in any::<u64>(), matches in 1usize..25) {
        let config = ReportConfig::default().with_matches(matches.max(1));
        let engine = ReportEngine::build(config.clone()).unwrap();
        let tables = mock_data::generate_season("Sentinels", matches, seed);
        let report = engine.generate(&tables, "Sentinels", fixed_time()).unwrap();
        let view = PreparedTables::build(&tables, "Sentinels", config.matches_to_analyze, &config.economy).unwrap();

        for insight in &report.key_insights {
            prop_assert!(!insight.evidence_refs.is_empty(), "{} has no evidence", insight.title);
            for evidence in &insight.evidence_refs {
                prop_assert!(evidence.sample_rows.len() <= MAX_SAMPLE_ROWS);
                prop_assert!(evidence.sample_rows.len() <= evidence.matching_rows);
                prop_assert!(evidence.reproduces_against(&view), "{}", insight.title);
                for row in &evidence.sample_rows {
                    prop_assert!(row_matches(row, &evidence.filters));
                }
            }
        }
    }
}
