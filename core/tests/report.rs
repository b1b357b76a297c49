use chrono::{DateTime, Duration, TimeZone, Utc};
use scout_core::{
    config::{ReportConfig, ThresholdTier},
    engine::ReportEngine,
    mock_data,
    report::DataQuality,
    tables::{CanonicalTables, MatchRecord, Party, PlayerMatchStat, RoundRecord, Side},
};
use std::collections::HashSet;

// ── Helpers ──────────────────────────────────────────────────────────────────

const TEAM: &str = "Cloud9";

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Four 20-round maps on Split with alternating results and first kills
/// always going to the round winner.
fn short_season() -> CanonicalTables {
    let start = Utc.with_ymd_and_hms(2025, 4, 1, 18, 0, 0).unwrap();
    let mut tables = CanonicalTables::default();
    for i in 0..4u32 {
        let won = i % 2 == 0;
        let match_id = format!("c{i}");
        let needed = if won { 12 } else { 6 };
        for n in 1..=20u32 {
            let team_won = if n == 1 { true } else { n > 20 - needed };
            let winner = if team_won { Party::Team } else { Party::Opponent };
            tables.rounds.push(RoundRecord {
                match_id:     match_id.clone(),
                round_number: n,
                side:         if n <= 12 { Side::Attack } else { Side::Defense },
                round_type:   None,
                winner,
                first_kill:   Some(winner),
            });
        }
        tables.player_match_stats.push(PlayerMatchStat {
            match_id:     match_id.clone(),
            team:         TEAM.to_string(),
            player:       "jakee".to_string(),
            agent:        "Jett".to_string(),
            kills:        18,
            deaths:       14,
            assists:      3,
            damage:       3100,
            headshots:    6,
            first_kills:  3,
            first_deaths: 2,
            acs:          240.0,
        });
        tables.matches.push(MatchRecord {
            match_id,
            date: start + Duration::days(i64::from(i)),
            team: TEAM.to_string(),
            opponent: "Sentinels".to_string(),
            map: "Split".to_string(),
            starting_side: Side::Attack,
            score_us: if won { 13 } else { 7 },
            score_them: if won { 7 } else { 13 },
            won,
            won_first_pistol: true,
        });
    }
    tables
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn zero_matches_give_an_empty_report_without_error() {
    let engine = ReportEngine::build(ReportConfig::default()).unwrap();
    let report = engine
        .generate(&CanonicalTables::default(), "Cloud9", fixed_time())
        .unwrap();

    assert!(report.key_insights.is_empty());
    assert!(report.how_to_beat.is_empty());
    assert!(report.what_not_to_do.is_empty());
    assert!(report.trend_alerts.is_empty());
    assert!(report.map_veto.is_empty());
    assert!(report.player_stats.is_empty());
    assert_eq!(report.team_summary.date_range, "N/A");
    assert_eq!(report.team_summary.overall_win_rate, None);
    assert_eq!(report.meta.data_quality, DataQuality::NoData);
    assert_eq!(report.meta.matches_found, 0);
    assert_eq!(report.meta.rules_evaluated, 0);
    assert!(report.evidence_tables.values().all(Vec::is_empty));
}

#[test]
fn another_teams_matches_are_not_this_teams_data() {
    let engine = ReportEngine::build(ReportConfig::default()).unwrap();
    let season = mock_data::generate_season("LOUD", 10, 4);
    let report = engine.generate(&season, "Cloud9", fixed_time()).unwrap();
    assert_eq!(report.meta.data_quality, DataQuality::NoData);
    assert_eq!(report.team_summary.name, "Cloud9");
}

#[test]
fn top_level_fields_form_the_wire_contract() {
    let engine = ReportEngine::build(ReportConfig::default()).unwrap();
    let season = mock_data::generate_season(TEAM, 12, 8);
    let report = engine.generate(&season, TEAM, fixed_time()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

    let keys: HashSet<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    let expected: HashSet<&str> = [
        "generated_at",
        "team_summary",
        "trend_alerts",
        "map_veto",
        "map_performance",
        "side_performance",
        "economy_stats",
        "player_stats",
        "capabilities",
        "key_insights",
        "how_to_beat",
        "what_not_to_do",
        "evidence_tables",
        "meta",
    ]
    .into_iter()
    .collect();
    assert_eq!(keys, expected);
    assert_eq!(json["generated_at"], "2025-06-01T12:00:00Z");
    assert_eq!(json["meta"]["engine_version"], env!("CARGO_PKG_VERSION"));

    for insight in json["key_insights"].as_array().unwrap() {
        let severity = insight["severity"].as_str().unwrap();
        assert!(["HIGH", "MED", "LOW"].contains(&severity));
        let confidence = insight["confidence"].as_str().unwrap();
        assert!(["high", "medium", "low"].contains(&confidence));
    }
}

#[test]
fn checklists_are_capped_deduplicated_sentences() {
    let config = ReportConfig::default().with_matches(20);
    let engine = ReportEngine::build(config.clone()).unwrap();
    let season = mock_data::generate_season("Sentinels", 20, 17);
    let report = engine.generate(&season, "Sentinels", fixed_time()).unwrap();

    assert!(report.how_to_beat.len() <= config.how_to_beat_max);
    assert!(report.what_not_to_do.len() <= config.what_not_to_do_max);
    for line in report.how_to_beat.iter().chain(&report.what_not_to_do) {
        assert!(line.ends_with('.') || line.ends_with('!') || line.ends_with('?'), "{line}");
    }
    let unique: HashSet<String> = report.how_to_beat.iter().map(|l| l.to_lowercase()).collect();
    assert_eq!(unique.len(), report.how_to_beat.len());
    if !report.key_insights.is_empty() {
        assert!(!report.how_to_beat.is_empty());
    }
}

#[test]
fn summary_counts_agree_with_insights() {
    let engine = ReportEngine::build(ReportConfig::default().with_matches(15)).unwrap();
    let season = mock_data::generate_season(TEAM, 15, 33);
    let report = engine.generate(&season, TEAM, fixed_time()).unwrap();
    let summary = &report.meta.insight_summary;

    assert_eq!(summary.total, report.key_insights.len());
    assert_eq!(summary.by_severity.values().sum::<usize>(), summary.total);
    assert_eq!(summary.by_category.values().sum::<usize>(), summary.total);
    assert!(report.meta.candidates_generated >= summary.total);
    assert_eq!(report.meta.rules_evaluated, 17);
    assert_eq!(report.meta.matches_found, 15);
    assert_eq!(report.team_summary.matches_analyzed, 15);
}

#[test]
fn evidence_tables_show_the_prepared_view() {
    let config = ReportConfig::default();
    let engine = ReportEngine::build(config.clone()).unwrap();
    let season = mock_data::generate_season(TEAM, 12, 2);
    let report = engine.generate(&season, TEAM, fixed_time()).unwrap();

    let rounds = &report.evidence_tables["rounds"];
    assert_eq!(rounds.len(), config.evidence_table_rows);
    assert!(rounds.iter().all(|r| r["round_type"].is_string()), "round types resolved");
    assert_eq!(report.evidence_tables["matches"].len(), 10);
    assert!(report.evidence_tables.contains_key("player_match_stats"));
}

#[test]
fn too_few_strict_findings_relax_the_thresholds_once() {
    let config = ReportConfig {
        min_insights: 12,
        ..ReportConfig::default()
    };
    let engine = ReportEngine::build(config).unwrap();
    let report = engine.generate(&short_season(), TEAM, fixed_time()).unwrap();

    assert_eq!(report.meta.threshold_tier, ThresholdTier::Relaxed);
    assert_eq!(report.meta.data_quality, DataQuality::RelaxedThresholds);
    assert_eq!(report.meta.insight_shortfall, report.key_insights.len() < 12);
}

#[test]
fn enough_strict_findings_keep_the_strict_tier() {
    let config = ReportConfig {
        min_insights: 0,
        ..ReportConfig::default()
    };
    let engine = ReportEngine::build(config).unwrap();
    let report = engine.generate(&short_season(), TEAM, fixed_time()).unwrap();

    assert_eq!(report.meta.threshold_tier, ThresholdTier::Strict);
    assert_eq!(report.meta.data_quality, DataQuality::Complete);
    assert!(!report.meta.insight_shortfall);
}

#[test]
fn malformed_tables_fail_the_whole_generation() {
    let engine = ReportEngine::build(ReportConfig::default()).unwrap();
    let mut season = mock_data::generate_season(TEAM, 3, 9);
    season.matches[1].match_id = season.matches[0].match_id.clone();
    assert!(engine.generate(&season, TEAM, fixed_time()).is_err());
}
