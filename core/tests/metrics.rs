use chrono::{Duration, TimeZone, Utc};
use scout_core::{
    config::ReportConfig,
    metrics::{self, MetricsBundle},
    tables::{
        CanonicalTables, MatchRecord, Party, PlayerMatchStat, PreparedTables, RoundRecord, RoundType,
        Side,
    },
};

// ── Helpers ──────────────────────────────────────────────────────────────────

const TEAM: &str = "Cloud9";
const ROSTER: [(&str, &str); 5] = [
    ("jakee", "Jett"),
    ("Xeppaa", "Sova"),
    ("runi", "Omen"),
    ("moose", "Killjoy"),
    ("eeiu", "Skye"),
];

/// One played map: (won, won_first_pistol, map). Listed oldest first.
type MapResult = (bool, bool, &'static str);

/// 20-round maps, 13-7. Round 1 goes to the pistol winner; the match
/// winner takes the closing rounds. First kills go to the round winner.
fn season(results: &[MapResult]) -> CanonicalTables {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap();
    let mut tables = CanonicalTables::default();
    for (i, &(won, pistol, map)) in results.iter().enumerate() {
        let match_id = format!("m{:02}", i + 1);
        let needed = if won { 13 } else { 7 } - u32::from(pistol);
        for n in 1..=20u32 {
            let team_won = if n == 1 { pistol } else { n > 20 - needed };
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
        for (p, agent) in ROSTER {
            tables.player_match_stats.push(PlayerMatchStat {
                match_id:     match_id.clone(),
                team:         TEAM.to_string(),
                player:       p.to_string(),
                agent:        agent.to_string(),
                kills:        15,
                deaths:       if p == "runi" { 0 } else { 12 },
                assists:      4,
                damage:       2600,
                headshots:    5,
                first_kills:  if p == "jakee" { 3 } else { 1 },
                first_deaths: 1,
                acs:          if p == "jakee" { 260.0 } else { 200.0 },
            });
        }
        tables.matches.push(MatchRecord {
            match_id,
            date: start + Duration::days(i as i64),
            team: TEAM.to_string(),
            opponent: "LOUD".to_string(),
            map: map.to_string(),
            starting_side: Side::Attack,
            score_us: if won { 13 } else { 7 },
            score_them: if won { 7 } else { 13 },
            won,
            won_first_pistol: pistol,
        });
    }
    tables
}

fn bundle_for(tables: &CanonicalTables, config: &ReportConfig) -> (PreparedTables, MetricsBundle) {
    let view = PreparedTables::build(tables, TEAM, config.matches_to_analyze, &config.economy).unwrap();
    let bundle = metrics::compute(&view, config);
    (view, bundle)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn win_rate_counts_matches_in_the_window() {
    let tables = season(&[
        (true, true, "Bind"),
        (false, false, "Bind"),
        (true, true, "Haven"),
        (true, false, "Bind"),
    ]);
    let config = ReportConfig::default();
    let (_, bundle) = bundle_for(&tables, &config);

    let win = bundle.snapshot("win_rate").unwrap();
    assert_eq!(win.n, 4);
    assert!((win.value - 0.75).abs() < 1e-12);
    assert_eq!(bundle.matches_analyzed, 4);
}

#[test]
fn window_keeps_only_the_most_recent_matches() {
    let results: Vec<MapResult> = (0..12).map(|i| (i >= 10, true, "Ascent")).collect();
    let tables = season(&results);
    let config = ReportConfig::default().with_matches(2);
    let (view, bundle) = bundle_for(&tables, &config);

    assert_eq!(view.matches.len(), 2);
    assert_eq!(view.matches[0].match_id, "m12", "newest first");
    assert_eq!(bundle.rate("win_rate"), Some(1.0));
}

#[test]
fn map_performance_reports_three_games_two_wins() {
    let tables = season(&[
        (true, true, "Bind"),
        (false, false, "Bind"),
        (true, true, "Bind"),
        (true, true, "Lotus"),
    ]);
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    let bind = bundle.map_performance.iter().find(|m| m.map == "Bind").unwrap();
    assert_eq!((bind.games, bind.wins, bind.losses), (3, 2, 1));
    assert!((bind.win_rate - 2.0 / 3.0).abs() < 1e-12);
    assert!((bind.avg_rounds_won - 11.0).abs() < 1e-12);
    assert_eq!(bundle.map_performance[0].map, "Bind", "most played map first");

    let snap = bundle.snapshot("map_win_rate:Bind").unwrap();
    assert_eq!(snap.n, 3);
}

#[test]
fn unsupplied_round_types_are_classified() {
    let tables = season(&[(true, true, "Split"), (false, false, "Split")]);
    let (view, bundle) = bundle_for(&tables, &ReportConfig::default());

    assert!(view.rounds.iter().all(|r| r.round_type.is_some()));
    for r in view.rounds.iter().filter(|r| r.round_number == 1 || r.round_number == 13) {
        assert_eq!(r.round_type, Some(RoundType::Pistol), "round {}", r.round_number);
    }
    let economy = bundle.economy.as_ref().unwrap();
    assert_eq!(economy.pistol_rounds, 4);
}

#[test]
fn side_rates_split_rounds_by_side() {
    let tables = season(&[(true, true, "Pearl")]);
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    let attack = bundle.side(Side::Attack).unwrap();
    let defense = bundle.side(Side::Defense).unwrap();
    assert_eq!(attack.rounds_played, 12);
    assert_eq!(defense.rounds_played, 8);
    assert_eq!(attack.rounds_won + defense.rounds_won, 13);
}

#[test]
fn trend_compares_last_three_to_last_ten() {
    // Oldest seven: two wins. Newest three: all wins. 5/10 overall.
    let mut results: Vec<MapResult> = (0..7).map(|i| (i < 2, true, "Icebox")).collect();
    results.extend([(true, true, "Icebox"); 3]);
    let tables = season(&results);
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    let trend = bundle.trend("win_rate").unwrap();
    assert_eq!((trend.recent_n, trend.baseline_n), (3, 10));
    assert!((trend.recent - 1.0).abs() < 1e-12);
    assert!((trend.baseline - 0.5).abs() < 1e-12);
    assert!((trend.change_pct - 50.0).abs() < 1e-9);
}

#[test]
fn pistol_loss_conditional_has_rate_and_baseline() {
    // 9 pistol losses (7 lost), 11 pistol wins (3 lost).
    let mut results: Vec<MapResult> = Vec::new();
    results.extend((0..9).map(|i| (i >= 7, false, "Haven")));
    results.extend((0..11).map(|i| (i >= 3, true, "Haven")));
    let tables = season(&results);
    let config = ReportConfig::default().with_matches(20);
    let (_, bundle) = bundle_for(&tables, &config);

    let c = bundle.conditional("after_pistol_loss").unwrap();
    assert_eq!(c.n, 9);
    assert!((c.loss_rate - 7.0 / 9.0).abs() < 1e-12);
    assert_eq!(c.baseline_n, 20);
    assert!((c.baseline_loss_rate - 0.5).abs() < 1e-12);
}

#[test]
fn down_early_conditional_scopes_maps_opened_zero_two() {
    // Two maps lost from round 1, one won from the pistol.
    let tables = season(&[
        (false, false, "Bind"),
        (false, false, "Bind"),
        (true, true, "Bind"),
    ]);
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    let c = bundle.conditional("when_down_early").unwrap();
    assert_eq!(c.n, 18, "rounds 4-12 of the two maps opened 0-2");
    assert!((c.loss_rate - 1.0).abs() < 1e-12);
    assert_eq!(c.baseline_n, 27);
    assert!((c.baseline_loss_rate - 23.0 / 27.0).abs() < 1e-12);
}

#[test]
fn no_early_deficit_means_no_down_early_conditional() {
    let tables = season(&[(true, true, "Bind"), (false, true, "Bind")]);
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());
    assert!(bundle.conditional("when_down_early").is_none());
}

#[test]
fn opening_death_conditional_skips_rounds_without_a_first_kill() {
    let mut tables = season(&[
        (false, false, "Bind"),
        (false, false, "Bind"),
        (true, true, "Bind"),
    ]);
    let blank = tables
        .rounds
        .iter_mut()
        .find(|r| r.match_id == "m01" && r.round_number == 2)
        .unwrap();
    blank.first_kill = None;
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    let c = bundle.conditional("after_opening_death").unwrap();
    assert_eq!(c.n, 32);
    assert!((c.loss_rate - 1.0).abs() < 1e-12);
    assert_eq!(c.baseline_n, 59);
    assert!((c.baseline_loss_rate - 32.0 / 59.0).abs() < 1e-12);
}

#[test]
fn most_played_agent_ties_go_to_the_most_recent() {
    // runi: Raze, Omen, Omen, Raze from oldest to newest.
    let results: Vec<MapResult> = (0..4).map(|i| (i % 2 == 0, true, "Lotus")).collect();
    let mut tables = season(&results);
    for row in tables.player_match_stats.iter_mut().filter(|r| r.player == "runi") {
        if row.match_id == "m01" || row.match_id == "m04" {
            row.agent = "Raze".to_string();
        }
    }
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    let runi = bundle.players.iter().find(|p| p.player == "runi").unwrap();
    assert_eq!(runi.most_played_agent, "Raze");
    let pool: Vec<&str> = runi.agent_pool.iter().map(|a| a.agent.as_str()).collect();
    assert_eq!(pool, vec!["Raze", "Omen"]);
}

#[test]
fn player_aggregates_handle_zero_deaths() {
    let tables = season(&[(true, true, "Ascent"), (false, true, "Ascent")]);
    let (_, bundle) = bundle_for(&tables, &ReportConfig::default());

    assert_eq!(bundle.players[0].player, "jakee", "highest ACS first");
    let runi = bundle.players.iter().find(|p| p.player == "runi").unwrap();
    assert_eq!(runi.kd_ratio, 30.0, "zero deaths: K/D is the kill total");
    assert_eq!(runi.most_played_agent, "Omen");
    assert_eq!(runi.agent_pool[0].games, 2);
    assert!((runi.headshot_share.unwrap() - 5.0 / 15.0).abs() < 1e-12);
}

#[test]
fn empty_view_yields_an_empty_bundle() {
    let tables = season(&[(true, true, "Bind")]);
    let config = ReportConfig::default();
    let view = PreparedTables::build(&tables, "Nobody", 10, &config.economy).unwrap();
    let bundle = metrics::compute(&view, &config);

    assert_eq!(bundle.matches_analyzed, 0);
    assert!(bundle.snapshots.is_empty());
    assert!(bundle.map_performance.is_empty());
    assert!(bundle.trends.is_empty());
    assert!(bundle.conditionals.is_empty());
    assert!(bundle.economy.is_none());
    assert!(bundle.date_range.is_none());
}
