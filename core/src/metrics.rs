//! Metrics Engine.
//!
//! RULE: Metrics know nothing about insight rules.
//! RULE: A metric with zero underlying samples is absent from the bundle.
//! Consumers must treat "absent" and "zero" as different states.
//!
//! Every named rate is also recorded as a MetricSnapshot carrying the
//! table and filters that produced it, so rules can cite it as evidence.

use crate::{
    capabilities::Capabilities,
    config::ReportConfig,
    evidence::{Filter, TableName},
    tables::{MatchRecord, Party, PreparedTables, RoundRecord, RoundType, Side},
    types::{MatchId, PlayerName, TeamName},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Metrics tracked across the recent and baseline windows, in report order.
pub const TRACKED_TRENDS: [&str; 4] = [
    "win_rate",
    "pistol_win_rate",
    "attack_win_rate",
    "defense_win_rate",
];

// ── Counting ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: usize,
    pub n:    usize,
}

impl Tally {
    pub fn add(&mut self, hit: bool) {
        self.n += 1;
        if hit {
            self.hits += 1;
        }
    }

    pub fn rate(&self) -> Option<f64> {
        (self.n > 0).then(|| self.hits as f64 / self.n as f64)
    }

    fn count<T>(items: impl Iterator<Item = T>, hit: impl Fn(&T) -> bool) -> Self {
        let mut tally = Self::default();
        for item in items {
            tally.add(hit(&item));
        }
        tally
    }
}

fn ratio(num: f64, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num / den as f64 }
}

// ── Bundle records ───────────────────────────────────────────────────

/// A named rate with its sample size and the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub name:    String,
    pub value:   f64,
    pub n:       usize,
    pub table:   TableName,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPerformance {
    pub map:             String,
    pub games:           usize,
    pub wins:            usize,
    pub losses:          usize,
    pub win_rate:        f64,
    pub avg_rounds_won:  f64,
    pub avg_rounds_lost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidePerformance {
    pub side:          Side,
    pub rounds_played: usize,
    pub rounds_won:    usize,
    pub win_rate:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomyStats {
    pub pistol_rounds:       usize,
    pub pistol_wins:         usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pistol_win_rate:     Option<f64>,
    pub eco_rounds:          usize,
    pub eco_wins:            usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eco_conversion_rate: Option<f64>,
    pub force_rounds:        usize,
    pub force_wins:          usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_win_rate:      Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentUsage {
    pub agent:     String,
    pub games:     usize,
    pub wins:      usize,
    pub pick_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAggregate {
    pub player:            PlayerName,
    pub games:             usize,
    pub wins:              usize,
    pub most_played_agent: String,
    /// Most played first, at most three entries.
    pub agent_pool:        Vec<AgentUsage>,
    pub avg_acs:           f64,
    pub avg_kills:         f64,
    pub avg_deaths:        f64,
    pub avg_assists:       f64,
    pub avg_damage:        f64,
    pub kd_ratio:          f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headshot_share:    Option<f64>,
    pub first_blood_rate:  f64,
    pub first_death_rate:  f64,
    pub first_kills:       u32,
    pub first_deaths:      u32,
}

/// One tracked metric over the recent window and the baseline window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDelta {
    pub metric:           String,
    pub recent:           f64,
    pub recent_n:         usize,
    pub baseline:         f64,
    pub baseline_n:       usize,
    /// (recent − baseline) in percentage points.
    pub change_pct:       f64,
    pub table:            TableName,
    pub recent_filters:   Vec<Filter>,
    pub baseline_filters: Vec<Filter>,
}

impl TrendDelta {
    pub fn delta(&self) -> f64 {
        self.recent - self.baseline
    }
}

/// P(loss | condition) next to the unconditional P(loss) of the same unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalRate {
    pub name:               String,
    pub loss_rate:          f64,
    pub n:                  usize,
    pub baseline_loss_rate: f64,
    pub baseline_n:         usize,
    pub table:              TableName,
    pub filters:            Vec<Filter>,
}

impl ConditionalRate {
    /// Gap used for severity: the larger of the shift from baseline and
    /// the distance above a coin flip.
    pub fn gap(&self) -> f64 {
        (self.loss_rate - self.baseline_loss_rate)
            .abs()
            .max(self.loss_rate - 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBundle {
    pub team:             TeamName,
    pub matches_analyzed: usize,
    pub date_range:       Option<DateRange>,
    pub snapshots:        BTreeMap<String, MetricSnapshot>,
    pub map_performance:  Vec<MapPerformance>,
    pub side_performance: Vec<SidePerformance>,
    pub economy:          Option<EconomyStats>,
    pub players:          Vec<PlayerAggregate>,
    pub capabilities:     Capabilities,
    pub trends:           Vec<TrendDelta>,
    pub conditionals:     BTreeMap<String, ConditionalRate>,
}

impl MetricsBundle {
    pub fn snapshot(&self, name: &str) -> Option<&MetricSnapshot> {
        self.snapshots.get(name)
    }

    pub fn rate(&self, name: &str) -> Option<f64> {
        self.snapshot(name).map(|s| s.value)
    }

    pub fn trend(&self, metric: &str) -> Option<&TrendDelta> {
        self.trends.iter().find(|t| t.metric == metric)
    }

    pub fn conditional(&self, name: &str) -> Option<&ConditionalRate> {
        self.conditionals.get(name)
    }

    pub fn side(&self, side: Side) -> Option<&SidePerformance> {
        self.side_performance.iter().find(|s| s.side == side)
    }
}

// ── Metric definitions ───────────────────────────────────────────────

/// Table and filters that select the sample of a tracked rate.
fn rate_query(name: &str) -> Option<(TableName, Vec<Filter>)> {
    let query = match name {
        "win_rate"            => (TableName::Matches, vec![]),
        "pistol_win_rate"     => (TableName::Rounds, vec![Filter::eq("round_type", RoundType::Pistol.as_str())]),
        "eco_conversion_rate" => (TableName::Rounds, vec![Filter::eq("round_type", RoundType::Eco.as_str())]),
        "force_win_rate"      => (TableName::Rounds, vec![Filter::eq("round_type", RoundType::Force.as_str())]),
        "attack_win_rate"     => (TableName::Rounds, vec![Filter::eq("side", Side::Attack.as_str())]),
        "defense_win_rate"    => (TableName::Rounds, vec![Filter::eq("side", Side::Defense.as_str())]),
        _ => return None,
    };
    Some(query)
}

fn round_predicate(name: &str) -> fn(&RoundRecord) -> bool {
    match name {
        "pistol_win_rate"     => |r| r.is_type(RoundType::Pistol),
        "eco_conversion_rate" => |r| r.is_type(RoundType::Eco),
        "force_win_rate"      => |r| r.is_type(RoundType::Force),
        "attack_win_rate"     => |r| r.side == Side::Attack,
        "defense_win_rate"    => |r| r.side == Side::Defense,
        _                     => |_| true,
    }
}

/// Tally a tracked rate over the matches in `scope` (all when None).
fn tally(tables: &PreparedTables, name: &str, scope: Option<&HashSet<&str>>) -> Tally {
    let in_scope = |id: &str| scope.is_none_or(|s| s.contains(id));
    if name == "win_rate" {
        return Tally::count(
            tables.matches.iter().filter(|m| in_scope(&m.match_id)),
            |m| m.won,
        );
    }
    let selected = round_predicate(name);
    Tally::count(
        tables
            .rounds
            .iter()
            .filter(|r| in_scope(&r.match_id) && selected(r)),
        |r| r.team_won(),
    )
}

// ── Engine ───────────────────────────────────────────────────────────

pub fn compute(tables: &PreparedTables, config: &ReportConfig) -> MetricsBundle {
    let mut snapshots = BTreeMap::new();
    for name in [
        "win_rate",
        "pistol_win_rate",
        "eco_conversion_rate",
        "force_win_rate",
        "attack_win_rate",
        "defense_win_rate",
    ] {
        if let Some(snapshot) = snapshot(tables, name) {
            snapshots.insert(name.to_string(), snapshot);
        }
    }

    let map_performance = map_performance(tables);
    for map in &map_performance {
        let name = format!("map_win_rate:{}", map.map);
        snapshots.insert(
            name.clone(),
            MetricSnapshot {
                name,
                value:   map.win_rate,
                n:       map.games,
                table:   TableName::Matches,
                filters: vec![Filter::eq("map", map.map.as_str())],
            },
        );
    }

    let side_performance = side_performance(tables);
    let economy = economy_stats(tables);
    let players = player_aggregates(tables);
    let capabilities = Capabilities::compute(tables, economy.as_ref(), &side_performance, &players);
    let trends = trends(tables, config);
    let conditionals = conditionals(tables, config);

    let date_range = match (
        tables.matches.iter().map(|m| m.date).min(),
        tables.matches.iter().map(|m| m.date).max(),
    ) {
        (Some(from), Some(to)) => Some(DateRange { from, to }),
        _ => None,
    };

    log::debug!(
        "metrics for {}: {} snapshots, {} maps, {} players, {} trends, {} conditionals",
        tables.team,
        snapshots.len(),
        map_performance.len(),
        players.len(),
        trends.len(),
        conditionals.len()
    );

    MetricsBundle {
        team: tables.team.clone(),
        matches_analyzed: tables.matches.len(),
        date_range,
        snapshots,
        map_performance,
        side_performance,
        economy,
        players,
        capabilities,
        trends,
        conditionals,
    }
}

fn snapshot(tables: &PreparedTables, name: &str) -> Option<MetricSnapshot> {
    let (table, filters) = rate_query(name)?;
    let tally = tally(tables, name, None);
    Some(MetricSnapshot {
        name: name.to_string(),
        value: tally.rate()?,
        n: tally.n,
        table,
        filters,
    })
}

fn map_performance(tables: &PreparedTables) -> Vec<MapPerformance> {
    #[derive(Default)]
    struct Acc {
        games:       usize,
        wins:        usize,
        rounds_won:  u32,
        rounds_lost: u32,
    }

    let mut by_map: BTreeMap<&str, Acc> = BTreeMap::new();
    for m in &tables.matches {
        let acc = by_map.entry(m.map.as_str()).or_default();
        acc.games += 1;
        acc.wins += usize::from(m.won);
        acc.rounds_won += m.score_us;
        acc.rounds_lost += m.score_them;
    }

    let mut maps: Vec<MapPerformance> = by_map
        .into_iter()
        .map(|(map, acc)| MapPerformance {
            map:             map.to_string(),
            games:           acc.games,
            wins:            acc.wins,
            losses:          acc.games - acc.wins,
            win_rate:        ratio(acc.wins as f64, acc.games),
            avg_rounds_won:  ratio(acc.rounds_won as f64, acc.games),
            avg_rounds_lost: ratio(acc.rounds_lost as f64, acc.games),
        })
        .collect();
    maps.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.map.cmp(&b.map)));
    maps
}

fn side_performance(tables: &PreparedTables) -> Vec<SidePerformance> {
    Side::ALL
        .iter()
        .filter_map(|&side| {
            let tally = Tally::count(
                tables.rounds.iter().filter(|r| r.side == side),
                |r| r.team_won(),
            );
            Some(SidePerformance {
                side,
                rounds_played: tally.n,
                rounds_won:    tally.hits,
                win_rate:      tally.rate()?,
            })
        })
        .collect()
}

fn economy_stats(tables: &PreparedTables) -> Option<EconomyStats> {
    if tables.rounds.is_empty() {
        return None;
    }
    let by_type = |kind: RoundType| {
        Tally::count(
            tables.rounds.iter().filter(|r| r.is_type(kind)),
            |r| r.team_won(),
        )
    };
    let pistol = by_type(RoundType::Pistol);
    let eco = by_type(RoundType::Eco);
    let force = by_type(RoundType::Force);
    Some(EconomyStats {
        pistol_rounds:       pistol.n,
        pistol_wins:         pistol.hits,
        pistol_win_rate:     pistol.rate(),
        eco_rounds:          eco.n,
        eco_wins:            eco.hits,
        eco_conversion_rate: eco.rate(),
        force_rounds:        force.n,
        force_wins:          force.hits,
        force_win_rate:      force.rate(),
    })
}

fn player_aggregates(tables: &PreparedTables) -> Vec<PlayerAggregate> {
    #[derive(Default)]
    struct Acc<'a> {
        games:     usize,
        wins:      usize,
        acs:       f64,
        kills:     u32,
        deaths:    u32,
        assists:   u32,
        damage:    u32,
        headshots: u32,
        fk:        u32,
        fd:        u32,
        /// (agent, games, wins, first position seen); rows arrive newest first.
        agents:    Vec<(&'a str, usize, usize, usize)>,
    }

    let mut by_player: BTreeMap<&str, Acc> = BTreeMap::new();
    for (position, row) in tables.players.iter().enumerate() {
        let won = tables.match_by_id(&row.match_id).is_some_and(|m| m.won);
        let acc = by_player.entry(row.player.as_str()).or_default();
        acc.games += 1;
        acc.wins += usize::from(won);
        acc.acs += row.acs;
        acc.kills += row.kills;
        acc.deaths += row.deaths;
        acc.assists += row.assists;
        acc.damage += row.damage;
        acc.headshots += row.headshots;
        acc.fk += row.first_kills;
        acc.fd += row.first_deaths;
        match acc.agents.iter_mut().find(|a| a.0 == row.agent) {
            Some(entry) => {
                entry.1 += 1;
                entry.2 += usize::from(won);
            }
            None => acc.agents.push((row.agent.as_str(), 1, usize::from(won), position)),
        }
    }

    let mut players: Vec<PlayerAggregate> = by_player
        .into_iter()
        .map(|(player, mut acc)| {
            // Ties on games go to the agent seen most recently.
            acc.agents.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.3.cmp(&b.3)));
            let agent_pool: Vec<AgentUsage> = acc
                .agents
                .iter()
                .take(3)
                .map(|&(agent, games, wins, _)| AgentUsage {
                    agent: agent.to_string(),
                    games,
                    wins,
                    pick_rate: ratio(games as f64, acc.games),
                })
                .collect();
            let kd_ratio = if acc.deaths == 0 {
                acc.kills as f64
            } else {
                acc.kills as f64 / acc.deaths as f64
            };
            PlayerAggregate {
                player:            player.to_string(),
                games:             acc.games,
                wins:              acc.wins,
                most_played_agent: agent_pool.first().map(|a| a.agent.clone()).unwrap_or_default(),
                agent_pool,
                avg_acs:           ratio(acc.acs, acc.games),
                avg_kills:         ratio(acc.kills as f64, acc.games),
                avg_deaths:        ratio(acc.deaths as f64, acc.games),
                avg_assists:       ratio(acc.assists as f64, acc.games),
                avg_damage:        ratio(acc.damage as f64, acc.games),
                kd_ratio,
                headshot_share:    (acc.kills > 0).then(|| acc.headshots as f64 / acc.kills as f64),
                first_blood_rate:  ratio(acc.fk as f64, acc.games),
                first_death_rate:  ratio(acc.fd as f64, acc.games),
                first_kills:       acc.fk,
                first_deaths:      acc.fd,
            }
        })
        .collect();
    players.sort_by(|a, b| {
        b.avg_acs
            .total_cmp(&a.avg_acs)
            .then_with(|| a.player.cmp(&b.player))
    });
    players
}

fn trends(tables: &PreparedTables, config: &ReportConfig) -> Vec<TrendDelta> {
    let recent_ids = tables.recent_match_ids(config.trend.recent_window);
    let baseline_ids = tables.recent_match_ids(config.trend.baseline_window);
    let recent_set: HashSet<&str> = recent_ids.iter().map(String::as_str).collect();
    let baseline_set: HashSet<&str> = baseline_ids.iter().map(String::as_str).collect();

    TRACKED_TRENDS
        .iter()
        .filter_map(|&name| {
            let (table, filters) = rate_query(name)?;
            let recent = tally(tables, name, Some(&recent_set));
            let baseline = tally(tables, name, Some(&baseline_set));
            let (recent_rate, baseline_rate) = (recent.rate()?, baseline.rate()?);
            Some(TrendDelta {
                metric:           name.to_string(),
                recent:           recent_rate,
                recent_n:         recent.n,
                baseline:         baseline_rate,
                baseline_n:       baseline.n,
                change_pct:       (recent_rate - baseline_rate) * 100.0,
                table,
                recent_filters:   scoped(&filters, &recent_ids),
                baseline_filters: scoped(&filters, &baseline_ids),
            })
        })
        .collect()
}

fn scoped(filters: &[Filter], ids: &[MatchId]) -> Vec<Filter> {
    let mut scoped = filters.to_vec();
    scoped.push(Filter::one_of("match_id", ids.iter().map(String::as_str)));
    scoped
}

fn conditionals(tables: &PreparedTables, config: &ReportConfig) -> BTreeMap<String, ConditionalRate> {
    let mut out = BTreeMap::new();
    let mut insert = |rate: Option<ConditionalRate>| {
        if let Some(rate) = rate {
            out.insert(rate.name.clone(), rate);
        }
    };

    // Match level: result after dropping the first pistol.
    let lost = |m: &&MatchRecord| !m.won;
    insert(conditional(
        "after_pistol_loss",
        Tally::count(tables.matches.iter().filter(|m| !m.won_first_pistol), lost),
        Tally::count(tables.matches.iter(), lost),
        TableName::Matches,
        vec![Filter::eq("won_first_pistol", false)],
    ));

    // First-half rounds 4.. after opening the map 0–2 down.
    let half = config.economy.half_length;
    let down_early: Vec<&str> = tables
        .matches
        .iter()
        .filter(|m| {
            let opening: Vec<&RoundRecord> = tables
                .rounds_for(&m.match_id)
                .filter(|r| r.round_number <= 2)
                .collect();
            opening.len() == 2 && opening.iter().all(|r| r.winner == Party::Opponent)
        })
        .map(|m| m.match_id.as_str())
        .collect();
    let late_first_half = |r: &&RoundRecord| (4..=half).contains(&r.round_number);
    let round_lost = |r: &&RoundRecord| !r.team_won();
    if !down_early.is_empty() {
        insert(conditional(
            "when_down_early",
            Tally::count(
                tables
                    .rounds
                    .iter()
                    .filter(late_first_half)
                    .filter(|r| down_early.contains(&r.match_id.as_str())),
                round_lost,
            ),
            Tally::count(tables.rounds.iter().filter(late_first_half), round_lost),
            TableName::Rounds,
            vec![
                Filter::one_of("match_id", down_early.iter().copied()),
                Filter::between("round_number", 4.0, half as f64),
            ],
        ));
    }

    // Round level: opponent took the opening duel.
    insert(conditional(
        "after_opening_death",
        Tally::count(
            tables
                .rounds
                .iter()
                .filter(|r| r.first_kill == Some(Party::Opponent)),
            round_lost,
        ),
        Tally::count(
            tables.rounds.iter().filter(|r| r.first_kill.is_some()),
            round_lost,
        ),
        TableName::Rounds,
        vec![Filter::eq("first_kill", Party::Opponent.as_str())],
    ));

    out
}

fn conditional(
    name: &str,
    given: Tally,
    baseline: Tally,
    table: TableName,
    filters: Vec<Filter>,
) -> Option<ConditionalRate> {
    Some(ConditionalRate {
        name:               name.to_string(),
        loss_rate:          given.rate()?,
        n:                  given.n,
        baseline_loss_rate: baseline.rate()?,
        baseline_n:         baseline.n,
        table,
        filters,
    })
}
