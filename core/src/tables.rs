//! Canonical input tables and the team-scoped prepared view.
//!
//! RULE: The three canonical tables are immutable inputs.
//! Everything downstream (metrics, rules, evidence) reads the
//! PreparedTables view built once per report generation.

use crate::{
    config::EconomyConfig,
    economy,
    error::{ScoutError, ScoutResult},
    evidence::TableName,
    types::{MatchId, PlayerName, RoundNumber, TeamName},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

// ── Enumerated columns ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attack,
    Defense,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Attack, Side::Defense];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack  => "attack",
            Self::Defense => "defense",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "attack"  => Some(Self::Attack),
            "defense" => Some(Self::Defense),
            _ => None,
        }
    }
}

/// Which side of the matchup a round outcome belongs to.
/// `Team` is always the team being scouted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Team,
    Opponent,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team     => "team",
            Self::Opponent => "opponent",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "team"     => Some(Self::Team),
            "opponent" => Some(Self::Opponent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    Pistol,
    Eco,
    Force,
    FullBuy,
}

impl RoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pistol  => "pistol",
            Self::Eco     => "eco",
            Self::Force   => "force",
            Self::FullBuy => "full_buy",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "pistol"               => Some(Self::Pistol),
            "eco"                  => Some(Self::Eco),
            "force" | "force_buy"  => Some(Self::Force),
            "full_buy" | "full"    => Some(Self::FullBuy),
            _ => None,
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

/// One played map, seen from the scouted team's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id:         MatchId,
    pub date:             DateTime<Utc>,
    pub team:             TeamName,
    pub opponent:         TeamName,
    pub map:              String,
    /// Side the team played in the first half.
    pub starting_side:    Side,
    pub score_us:         u32,
    pub score_them:       u32,
    pub won:              bool,
    pub won_first_pistol: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub match_id:     MatchId,
    pub round_number: RoundNumber,
    /// Side the team played this round.
    pub side:         Side,
    /// Absent when the normalizer could not tell; resolved in the prepared view.
    #[serde(default)]
    pub round_type:   Option<RoundType>,
    pub winner:       Party,
    #[serde(default)]
    pub first_kill:   Option<Party>,
}

impl RoundRecord {
    pub fn team_won(&self) -> bool {
        self.winner == Party::Team
    }

    pub fn is_type(&self, kind: RoundType) -> bool {
        self.round_type == Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchStat {
    pub match_id:     MatchId,
    pub team:         TeamName,
    pub player:       PlayerName,
    pub agent:        String,
    pub kills:        u32,
    pub deaths:       u32,
    pub assists:      u32,
    pub damage:       u32,
    pub headshots:    u32,
    pub first_kills:  u32,
    pub first_deaths: u32,
    /// Average combat score for the map.
    pub acs:          f64,
}

// ── Canonical tables ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTables {
    pub matches:            Vec<MatchRecord>,
    pub rounds:             Vec<RoundRecord>,
    pub player_match_stats: Vec<PlayerMatchStat>,
}

impl CanonicalTables {
    /// Reject rows that violate the normalizer contract.
    /// Any failure here aborts the whole report generation.
    pub fn validate(&self) -> ScoutResult<()> {
        let mut match_ids = HashSet::new();
        for m in &self.matches {
            if m.match_id.trim().is_empty() {
                return Err(ScoutError::malformed("matches", "match_id", "empty match id"));
            }
            if m.team.trim().is_empty() {
                return Err(ScoutError::malformed(
                    "matches",
                    "team",
                    format!("empty team on match {}", m.match_id),
                ));
            }
            if m.map.trim().is_empty() {
                return Err(ScoutError::malformed(
                    "matches",
                    "map",
                    format!("empty map on match {}", m.match_id),
                ));
            }
            if !match_ids.insert(m.match_id.as_str()) {
                return Err(ScoutError::malformed(
                    "matches",
                    "match_id",
                    format!("duplicate match id {}", m.match_id),
                ));
            }
        }

        let mut round_keys = HashSet::new();
        for r in &self.rounds {
            if r.round_number == 0 {
                return Err(ScoutError::malformed(
                    "rounds",
                    "round_number",
                    format!("round number 0 on match {}", r.match_id),
                ));
            }
            if !round_keys.insert((r.match_id.as_str(), r.round_number)) {
                return Err(ScoutError::malformed(
                    "rounds",
                    "round_number",
                    format!("duplicate round {} on match {}", r.round_number, r.match_id),
                ));
            }
        }

        for p in &self.player_match_stats {
            if p.player.trim().is_empty() {
                return Err(ScoutError::malformed(
                    "player_match_stats",
                    "player",
                    format!("empty player name on match {}", p.match_id),
                ));
            }
            if !p.acs.is_finite() || p.acs < 0.0 {
                return Err(ScoutError::malformed(
                    "player_match_stats",
                    "acs",
                    format!("{} on match {} has combat score {}", p.player, p.match_id, p.acs),
                ));
            }
        }
        Ok(())
    }
}

// ── Prepared view ────────────────────────────────────────────────────────────

/// Team-scoped, classified, ordered view of the canonical tables.
///
/// - matches: the `n` most recent for the team, newest first
/// - rounds: rounds of those matches, match order then round number,
///   every `round_type` resolved
/// - players: the team's player lines for those matches, match order
#[derive(Debug, Clone)]
pub struct PreparedTables {
    pub team:    TeamName,
    pub matches: Vec<MatchRecord>,
    pub rounds:  Vec<RoundRecord>,
    pub players: Vec<PlayerMatchStat>,
    match_index: HashMap<MatchId, usize>,
    json_rows:   BTreeMap<TableName, Vec<Value>>,
}

impl PreparedTables {
    pub fn build(
        tables: &CanonicalTables,
        team: &str,
        matches_to_analyze: usize,
        economy_config: &EconomyConfig,
    ) -> ScoutResult<Self> {
        let wanted = team.trim().to_lowercase();

        let mut matches: Vec<MatchRecord> = tables
            .matches
            .iter()
            .filter(|m| m.team.trim().to_lowercase() == wanted)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.match_id.cmp(&b.match_id)));
        matches.truncate(matches_to_analyze);

        let match_index: HashMap<MatchId, usize> = matches
            .iter()
            .enumerate()
            .map(|(i, m)| (m.match_id.clone(), i))
            .collect();

        let mut rounds: Vec<RoundRecord> = tables
            .rounds
            .iter()
            .filter(|r| match_index.contains_key(&r.match_id))
            .cloned()
            .collect();
        rounds.sort_by_key(|r| (match_index[&r.match_id], r.round_number));
        for chunk in rounds.chunk_by_mut(|a, b| a.match_id == b.match_id) {
            economy::classify_match_rounds(chunk, economy_config);
        }

        let mut players: Vec<PlayerMatchStat> = tables
            .player_match_stats
            .iter()
            .filter(|p| {
                match_index.contains_key(&p.match_id) && p.team.trim().to_lowercase() == wanted
            })
            .cloned()
            .collect();
        players.sort_by(|a, b| {
            match_index[&a.match_id]
                .cmp(&match_index[&b.match_id])
                .then_with(|| a.player.cmp(&b.player))
        });

        let team_name = matches
            .first()
            .map(|m| m.team.clone())
            .unwrap_or_else(|| team.trim().to_string());

        let mut json_rows = BTreeMap::new();
        json_rows.insert(TableName::Matches, to_rows(&matches)?);
        json_rows.insert(TableName::Rounds, to_rows(&rounds)?);
        json_rows.insert(TableName::PlayerMatchStats, to_rows(&players)?);

        log::info!(
            "prepared view for {team_name}: {} matches, {} rounds, {} player lines",
            matches.len(),
            rounds.len(),
            players.len()
        );

        Ok(Self {
            team: team_name,
            matches,
            rounds,
            players,
            match_index,
            json_rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn match_by_id(&self, match_id: &str) -> Option<&MatchRecord> {
        self.match_index.get(match_id).map(|&i| &self.matches[i])
    }

    /// Ids of the `k` most recent matches, newest first.
    pub fn recent_match_ids(&self, k: usize) -> Vec<MatchId> {
        self.matches.iter().take(k).map(|m| m.match_id.clone()).collect()
    }

    pub fn rounds_for<'a>(&'a self, match_id: &'a str) -> impl Iterator<Item = &'a RoundRecord> + 'a {
        self.rounds.iter().filter(move |r| r.match_id == match_id)
    }

    /// Serialized rows of one table, in view order.
    pub fn rows(&self, table: TableName) -> &[Value] {
        self.json_rows.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn to_rows<T: Serialize>(records: &[T]) -> ScoutResult<Vec<Value>> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(ScoutError::from))
        .collect()
}
