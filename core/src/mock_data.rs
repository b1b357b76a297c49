//! Synthetic seasons for demos and property tests.
//!
//! RULE: A season is a pure function of (team, match count, seed).
//! Schedule draws (opponent, map, sides) come from the Schedule stream,
//! round outcomes from Rounds, and player lines from Players, so
//! changing how player lines are drawn never reshuffles the scores.
//!
//! Rounds are written without a `round_type`; the prepared view
//! classifies them like any provider feed that lacks a buy field.

use crate::{
    rng::{ScoutRng, Stream},
    tables::{CanonicalTables, MatchRecord, Party, PlayerMatchStat, RoundRecord, Side},
    types::RoundNumber,
};
use chrono::{Duration, TimeZone, Utc};

pub const MAPS: [&str; 10] = [
    "Ascent", "Bind", "Haven", "Split", "Icebox", "Breeze", "Fracture", "Pearl", "Lotus", "Sunset",
];

const OPPONENTS: [&str; 12] = [
    "Cloud9", "Sentinels", "LOUD", "Fnatic", "Team Liquid", "NAVI", "Paper Rex", "DRX",
    "100 Thieves", "G2 Esports", "Leviatan", "Evil Geniuses",
];

/// 2025-01-06T18:00:00Z
const SEASON_START: i64 = 1_736_186_400;
const DAYS_BETWEEN_MATCHES: i64 = 3;
const WIN_TARGET: u32 = 13;
const OVERTIME_CAP: u32 = 60;

// ── Roster ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Duelist,
    Initiator,
    Controller,
    Sentinel,
    Flex,
}

impl Role {
    pub fn agents(&self) -> &'static [&'static str] {
        match self {
            Self::Duelist    => &["Jett", "Raze", "Reyna", "Phoenix", "Yoru", "Neon", "Iso"],
            Self::Initiator  => &["Sova", "Breach", "Skye", "KAY/O", "Fade", "Gekko"],
            Self::Controller => &["Brimstone", "Omen", "Viper", "Astra", "Harbor", "Clove"],
            Self::Sentinel   => &["Sage", "Cypher", "Killjoy", "Chamber", "Deadlock"],
            Self::Flex       => &["Jett", "Raze", "Sova", "Skye", "KAY/O", "Omen", "Chamber"],
        }
    }

    /// Relative odds of taking the opening duel.
    fn entry_weight(&self) -> f64 {
        match self {
            Self::Duelist    => 4.0,
            Self::Initiator  => 2.0,
            Self::Flex       => 2.0,
            Self::Sentinel   => 1.0,
            Self::Controller => 1.0,
        }
    }

    fn kills_per_round(&self) -> f64 {
        match self {
            Self::Duelist    => 0.85,
            Self::Flex       => 0.75,
            Self::Initiator  => 0.72,
            Self::Sentinel   => 0.68,
            Self::Controller => 0.65,
        }
    }

    fn assists_per_round(&self) -> f64 {
        match self {
            Self::Initiator  => 0.45,
            Self::Controller => 0.40,
            _ => 0.25,
        }
    }
}

const ROLES: [Role; 5] = [Role::Duelist, Role::Initiator, Role::Controller, Role::Sentinel, Role::Flex];

fn known_roster(team: &str) -> Option<[&'static str; 5]> {
    match team.trim().to_ascii_lowercase().as_str() {
        "cloud9"    => Some(["jakee", "Xeppaa", "runi", "moose", "eeiu"]),
        "sentinels" => Some(["TenZ", "zekken", "Sacy", "johnqt", "bang"]),
        "loud"      => Some(["aspas", "Less", "tuyz", "cauanzin", "qck"]),
        _ => None,
    }
}

const HANDLE_HEADS: [&str; 12] = [
    "nova", "kry", "vex", "zen", "ash", "rift", "blaze", "echo", "frost", "hex", "lynx", "onyx",
];
const HANDLE_TAILS: [&str; 8] = ["", "x", "o", "ie", "z", "er", "ic", "y"];

fn generated_handle(rng: &mut ScoutRng, taken: &[String]) -> String {
    loop {
        let head = rng.pick(&HANDLE_HEADS).copied().unwrap_or("anon");
        let tail = rng.pick(&HANDLE_TAILS).copied().unwrap_or("");
        let handle = format!("{head}{tail}");
        if !taken.contains(&handle) {
            return handle;
        }
    }
}

#[derive(Debug, Clone)]
struct Player {
    name:  String,
    role:  Role,
    main:  &'static str,
    entry: f64,
}

fn build_roster(team: &str, rng: &mut ScoutRng) -> Vec<Player> {
    let mut names: Vec<String> = Vec::with_capacity(ROLES.len());
    match known_roster(team) {
        Some(handles) => names.extend(handles.iter().map(|h| h.to_string())),
        None => {
            for _ in ROLES {
                let handle = generated_handle(rng, &names);
                names.push(handle);
            }
        }
    }
    names
        .into_iter()
        .zip(ROLES)
        .map(|(name, role)| Player {
            main: rng.pick(role.agents()).copied().unwrap_or("Sage"),
            entry: role.entry_weight() * (0.6 + 0.8 * rng.next_f64()),
            name,
            role,
        })
        .collect()
}

// ── Team profile ─────────────────────────────────────────────────────────────

/// Season-long tendencies that shape the round outcomes.
#[derive(Debug, Clone)]
struct Profile {
    map_strength: Vec<f64>,
    attack_bias:  f64,
    pistol_skill: f64,
    /// Round win probability lost for the rest of a half after losing its pistol.
    tilt:         f64,
}

impl Profile {
    fn draw(rng: &mut ScoutRng) -> Self {
        Self {
            map_strength: MAPS.iter().map(|_| 0.30 + 0.40 * rng.next_f64()).collect(),
            attack_bias:  (rng.next_f64() - 0.5) * 0.16,
            pistol_skill: 0.30 + 0.40 * rng.next_f64(),
            tilt:         0.15 * rng.next_f64(),
        }
    }
}

fn side_for(round: RoundNumber, starting: Side) -> Side {
    let flipped = match starting {
        Side::Attack  => Side::Defense,
        Side::Defense => Side::Attack,
    };
    if round <= 12 {
        starting
    } else if round <= 24 {
        flipped
    } else if (round - 25) % 2 == 0 {
        // Overtime swaps every round, opening on the starting side.
        starting
    } else {
        flipped
    }
}

fn decided(us: u32, them: u32) -> bool {
    let total = us + them;
    if total <= 24 {
        us == WIN_TARGET || them == WIN_TARGET
    } else {
        us.abs_diff(them) >= 2 || (total >= OVERTIME_CAP && us != them)
    }
}

// ── Generation ───────────────────────────────────────────────────────────────

/// Generate `matches` maps played by `team`, oldest first.
pub fn generate_season(team: &str, matches: usize, seed: u64) -> CanonicalTables {
    let mut schedule = ScoutRng::new(seed, Stream::Schedule);
    let mut rounds_rng = ScoutRng::new(seed, Stream::Rounds);
    let mut players_rng = ScoutRng::new(seed, Stream::Players);

    let profile = Profile::draw(&mut schedule);
    let roster = build_roster(team, &mut players_rng);
    let opponents: Vec<&str> = OPPONENTS
        .iter()
        .copied()
        .filter(|o| !o.eq_ignore_ascii_case(team.trim()))
        .collect();
    let start = Utc.timestamp_opt(SEASON_START, 0).single().unwrap_or_default();
    let slug: String = team
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut tables = CanonicalTables::default();
    for i in 0..matches {
        let match_id = format!("{slug}-{seed:x}-{:03}", i + 1);
        let date = start + Duration::days(i as i64 * DAYS_BETWEEN_MATCHES);
        let map_index = schedule.below(MAPS.len() as u64) as usize;
        let opponent = schedule.pick(&opponents).copied().unwrap_or("Opponent");
        let starting_side = if schedule.chance(0.5) { Side::Attack } else { Side::Defense };

        let rounds = play_rounds(&match_id, &profile, map_index, starting_side, &mut rounds_rng);
        let score_us = rounds.iter().filter(|r| r.winner == Party::Team).count() as u32;
        let score_them = rounds.len() as u32 - score_us;
        let won = score_us > score_them;
        let won_first_pistol = rounds.first().is_some_and(|r| r.winner == Party::Team);

        tables.player_match_stats.extend(player_lines(
            &match_id,
            team,
            &roster,
            &rounds,
            won,
            &mut players_rng,
        ));
        tables.matches.push(MatchRecord {
            match_id: match_id.clone(),
            date,
            team: team.to_string(),
            opponent: opponent.to_string(),
            map: MAPS[map_index].to_string(),
            starting_side,
            score_us,
            score_them,
            won,
            won_first_pistol,
        });
        tables.rounds.extend(rounds);
    }
    log::debug!("generated {matches} synthetic matches for {team} (seed {seed})");
    tables
}

fn play_rounds(
    match_id: &str,
    profile: &Profile,
    map_index: usize,
    starting_side: Side,
    rng: &mut ScoutRng,
) -> Vec<RoundRecord> {
    let strength = profile.map_strength[map_index];
    let mut rounds = Vec::with_capacity(26);
    let (mut us, mut them) = (0u32, 0u32);
    let mut tilted = false;

    while !decided(us, them) {
        let round_number = us + them + 1;
        let side = side_for(round_number, starting_side);
        if round_number == 13 || round_number == 25 {
            tilted = false;
        }

        let pistol = round_number == 1 || round_number == 13;
        let mut p = if pistol {
            profile.pistol_skill
        } else {
            let bias = match side {
                Side::Attack  => profile.attack_bias,
                Side::Defense => -profile.attack_bias,
            };
            strength + bias - if tilted { profile.tilt } else { 0.0 }
        };
        p = p.clamp(0.1, 0.9);

        let team_first = rng.chance(p);
        let base = if team_first { 0.70 } else { 0.30 };
        let team_won = rng.chance((base + (p - 0.5) * 0.5).clamp(0.05, 0.95));
        if pistol && !team_won {
            tilted = true;
        }
        if team_won { us += 1 } else { them += 1 }

        rounds.push(RoundRecord {
            match_id: match_id.to_string(),
            round_number,
            side,
            round_type: None,
            winner: if team_won { Party::Team } else { Party::Opponent },
            first_kill: Some(if team_first { Party::Team } else { Party::Opponent }),
        });
    }
    rounds
}

fn weighted_index(roster: &[Player], rng: &mut ScoutRng) -> usize {
    let total: f64 = roster.iter().map(|p| p.entry).sum();
    let mut roll = rng.next_f64() * total;
    for (i, p) in roster.iter().enumerate() {
        if roll < p.entry {
            return i;
        }
        roll -= p.entry;
    }
    roster.len().saturating_sub(1)
}

fn player_lines(
    match_id: &str,
    team: &str,
    roster: &[Player],
    rounds: &[RoundRecord],
    won: bool,
    rng: &mut ScoutRng,
) -> Vec<PlayerMatchStat> {
    let played = rounds.len().max(1) as f64;
    let mut first_kills = vec![0u32; roster.len()];
    let mut first_deaths = vec![0u32; roster.len()];
    for r in rounds {
        let i = weighted_index(roster, rng);
        match r.first_kill {
            Some(Party::Team)     => first_kills[i] += 1,
            Some(Party::Opponent) => first_deaths[i] += 1,
            None => {}
        }
    }

    roster
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let agent = if rng.chance(0.7) {
                p.main
            } else {
                rng.pick(p.role.agents()).copied().unwrap_or(p.main)
            };
            let form = 0.8 + 0.4 * rng.next_f64();
            let result_mult = if won { 1.1 } else { 0.9 };
            let kills = ((played * p.role.kills_per_round() * result_mult * form).round() as u32)
                .max(first_kills[i]);
            let deaths = ((played * if won { 0.62 } else { 0.78 } * (0.8 + 0.4 * rng.next_f64()))
                .round() as u32)
                .max(first_deaths[i]);
            let assists =
                (played * p.role.assists_per_round() * (0.7 + 0.6 * rng.next_f64())).round() as u32;
            let damage = kills * rng.range(130, 170) + assists * rng.range(25, 45);
            let headshots = kills * rng.range(15, 35) / 100;
            let acs = ((damage as f64 + 70.0 * kills as f64) / played * 10.0).round() / 10.0;

            PlayerMatchStat {
                match_id:     match_id.to_string(),
                team:         team.to_string(),
                player:       p.name.clone(),
                agent:        agent.to_string(),
                kills,
                deaths,
                assists,
                damage,
                headshots,
                first_kills:  first_kills[i],
                first_deaths: first_deaths[i],
                acs,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_follow_mr12() {
        let tables = generate_season("Cloud9", 20, 11);
        for m in &tables.matches {
            let winner = m.score_us.max(m.score_them);
            let loser = m.score_us.min(m.score_them);
            if winner == WIN_TARGET {
                assert!(loser <= 11, "{m:?}");
            } else {
                assert!(winner > WIN_TARGET && winner - loser == 2, "{m:?}");
            }
            let played = tables.rounds.iter().filter(|r| r.match_id == m.match_id).count() as u32;
            assert_eq!(played, m.score_us + m.score_them);
        }
    }

    #[test]
    fn sides_swap_at_the_half() {
        assert_eq!(side_for(1, Side::Attack), Side::Attack);
        assert_eq!(side_for(12, Side::Attack), Side::Attack);
        assert_eq!(side_for(13, Side::Attack), Side::Defense);
        assert_eq!(side_for(24, Side::Attack), Side::Defense);
        assert_eq!(side_for(25, Side::Attack), Side::Attack);
        assert_eq!(side_for(26, Side::Attack), Side::Defense);
    }

    #[test]
    fn known_teams_use_their_roster() {
        let tables = generate_season("Sentinels", 1, 3);
        let mut players: Vec<&str> =
            tables.player_match_stats.iter().map(|p| p.player.as_str()).collect();
        players.sort_unstable();
        assert_eq!(players, vec!["Sacy", "TenZ", "bang", "johnqt", "zekken"]);
        assert!(tables.matches.iter().all(|m| m.opponent != "Sentinels"));
    }

    #[test]
    fn first_kills_reconcile_with_rounds() {
        let tables = generate_season("Unknown Squad", 8, 99);
        let team_fk = tables.rounds.iter().filter(|r| r.first_kill == Some(Party::Team)).count();
        let player_fk: u32 = tables.player_match_stats.iter().map(|p| p.first_kills).sum();
        assert_eq!(team_fk as u32, player_fk);
        assert!(tables.validate().is_ok());
    }
}
