//! `player_match_stats` table queries.

use super::{count, TableStore};
use crate::{error::ScoutResult, tables::PlayerMatchStat};
use rusqlite::params;

const COLUMNS: [&str; 12] = [
    "match_id",
    "team",
    "player",
    "agent",
    "kills",
    "deaths",
    "assists",
    "damage",
    "headshots",
    "first_kills",
    "first_deaths",
    "acs",
];

impl TableStore {
    pub fn insert_player_stat(&self, p: &PlayerMatchStat) -> ScoutResult<()> {
        self.conn.execute(
            "INSERT INTO player_match_stats (match_id, team, player, agent, kills, deaths,
                                             assists, damage, headshots, first_kills,
                                             first_deaths, acs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                p.match_id,
                p.team,
                p.player,
                p.agent,
                p.kills,
                p.deaths,
                p.assists,
                p.damage,
                p.headshots,
                p.first_kills,
                p.first_deaths,
                p.acs,
            ],
        )?;
        Ok(())
    }

    pub fn load_player_stats(&self) -> ScoutResult<Vec<PlayerMatchStat>> {
        self.require_columns("player_match_stats", &COLUMNS)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM player_match_stats ORDER BY match_id, team, player",
            COLUMNS.join(", ")
        ))?;
        let raw = stmt
            .query_map([], |r| {
                let mut counts = [0i64; 7];
                for (i, cell) in counts.iter_mut().enumerate() {
                    *cell = r.get(4 + i)?;
                }
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    counts,
                    r.get::<_, f64>(11)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(raw.len());
        for (match_id, team, player, agent, counts, acs) in raw {
            let at = format!("{player} on match {match_id}");
            let mut narrowed = [0u32; 7];
            for (i, (&value, slot)) in counts.iter().zip(narrowed.iter_mut()).enumerate() {
                *slot = count("player_match_stats", COLUMNS[4 + i], value, &at)?;
            }
            let [kills, deaths, assists, damage, headshots, first_kills, first_deaths] = narrowed;
            rows.push(PlayerMatchStat {
                match_id,
                team,
                player,
                agent,
                kills,
                deaths,
                assists,
                damage,
                headshots,
                first_kills,
                first_deaths,
                acs,
            });
        }
        Ok(rows)
    }
}
