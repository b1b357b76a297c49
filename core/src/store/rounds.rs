//! `rounds` table queries.

use super::{count, malformed, TableStore};
use crate::{
    error::ScoutResult,
    tables::{Party, RoundRecord, RoundType, Side},
};
use rusqlite::params;

const COLUMNS: [&str; 6] = ["match_id", "round_number", "side", "round_type", "winner", "first_kill"];

impl TableStore {
    pub fn insert_round(&self, r: &RoundRecord) -> ScoutResult<()> {
        self.conn.execute(
            "INSERT INTO rounds (match_id, round_number, side, round_type, winner, first_kill)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                r.match_id,
                r.round_number,
                r.side.as_str(),
                r.round_type.map(|t| t.as_str()),
                r.winner.as_str(),
                r.first_kill.map(|p| p.as_str()),
            ],
        )?;
        Ok(())
    }

    pub fn load_rounds(&self) -> ScoutResult<Vec<RoundRecord>> {
        self.require_columns("rounds", &COLUMNS)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM rounds ORDER BY match_id, round_number",
            COLUMNS.join(", ")
        ))?;
        let raw = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(raw.len());
        for (match_id, round_number, side, round_type, winner, first_kill) in raw {
            let round_number =
                count("rounds", "round_number", round_number, &format!("match {match_id}"))?;
            let at = || format!("round {round_number} of match {match_id}");
            let side = Side::parse(&side)
                .ok_or_else(|| malformed("rounds", "side", format!("'{side}' on {}", at())))?;
            // Empty text means "not supplied", same as NULL.
            let round_type = match round_type.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(text) => Some(RoundType::parse(text).ok_or_else(|| {
                    malformed("rounds", "round_type", format!("'{text}' on {}", at()))
                })?),
            };
            let winner = Party::parse(&winner)
                .ok_or_else(|| malformed("rounds", "winner", format!("'{winner}' on {}", at())))?;
            let first_kill = match first_kill.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(text) => Some(Party::parse(text).ok_or_else(|| {
                    malformed("rounds", "first_kill", format!("'{text}' on {}", at()))
                })?),
            };
            result.push(RoundRecord {
                match_id,
                round_number,
                side,
                round_type,
                winner,
                first_kill,
            });
        }
        Ok(result)
    }
}
