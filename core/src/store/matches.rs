//! `matches` table queries.

use super::{count, malformed, TableStore};
use crate::{
    error::ScoutResult,
    tables::{MatchRecord, Side},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

const COLUMNS: [&str; 10] = [
    "match_id",
    "date",
    "team",
    "opponent",
    "map",
    "starting_side",
    "score_us",
    "score_them",
    "won",
    "won_first_pistol",
];

/// RFC 3339 timestamps, or a bare YYYY-MM-DD taken as midnight UTC.
pub(super) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text.trim()) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl TableStore {
    pub fn insert_match(&self, m: &MatchRecord) -> ScoutResult<()> {
        self.conn.execute(
            "INSERT INTO matches (match_id, date, team, opponent, map, starting_side,
                                  score_us, score_them, won, won_first_pistol)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                m.match_id,
                m.date.to_rfc3339(),
                m.team,
                m.opponent,
                m.map,
                m.starting_side.as_str(),
                m.score_us,
                m.score_them,
                m.won,
                m.won_first_pistol,
            ],
        )?;
        Ok(())
    }

    pub fn load_matches(&self) -> ScoutResult<Vec<MatchRecord>> {
        self.require_columns("matches", &COLUMNS)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches ORDER BY match_id",
            COLUMNS.join(", ")
        ))?;
        let raw = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, i64>(6)?,
                    r.get::<_, i64>(7)?,
                    r.get::<_, bool>(8)?,
                    r.get::<_, bool>(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(raw.len());
        for (match_id, date, team, opponent, map, side, score_us, score_them, won, won_first_pistol) in raw {
            let date = parse_date(&date)
                .ok_or_else(|| malformed("matches", "date", format!("'{date}' on match {match_id}")))?;
            let starting_side = Side::parse(&side).ok_or_else(|| {
                malformed("matches", "starting_side", format!("'{side}' on match {match_id}"))
            })?;
            let at = format!("match {match_id}");
            let score_us = count("matches", "score_us", score_us, &at)?;
            let score_them = count("matches", "score_them", score_them, &at)?;
            result.push(MatchRecord {
                match_id,
                date,
                team,
                opponent,
                map,
                starting_side,
                score_us,
                score_them,
                won,
                won_first_pistol,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_rfc3339_and_plain_days() {
        let full = parse_date("2025-03-04T18:30:00+01:00").unwrap();
        assert_eq!(full.to_rfc3339(), "2025-03-04T17:30:00+00:00");
        let day = parse_date("2025-03-04").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-03-04T00:00:00+00:00");
        assert!(parse_date("04/03/2025").is_none());
    }
}
