//! Evidence references: the falsifiability layer.
//!
//! RULE: Evidence is a pure query (table + filters + row cap) against the
//! prepared view. Sample rows are never assembled by hand, so re-running
//! the filters always reproduces them.

use crate::tables::PreparedTables;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard cap on sample rows carried by a single reference.
pub const MAX_SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Matches,
    Rounds,
    PlayerMatchStats,
}

impl TableName {
    pub const ALL: [TableName; 3] = [
        TableName::Matches,
        TableName::Rounds,
        TableName::PlayerMatchStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matches          => "matches",
            Self::Rounds           => "rounds",
            Self::PlayerMatchStats => "player_match_stats",
        }
    }
}

/// A single column predicate. A row satisfies a filter list when it
/// satisfies every filter in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
    /// Inclusive numeric range.
    Between { column: String, min: f64, max: f64 },
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.to_string(),
            value:  value.into(),
        }
    }

    pub fn one_of<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn between(column: &str, min: f64, max: f64) -> Self {
        Self::Between {
            column: column.to_string(),
            min,
            max,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } | Self::Between { column, .. } => column,
        }
    }

    pub fn accepts(&self, row: &Value) -> bool {
        let Some(cell) = row.get(self.column()) else {
            return false;
        };
        match self {
            Self::Eq { value, .. } => cells_equal(cell, value),
            Self::In { values, .. } => values.iter().any(|v| cells_equal(cell, v)),
            Self::Between { min, max, .. } => cell
                .as_f64()
                .is_some_and(|x| x >= *min && x <= *max),
        }
    }
}

fn cells_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

pub fn row_matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.accepts(row))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub table:         TableName,
    pub filters:       Vec<Filter>,
    pub sample_rows:   Vec<Value>,
    /// Total rows satisfying `filters` at generation time.
    pub matching_rows: usize,
}

impl EvidenceRef {
    /// Run `filters` against `table` and keep the first `cap` matching
    /// rows (never more than MAX_SAMPLE_ROWS).
    pub fn select(tables: &PreparedTables, table: TableName, filters: Vec<Filter>, cap: usize) -> Self {
        let cap = cap.min(MAX_SAMPLE_ROWS);
        let mut matching_rows = 0;
        let mut sample_rows = Vec::new();
        for row in tables.rows(table).iter().filter(|row| row_matches(row, &filters)) {
            matching_rows += 1;
            if sample_rows.len() < cap {
                sample_rows.push(row.clone());
            }
        }
        Self {
            table,
            filters,
            sample_rows,
            matching_rows,
        }
    }

    /// True when every sample row is still returned by `filters`.
    pub fn reproduces_against(&self, tables: &PreparedTables) -> bool {
        let hits: Vec<&Value> = tables
            .rows(self.table)
            .iter()
            .filter(|row| row_matches(row, &self.filters))
            .collect();
        self.sample_rows.iter().all(|s| hits.contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_cells_compare_by_value() {
        let row = json!({ "round_number": 4, "side": "attack" });
        assert!(Filter::eq("round_number", 4.0).accepts(&row));
        assert!(Filter::between("round_number", 4.0, 12.0).accepts(&row));
        assert!(!Filter::between("round_number", 5.0, 12.0).accepts(&row));
    }

    #[test]
    fn missing_columns_never_match() {
        let row = json!({ "side": "attack" });
        assert!(!Filter::eq("map", "Bind").accepts(&row));
    }

    #[test]
    fn in_filter_accepts_any_listed_value() {
        let row = json!({ "match_id": "m2" });
        assert!(Filter::one_of("match_id", ["m1", "m2"]).accepts(&row));
        assert!(!Filter::one_of("match_id", ["m3"]).accepts(&row));
    }

    #[test]
    fn null_cells_match_null_values() {
        let row = json!({ "first_kill": null });
        assert!(Filter::eq("first_kill", Value::Null).accepts(&row));
        assert!(!Filter::eq("first_kill", "team").accepts(&row));
    }
}
