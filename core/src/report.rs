//! Report Assembler.
//!
//! RULE: Structural assembly only. No metric is recomputed here and no
//! insight or evidence is dropped or reordered.
//!
//! The top-level field names form the wire contract with the
//! presentation layer. Never rename them.

use crate::{
    capabilities::Capabilities,
    config::{ReportConfig, ThresholdTier},
    evidence::TableName,
    insight::{Category, Insight, Severity, TrendAlert},
    metrics::{EconomyStats, MapPerformance, MetricsBundle, PlayerAggregate, SidePerformance},
    rules::map_veto::MapVetoEntry,
    tables::PreparedTables,
    types::TeamName,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Complete,
    RelaxedThresholds,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub name:             TeamName,
    pub matches_analyzed: usize,
    pub overall_win_rate: Option<f64>,
    /// "YYYY-MM-DD to YYYY-MM-DD", or "N/A" without matches.
    pub date_range:       String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightSummary {
    pub total:       usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub avg_impact:  f64,
}

impl InsightSummary {
    pub fn of(insights: &[Insight]) -> Self {
        let mut summary = Self {
            total: insights.len(),
            ..Default::default()
        };
        for insight in insights {
            *summary.by_severity.entry(insight.severity.as_str().to_string()).or_default() += 1;
            *summary.by_category.entry(insight.category.as_str().to_string()).or_default() += 1;
        }
        if !insights.is_empty() {
            summary.avg_impact =
                insights.iter().map(|i| i.impact_score).sum::<f64>() / insights.len() as f64;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(severity.as_str()).copied().unwrap_or(0)
    }

    pub fn count_category(&self, category: Category) -> usize {
        self.by_category.get(category.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub data_quality:         DataQuality,
    pub threshold_tier:       ThresholdTier,
    pub matches_requested:    usize,
    pub matches_found:        usize,
    pub rules_evaluated:      usize,
    pub rules_faulted:        Vec<String>,
    pub candidates_generated: usize,
    pub insight_summary:      InsightSummary,
    pub insight_shortfall:    bool,
    pub engine_version:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoutingReport {
    pub generated_at:     DateTime<Utc>,
    pub team_summary:     TeamSummary,
    pub trend_alerts:     Vec<TrendAlert>,
    pub map_veto:         Vec<MapVetoEntry>,
    pub map_performance:  Vec<MapPerformance>,
    pub side_performance: Vec<SidePerformance>,
    pub economy_stats:    Option<EconomyStats>,
    pub player_stats:     Vec<PlayerAggregate>,
    pub capabilities:     Capabilities,
    pub key_insights:     Vec<Insight>,
    pub how_to_beat:      Vec<String>,
    pub what_not_to_do:   Vec<String>,
    pub evidence_tables:  BTreeMap<String, Vec<Value>>,
    pub meta:             ReportMeta,
}

/// Everything upstream components hand to the assembler.
pub struct ReportParts {
    pub generated_at: DateTime<Utc>,
    pub bundle:       MetricsBundle,
    pub insights:     Vec<Insight>,
    pub trend_alerts: Vec<TrendAlert>,
    pub map_veto:     Vec<MapVetoEntry>,
    pub meta:         ReportMeta,
}

impl ScoutingReport {
    pub fn assemble(parts: ReportParts, tables: &PreparedTables, config: &ReportConfig) -> Self {
        let ReportParts { generated_at, bundle, insights, trend_alerts, map_veto, meta } = parts;

        let date_range = bundle
            .date_range
            .as_ref()
            .map(|r| format!("{} to {}", r.from.format("%Y-%m-%d"), r.to.format("%Y-%m-%d")))
            .unwrap_or_else(|| "N/A".to_string());

        let team_summary = TeamSummary {
            name:             bundle.team.clone(),
            matches_analyzed: bundle.matches_analyzed,
            overall_win_rate: bundle.rate("win_rate"),
            date_range,
        };

        let how_to_beat = checklist(
            insights.iter().map(|i| i.recommendation.as_str()),
            config.how_to_beat_max,
        );
        let what_not_to_do = checklist(
            insights.iter().filter_map(|i| i.what_not_to_do.as_deref()),
            config.what_not_to_do_max,
        );

        let evidence_tables = TableName::ALL
            .iter()
            .map(|&table| {
                let rows = tables.rows(table);
                let shown = rows.len().min(config.evidence_table_rows);
                (table.as_str().to_string(), rows[..shown].to_vec())
            })
            .collect();

        Self {
            generated_at,
            team_summary,
            trend_alerts,
            map_veto,
            map_performance: bundle.map_performance,
            side_performance: bundle.side_performance,
            economy_stats: bundle.economy,
            player_stats: bundle.players,
            capabilities: bundle.capabilities,
            key_insights: insights,
            how_to_beat,
            what_not_to_do,
            evidence_tables,
            meta,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ── Checklists ───────────────────────────────────────────────────────

/// Terminate with a full stop unless the text already ends a sentence.
pub fn as_sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// Lowercase words with punctuation stripped, for near-duplicate detection.
pub fn dedup_key(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `max` distinct, non-empty items in priority order.
pub fn checklist<'a>(items: impl Iterator<Item = &'a str>, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if out.len() >= max {
            break;
        }
        let key = dedup_key(item);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        out.push(as_sentence(item));
    }
    out
}
