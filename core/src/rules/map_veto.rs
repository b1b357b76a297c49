//! Map veto classification and map rules.
//!
//! Labels describe the scouted team's own record:
//!   games < min_games        → LOW_SAMPLE (reported, never PICK/BAN)
//!   win_rate ≥ pick_win_rate → PICK (their strong map)
//!   win_rate ≤ ban_win_rate  → BAN  (their weak map)
//!   otherwise                → NEUTRAL

use super::{normalize_gap, pct, RuleContext, RuleId};
use crate::{
    config::MapVetoConfig,
    error::{ScoutError, ScoutResult},
    evidence::{Filter, TableName},
    insight::{CandidateInsight, Confidence, Severity},
    metrics::{MapPerformance, MetricsBundle},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VetoCall {
    Ban,
    Pick,
    Neutral,
    LowSample,
}

impl VetoCall {
    pub fn classify(games: usize, win_rate: f64, config: &MapVetoConfig) -> Self {
        if games < config.min_games {
            Self::LowSample
        } else if win_rate >= config.pick_win_rate {
            Self::Pick
        } else if win_rate <= config.ban_win_rate {
            Self::Ban
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ban       => "BAN",
            Self::Pick      => "PICK",
            Self::Neutral   => "NEUTRAL",
            Self::LowSample => "LOW_SAMPLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapVetoEntry {
    pub map:            String,
    pub games:          usize,
    pub wins:           usize,
    pub win_rate:       f64,
    pub recommendation: VetoCall,
}

/// BAN, PICK, NEUTRAL, LOW_SAMPLE; within a label the most lopsided first.
pub fn classify(bundle: &MetricsBundle, config: &MapVetoConfig) -> Vec<MapVetoEntry> {
    let mut entries: Vec<MapVetoEntry> = bundle
        .map_performance
        .iter()
        .map(|m| MapVetoEntry {
            map:            m.map.clone(),
            games:          m.games,
            wins:           m.wins,
            win_rate:       m.win_rate,
            recommendation: VetoCall::classify(m.games, m.win_rate, config),
        })
        .collect();
    entries.sort_by(|a, b| {
        a.recommendation
            .cmp(&b.recommendation)
            .then_with(|| (b.win_rate - 0.5).abs().total_cmp(&(a.win_rate - 0.5).abs()))
            .then_with(|| a.map.cmp(&b.map))
    });
    entries
}

fn maps_with<'a>(ctx: &'a RuleContext, call: VetoCall) -> impl Iterator<Item = &'a MapPerformance> + 'a {
    let config = &ctx.config.map_veto;
    ctx.bundle
        .map_performance
        .iter()
        .filter(move |m| VetoCall::classify(m.games, m.win_rate, config) == call)
}

fn map_candidate(
    ctx: &RuleContext,
    rule: RuleId,
    map: &MapPerformance,
    gap: f64,
    title: String,
) -> ScoutResult<Option<CandidateInsight>> {
    let snapshot = ctx.required_snapshot(rule, &format!("map_win_rate:{}", map.map))?;
    if snapshot.n != map.games {
        return Err(ScoutError::rule_fault(
            rule.name(),
            format!("{} has {} games but snapshot n={}", map.map, map.games, snapshot.n),
        ));
    }
    let Some(confidence) = ctx.admit(map.games, gap) else {
        return Ok(None);
    };
    let candidate = CandidateInsight::new(rule, format!("map:{}", map.map), title, Severity::from_gap(gap), confidence)
        .data_point(format!(
            "{} win rate on {} ({}/{}), avg score {:.1}-{:.1}",
            pct(map.win_rate),
            map.map,
            map.wins,
            map.games,
            map.avg_rounds_won,
            map.avg_rounds_lost
        ))
        .evidence(ctx.snapshot_evidence(snapshot))
        .effect(normalize_gap(gap), map.games);
    Ok(Some(candidate))
}

/// Their PICK maps: advise banning them.
pub fn map_strength(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let mut out = Vec::new();
    for map in maps_with(ctx, VetoCall::Pick) {
        let title = format!("Ban: {}", map.map);
        let Some(c) = map_candidate(ctx, RuleId::MapStrength, map, map.win_rate - 0.5, title)? else {
            continue;
        };
        out.push(
            c.interpretation(format!("{} is one of their best maps; their executes there are refined.", map.map))
                .recommend(format!("Ban {} in the veto, or bring specific counter-strats if it is forced", map.map))
                .avoid(format!("Don't play default on {}", map.map)),
        );
    }
    Ok(out)
}

/// Their BAN maps: advise forcing them.
pub fn map_weakness(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let mut out = Vec::new();
    for map in maps_with(ctx, VetoCall::Ban) {
        let title = format!("Force: {}", map.map);
        let Some(c) = map_candidate(ctx, RuleId::MapWeakness, map, 0.5 - map.win_rate, title)? else {
            continue;
        };
        out.push(
            c.interpretation(format!("They consistently struggle on {}.", map.map))
                .recommend(format!("Steer the veto toward {} and prepare your best strats for it", map.map)),
        );
    }
    Ok(out)
}

/// Maps played too rarely to classify. Reported so they are not mistaken for neutral.
pub fn low_sample_maps(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let thin: Vec<&MapPerformance> = maps_with(ctx, VetoCall::LowSample).collect();
    if thin.is_empty() {
        return Ok(vec![]);
    }
    let listed: Vec<String> = thin.iter().map(|m| format!("{} ({})", m.map, m.games)).collect();
    let games: usize = thin.iter().map(|m| m.games).sum();
    let share = thin.len() as f64 / ctx.bundle.map_performance.len().max(1) as f64;
    Ok(vec![CandidateInsight::new(
        RuleId::LowSampleMaps,
        "low_sample_maps",
        "Low Data Maps",
        Severity::Low,
        Confidence::Low,
    )
    .data_point(format!("Limited data on: {}", listed.join(", ")))
    .interpretation("These maps have too few games for a reliable read.")
    .recommend("Treat these maps as wildcards and review recent footage before picking them")
    .evidence(ctx.evidence(
        TableName::Matches,
        vec![Filter::one_of("map", thin.iter().map(|m| m.map.as_str()))],
    ))
    .effect(share * 0.5, games)])
}
