//! Ranking and deduplication.
//!
//! impact = confidence_weight × effect_size × frequency_factor
//!   confidence_weight: high 1.0, medium 0.7, low 0.4
//!   effect_size:       rule-normalised, [0, 1]
//!   frequency_factor:  ln(n + 1) / ln(saturation), clamped to [floor, 1]
//!
//! RULE: One survivor per (category, metric key), the highest impact.
//! RULE: Order is impact desc, then severity desc, then registration
//!       order, then emission order. Fully deterministic.

use crate::{
    config::{ImpactConfig, ReportConfig},
    insight::{CandidateInsight, Category, Confidence, Insight},
};
use std::cmp::Ordering;
use std::collections::HashMap;

pub fn frequency_factor(sample_size: usize, config: &ImpactConfig) -> f64 {
    let saturation = (config.saturation_sample.max(2) as f64).ln();
    ((sample_size as f64 + 1.0).ln() / saturation).clamp(config.frequency_floor, 1.0)
}

pub fn impact_score(confidence: Confidence, effect_size: f64, sample_size: usize, config: &ImpactConfig) -> f64 {
    let effect = if effect_size.is_finite() { effect_size.abs().min(1.0) } else { 0.0 };
    (confidence.weight() * effect * frequency_factor(sample_size, config)).clamp(0.0, 1.0)
}

struct Scored {
    candidate: CandidateInsight,
    impact:    f64,
    emitted:   usize,
}

fn precedence(a: &Scored, b: &Scored) -> Ordering {
    b.impact
        .total_cmp(&a.impact)
        .then_with(|| b.candidate.severity.cmp(&a.candidate.severity))
        .then_with(|| a.candidate.rule.cmp(&b.candidate.rule))
        .then_with(|| a.emitted.cmp(&b.emitted))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub insights:  Vec<Insight>,
    /// Candidates dropped as duplicates of a stronger finding.
    pub merged:    usize,
    /// Survivors cut by the maximum count.
    pub truncated: usize,
}

/// Score, deduplicate, order and cap the concatenated candidate list.
pub fn rank(candidates: Vec<CandidateInsight>, config: &ReportConfig) -> Ranked {
    let total = candidates.len();
    let mut best: HashMap<(Category, String), Scored> = HashMap::new();
    for (emitted, candidate) in candidates.into_iter().enumerate() {
        let impact = impact_score(
            candidate.confidence,
            candidate.effect_size,
            candidate.sample_size,
            &config.impact,
        );
        let scored = Scored { candidate, impact, emitted };
        let key = (scored.candidate.category, scored.candidate.metric_key.clone());
        match best.get(&key) {
            Some(held) if precedence(held, &scored) != Ordering::Greater => {}
            _ => {
                best.insert(key, scored);
            }
        }
    }

    let mut survivors: Vec<Scored> = best.into_values().collect();
    survivors.sort_by(precedence);
    let merged = total - survivors.len();
    let truncated = survivors.len().saturating_sub(config.max_insights);
    survivors.truncate(config.max_insights);

    log::info!(
        "ranking: {total} candidates, {merged} merged as duplicates, {} kept, {truncated} cut",
        survivors.len()
    );

    Ranked {
        insights: survivors
            .into_iter()
            .map(|s| s.candidate.into_insight(s.impact))
            .collect(),
        merged,
        truncated,
    }
}
