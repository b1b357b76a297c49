//! Loss patterns: conditional collapse and eco conversion.

use super::{normalize_gap, pct, RuleContext, RuleId};
use crate::{
    error::ScoutResult,
    insight::{CandidateInsight, Confidence, Severity},
    metrics::ConditionalRate,
};

/// Shared gate for collapse rules: sample floor, loss-rate floor and
/// effect floor must all clear.
pub(super) fn collapse(
    ctx: &RuleContext,
    condition: &ConditionalRate,
    min_sample: usize,
) -> Option<Confidence> {
    if condition.n < min_sample || condition.loss_rate < ctx.thresholds.collapse_loss_rate {
        return None;
    }
    ctx.admit(condition.n, condition.gap())
}

pub fn pistol_loss_collapse(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let Some(c) = ctx.bundle.conditional("after_pistol_loss") else {
        return Ok(vec![]);
    };
    let Some(confidence) = collapse(ctx, c, ctx.thresholds.min_conditional_sample) else {
        return Ok(vec![]);
    };
    let gap = c.gap();
    Ok(vec![CandidateInsight::new(
        RuleId::PistolLossCollapse,
        "after_pistol_loss",
        "Pistol Loss Collapse",
        Severity::from_gap(gap),
        confidence,
    )
    .data_point(format!(
        "Lose {} of matches after losing the first pistol (n={}, overall loss rate {})",
        pct(c.loss_rate),
        c.n,
        pct(c.baseline_loss_rate)
    ))
    .interpretation("They struggle to recover from a lost pistol. The economy cascade after it hurts them.")
    .recommend("Prioritise the first pistol round and punish the follow-up eco")
    .avoid("Don't force-buy after winning the pistol; let their economy break first")
    .evidence(ctx.evidence(c.table, c.filters.clone()))
    .effect(normalize_gap(gap), c.n)])
}

pub fn early_deficit_collapse(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let Some(c) = ctx.bundle.conditional("when_down_early") else {
        return Ok(vec![]);
    };
    let Some(confidence) = collapse(ctx, c, ctx.thresholds.min_round_sample) else {
        return Ok(vec![]);
    };
    let gap = c.gap();
    Ok(vec![CandidateInsight::new(
        RuleId::EarlyDeficitCollapse,
        "when_down_early",
        "Early Deficit Collapse",
        Severity::from_gap(gap),
        confidence,
    )
    .data_point(format!(
        "Lose {} of the remaining first-half rounds after going 0-2 down (n={}, usual {})",
        pct(c.loss_rate),
        c.n,
        pct(c.baseline_loss_rate)
    ))
    .interpretation("Falling behind early breaks their mid-half adaptation.")
    .recommend("Open aggressively and bank the first two rounds")
    .avoid("Don't ease off once you are ahead early")
    .evidence(ctx.evidence(c.table, c.filters.clone()))
    .effect(normalize_gap(gap), c.n)])
}

/// Eco conversion far above or below the reference rate.
pub fn eco_conversion(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let Some(eco) = ctx.bundle.snapshot("eco_conversion_rate") else {
        return Ok(vec![]);
    };
    if eco.n < ctx.thresholds.min_eco_rounds {
        return Ok(vec![]);
    }
    let reference = ctx
        .config
        .meta_baseline
        .rates
        .get("eco")
        .copied()
        .unwrap_or(0.15);
    let gap = eco.value - reference;
    let strong = gap >= 2.0 * ctx.thresholds.min_effect;
    let weak = gap <= -ctx.thresholds.min_effect / 2.0;
    if !strong && !weak {
        return Ok(vec![]);
    }
    // The weak side is bounded by the reference itself, so the floor is scaled to it.
    let floor_gap = if strong { gap } else { gap * 2.0 };
    let Some(confidence) = ctx.admit(eco.n, floor_gap) else {
        return Ok(vec![]);
    };

    let candidate = if strong {
        CandidateInsight::new(
            RuleId::EcoConversion,
            "eco_conversion_rate",
            "Strong Eco Round Conversion",
            Severity::from_gap(gap),
            confidence,
        )
        .data_point(format!("Win {} of eco rounds (n={})", pct(eco.value), eco.n))
        .interpretation("They convert eco rounds far above the usual rate. Their save-round setups are practised.")
        .recommend("Play eco rounds with discipline; trade carefully instead of peeking for kills")
        .avoid("Don't treat their eco rounds as free")
    } else {
        CandidateInsight::new(
            RuleId::EcoConversion,
            "eco_conversion_rate",
            "Weak Eco Rounds",
            Severity::Low,
            confidence,
        )
        .data_point(format!("Win only {} of eco rounds (n={})", pct(eco.value), eco.n))
        .interpretation("They rarely convert eco rounds.")
        .recommend("Push their economy into ecos; they seldom punish overconfident buys")
    };
    Ok(vec![candidate
        .evidence(ctx.snapshot_evidence(eco))
        .effect(normalize_gap(floor_gap), eco.n)])
}
