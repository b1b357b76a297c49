//! Playbook predictors: pistol tendencies, side preference, opening duels.

use super::{loss_pattern::collapse, normalize_gap, pct, RuleContext, RuleId};
use crate::{
    error::ScoutResult,
    insight::{CandidateInsight, Severity},
    tables::Side,
};

pub fn pistol_tendencies(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let Some(pistol) = ctx.bundle.snapshot("pistol_win_rate") else {
        return Ok(vec![]);
    };
    if pistol.n < ctx.thresholds.min_pistol_rounds {
        return Ok(vec![]);
    }
    let gap = pistol.value - 0.5;
    let Some(confidence) = ctx.admit(pistol.n, gap) else {
        return Ok(vec![]);
    };
    let wins = (pistol.value * pistol.n as f64).round() as usize;
    let candidate = if gap > 0.0 {
        CandidateInsight::new(
            RuleId::PistolTendencies,
            "pistol_win_rate",
            "Strong Pistol Execution",
            Severity::from_gap(gap),
            confidence,
        )
        .interpretation("Their pistol rounds are rehearsed, usually a coordinated utility-heavy setup.")
        .recommend("Study their pistol setups and answer with anti-pistol utility or an early push")
        .avoid("Don't take slow default pistols into their prepared setup")
    } else {
        CandidateInsight::new(
            RuleId::PistolTendencies,
            "pistol_win_rate",
            "Weak Pistol Rounds",
            Severity::from_gap(gap),
            confidence,
        )
        .interpretation("They lose pistol rounds more than they win them; coordination on low buys is loose.")
        .recommend("Play fast, aggressive pistols; they fold under early pressure")
    };
    Ok(vec![candidate
        .data_point(format!(
            "{} pistol win rate ({}/{} pistol rounds)",
            pct(pistol.value),
            wins,
            pistol.n
        ))
        .evidence(ctx.snapshot_evidence(pistol))
        .effect(normalize_gap(gap), pistol.n)])
}

pub fn side_preference(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let (Some(attack), Some(defense)) = (
        ctx.bundle.snapshot("attack_win_rate"),
        ctx.bundle.snapshot("defense_win_rate"),
    ) else {
        return Ok(vec![]);
    };
    let min = ctx.thresholds.min_round_sample;
    if attack.n < min || defense.n < min {
        return Ok(vec![]);
    }
    let gap = attack.value - defense.value;
    let n = attack.n.min(defense.n);
    let Some(confidence) = ctx.admit(n, gap) else {
        return Ok(vec![]);
    };
    let (stronger, weaker) = if gap > 0.0 {
        (Side::Attack, Side::Defense)
    } else {
        (Side::Defense, Side::Attack)
    };
    let stronger_title = match stronger {
        Side::Attack  => "Attack",
        Side::Defense => "Defense",
    };
    Ok(vec![CandidateInsight::new(
        RuleId::SidePreference,
        "side_preference",
        format!("{stronger_title}-Sided Team"),
        Severity::from_gap(gap),
        confidence,
    )
    .data_point(format!(
        "Attack {} ({} rounds), Defense {} ({} rounds), gap {}",
        pct(attack.value),
        attack.n,
        pct(defense.value),
        defense.n,
        pct(gap.abs())
    ))
    .interpretation(format!(
        "Their {} playbook is deeper; their {} defaults are more predictable.",
        stronger.as_str(),
        weaker.as_str()
    ))
    .recommend(format!(
        "Choose sides so they play {} in the decisive half",
        weaker.as_str()
    ))
    .evidence(ctx.snapshot_evidence(attack))
    .evidence(ctx.snapshot_evidence(defense))
    .effect(normalize_gap(gap), n)])
}

/// Rounds fall apart once the opponent wins the opening duel.
pub fn opening_duel_dependence(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let Some(c) = ctx.bundle.conditional("after_opening_death") else {
        return Ok(vec![]);
    };
    let Some(confidence) = collapse(ctx, c, ctx.thresholds.min_round_sample) else {
        return Ok(vec![]);
    };
    let gap = c.gap();
    Ok(vec![CandidateInsight::new(
        RuleId::OpeningDuelDependence,
        "after_opening_death",
        "Opening Duel Dependence",
        Severity::from_gap(gap),
        confidence,
    )
    .data_point(format!(
        "Lose {} of rounds after conceding the first kill (n={}, overall {})",
        pct(c.loss_rate),
        c.n,
        pct(c.baseline_loss_rate)
    ))
    .interpretation("Their rounds rely on winning the opening duel; they rarely retake after a man down.")
    .recommend("Invest utility in winning the first engagement of each round")
    .avoid("Don't take low-percentage opening duels that hand them the first kill")
    .evidence(ctx.evidence(c.table, c.filters.clone()))
    .effect(normalize_gap(gap), c.n)])
}
