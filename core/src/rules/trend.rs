//! Trend alerts: recent window vs baseline window.
//!
//! |last3 − last10| ≥ high_delta → HIGH, ≥ med_delta → MED, otherwise
//! nothing is emitted. Direction is improving when last3 > last10.

use super::{normalize_gap, pct, RuleContext, RuleId};
use crate::{
    config::TrendConfig,
    error::ScoutResult,
    insight::{CandidateInsight, Severity, TrendAlert, TrendDirection},
    metrics::{MetricsBundle, TrendDelta},
};

fn significance(delta: &TrendDelta, config: &TrendConfig) -> Option<Severity> {
    if delta.recent_n < config.min_recent_sample || delta.baseline_n < config.min_baseline_sample {
        return None;
    }
    let change = delta.delta().abs();
    if change >= config.high_delta {
        Some(Severity::High)
    } else if change >= config.med_delta {
        Some(Severity::Med)
    } else {
        None
    }
}

/// Significant trend shifts, in tracked-metric order.
pub fn alerts(bundle: &MetricsBundle, config: &TrendConfig) -> Vec<TrendAlert> {
    bundle
        .trends
        .iter()
        .filter_map(|delta| {
            Some(TrendAlert {
                metric:       delta.metric.clone(),
                last_3:       delta.recent,
                last_10:      delta.baseline,
                change_pct:   delta.change_pct,
                direction:    TrendDirection::of(delta.delta()),
                significance: significance(delta, config)?,
            })
        })
        .collect()
}

fn label(metric: &str) -> &'static str {
    match metric {
        "win_rate"         => "Win rate",
        "pistol_win_rate"  => "Pistol win rate",
        "attack_win_rate"  => "Attack round win rate",
        "defense_win_rate" => "Defense round win rate",
        _                  => "Rate",
    }
}

fn shift_candidate(
    ctx: &RuleContext,
    rule: RuleId,
    metric_key: &str,
    delta: &TrendDelta,
) -> Option<CandidateInsight> {
    let severity = significance(delta, &ctx.config.trend)?;
    let gap = delta.delta();
    let confidence = ctx.admit(delta.baseline_n, gap)?;
    let direction = TrendDirection::of(gap);
    let name = label(&delta.metric);

    let (interpretation, recommendation, avoid) = match direction {
        TrendDirection::Improving => (
            format!("{name} is climbing in recent matches. Their recent form beats their longer record."),
            format!("Prepare for the version of them seen in the last {} matches.", ctx.config.trend.recent_window),
            Some("Don't plan around their older results.".to_string()),
        ),
        TrendDirection::Declining => (
            format!("{name} is dropping in recent matches. Form or structure is slipping."),
            "Press them early and make them play from behind while form is down.".to_string(),
            None,
        ),
    };

    let mut candidate = CandidateInsight::new(
        rule,
        metric_key,
        format!("{name} {}", direction.as_str()),
        severity,
        confidence,
    )
    .data_point(format!(
        "{name} {} over the last {} matches vs {} over the last {} ({:+.0} pts, n={})",
        pct(delta.recent),
        ctx.config.trend.recent_window,
        pct(delta.baseline),
        ctx.config.trend.baseline_window,
        delta.change_pct,
        delta.recent_n
    ))
    .interpretation(interpretation)
    .recommend(recommendation)
    .evidence(ctx.evidence(delta.table, delta.recent_filters.clone()))
    .evidence(ctx.evidence(delta.table, delta.baseline_filters.clone()))
    .effect(normalize_gap(gap), delta.baseline_n);
    if let Some(avoid) = avoid {
        candidate = candidate.avoid(avoid);
    }
    Some(candidate)
}

pub fn win_rate_shift(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    Ok(ctx
        .bundle
        .trend("win_rate")
        .and_then(|d| shift_candidate(ctx, RuleId::WinRateShift, "win_rate", d))
        .into_iter()
        .collect())
}

pub fn pistol_shift(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    Ok(ctx
        .bundle
        .trend("pistol_win_rate")
        .and_then(|d| shift_candidate(ctx, RuleId::PistolShift, "pistol_win_rate", d))
        .into_iter()
        .collect())
}

/// The larger of the attack and defense shifts.
pub fn side_shift(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let larger = ["attack_win_rate", "defense_win_rate"]
        .iter()
        .filter_map(|m| ctx.bundle.trend(m))
        .filter(|d| significance(d, &ctx.config.trend).is_some())
        .max_by(|a, b| a.delta().abs().total_cmp(&b.delta().abs()));
    Ok(larger
        .and_then(|d| shift_candidate(ctx, RuleId::SideShift, "side_win_rate", d))
        .into_iter()
        .collect())
}
