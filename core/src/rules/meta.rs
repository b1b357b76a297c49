//! Meta comparison against reference rates.
//!
//! Each configured area (pistol, attack, defense, eco) is compared with
//! its reference rate. One candidate per area that sits more than
//! `margin` below (or above) the reference.

use super::{normalize_gap, pct, RuleContext, RuleId};
use crate::{
    error::ScoutResult,
    insight::{CandidateInsight, Severity},
    metrics::MetricSnapshot,
};

/// The rate behind an area, when it clears that area's sample floor.
fn area_rate<'a>(ctx: &RuleContext<'a>, area: &str) -> Option<&'a MetricSnapshot> {
    let t = ctx.thresholds;
    let (name, floor) = match area {
        "pistol"  => ("pistol_win_rate", t.min_pistol_rounds),
        "attack"  => ("attack_win_rate", t.min_round_sample),
        "defense" => ("defense_win_rate", t.min_round_sample),
        "eco"     => ("eco_conversion_rate", t.min_eco_rounds),
        _ => return None,
    };
    ctx.bundle.snapshot(name).filter(|s| s.n >= floor)
}

fn title_case(area: &str) -> String {
    let mut chars = area.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn compare(ctx: &RuleContext, rule: RuleId, below: bool) -> Vec<CandidateInsight> {
    let margin = ctx.config.meta_baseline.margin;
    let mut out = Vec::new();
    for (area, &reference) in &ctx.config.meta_baseline.rates {
        let Some(snapshot) = area_rate(ctx, area) else {
            continue;
        };
        let gap = snapshot.value - reference;
        let outside = if below { gap < -margin } else { gap > margin };
        if !outside {
            continue;
        }
        let Some(confidence) = ctx.admit(snapshot.n, gap) else {
            continue;
        };
        let name = title_case(area);
        let candidate = CandidateInsight::new(
            rule,
            area.as_str(),
            if below { format!("Below Average: {name}") } else { format!("Strong: {name}") },
            Severity::from_gap(gap),
            confidence,
        )
        .data_point(format!(
            "{name} {} vs {} reference (n={})",
            pct(snapshot.value),
            pct(reference),
            snapshot.n
        ))
        .evidence(ctx.snapshot_evidence(snapshot))
        .effect(normalize_gap(gap), snapshot.n);
        out.push(if below {
            candidate
                .interpretation(format!("{name} is a fundamental weakness compared with the field."))
                .recommend(format!("Exploit their {area} weakness with focused preparation"))
        } else {
            candidate
                .interpretation(format!("{name} is a well-drilled strength compared with the field."))
                .recommend(format!("Prepare specific counters for their {area} play"))
                .avoid(format!("Don't underestimate their {area}; respect it and adapt"))
        });
    }
    out
}

pub fn below_baseline(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    Ok(compare(ctx, RuleId::BelowMetaBaseline, true))
}

pub fn above_baseline(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    Ok(compare(ctx, RuleId::AboveMetaBaseline, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_are_title_cased() {
        assert_eq!(title_case("defense"), "Defense");
        assert_eq!(title_case(""), "");
    }
}
