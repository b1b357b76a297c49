//! Agent neutralisation: comfort picks, punishable entries, entry reliance.

use super::{normalize_gap, RuleContext, RuleId};
use crate::{
    error::{ScoutError, ScoutResult},
    evidence::{EvidenceRef, Filter, TableName},
    insight::{CandidateInsight, Severity},
    metrics::PlayerAggregate,
};

fn player_rows(ctx: &RuleContext, player: &PlayerAggregate, agent: Option<&str>) -> EvidenceRef {
    let mut filters = vec![Filter::eq("player", player.player.as_str())];
    if let Some(agent) = agent {
        filters.push(Filter::eq("agent", agent));
    }
    ctx.evidence(TableName::PlayerMatchStats, filters)
}

/// One agent takes most of a player's games, or most of their wins.
pub fn agent_dependency(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let t = ctx.thresholds;
    let mut out = Vec::new();
    for player in ctx.bundle.players.iter().filter(|p| p.games >= t.min_player_games) {
        let Some(top) = player.agent_pool.first() else {
            return Err(ScoutError::rule_fault(
                RuleId::AgentDependency.name(),
                format!("{} has games but no agents", player.player),
            ));
        };
        let pick_share = top.pick_rate;
        // Win share is taken from the agent with the most wins.
        let (carrier, win_share) = match player.agent_pool.iter().rev().max_by_key(|a| a.wins) {
            Some(a) if player.wins >= t.min_conditional_sample => {
                (a, a.wins as f64 / player.wins as f64)
            }
            _ => (top, 0.0),
        };
        let share = pick_share.max(win_share);
        if share < t.dependency_share {
            continue;
        }
        let gap = share - 0.5;
        let Some(confidence) = ctx.admit(player.games, gap) else {
            continue;
        };
        let (agent, data_point) = if pick_share >= win_share {
            let data_point = format!(
                "{} plays {} in {:.0}% of games ({}/{})",
                player.player, top.agent, pick_share * 100.0, top.games, player.games
            );
            (top.agent.as_str(), data_point)
        } else {
            let data_point = format!(
                "{} won {} of {} wins on {} ({:.0}%)",
                player.player, carrier.wins, player.wins, carrier.agent, win_share * 100.0
            );
            (carrier.agent.as_str(), data_point)
        };
        out.push(
            CandidateInsight::new(
                RuleId::AgentDependency,
                format!("agent_dependency:{}", player.player),
                format!("{} depends on {}", player.player, agent),
                Severity::from_gap(gap),
                confidence,
            )
            .data_point(data_point)
            .interpretation(format!(
                "{} is heavily tied to {}. Denying it or countering it takes away their comfort.",
                player.player, agent
            ))
            .recommend(format!(
                "Counter-pick against {} and prepare for {}'s usual positions",
                agent, player.player
            ))
            .avoid(format!("Don't leave {} free to play {} unopposed", player.player, agent))
            .evidence(player_rows(ctx, player, Some(agent)))
            .effect(normalize_gap(gap), player.games),
        );
    }
    Ok(out)
}

/// A player who dies first more often than they get the opening kill.
pub fn entry_target(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let t = ctx.thresholds;
    let mut out = Vec::new();
    for player in ctx.bundle.players.iter().filter(|p| p.games >= t.min_player_games) {
        if player.first_death_rate <= player.first_blood_rate
            || player.first_death_rate < t.min_first_death_rate
        {
            continue;
        }
        let duels = player.first_kills + player.first_deaths;
        let gap = player.first_deaths as f64 / duels as f64 - 0.5;
        let Some(confidence) = ctx.admit(player.games, gap) else {
            continue;
        };
        out.push(
            CandidateInsight::new(
                RuleId::EntryTarget,
                format!("entry_target:{}", player.player),
                format!("Target: {}", player.player),
                Severity::from_gap(gap),
                confidence,
            )
            .data_point(format!(
                "{}: {:.1} first kills/game but {:.1} first deaths/game (n={})",
                player.player, player.first_blood_rate, player.first_death_rate, player.games
            ))
            .interpretation(format!(
                "{} takes opening duels aggressively and loses most of them.",
                player.player
            ))
            .recommend(format!("Set crossfires on {}'s entry paths; they overextend", player.player))
            .evidence(player_rows(ctx, player, None))
            .effect(normalize_gap(gap), player.games),
        );
    }
    Ok(out)
}

/// The team's opening kills come mostly from one player.
pub fn first_blood_reliance(ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
    let t = ctx.thresholds;
    let eligible: Vec<&PlayerAggregate> = ctx
        .bundle
        .players
        .iter()
        .filter(|p| p.games >= t.min_player_games)
        .collect();
    if eligible.len() < 3 {
        return Ok(vec![]);
    }
    let total: f64 = eligible.iter().map(|p| p.first_blood_rate).sum();
    let average = total / eligible.len() as f64;
    let Some(top) = eligible
        .iter()
        .copied()
        .max_by(|a, b| {
            a.first_blood_rate
                .total_cmp(&b.first_blood_rate)
                .then_with(|| b.player.cmp(&a.player))
        })
    else {
        return Ok(vec![]);
    };
    if average <= 0.0
        || top.first_blood_rate < average * t.reliance_ratio
        || top.first_blood_rate < t.min_first_blood_rate
    {
        return Ok(vec![]);
    }
    // Excess over an even split of the team's opening kills.
    let gap = top.first_blood_rate / total - 1.0 / eligible.len() as f64;
    let Some(confidence) = ctx.admit(top.games, gap) else {
        return Ok(vec![]);
    };
    Ok(vec![CandidateInsight::new(
        RuleId::FirstBloodReliance,
        "first_blood_reliance",
        format!("Entry Reliance on {}", top.player),
        Severity::from_gap(gap),
        confidence,
    )
    .data_point(format!(
        "{}: {:.1} first kills/game vs team average {:.1} (n={})",
        top.player, top.first_blood_rate, average, top.games
    ))
    .interpretation(format!(
        "Their round tempo starts with {}. Shutting that player down stalls their entries.",
        top.player
    ))
    .recommend(format!("Focus {} early and set up counters on their entry routes", top.player))
    .avoid("Don't give up free first bloods; opening kills swing their rounds")
    .evidence(player_rows(ctx, top, None))
    .effect(normalize_gap(gap), top.games)])
}
