//! Capability scores.
//!
//! Six bounded [0, 100] scores. Each is a clipped linear transform of a
//! rate against a fixed reference: `50 + 50 × (rate − reference) / span`.
//! A rate equal to its reference scores 50. A score whose underlying
//! rate is absent is absent too.

use crate::{
    metrics::{EconomyStats, PlayerAggregate, SidePerformance},
    tables::{PreparedTables, Side},
};
use serde::Serialize;

/// Eco conversion rate considered average.
const ECO_REFERENCE: f64 = 0.15;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pistol:       Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub economy:      Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_bloods: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack:       Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense:      Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency:  Option<f64>,
}

pub fn scale(rate: f64, reference: f64, span: f64) -> f64 {
    (50.0 + 50.0 * (rate - reference) / span).clamp(0.0, 100.0)
}

/// 100 / (1 + cv) of per-match round differential. Needs two matches.
pub fn consistency(differentials: &[f64]) -> Option<f64> {
    if differentials.len() < 2 {
        return None;
    }
    let n = differentials.len() as f64;
    let mean = differentials.iter().sum::<f64>() / n;
    let variance = differentials.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean.abs().max(1.0);
    Some((100.0 / (1.0 + cv)).clamp(0.0, 100.0))
}

impl Capabilities {
    pub fn compute(
        tables: &PreparedTables,
        economy: Option<&EconomyStats>,
        sides: &[SidePerformance],
        players: &[PlayerAggregate],
    ) -> Self {
        let side_rate = |side: Side| sides.iter().find(|s| s.side == side).map(|s| s.win_rate);

        let (fk, fd) = players
            .iter()
            .fold((0u32, 0u32), |(fk, fd), p| (fk + p.first_kills, fd + p.first_deaths));
        let opening_share = (fk + fd > 0).then(|| fk as f64 / (fk + fd) as f64);

        let differentials: Vec<f64> = tables
            .matches
            .iter()
            .map(|m| m.score_us as f64 - m.score_them as f64)
            .collect();

        Self {
            pistol:       economy.and_then(|e| e.pistol_win_rate).map(|r| scale(r, 0.5, 0.5)),
            economy:      economy
                .and_then(|e| e.eco_conversion_rate)
                .map(|r| scale(r, ECO_REFERENCE, ECO_REFERENCE)),
            first_bloods: opening_share.map(|r| scale(r, 0.5, 0.5)),
            attack:       side_rate(Side::Attack).map(|r| scale(r, 0.5, 0.5)),
            defense:      side_rate(Side::Defense).map(|r| scale(r, 0.5, 0.5)),
            consistency:  consistency(&differentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rate_scores_fifty() {
        assert_eq!(scale(0.5, 0.5, 0.5), 50.0);
        assert_eq!(scale(0.15, 0.15, 0.15), 50.0);
    }

    #[test]
    fn scores_are_clipped() {
        assert_eq!(scale(1.0, 0.15, 0.15), 100.0);
        assert_eq!(scale(0.0, 0.5, 0.5), 0.0);
        assert_eq!(scale(0.75, 0.5, 0.5), 75.0);
    }

    #[test]
    fn identical_differentials_are_fully_consistent() {
        assert_eq!(consistency(&[3.0, 3.0, 3.0]), Some(100.0));
        assert_eq!(consistency(&[5.0]), None);
    }

    #[test]
    fn noisy_differentials_score_lower() {
        let steady = consistency(&[4.0, 5.0, 3.0, 4.0]).unwrap();
        let noisy = consistency(&[10.0, -8.0, 12.0, -6.0]).unwrap();
        assert!(noisy < steady, "noisy {noisy} should be below steady {steady}");
    }
}
