//! Report configuration.
//!
//! Every option is a pure input to one report generation. Defaults are
//! the documented production values; `data/report_config.json` spells
//! them out in full.

use crate::{
    error::{ScoutError, ScoutResult},
    insight::Confidence,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Threshold tiers ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdTier {
    Strict,
    Relaxed,
}

impl ThresholdTier {
    /// One step looser, or None when already at the loosest tier.
    pub fn relax(self) -> Option<Self> {
        match self {
            Self::Strict  => Some(Self::Relaxed),
            Self::Relaxed => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict  => "strict",
            Self::Relaxed => "relaxed",
        }
    }
}

/// Sample-size and effect-size floors a rule must clear to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Smallest raw rate gap worth reporting.
    pub min_effect: f64,
    /// Matches required under a match-level condition (e.g. lost pistol).
    pub min_conditional_sample: usize,
    /// Rounds required for round-level rates (sides, opening duels, deficits).
    pub min_round_sample: usize,
    pub min_pistol_rounds: usize,
    pub min_eco_rounds: usize,
    pub min_player_games: usize,
    /// Conditional loss rate a collapse pattern must reach.
    pub collapse_loss_rate: f64,
    /// Share of a player's games (or wins) on one agent.
    pub dependency_share: f64,
    /// First deaths per game before a player is called out as a target.
    pub min_first_death_rate: f64,
    /// Top entry rate relative to the team average.
    pub reliance_ratio: f64,
    pub min_first_blood_rate: f64,
    /// Emitted confidence must be at least this level.
    pub min_confidence: Confidence,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            min_effect:             0.10,
            min_conditional_sample: 5,
            min_round_sample:       20,
            min_pistol_rounds:      6,
            min_eco_rounds:         5,
            min_player_games:       5,
            collapse_loss_rate:     0.65,
            dependency_share:       0.70,
            min_first_death_rate:   1.5,
            reliance_ratio:         2.0,
            min_first_blood_rate:   1.5,
            min_confidence:         Confidence::Low,
        }
    }
}

impl TierThresholds {
    pub fn relaxed() -> Self {
        Self {
            min_effect:             0.05,
            min_conditional_sample: 3,
            min_round_sample:       10,
            min_pistol_rounds:      4,
            min_eco_rounds:         3,
            min_player_games:       3,
            collapse_loss_rate:     0.55,
            dependency_share:       0.60,
            min_first_death_rate:   1.0,
            reliance_ratio:         1.5,
            min_first_blood_rate:   1.0,
            min_confidence:         Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTiers {
    pub strict:  TierThresholds,
    pub relaxed: TierThresholds,
}

impl Default for ThresholdTiers {
    fn default() -> Self {
        Self {
            strict:  TierThresholds::default(),
            relaxed: TierThresholds::relaxed(),
        }
    }
}

impl ThresholdTiers {
    pub fn get(&self, tier: ThresholdTier) -> &TierThresholds {
        match tier {
            ThresholdTier::Strict  => &self.strict,
            ThresholdTier::Relaxed => &self.relaxed,
        }
    }
}

// ── Scoring sections ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub high_min_sample:   usize,
    pub medium_min_sample: usize,
    /// Effects below this drop confidence one level.
    pub weak_effect:       f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            high_min_sample:   15,
            medium_min_sample: 7,
            weak_effect:       0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub recent_window:       usize,
    pub baseline_window:     usize,
    pub high_delta:          f64,
    pub med_delta:           f64,
    pub min_recent_sample:   usize,
    pub min_baseline_sample: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_window:       3,
            baseline_window:     10,
            high_delta:          0.25,
            med_delta:           0.15,
            min_recent_sample:   3,
            min_baseline_sample: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapVetoConfig {
    pub min_games:     usize,
    pub pick_win_rate: f64,
    pub ban_win_rate:  f64,
}

impl Default for MapVetoConfig {
    fn default() -> Self {
        Self {
            min_games:     3,
            pick_win_rate: 0.55,
            ban_win_rate:  0.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Sample size at which the frequency factor reaches 1.0.
    pub saturation_sample: usize,
    pub frequency_floor:   f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            saturation_sample: 20,
            frequency_floor:   0.3,
        }
    }
}

/// Credit model used to classify rounds that arrive without a type.
/// See economy.rs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub half_length:        u32,
    pub pistol_credits:     u32,
    pub win_reward:         u32,
    pub loss_reward:        u32,
    pub loss_streak_bonus:  u32,
    pub max_loss_reward:    u32,
    pub full_buy_cost:      u32,
    pub credit_cap:         u32,
    /// Below this buying power a round is an eco.
    pub eco_threshold:      u32,
    /// At or above this buying power a round is a full buy.
    pub full_buy_threshold: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            half_length:        12,
            pistol_credits:     800,
            win_reward:         3000,
            loss_reward:        1900,
            loss_streak_bonus:  500,
            max_loss_reward:    2900,
            full_buy_cost:      3900,
            credit_cap:         9000,
            eco_threshold:      2000,
            full_buy_threshold: 3900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaBaselineConfig {
    /// Reference rate per area (`pistol`, `attack`, `defense`, `eco`).
    pub rates:  BTreeMap<String, f64>,
    /// Distance from the reference a rate must exceed.
    pub margin: f64,
}

impl Default for MetaBaselineConfig {
    fn default() -> Self {
        let rates = [("pistol", 0.5), ("attack", 0.5), ("defense", 0.5), ("eco", 0.15)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self { rates, margin: 0.10 }
    }
}

// ── Root ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of most recent matches analysed (`n`).
    pub matches_to_analyze:  usize,
    pub min_insights:        usize,
    pub max_insights:        usize,
    pub how_to_beat_max:     usize,
    pub what_not_to_do_max:  usize,
    pub evidence_sample_rows: usize,
    pub evidence_table_rows: usize,
    pub parallel_rules:      bool,
    pub tiers:               ThresholdTiers,
    pub confidence:          ConfidenceConfig,
    pub trend:               TrendConfig,
    pub map_veto:            MapVetoConfig,
    pub impact:              ImpactConfig,
    pub economy:             EconomyConfig,
    pub meta_baseline:       MetaBaselineConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            matches_to_analyze:   10,
            min_insights:         6,
            max_insights:         12,
            how_to_beat_max:      6,
            what_not_to_do_max:   4,
            evidence_sample_rows: 5,
            evidence_table_rows:  10,
            parallel_rules:       true,
            tiers:                ThresholdTiers::default(),
            confidence:           ConfidenceConfig::default(),
            trend:                TrendConfig::default(),
            map_veto:             MapVetoConfig::default(),
            impact:               ImpactConfig::default(),
            economy:              EconomyConfig::default(),
            meta_baseline:        MetaBaselineConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_matches(mut self, n: usize) -> Self {
        self.matches_to_analyze = n;
        self
    }

    pub fn validate(&self) -> ScoutResult<()> {
        let fail = |detail: String| Err(ScoutError::Config { detail });

        if self.min_insights > self.max_insights {
            return fail(format!(
                "min_insights ({}) exceeds max_insights ({})",
                self.min_insights, self.max_insights
            ));
        }
        if self.map_veto.pick_win_rate <= self.map_veto.ban_win_rate {
            return fail(format!(
                "map_veto.pick_win_rate ({}) must be above ban_win_rate ({})",
                self.map_veto.pick_win_rate, self.map_veto.ban_win_rate
            ));
        }
        if self.trend.high_delta < self.trend.med_delta {
            return fail("trend.high_delta must be at least trend.med_delta".into());
        }
        if self.trend.recent_window == 0 || self.trend.recent_window > self.trend.baseline_window {
            return fail("trend.recent_window must be in 1..=baseline_window".into());
        }
        if self.confidence.high_min_sample < self.confidence.medium_min_sample {
            return fail("confidence.high_min_sample must be at least medium_min_sample".into());
        }
        if self.impact.saturation_sample == 0
            || !(0.0..=1.0).contains(&self.impact.frequency_floor)
        {
            return fail("impact.saturation_sample must be > 0 and frequency_floor in [0, 1]".into());
        }
        if self.economy.eco_threshold > self.economy.full_buy_threshold {
            return fail("economy.eco_threshold must not exceed full_buy_threshold".into());
        }
        if self.economy.half_length == 0 {
            return fail("economy.half_length must be > 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ReportConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ReportConfig =
            serde_json::from_str(r#"{ "matches_to_analyze": 20, "trend": { "high_delta": 0.3 } }"#)
                .unwrap();
        assert_eq!(config.matches_to_analyze, 20);
        assert_eq!(config.trend.high_delta, 0.3);
        assert_eq!(config.trend.med_delta, 0.15);
        assert_eq!(config.max_insights, 12);
    }

    #[test]
    fn inverted_insight_bounds_are_rejected() {
        let config = ReportConfig {
            min_insights: 10,
            max_insights: 4,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ScoutError::Config { .. })));
    }

    #[test]
    fn tiers_relax_once() {
        assert_eq!(ThresholdTier::Strict.relax(), Some(ThresholdTier::Relaxed));
        assert_eq!(ThresholdTier::Relaxed.relax(), None);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped: ReportConfig =
            serde_json::from_str(include_str!("../../data/report_config.json")).unwrap();
        assert_eq!(shipped, ReportConfig::default());
    }
}
