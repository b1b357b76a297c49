//! Rule registry.
//!
//! RULE: Every rule is a pure function of (MetricsBundle, prepared tables).
//! RULE: Rules never call each other and never share mutable state.
//! RULE: Insufficient data is an empty result, never an error.
//!       Err is reserved for internal faults; the engine isolates them.
//!
//! REGISTRATION ORDER (fixed, append-only, used as the final tie-break):
//!   0-2    trend         win rate, pistol, side shift
//!   3-5    loss_pattern  pistol collapse, early deficit, eco conversion
//!   6-8    agent         dependency, entry target, first-blood reliance
//!   9-11   map_veto      strength, weakness, low-sample maps
//!   12-14  playbook      pistol tendencies, side preference, opening duels
//!   15-16  meta          below baseline, above baseline

pub mod agent;
pub mod loss_pattern;
pub mod map_veto;
pub mod meta;
pub mod playbook;
pub mod trend;

use crate::{
    config::{ReportConfig, ThresholdTier, TierThresholds},
    error::{ScoutError, ScoutResult},
    evidence::{EvidenceRef, Filter, TableName},
    insight::{CandidateInsight, Category, Confidence},
    metrics::{MetricSnapshot, MetricsBundle},
    tables::PreparedTables,
};

/// Stable rule identities.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum RuleId {
    WinRateShift          = 0,
    PistolShift           = 1,
    SideShift             = 2,
    PistolLossCollapse    = 3,
    EarlyDeficitCollapse  = 4,
    EcoConversion         = 5,
    AgentDependency       = 6,
    EntryTarget           = 7,
    FirstBloodReliance    = 8,
    MapStrength           = 9,
    MapWeakness           = 10,
    LowSampleMaps         = 11,
    PistolTendencies      = 12,
    SidePreference        = 13,
    OpeningDuelDependence = 14,
    BelowMetaBaseline     = 15,
    AboveMetaBaseline     = 16,
    // Add new rules here, append only.
}

impl RuleId {
    pub const ALL: [RuleId; 17] = [
        RuleId::WinRateShift,
        RuleId::PistolShift,
        RuleId::SideShift,
        RuleId::PistolLossCollapse,
        RuleId::EarlyDeficitCollapse,
        RuleId::EcoConversion,
        RuleId::AgentDependency,
        RuleId::EntryTarget,
        RuleId::FirstBloodReliance,
        RuleId::MapStrength,
        RuleId::MapWeakness,
        RuleId::LowSampleMaps,
        RuleId::PistolTendencies,
        RuleId::SidePreference,
        RuleId::OpeningDuelDependence,
        RuleId::BelowMetaBaseline,
        RuleId::AboveMetaBaseline,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::WinRateShift          => "trend_win_rate_shift",
            Self::PistolShift           => "trend_pistol_shift",
            Self::SideShift             => "trend_side_shift",
            Self::PistolLossCollapse    => "loss_after_pistol",
            Self::EarlyDeficitCollapse  => "loss_when_down_early",
            Self::EcoConversion         => "eco_conversion",
            Self::AgentDependency       => "agent_dependency",
            Self::EntryTarget           => "entry_target",
            Self::FirstBloodReliance    => "first_blood_reliance",
            Self::MapStrength           => "map_strength",
            Self::MapWeakness           => "map_weakness",
            Self::LowSampleMaps         => "low_sample_maps",
            Self::PistolTendencies      => "pistol_tendencies",
            Self::SidePreference        => "side_preference",
            Self::OpeningDuelDependence => "opening_duel_dependence",
            Self::BelowMetaBaseline     => "below_meta_baseline",
            Self::AboveMetaBaseline     => "above_meta_baseline",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::WinRateShift | Self::PistolShift | Self::SideShift => Category::Trend,
            Self::PistolLossCollapse | Self::EarlyDeficitCollapse | Self::EcoConversion => {
                Category::LossPattern
            }
            Self::AgentDependency | Self::EntryTarget | Self::FirstBloodReliance => Category::Agent,
            Self::MapStrength | Self::MapWeakness | Self::LowSampleMaps => Category::MapVeto,
            Self::PistolTendencies | Self::SidePreference | Self::OpeningDuelDependence => {
                Category::Playbook
            }
            Self::BelowMetaBaseline | Self::AboveMetaBaseline => Category::Meta,
        }
    }

    pub fn evaluate(&self, ctx: &RuleContext) -> ScoutResult<Vec<CandidateInsight>> {
        let candidates = match self {
            Self::WinRateShift          => trend::win_rate_shift(ctx),
            Self::PistolShift           => trend::pistol_shift(ctx),
            Self::SideShift             => trend::side_shift(ctx),
            Self::PistolLossCollapse    => loss_pattern::pistol_loss_collapse(ctx),
            Self::EarlyDeficitCollapse  => loss_pattern::early_deficit_collapse(ctx),
            Self::EcoConversion         => loss_pattern::eco_conversion(ctx),
            Self::AgentDependency       => agent::agent_dependency(ctx),
            Self::EntryTarget           => agent::entry_target(ctx),
            Self::FirstBloodReliance    => agent::first_blood_reliance(ctx),
            Self::MapStrength           => map_veto::map_strength(ctx),
            Self::MapWeakness           => map_veto::map_weakness(ctx),
            Self::LowSampleMaps         => map_veto::low_sample_maps(ctx),
            Self::PistolTendencies      => playbook::pistol_tendencies(ctx),
            Self::SidePreference        => playbook::side_preference(ctx),
            Self::OpeningDuelDependence => playbook::opening_duel_dependence(ctx),
            Self::BelowMetaBaseline     => meta::below_baseline(ctx),
            Self::AboveMetaBaseline     => meta::above_baseline(ctx),
        }?;
        log::debug!("rule {} emitted {} candidates", self.name(), candidates.len());
        Ok(candidates)
    }
}

// ── Context ──────────────────────────────────────────────────────────

/// Read-only inputs shared by every rule in one evaluation pass.
pub struct RuleContext<'a> {
    pub bundle:     &'a MetricsBundle,
    pub tables:     &'a PreparedTables,
    pub tier:       ThresholdTier,
    pub thresholds: &'a TierThresholds,
    pub config:     &'a ReportConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        bundle: &'a MetricsBundle,
        tables: &'a PreparedTables,
        tier: ThresholdTier,
        config: &'a ReportConfig,
    ) -> Self {
        Self {
            bundle,
            tables,
            tier,
            thresholds: config.tiers.get(tier),
            config,
        }
    }

    /// Confidence from the sample-size tier, one level lower for weak effects.
    pub fn confidence(&self, n: usize, gap: f64) -> Confidence {
        let tiers = &self.config.confidence;
        let by_sample = if n >= tiers.high_min_sample {
            Confidence::High
        } else if n >= tiers.medium_min_sample {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        if gap.abs() < tiers.weak_effect {
            by_sample.downgrade()
        } else {
            by_sample
        }
    }

    /// Confidence for a finding, or None when the effect or the resulting
    /// confidence falls below this tier's floors.
    pub fn admit(&self, n: usize, gap: f64) -> Option<Confidence> {
        if !gap.is_finite() || gap.abs() < self.thresholds.min_effect {
            return None;
        }
        let confidence = self.confidence(n, gap);
        (confidence >= self.thresholds.min_confidence).then_some(confidence)
    }

    pub fn evidence(&self, table: TableName, filters: Vec<Filter>) -> EvidenceRef {
        EvidenceRef::select(self.tables, table, filters, self.config.evidence_sample_rows)
    }

    pub fn snapshot_evidence(&self, snapshot: &MetricSnapshot) -> EvidenceRef {
        self.evidence(snapshot.table, snapshot.filters.clone())
    }

    /// A snapshot the bundle is expected to carry. Its absence is a fault.
    pub fn required_snapshot(&self, rule: RuleId, name: &str) -> ScoutResult<&'a MetricSnapshot> {
        self.bundle
            .snapshot(name)
            .ok_or_else(|| ScoutError::rule_fault(rule.name(), format!("snapshot '{name}' missing")))
    }
}

/// Map a probability gap onto [0, 1]. A gap of 0.5 is the largest possible.
pub fn normalize_gap(gap: f64) -> f64 {
    (gap.abs() / 0.5).clamp(0.0, 1.0)
}

pub fn pct(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_order_matches_discriminants() {
        for (i, rule) in RuleId::ALL.iter().enumerate() {
            assert_eq!(*rule as usize, i, "{} out of order", rule.name());
        }
    }

    #[test]
    fn rule_names_are_unique() {
        let names: HashSet<_> = RuleId::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), RuleId::ALL.len());
    }

    #[test]
    fn every_category_has_two_or_three_rules() {
        for category in Category::ALL {
            let count = RuleId::ALL.iter().filter(|r| r.category() == category).count();
            assert!((2..=3).contains(&count), "{} has {count} rules", category.as_str());
        }
    }

    #[test]
    fn gaps_normalise_into_unit_range() {
        assert_eq!(normalize_gap(0.25), 0.5);
        assert_eq!(normalize_gap(-0.6), 1.0);
        assert_eq!(pct(0.778), "78%");
    }
}
