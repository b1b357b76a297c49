//! Insight records and their ordered enums.
//!
//! RULE: Severity and confidence are ordered variants, never free strings.
//! Ranking tie-breaks compare them directly.

use crate::{evidence::EvidenceRef, rules::RuleId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MED")]
    Med,
    #[serde(rename = "HIGH")]
    High,
}

impl Severity {
    /// Tier a probability gap: ≥ 0.25 HIGH, ≥ 0.15 MED, otherwise LOW.
    pub fn from_gap(gap: f64) -> Self {
        let gap = gap.abs();
        if gap >= 0.25 {
            Self::High
        } else if gap >= 0.15 {
            Self::Med
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low  => "LOW",
            Self::Med  => "MED",
            Self::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn weight(&self) -> f64 {
        match self {
            Self::High   => 1.0,
            Self::Medium => 0.7,
            Self::Low    => 0.4,
        }
    }

    pub fn downgrade(self) -> Self {
        match self {
            Self::High   => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low    => "low",
            Self::Medium => "medium",
            Self::High   => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trend,
    LossPattern,
    Agent,
    MapVeto,
    Playbook,
    Meta,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Trend,
        Category::LossPattern,
        Category::Agent,
        Category::MapVeto,
        Category::Playbook,
        Category::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend       => "trend",
            Self::LossPattern => "loss_pattern",
            Self::Agent       => "agent",
            Self::MapVeto     => "map_veto",
            Self::Playbook    => "playbook",
            Self::Meta        => "meta",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
}

impl TrendDirection {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 { Self::Improving } else { Self::Declining }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAlert {
    pub metric:       String,
    pub last_3:       f64,
    pub last_10:      f64,
    /// Percentage-point change from the baseline window to the recent one.
    pub change_pct:   f64,
    pub direction:    TrendDirection,
    pub significance: Severity,
}

// ── Candidates ───────────────────────────────────────────────────────

/// A rule's unranked finding. `effect_size` is already normalised to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateInsight {
    pub rule:           RuleId,
    pub category:       Category,
    pub metric_key:     String,
    pub title:          String,
    pub severity:       Severity,
    pub confidence:     Confidence,
    pub data_point:     String,
    pub interpretation: String,
    pub recommendation: String,
    pub what_not_to_do: Option<String>,
    pub evidence:       Vec<EvidenceRef>,
    pub effect_size:    f64,
    pub sample_size:    usize,
}

impl CandidateInsight {
    pub fn new(
        rule: RuleId,
        metric_key: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        confidence: Confidence,
    ) -> Self {
        Self {
            rule,
            category:       rule.category(),
            metric_key:     metric_key.into(),
            title:          title.into(),
            severity,
            confidence,
            data_point:     String::new(),
            interpretation: String::new(),
            recommendation: String::new(),
            what_not_to_do: None,
            evidence:       Vec::new(),
            effect_size:    0.0,
            sample_size:    0,
        }
    }

    pub fn data_point(mut self, text: impl Into<String>) -> Self {
        self.data_point = text.into();
        self
    }

    pub fn interpretation(mut self, text: impl Into<String>) -> Self {
        self.interpretation = text.into();
        self
    }

    pub fn recommend(mut self, text: impl Into<String>) -> Self {
        self.recommendation = text.into();
        self
    }

    pub fn avoid(mut self, text: impl Into<String>) -> Self {
        self.what_not_to_do = Some(text.into());
        self
    }

    pub fn evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// Record the normalised effect (clamped to [0, 1]) and its sample size.
    pub fn effect(mut self, effect_size: f64, sample_size: usize) -> Self {
        self.effect_size = if effect_size.is_finite() {
            effect_size.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.sample_size = sample_size;
        self
    }

    pub fn into_insight(self, impact_score: f64) -> Insight {
        Insight {
            title:          self.title,
            severity:       self.severity,
            confidence:     self.confidence,
            data_point:     self.data_point,
            interpretation: self.interpretation,
            recommendation: self.recommendation,
            what_not_to_do: self.what_not_to_do,
            evidence_refs:  self.evidence,
            impact_score,
            category:       self.category,
            metric_key:     self.metric_key,
            rule:           self.rule.name().to_string(),
            sample_size:    self.sample_size,
        }
    }
}

// ── Ranked insights ──────────────────────────────────────────────────

/// A ranked, final insight. Immutable once produced by ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title:          String,
    pub severity:       Severity,
    pub confidence:     Confidence,
    pub data_point:     String,
    pub interpretation: String,
    pub recommendation: String,
    pub what_not_to_do: Option<String>,
    pub evidence_refs:  Vec<EvidenceRef>,
    pub impact_score:   f64,
    pub category:       Category,
    pub metric_key:     String,
    pub rule:           String,
    pub sample_size:    usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_tiers_by_gap() {
        assert_eq!(Severity::from_gap(0.30), Severity::High);
        assert_eq!(Severity::from_gap(-0.25), Severity::High);
        assert_eq!(Severity::from_gap(0.15), Severity::Med);
        assert_eq!(Severity::from_gap(0.149), Severity::Low);
    }

    #[test]
    fn ordered_enums_compare_by_strength() {
        assert!(Severity::High > Severity::Med && Severity::Med > Severity::Low);
        assert!(Confidence::High > Confidence::Medium);
        assert_eq!(Confidence::High.downgrade(), Confidence::Medium);
        assert_eq!(Confidence::Low.downgrade(), Confidence::Low);
    }

    #[test]
    fn wire_names_match_the_output_contract() {
        assert_eq!(serde_json::to_string(&Severity::Med).unwrap(), "\"MED\"");
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"medium\"");
        assert_eq!(serde_json::to_string(&Category::LossPattern).unwrap(), "\"loss_pattern\"");
        assert_eq!(serde_json::to_string(&TrendDirection::Improving).unwrap(), "\"improving\"");
    }

    #[test]
    fn effect_is_clamped() {
        let c = CandidateInsight::new(RuleId::WinRateShift, "win_rate", "t", Severity::Low, Confidence::Low)
            .effect(1.7, 4);
        assert_eq!(c.effect_size, 1.0);
        let c = c.effect(f64::NAN, 4);
        assert_eq!(c.effect_size, 0.0);
    }
}
