//! The report engine: one pure pipeline invocation per report.
//!
//! PIPELINE (fixed, one direction only):
//!   1. Validate canonical tables      (malformed input fails the run)
//!   2. Build the prepared view        (team scope, last n matches, round types)
//!   3. Metrics Engine                 (must finish before any rule runs)
//!   4. Rule Engine                    (registered rules, in parallel or in order)
//!   5. Ranking & deduplication
//!   6. Relax thresholds once and re-run 4-5 if below min_insights
//!   7. Report Assembler
//!
//! RULES:
//!   - No state survives between generate() calls.
//!   - Rules see read-only references to the same bundle and view.
//!   - A rule returning Err is logged, recorded in meta.rules_faulted,
//!     and treated as zero candidates. It never fails the report.
//!   - Nothing here reads the clock except generate_now().

use crate::{
    config::{ReportConfig, ThresholdTier},
    error::ScoutResult,
    insight::CandidateInsight,
    metrics::{self, MetricsBundle},
    ranking::{self, Ranked},
    report::{DataQuality, InsightSummary, ReportMeta, ReportParts, ScoutingReport, ENGINE_VERSION},
    rules::{map_veto, trend, RuleContext, RuleId},
    tables::{CanonicalTables, PreparedTables},
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;

/// Result of one evaluation pass at a given threshold tier.
struct Pass {
    tier:                 ThresholdTier,
    candidates_generated: usize,
    faulted:              Vec<String>,
    ranked:               Ranked,
}

impl Pass {
    fn empty() -> Self {
        Self {
            tier:                 ThresholdTier::Strict,
            candidates_generated: 0,
            faulted:              Vec::new(),
            ranked:               Ranked {
                insights:  Vec::new(),
                merged:    0,
                truncated: 0,
            },
        }
    }
}

/// Concatenated rule output of one pass, before ranking.
#[derive(Debug, Default)]
pub struct RuleOutcomes {
    pub candidates: Vec<CandidateInsight>,
    /// Names of rules that returned an error.
    pub faulted:    Vec<String>,
}

pub struct ReportEngine {
    config: ReportConfig,
    rules:  Vec<RuleId>,
}

impl ReportEngine {
    /// An engine with no rules registered. Rejects invalid configuration.
    pub fn new(config: ReportConfig) -> ScoutResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rules: Vec::new(),
        })
    }

    /// Build an engine with every rule registered in registry order.
    /// Call this instead of new() + manual register() calls.
    pub fn build(config: ReportConfig) -> ScoutResult<Self> {
        let mut engine = Self::new(config)?;
        for rule in RuleId::ALL {
            engine.register(rule);
        }
        Ok(engine)
    }

    /// Register a rule. Registration order is the final ranking tie-break.
    pub fn register(&mut self, rule: RuleId) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    /// Generate a report stamped with the current time.
    pub fn generate_now(&self, tables: &CanonicalTables, team: &str) -> ScoutResult<ScoutingReport> {
        self.generate(tables, team, Utc::now())
    }

    /// Generate a report. Identical inputs give an identical report.
    pub fn generate(
        &self,
        tables: &CanonicalTables,
        team: &str,
        generated_at: DateTime<Utc>,
    ) -> ScoutResult<ScoutingReport> {
        tables.validate()?;
        let view = PreparedTables::build(
            tables,
            team,
            self.config.matches_to_analyze,
            &self.config.economy,
        )?;
        let bundle = metrics::compute(&view, &self.config);
        let trend_alerts = trend::alerts(&bundle, &self.config.trend);
        let map_veto = map_veto::classify(&bundle, &self.config.map_veto);

        let pass = if view.is_empty() {
            log::info!("no matches for {}; skipping rules", view.team);
            Pass::empty()
        } else {
            let strict = self.evaluate(&bundle, &view, ThresholdTier::Strict);
            match ThresholdTier::Strict.relax() {
                Some(relaxed) if strict.ranked.insights.len() < self.config.min_insights => {
                    log::info!(
                        "{} insights under {} thresholds (minimum {}); relaxing to {}",
                        strict.ranked.insights.len(),
                        ThresholdTier::Strict.as_str(),
                        self.config.min_insights,
                        relaxed.as_str()
                    );
                    self.evaluate(&bundle, &view, relaxed)
                }
                _ => strict,
            }
        };

        let insights = pass.ranked.insights;
        let data_quality = if view.is_empty() {
            DataQuality::NoData
        } else if pass.tier == ThresholdTier::Strict {
            DataQuality::Complete
        } else {
            DataQuality::RelaxedThresholds
        };
        let insight_shortfall = insights.len() < self.config.min_insights;
        if insight_shortfall && !view.is_empty() {
            log::info!(
                "only {} insights for {} after relaxation (minimum {})",
                insights.len(),
                view.team,
                self.config.min_insights
            );
        }

        let meta = ReportMeta {
            data_quality,
            threshold_tier:       pass.tier,
            matches_requested:    self.config.matches_to_analyze,
            matches_found:        view.matches.len(),
            rules_evaluated:      if view.is_empty() { 0 } else { self.rules.len() },
            rules_faulted:        pass.faulted,
            candidates_generated: pass.candidates_generated,
            insight_summary:      InsightSummary::of(&insights),
            insight_shortfall,
            engine_version:       ENGINE_VERSION.to_string(),
        };

        let parts = ReportParts {
            generated_at,
            bundle,
            insights,
            trend_alerts,
            map_veto,
            meta,
        };
        Ok(ScoutingReport::assemble(parts, &view, &self.config))
    }

    /// Run every registered rule at `tier`, then rank the concatenation.
    fn evaluate(&self, bundle: &MetricsBundle, view: &PreparedTables, tier: ThresholdTier) -> Pass {
        let ctx = RuleContext::new(bundle, view, tier, &self.config);
        let RuleOutcomes { candidates, faulted } = self.run_rules(&ctx);

        let candidates_generated = candidates.len();
        log::info!(
            "{} tier: {} rules produced {candidates_generated} candidates",
            tier.as_str(),
            self.rules.len()
        );
        Pass {
            tier,
            candidates_generated,
            faulted,
            ranked: ranking::rank(candidates, &self.config),
        }
    }

    /// Evaluate every registered rule against `ctx`, isolating faults.
    /// Candidates come back in registration order.
    pub fn run_rules(&self, ctx: &RuleContext) -> RuleOutcomes {
        let outcomes: Vec<_> = if self.config.parallel_rules {
            self.rules
                .par_iter()
                .map(|rule| (*rule, rule.evaluate(ctx)))
                .collect()
        } else {
            self.rules
                .iter()
                .map(|rule| (*rule, rule.evaluate(ctx)))
                .collect()
        };

        let mut result = RuleOutcomes::default();
        for (rule, outcome) in outcomes {
            match outcome {
                Ok(found) => result.candidates.extend(found),
                Err(e) => {
                    log::warn!("rule {} faulted and was skipped: {e}", rule.name());
                    result.faulted.push(rule.name().to_string());
                }
            }
        }
        result
    }
}
