//! Tiering engine: runs every stage for one variant, or for a cohort that
//! shares a purity estimate.
//!
//! Stage order for one variant:
//!   1. Aggregate evidence from all channels
//!   2. Dynamic Somatic Confidence (tumour-only)
//!   3. VICC oncogenicity scoring
//!   4. OncoKB leveling
//!   5. AMP multi-context tiering
//!   6. DSC gating of AMP tiers (tumour-only)
//!   7. VICC-driven refinement of AMP tiers
//!   8. Overall confidence and completeness
//!
//! A failing stage is logged, recorded in `TierResult::warnings` and replaced
//! by its neutral default; classification itself never fails.

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use oncotier_common::error::check_unit_interval;
use oncotier_common::{AnalysisType, AnnotatedVariant, Guideline, Result, TieringConfig};
use oncotier_dsc::{DscCalculator, PurityEstimate, PurityEstimator};
use oncotier_evidence::EvidenceAggregator;
use oncotier_knowledge::KnowledgeProvider;

use crate::amp::score_amp;
use crate::confidence::overall_confidence;
use crate::oncokb::score_oncokb;
use crate::refine::{apply_dsc_gating, apply_vicc_refinement};
use crate::result::{AmpTier, TierResult};
use crate::vicc::score_vicc;

/// Results for a batch of variants from one sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortClassification {
    /// Purity used for every tumour-only DSC in the batch
    pub purity: PurityEstimate,
    /// One result per input variant, in input order
    pub results: Vec<TierResult>,
}

#[derive(Clone)]
pub struct TieringEngine {
    config: TieringConfig,
    aggregator: EvidenceAggregator,
    dsc: DscCalculator,
    purity: PurityEstimator,
}

impl TieringEngine {
    pub fn new(config: TieringConfig, knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Tiering configuration failed validation; affected stages will fall back to defaults");
        }
        Self {
            aggregator: EvidenceAggregator::new(Arc::clone(&knowledge)),
            dsc: DscCalculator::new(config.dsc.clone(), Arc::clone(&knowledge)),
            purity: PurityEstimator::new(config.purity.clone()).with_knowledge(knowledge),
            config,
        }
    }

    /// Engine configured from `ONCOTIER_CONFIG`, or defaults when unset.
    pub fn from_env(knowledge: Arc<dyn KnowledgeProvider>) -> anyhow::Result<Self> {
        let config = TieringConfig::load().context("Failed to load tiering configuration")?;
        Ok(Self::new(config, knowledge))
    }

    pub fn config(&self) -> &TieringConfig {
        &self.config
    }

    pub fn knowledge(&self) -> &dyn KnowledgeProvider {
        self.aggregator.knowledge()
    }

    /// Classify one variant. `purity` is only used without a matched normal.
    #[instrument(skip(self, variant), fields(variant = %variant.variant_id()))]
    pub fn classify(
        &self,
        variant: &AnnotatedVariant,
        cancer_type: &str,
        analysis_type: AnalysisType,
        purity: Option<f64>,
    ) -> TierResult {
        let mut warnings = Vec::new();

        // ── 1. Evidence ──────────────────────────────────────────────────────
        let report = self.aggregator.aggregate_with_report(variant, cancer_type, analysis_type);
        for failure in &report.failures {
            warnings.push(format!("evidence channel {}: {}", failure.channel.as_str(), failure.message));
        }
        let evidence = report.evidence;
        debug!(count = evidence.len(), "Evidence aggregated");

        // ── 2. DSC ───────────────────────────────────────────────────────────
        let dsc = if analysis_type == AnalysisType::TumorOnly {
            let purity = match purity.map(|p| check_unit_interval("purity", p)).transpose() {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "Ignoring invalid purity");
                    warnings.push(format!("purity: {}", e));
                    None
                }
            };
            match self.dsc.compute(variant, &evidence, purity) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!(error = %e, "DSC failed; skipping gating");
                    warnings.push(format!("dsc: {}", e));
                    None
                }
            }
        } else {
            None
        };

        // ── 3–5. Guideline scoring ───────────────────────────────────────────
        let vicc = stage_or_default("vicc", score_vicc(&evidence), &mut warnings);
        let oncokb = stage_or_default("oncokb", score_oncokb(&evidence), &mut warnings);
        let mut amp = stage_or_default(
            "amp",
            score_amp(&evidence, cancer_type, &self.config.amp, self.knowledge()),
            &mut warnings,
        );

        // ── 6. DSC gating ────────────────────────────────────────────────────
        if let Some(d) = &dsc {
            apply_dsc_gating(&mut amp, d, &self.config.dsc);
        }

        // ── 7. VICC refinement ───────────────────────────────────────────────
        apply_vicc_refinement(&mut amp, vicc.classification, &self.config.confidence);

        // ── 8. Summary ───────────────────────────────────────────────────────
        let confidence = overall_confidence(&evidence, &vicc, &amp, analysis_type, &self.config.confidence);
        let guidelines_with_evidence = Guideline::ALL
            .iter()
            .filter(|g| evidence.iter().any(|e| e.guideline() == **g))
            .count();
        let data_completeness = guidelines_with_evidence as f64 / Guideline::ALL.len() as f64;
        let primary_tier = amp.best_tier().unwrap_or(AmpTier::TierIII);

        info!(
            gene = variant.gene().unwrap_or("-"),
            evidence = evidence.len(),
            vicc = vicc.classification.as_str(),
            vicc_score = vicc.total_score,
            oncokb = oncokb.highest_level.map(|l| l.as_str()).unwrap_or("-"),
            tier = primary_tier.as_str(),
            dsc = ?dsc.as_ref().map(|d| d.dsc_score),
            confidence,
            warnings = warnings.len(),
            "Variant tiered"
        );

        TierResult {
            variant_id: variant.variant_id(),
            gene: variant.gene().map(str::to_string),
            hgvs_p: variant.hgvs_p.clone(),
            cancer_type: cancer_type.to_string(),
            analysis_type,
            vicc,
            oncokb,
            amp,
            dsc,
            evidence,
            primary_tier,
            overall_confidence: confidence,
            data_completeness,
            warnings,
        }
    }

    /// Classify every variant of one sample.
    ///
    /// Purity is estimated once from the whole batch (seeded by
    /// `external_purity` when given) and shared by every tumour-only DSC.
    /// Variants are independent, so with the `parallel` feature they are
    /// classified concurrently; result order always matches input order.
    #[instrument(skip(self, variants), fields(variants = variants.len()))]
    pub fn classify_cohort(
        &self,
        variants: &[AnnotatedVariant],
        cancer_type: &str,
        analysis_type: AnalysisType,
        external_purity: Option<f64>,
    ) -> CohortClassification {
        let purity = self.purity.estimate(variants, analysis_type, external_purity);
        info!(
            purity = purity.purity,
            confidence = purity.confidence,
            method = purity.method.as_str(),
            "Purity estimated for cohort"
        );

        let p = Some(purity.purity);
        let results = self.classify_all(variants, cancer_type, analysis_type, p);

        let actionable = results.iter().filter(|r| r.primary_tier.is_actionable()).count();
        info!(total = results.len(), actionable, "Cohort tiered");

        CohortClassification { purity, results }
    }

    fn classify_all(
        &self,
        variants: &[AnnotatedVariant],
        cancer_type: &str,
        analysis_type: AnalysisType,
        purity: Option<f64>,
    ) -> Vec<TierResult> {
        #[cfg(feature = "parallel")]
        {
            if variants.len() > 1 {
                use rayon::prelude::*;
                return variants
                    .par_iter()
                    .map(|v| self.classify(v, cancer_type, analysis_type, purity))
                    .collect();
            }
        }
        variants
            .iter()
            .map(|v| self.classify(v, cancer_type, analysis_type, purity))
            .collect()
    }
}

impl std::fmt::Debug for TieringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieringEngine").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Unwrap a stage result, or record the failure and use the stage default.
fn stage_or_default<T: Default>(stage: &str, outcome: Result<T>, warnings: &mut Vec<String>) -> T {
    match outcome {
        Ok(value) => value,
        Err(e) => {
            warn!(stage, error = %e, "Stage failed; using default");
            warnings.push(format!("{}: {}", stage, e));
            T::default()
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
