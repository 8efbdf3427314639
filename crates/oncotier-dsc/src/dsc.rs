//! Dynamic Somatic Confidence.
//!
//! Three modules, combined by weighted average:
//!
//! 1. VAF/purity consistency: how well the VAF fits a somatic scenario at the
//!    given purity (absent without purity or VAF).
//! 2. Prior probability: hotspot, clinical and gene-role support against
//!    population frequency and germline evidence.
//! 3. Genomic context: reserved, always absent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use oncotier_common::config::DscConfig;
use oncotier_common::error::check_unit_interval;
use oncotier_common::{AnnotatedVariant, Evidence, EvidenceCode, Result, TierError, ViccCriterion};
use oncotier_knowledge::KnowledgeProvider;

// ── Module 1 constants ──────────────────────────────────────────────────────

/// VAF above purity by more than this cannot be a somatic heterozygous call.
const EXCESS_VAF_MARGIN: f64 = 0.1;
/// Half-width of the germline heterozygous window around 0.5 (exclusive).
const GERMLINE_HET_WINDOW: f64 = 0.05;
const WINDOW_EPSILON: f64 = 1e-9;
const LOW_VAF: f64 = 0.05;
const HIGH_PURITY: f64 = 0.7;

const HET_TOLERANCE: f64 = 0.25;
const HOM_TOLERANCE: f64 = 0.30;
const HOM_MIN_VAF: f64 = 0.3;
const HOM_PENALTY: f64 = 0.9;

const HIGH_DEPTH: u32 = 100;
const LOH_BONUS: f64 = 0.05;
const DEPTH_BONUS: f64 = 0.05;

// ── Module 2 constants ──────────────────────────────────────────────────────

const PRIOR_BASE: f64 = 0.5;
const RARE_THRESHOLD: f64 = 0.001;
const COMMON_THRESHOLD: f64 = 0.05;
const MAX_FREQUENCY_PENALTY: f64 = 0.4;
const GERMLINE_PENALTY: f64 = 0.3;
const PREDISPOSITION_PENALTY: f64 = 0.1;
const STRONG_EVIDENCE_CONFIDENCE: f64 = 0.8;

/// Dynamic Somatic Confidence for one variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DynamicSomaticConfidence {
    pub dsc_score: f64,
    /// Module 1; absent without purity or VAF
    pub vaf_purity_score: Option<f64>,
    /// Module 2
    pub prior_probability_score: f64,
    /// Module 3; not produced yet
    pub genomic_context_score: Option<f64>,
    pub purity: Option<f64>,
    pub vaf: Option<f64>,
    pub hotspot_support: bool,
    pub clinvar_germline_support: bool,
    pub dsc_confidence: f64,
}

/// Computes [`DynamicSomaticConfidence`] from a variant and its evidence.
#[derive(Clone)]
pub struct DscCalculator {
    config: DscConfig,
    knowledge: Arc<dyn KnowledgeProvider>,
}

impl DscCalculator {
    pub fn new(config: DscConfig, knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        Self { config, knowledge }
    }

    pub fn compute(
        &self,
        variant: &AnnotatedVariant,
        evidence: &[Evidence],
        purity: Option<f64>,
    ) -> Result<DynamicSomaticConfidence> {
        let purity = purity.map(|p| check_unit_interval("purity", p)).transpose()?;
        let vaf = match variant.vaf {
            Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Some(v),
            Some(v) => {
                debug!(variant = %variant.variant_id(), vaf = v, "Ignoring out-of-range VAF");
                None
            }
            None => None,
        };

        let role = variant.gene().and_then(|g| self.knowledge.gene_role(g)).unwrap_or_default();

        let vaf_purity_score = match (vaf, purity) {
            (Some(v), Some(p)) => Some(vaf_purity_consistency(v, p, variant.total_depth, role.tumor_suppressor)),
            _ => None,
        };

        let hotspot_support = evidence.iter().any(|e| {
            matches!(
                e.vicc_criterion(),
                Some(ViccCriterion::Os3 | ViccCriterion::Om3 | ViccCriterion::Op3)
            )
        });
        let clinvar_germline_support = has_germline_support(variant);
        let max_frequency = self.max_population_frequency(variant);
        let prior_probability_score =
            prior_probability(evidence, max_frequency, clinvar_germline_support, role.predisposition);
        let genomic_context_score: Option<f64> = None;

        let dsc_score = self.combine(vaf_purity_score, prior_probability_score, genomic_context_score)?;
        let dsc_confidence = dsc_confidence(
            [vaf_purity_score, Some(prior_probability_score), genomic_context_score],
            evidence,
            max_frequency.is_some(),
        );

        debug!(
            variant = %variant.variant_id(),
            dsc = dsc_score,
            vaf_purity = ?vaf_purity_score,
            prior = prior_probability_score,
            "DSC computed"
        );

        Ok(DynamicSomaticConfidence {
            dsc_score,
            vaf_purity_score,
            prior_probability_score,
            genomic_context_score,
            purity,
            vaf,
            hotspot_support,
            clinvar_germline_support,
            dsc_confidence,
        })
    }

    /// Weighted average over the modules that produced a score, plus the
    /// synergy bonus when modules 1 and 2 both clear the threshold.
    fn combine(&self, vaf_purity: Option<f64>, prior: f64, genomic: Option<f64>) -> Result<f64> {
        let cfg = &self.config;
        let weighted = [
            (vaf_purity, cfg.vaf_purity_weight),
            (Some(prior), cfg.prior_weight),
            (genomic, cfg.genomic_context_weight),
        ];
        let (sum, weight) = weighted
            .iter()
            .filter_map(|(score, w)| score.map(|s| (s * w, *w)))
            .fold((0.0, 0.0), |(s, tw), (x, w)| (s + x, tw + w));
        if weight <= 0.0 {
            return Err(TierError::Config("DSC module weights sum to zero".to_string()));
        }
        let mut score = sum / weight;

        if let Some(m1) = vaf_purity {
            if m1 > cfg.synergy_threshold && prior > cfg.synergy_threshold {
                score += cfg.synergy_factor * m1.min(prior);
            }
        }
        Ok(score.clamp(0.0, 1.0))
    }

    /// Highest population frequency over the variant's own records and
    /// knowledge-base records for populations the variant does not carry.
    fn max_population_frequency(&self, variant: &AnnotatedVariant) -> Option<f64> {
        let kb_records = match (variant.gene(), variant.hgvs_p.as_deref()) {
            (Some(gene), Some(protein)) => self.knowledge.population_frequencies(gene, protein),
            _ => vec![],
        };
        let own = &variant.population_frequencies;
        kb_records
            .iter()
            .filter(|kb| !own.iter().any(|r| r.population.eq_ignore_ascii_case(&kb.population)))
            .map(|kb| kb.frequency)
            .filter(|f| f.is_finite())
            .fold(variant.max_population_frequency(), |acc, f| Some(acc.map_or(f, |a: f64| a.max(f))))
    }
}

impl std::fmt::Debug for DscCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DscCalculator").field("config", &self.config).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Module 1: VAF/purity consistency
// ---------------------------------------------------------------------------

/// Germline-heterozygous window: strictly within 0.05 of 0.5.
pub fn is_near_half(vaf: f64) -> bool {
    (vaf - 0.5).abs() < GERMLINE_HET_WINDOW - WINDOW_EPSILON
}

/// Fit of `vaf` to the best somatic scenario at `purity`, in [0, 1].
pub fn vaf_purity_consistency(vaf: f64, purity: f64, depth: Option<u32>, tumor_suppressor: bool) -> f64 {
    // Suspicious patterns short-circuit scenario scoring.
    if vaf > purity + EXCESS_VAF_MARGIN {
        return if is_near_half(vaf) { 0.1 } else { 0.4 };
    }
    if is_near_half(vaf) {
        return 0.2;
    }
    if vaf < LOW_VAF && purity > HIGH_PURITY {
        return 0.3;
    }
    if purity <= f64::EPSILON {
        return 0.0;
    }

    let heterozygous = scenario_fit(vaf, purity / 2.0, HET_TOLERANCE);
    let homozygous = if vaf > HOM_MIN_VAF {
        scenario_fit(vaf, purity, HOM_TOLERANCE) * HOM_PENALTY
    } else {
        0.0
    };
    let half = purity / 2.0;
    let subclonal = if vaf >= LOW_VAF && vaf < half { 0.6 + 0.2 * (vaf / half) } else { 0.0 };

    let mut score = heterozygous.max(homozygous).max(subclonal);
    if tumor_suppressor && homozygous >= 0.7 {
        score += LOH_BONUS;
    }
    if depth.is_some_and(|d| d >= HIGH_DEPTH) {
        score += DEPTH_BONUS;
    }
    score.clamp(0.0, 1.0)
}

/// 1.0 at the expected VAF, 0.8 at the tolerance edge, then linear decay.
fn scenario_fit(vaf: f64, expected: f64, relative_tolerance: f64) -> f64 {
    let tolerance = relative_tolerance * expected;
    if tolerance <= 0.0 {
        return 0.0;
    }
    let deviation = (vaf - expected).abs();
    if deviation <= tolerance {
        1.0 - 0.2 * (deviation / tolerance)
    } else {
        (0.8 - 0.4 * (deviation - tolerance) / tolerance).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Module 2: prior probability
// ---------------------------------------------------------------------------

fn has_germline_support(variant: &AnnotatedVariant) -> bool {
    variant.clinical_evidence.iter().any(|r| {
        r.evidence_type.to_lowercase().contains("predispos")
            || r.significance.as_deref().is_some_and(|s| s.to_lowercase().contains("germline"))
    })
}

fn is_clinical(e: &Evidence) -> bool {
    match e.code {
        EvidenceCode::Amp { .. } | EvidenceCode::OncoKb { .. } => true,
        EvidenceCode::Vicc { criterion } => criterion == ViccCriterion::Os2,
    }
}

pub fn prior_probability(
    evidence: &[Evidence],
    max_frequency: Option<f64>,
    germline_support: bool,
    predisposition_gene: bool,
) -> f64 {
    let mut score = PRIOR_BASE;
    let has = |c: ViccCriterion| evidence.iter().any(|e| e.vicc_criterion() == Some(c));

    score += if has(ViccCriterion::Os3) {
        0.4
    } else if has(ViccCriterion::Om3) {
        0.3
    } else if has(ViccCriterion::Op3) {
        0.2
    } else {
        0.0
    };

    let clinical: Vec<&Evidence> = evidence.iter().filter(|e| is_clinical(e)).collect();
    if clinical.iter().any(|e| e.confidence >= STRONG_EVIDENCE_CONFIDENCE) {
        score += 0.3;
    } else if !clinical.is_empty() {
        score += 0.15;
    }

    if has(ViccCriterion::Ovs1) {
        score += 0.3;
    } else if has(ViccCriterion::Os1) {
        score += 0.2;
    }

    if let Some(af) = max_frequency {
        if af > RARE_THRESHOLD {
            score -= MAX_FREQUENCY_PENALTY * (af / COMMON_THRESHOLD).min(1.0);
        }
    }
    if germline_support {
        score -= GERMLINE_PENALTY;
    }
    if predisposition_gene {
        score -= PREDISPOSITION_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Meta-confidence
// ---------------------------------------------------------------------------

fn dsc_confidence(modules: [Option<f64>; 3], evidence: &[Evidence], has_population_data: bool) -> f64 {
    let available = modules.iter().filter(|m| m.is_some()).count() as f64;
    let mut confidence = 0.5 + 0.2 * available;
    if evidence.iter().any(|e| e.confidence > 0.9) {
        confidence += 0.2;
    }
    if has_population_data {
        confidence += 0.1;
    }
    confidence.clamp(0.1, 1.0)
}

// ── Tests ───────────────────────────────────────────────────────────────────
