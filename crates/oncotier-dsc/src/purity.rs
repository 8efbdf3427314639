//! VAF-based tumour purity estimation.
//!
//! Heterozygous clonal somatic variants sit at VAF ≈ purity / 2, so the
//! bulk of a clean VAF distribution points at the purity. Two estimators
//! read that bulk differently (modal bin, upper quantile); the more
//! confident one wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use oncotier_common::config::PurityConfig;
use oncotier_common::error::check_unit_interval;
use oncotier_common::{AnalysisType, AnnotatedVariant, Result, TierError};
use oncotier_knowledge::KnowledgeProvider;

/// Share of variants counted for full count adequacy.
const ADEQUATE_VARIANT_COUNT: f64 = 50.0;
/// Confidence of the quantile estimator relative to the peak estimator.
const QUANTILE_CONFIDENCE_SCALE: f64 = 0.8;
/// Confidence bonus at perfect agreement with a supplied prior.
const PRIOR_AGREEMENT_BONUS: f64 = 0.1;
/// Floor on the peak estimator's sharpness factor.
const MIN_PEAK_SHARPNESS: f64 = 0.3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurityMethod {
    /// Modal VAF bin of heterozygous variants
    HeterozygousPeak,
    /// Upper VAF quantile
    Quantile,
    /// Supplied by an external tool
    External,
    /// Too few usable variants; fixed fallback
    Default,
}

impl PurityMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurityMethod::HeterozygousPeak => "heterozygous_peak",
            PurityMethod::Quantile => "quantile",
            PurityMethod::External => "external",
            PurityMethod::Default => "default",
        }
    }
}

/// Summary of the VAFs an estimate was computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VafSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub q25: f64,
    pub q75: f64,
}

impl VafSummary {
    /// `sorted` must be ascending and non-empty.
    fn from_sorted(sorted: &[f64]) -> Self {
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            median: quantile(sorted, 0.5),
            std_dev: variance.sqrt(),
            q25: quantile(sorted, 0.25),
            q75: quantile(sorted, 0.75),
        }
    }

    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 { self.std_dev / self.mean } else { 1.0 }
    }
}

/// Factors whose geometric mean is the estimate's confidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PurityQuality {
    /// min(1, n / 50)
    pub count_adequacy: f64,
    /// 1 − coefficient of variation
    pub consistency: f64,
    /// 1.0 inside [0.1, 0.9], 0.6 at the edges, 0.2 otherwise
    pub plausibility: f64,
    pub method_factor: f64,
}

/// Tumour cellular fraction with a confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurityEstimate {
    pub purity: f64,
    pub confidence: f64,
    pub method: PurityMethod,
    pub variant_count: usize,
    #[serde(default)]
    pub vaf_summary: Option<VafSummary>,
    #[serde(default)]
    pub quality: Option<PurityQuality>,
    /// External prior blended into the estimate, if any
    #[serde(default)]
    pub prior: Option<f64>,
}

impl PurityEstimate {
    /// Fails unless both `purity` and `confidence` lie in [0, 1].
    pub fn new(purity: f64, confidence: f64, method: PurityMethod) -> Result<Self> {
        Ok(Self {
            purity: check_unit_interval("purity", purity)?,
            confidence: check_unit_interval("purity confidence", confidence)?,
            method,
            variant_count: 0,
            vaf_summary: None,
            quality: None,
            prior: None,
        })
    }

    /// An externally measured purity, taken at face value.
    pub fn external(purity: f64) -> Result<Self> {
        let mut estimate = Self::new(purity, 1.0, PurityMethod::External)?;
        estimate.prior = Some(purity);
        Ok(estimate)
    }
}

/// Estimates purity from a cohort of variants from one sample.
#[derive(Clone)]
pub struct PurityEstimator {
    config: PurityConfig,
    knowledge: Option<Arc<dyn KnowledgeProvider>>,
}

impl PurityEstimator {
    pub fn new(config: PurityConfig) -> Self {
        Self { config, knowledge: None }
    }

    /// Gene roles let tumour-only estimation favour cancer-gene variants.
    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn config(&self) -> &PurityConfig {
        &self.config
    }

    /// Never fails: unusable input produces the low-confidence fallback.
    pub fn estimate(
        &self,
        variants: &[AnnotatedVariant],
        analysis_type: AnalysisType,
        prior: Option<f64>,
    ) -> PurityEstimate {
        let prior = match prior.map(|p| check_unit_interval("prior purity", p)).transpose() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Ignoring out-of-range prior purity");
                None
            }
        };

        match self.try_estimate(variants, analysis_type, prior) {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!(error = %e, "Purity estimation failed; using fallback");
                self.fallback(prior, 0)
            }
        }
    }

    fn try_estimate(
        &self,
        variants: &[AnnotatedVariant],
        analysis_type: AnalysisType,
        prior: Option<f64>,
    ) -> Result<PurityEstimate> {
        let mut vafs = self.usable_vafs(variants, analysis_type);
        if vafs.len() < self.config.min_variants {
            debug!(usable = vafs.len(), required = self.config.min_variants, "Too few variants for purity estimation");
            return Ok(self.fallback(prior, vafs.len()));
        }
        vafs.sort_by(|a, b| a.total_cmp(b));

        let summary = VafSummary::from_sorted(&vafs);
        let peak = self.peak_estimate(&vafs, &summary)?;
        let quantile = self.quantile_estimate(&vafs, &summary)?;
        // Ties go to the peak estimate.
        let mut best = if quantile.confidence > peak.confidence { quantile } else { peak };

        best.variant_count = vafs.len();
        best.vaf_summary = Some(summary);

        if let Some(p) = prior {
            let blend = self.config.prior_blend;
            let agreement = 1.0 - (best.purity - p).abs();
            best.purity = ((1.0 - blend) * best.purity + blend * p).clamp(0.0, 1.0);
            best.confidence = (best.confidence + PRIOR_AGREEMENT_BONUS * agreement).min(self.config.max_confidence);
            best.prior = Some(p);
        }

        debug!(
            purity = best.purity,
            confidence = best.confidence,
            method = best.method.as_str(),
            variants = best.variant_count,
            "Purity estimated"
        );
        PurityEstimate::new(best.purity, best.confidence, best.method).map(|checked| PurityEstimate {
            purity: checked.purity,
            confidence: checked.confidence,
            ..best
        })
    }

    /// Fallback estimate. A supplied prior is kept in preference to the fixed default.
    fn fallback(&self, prior: Option<f64>, variant_count: usize) -> PurityEstimate {
        let (purity, method) = match prior {
            Some(p) => (p, PurityMethod::External),
            None => (self.config.fallback_purity.clamp(0.0, 1.0), PurityMethod::Default),
        };
        PurityEstimate {
            purity,
            confidence: self.config.fallback_confidence.clamp(0.0, 1.0),
            method,
            variant_count,
            vaf_summary: None,
            quality: None,
            prior,
        }
    }

    /// VAFs passing quality bounds, narrowed to SNVs and, in tumour-only
    /// mode, to supported variants whenever enough of them remain.
    fn usable_vafs(&self, variants: &[AnnotatedVariant], analysis_type: AnalysisType) -> Vec<f64> {
        let cfg = &self.config;
        let passing: Vec<&AnnotatedVariant> = variants
            .iter()
            .filter(|v| v.is_pass())
            .filter(|v| v.total_depth.is_some_and(|d| d >= cfg.min_depth))
            .filter(|v| {
                v.vaf
                    .is_some_and(|f| f.is_finite() && f >= cfg.min_vaf && f <= cfg.max_vaf)
            })
            .collect();

        let mut selected = passing;
        let snvs: Vec<&AnnotatedVariant> = selected.iter().copied().filter(|v| v.is_snv()).collect();
        if snvs.len() >= cfg.min_variants {
            selected = snvs;
        }

        if !analysis_type.has_matched_normal() {
            let supported: Vec<&AnnotatedVariant> =
                selected.iter().copied().filter(|v| self.is_supported(v)).collect();
            if supported.len() >= cfg.min_variants {
                selected = supported;
            }
        }

        selected.iter().filter_map(|v| v.vaf).collect()
    }

    fn is_supported(&self, variant: &AnnotatedVariant) -> bool {
        let hotspot = variant.max_hotspot_samples().is_some_and(|n| n > 0);
        let cancer_gene = match (&self.knowledge, variant.gene()) {
            (Some(kb), Some(gene)) => kb
                .gene_role(gene)
                .is_some_and(|r| r.cancer_gene_census || r.oncogene || r.tumor_suppressor),
            _ => false,
        };
        hotspot || cancer_gene || variant.is_impactful()
    }

    fn peak_estimate(&self, sorted: &[f64], summary: &VafSummary) -> Result<PurityEstimate> {
        let width = self.config.bin_width;
        if !(width > 0.0 && width <= 0.5) {
            return Err(TierError::Config(format!("purity bin width {} outside (0, 0.5]", width)));
        }
        let bins = (1.0 / width).ceil() as usize;
        let mut counts = vec![0usize; bins];
        for v in sorted {
            let idx = ((v / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }
        // First (lowest) bin among equal maxima.
        let (mode_idx, _) = counts
            .iter()
            .enumerate()
            .fold((0, 0), |(bi, bc), (i, &c)| if c > bc { (i, c) } else { (bi, bc) });
        let center = (mode_idx as f64 + 0.5) * width;
        let purity = (2.0 * center).min(1.0);

        let neighbourhood: usize = counts
            [mode_idx.saturating_sub(1)..=(mode_idx + 1).min(bins - 1)]
            .iter()
            .sum();
        let sharpness = (neighbourhood as f64 / sorted.len() as f64).max(MIN_PEAK_SHARPNESS);

        let quality = self.quality(sorted.len(), summary, purity, sharpness);
        let confidence = self.combine(&quality);
        let mut estimate = PurityEstimate::new(purity, confidence, PurityMethod::HeterozygousPeak)?;
        estimate.quality = Some(quality);
        Ok(estimate)
    }

    fn quantile_estimate(&self, sorted: &[f64], summary: &VafSummary) -> Result<PurityEstimate> {
        let q = check_unit_interval("purity quantile", self.config.quantile)?;
        let purity = (2.0 * quantile(sorted, q)).min(1.0);
        let quality = self.quality(sorted.len(), summary, purity, 1.0);
        let confidence = self.combine(&quality) * QUANTILE_CONFIDENCE_SCALE;
        let mut estimate = PurityEstimate::new(purity, confidence, PurityMethod::Quantile)?;
        estimate.quality = Some(quality);
        Ok(estimate)
    }

    fn quality(&self, n: usize, summary: &VafSummary, purity: f64, method_factor: f64) -> PurityQuality {
        PurityQuality {
            count_adequacy: (n as f64 / ADEQUATE_VARIANT_COUNT).min(1.0),
            consistency: (1.0 - summary.coefficient_of_variation()).clamp(0.0, 1.0),
            plausibility: plausibility(purity),
            method_factor,
        }
    }

    fn combine(&self, q: &PurityQuality) -> f64 {
        let product = q.count_adequacy * q.consistency * q.plausibility * q.method_factor;
        product.max(0.0).powf(0.25).min(self.config.max_confidence)
    }
}

impl std::fmt::Debug for PurityEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurityEstimator")
            .field("config", &self.config)
            .field("knowledge", &self.knowledge.is_some())
            .finish()
    }
}

fn plausibility(purity: f64) -> f64 {
    if (0.1..=0.9).contains(&purity) {
        1.0
    } else if (0.05..=1.0).contains(&purity) {
        0.6
    } else {
        0.2
    }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(vaf: f64, depth: u32) -> AnnotatedVariant {
        AnnotatedVariant {
            vaf: Some(vaf),
            total_depth: Some(depth),
            consequences: vec!["missense_variant".to_string()],
            ..AnnotatedVariant::new("1", 1000, "A", "G")
        }
    }

    /// VAFs clustered tightly around `centre`.
    fn cohort(centre: f64, n: usize) -> Vec<AnnotatedVariant> {
        (0..n)
            .map(|i| {
                let jitter = ((i % 5) as f64 - 2.0) * 0.005;
                variant(centre + jitter, 150)
            })
            .collect()
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(PurityEstimate::new(1.2, 0.5, PurityMethod::Quantile).is_err());
        assert!(PurityEstimate::new(0.5, -0.1, PurityMethod::Quantile).is_err());
        assert!(PurityEstimate::new(f64::NAN, 0.5, PurityMethod::Quantile).is_err());
        assert!(PurityEstimate::new(0.0, 1.0, PurityMethod::Quantile).is_ok());
    }

    #[test]
    fn test_too_few_variants_falls_back() {
        let estimator = PurityEstimator::new(PurityConfig::default());
        let est = estimator.estimate(&cohort(0.4, 9), AnalysisType::TumorNormal, None);
        assert_eq!(est.method, PurityMethod::Default);
        assert!((est.purity - 0.5).abs() < 1e-9);
        assert!((est.confidence - 0.2).abs() < 1e-9);
        assert_eq!(est.variant_count, 9);
    }

    #[test]
    fn test_fallback_keeps_prior() {
        let estimator = PurityEstimator::new(PurityConfig::default());
        let est = estimator.estimate(&[], AnalysisType::TumorOnly, Some(0.65));
        assert_eq!(est.method, PurityMethod::External);
        assert!((est.purity - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_filters_drop_low_quality_variants() {
        let mut variants = cohort(0.3, 12);
        // Shallow, failing and out-of-range entries never count.
        variants.push(variant(0.3, 5));
        variants.push(AnnotatedVariant { filter_status: "LowQual".into(), ..variant(0.3, 200) });
        variants.push(variant(0.99, 200));
        variants.push(variant(0.01, 200));
        let estimator = PurityEstimator::new(PurityConfig::default());
        let est = estimator.estimate(&variants, AnalysisType::TumorNormal, None);
        assert_eq!(est.variant_count, 12);
    }

    #[test]
    fn test_heterozygous_peak_recovers_purity() {
        let estimator = PurityEstimator::new(PurityConfig::default());
        let est = estimator.estimate(&cohort(0.32, 60), AnalysisType::TumorNormal, None);
        assert_eq!(est.method, PurityMethod::HeterozygousPeak);
        // Modal bin [0.30, 0.35) -> centre 0.325 -> purity 0.65
        assert!((est.purity - 0.65).abs() < 1e-9);
        assert!(est.confidence > 0.8);
        assert!(est.confidence <= 0.95);
        let summary = est.vaf_summary.unwrap();
        assert!((summary.median - 0.32).abs() < 0.01);
    }

    #[test]
    fn test_prior_blending() {
        let estimator = PurityEstimator::new(PurityConfig::default());
        let plain = estimator.estimate(&cohort(0.32, 60), AnalysisType::TumorNormal, None);
        let blended = estimator.estimate(&cohort(0.32, 60), AnalysisType::TumorNormal, Some(0.85));
        assert!((blended.purity - (0.7 * plain.purity + 0.3 * 0.85)).abs() < 1e-9);
        assert!(blended.confidence >= plain.confidence);
        assert!(blended.confidence <= 0.95);
        assert_eq!(blended.prior, Some(0.85));
    }

    #[test]
    fn test_invalid_prior_ignored() {
        let estimator = PurityEstimator::new(PurityConfig::default());
        let est = estimator.estimate(&cohort(0.32, 60), AnalysisType::TumorNormal, Some(3.0));
        assert_eq!(est.prior, None);
    }

    #[test]
    fn test_estimates_always_in_unit_interval() {
        let estimator = PurityEstimator::new(PurityConfig::default());
        for centre in [0.06, 0.2, 0.45, 0.6, 0.9] {
            let est = estimator.estimate(&cohort(centre, 40), AnalysisType::TumorOnly, None);
            assert!((0.0..=1.0).contains(&est.purity), "centre={}", centre);
            assert!((0.0..=1.0).contains(&est.confidence), "centre={}", centre);
        }
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [0.1, 0.2, 0.3, 0.4, 0.5];
        assert!((quantile(&sorted, 0.75) - 0.4).abs() < 1e-12);
        assert!((quantile(&sorted, 0.5) - 0.3).abs() < 1e-12);
        assert!((quantile(&[0.7], 0.25) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_plausibility_bands() {
        assert_eq!(plausibility(0.5), 1.0);
        assert_eq!(plausibility(0.95), 0.6);
        assert_eq!(plausibility(0.07), 0.6);
        assert_eq!(plausibility(0.01), 0.2);
    }
}
