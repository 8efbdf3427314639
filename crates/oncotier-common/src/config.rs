//! Tiering configuration.
//!
//! Every knob has a documented default; a config file only needs the values
//! it overrides. Files may be TOML or YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TierError};

/// Environment variable naming the config file read by [`TieringConfig::load`].
pub const CONFIG_ENV_VAR: &str = "ONCOTIER_CONFIG";

/// Complete tiering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TieringConfig {
    /// AMP tier bands
    #[serde(default)]
    pub amp: AmpThresholds,

    /// Dynamic Somatic Confidence weighting and gates
    #[serde(default)]
    pub dsc: DscConfig,

    /// Purity estimation bounds
    #[serde(default)]
    pub purity: PurityConfig,

    /// Confidence multipliers and penalties
    #[serde(default)]
    pub confidence: ConfidenceConfig,
}

// ── AMP thresholds ────────────────────────────────────────────────────────────

/// Minimum context evidence score for each AMP tier band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmpThresholds {
    #[serde(default = "default_tier_ia")]
    pub tier_ia: f64,
    #[serde(default = "default_tier_ib")]
    pub tier_ib: f64,
    #[serde(default = "default_tier_iic")]
    pub tier_iic: f64,
    #[serde(default = "default_tier_iid")]
    pub tier_iid: f64,
    #[serde(default = "default_tier_iie")]
    pub tier_iie: f64,
    /// Contexts scoring below this are not assigned at all
    #[serde(default = "default_min_context_score")]
    pub min_context_score: f64,
}

fn default_tier_ia() -> f64 { 0.80 }
fn default_tier_ib() -> f64 { 0.60 }
fn default_tier_iic() -> f64 { 0.40 }
fn default_tier_iid() -> f64 { 0.20 }
fn default_tier_iie() -> f64 { 0.10 }
fn default_min_context_score() -> f64 { 0.10 }

impl Default for AmpThresholds {
    fn default() -> Self {
        Self {
            tier_ia: default_tier_ia(),
            tier_ib: default_tier_ib(),
            tier_iic: default_tier_iic(),
            tier_iid: default_tier_iid(),
            tier_iie: default_tier_iie(),
            min_context_score: default_min_context_score(),
        }
    }
}

// ── DSC ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DscConfig {
    /// Weight of the prior-probability module
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f64,
    /// Weight of the VAF/purity consistency module
    #[serde(default = "default_vaf_purity_weight")]
    pub vaf_purity_weight: f64,
    /// Weight of the genomic-context module (used once that module produces scores)
    #[serde(default = "default_genomic_context_weight")]
    pub genomic_context_weight: f64,
    /// Both module scores must exceed this for the synergy bonus
    #[serde(default = "default_synergy_threshold")]
    pub synergy_threshold: f64,
    /// Bonus = factor × min(module1, module2)
    #[serde(default = "default_synergy_factor")]
    pub synergy_factor: f64,
    /// Tier IA/IB require a DSC strictly above this
    #[serde(default = "default_tier_i_gate")]
    pub tier_i_gate: f64,
    /// Tier IIC/IID/IIE require a DSC strictly above this
    #[serde(default = "default_tier_ii_gate")]
    pub tier_ii_gate: f64,
}

fn default_prior_weight() -> f64 { 0.6 }
fn default_vaf_purity_weight() -> f64 { 0.4 }
fn default_genomic_context_weight() -> f64 { 0.2 }
fn default_synergy_threshold() -> f64 { 0.8 }
fn default_synergy_factor() -> f64 { 0.1 }
fn default_tier_i_gate() -> f64 { 0.9 }
fn default_tier_ii_gate() -> f64 { 0.6 }

impl Default for DscConfig {
    fn default() -> Self {
        Self {
            prior_weight: default_prior_weight(),
            vaf_purity_weight: default_vaf_purity_weight(),
            genomic_context_weight: default_genomic_context_weight(),
            synergy_threshold: default_synergy_threshold(),
            synergy_factor: default_synergy_factor(),
            tier_i_gate: default_tier_i_gate(),
            tier_ii_gate: default_tier_ii_gate(),
        }
    }
}

// ── Purity ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurityConfig {
    #[serde(default = "default_min_variants")]
    pub min_variants: usize,
    #[serde(default = "default_min_vaf")]
    pub min_vaf: f64,
    #[serde(default = "default_max_vaf")]
    pub max_vaf: f64,
    #[serde(default = "default_min_depth")]
    pub min_depth: u32,
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    /// Share of an external prior in the blended estimate
    #[serde(default = "default_prior_blend")]
    pub prior_blend: f64,
    #[serde(default = "default_fallback_purity")]
    pub fallback_purity: f64,
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
    #[serde(default = "default_max_confidence")]
    pub max_confidence: f64,
}

fn default_min_variants() -> usize { 10 }
fn default_min_vaf() -> f64 { 0.05 }
fn default_max_vaf() -> f64 { 0.95 }
fn default_min_depth() -> u32 { 20 }
fn default_bin_width() -> f64 { 0.05 }
fn default_quantile() -> f64 { 0.75 }
fn default_prior_blend() -> f64 { 0.3 }
fn default_fallback_purity() -> f64 { 0.5 }
fn default_fallback_confidence() -> f64 { 0.2 }
fn default_max_confidence() -> f64 { 0.95 }

impl Default for PurityConfig {
    fn default() -> Self {
        Self {
            min_variants: default_min_variants(),
            min_vaf: default_min_vaf(),
            max_vaf: default_max_vaf(),
            min_depth: default_min_depth(),
            bin_width: default_bin_width(),
            quantile: default_quantile(),
            prior_blend: default_prior_blend(),
            fallback_purity: default_fallback_purity(),
            fallback_confidence: default_fallback_confidence(),
            max_confidence: default_max_confidence(),
        }
    }
}

// ── Confidence ────────────────────────────────────────────────────────────────

/// Empirical multipliers applied during refinement and overall confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceConfig {
    /// Subtracted from the overall confidence when there is no matched normal
    #[serde(default = "default_tumor_only_penalty")]
    pub tumor_only_penalty: f64,
    /// Added when VICC and AMP point the same way
    #[serde(default = "default_consistency_bonus")]
    pub consistency_bonus: f64,
    #[serde(default = "default_benign_factor")]
    pub benign_factor: f64,
    #[serde(default = "default_uncertain_factor")]
    pub uncertain_factor: f64,
    #[serde(default = "default_oncogenic_boost")]
    pub oncogenic_boost: f64,
    #[serde(default = "default_likely_oncogenic_boost")]
    pub likely_oncogenic_boost: f64,
}

fn default_tumor_only_penalty() -> f64 { 0.2 }
fn default_consistency_bonus() -> f64 { 0.1 }
fn default_benign_factor() -> f64 { 0.8 }
fn default_uncertain_factor() -> f64 { 0.9 }
fn default_oncogenic_boost() -> f64 { 1.10 }
fn default_likely_oncogenic_boost() -> f64 { 1.05 }

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            tumor_only_penalty: default_tumor_only_penalty(),
            consistency_bonus: default_consistency_bonus(),
            benign_factor: default_benign_factor(),
            uncertain_factor: default_uncertain_factor(),
            oncogenic_boost: default_oncogenic_boost(),
            likely_oncogenic_boost: default_likely_oncogenic_boost(),
        }
    }
}

// ── Loading and validation ───────────────────────────────────────────────────

impl TieringConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(TierError::Config(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Load the file named by `ONCOTIER_CONFIG`, or defaults when it is unset.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                if !Path::new(&path).exists() {
                    return Err(TierError::Config(format!("Config file not found: {}", path)));
                }
                tracing::info!(path = %path, "Loading tiering configuration");
                Self::from_path(&path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Reject settings that would make the decision ladders incoherent.
    pub fn validate(&self) -> Result<()> {
        let a = &self.amp;
        let bands = [a.tier_ia, a.tier_ib, a.tier_iic, a.tier_iid, a.tier_iie];
        if bands.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(TierError::Config("AMP thresholds must lie in [0, 1]".into()));
        }
        if bands.windows(2).any(|w| w[0] < w[1]) {
            return Err(TierError::Config(format!(
                "AMP thresholds must be non-increasing from IA to IIE: {:?}",
                bands
            )));
        }

        let d = &self.dsc;
        for (name, w) in [
            ("dsc.prior_weight", d.prior_weight),
            ("dsc.vaf_purity_weight", d.vaf_purity_weight),
            ("dsc.genomic_context_weight", d.genomic_context_weight),
            ("dsc.tier_i_gate", d.tier_i_gate),
            ("dsc.tier_ii_gate", d.tier_ii_gate),
            ("dsc.synergy_threshold", d.synergy_threshold),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(TierError::Config(format!("{} must lie in [0, 1], got {}", name, w)));
            }
        }
        if d.prior_weight + d.vaf_purity_weight <= 0.0 {
            return Err(TierError::Config("DSC module weights must not all be zero".into()));
        }

        let c = &self.confidence;
        for (name, factor) in [
            ("dsc.synergy_factor", d.synergy_factor),
            ("confidence.benign_factor", c.benign_factor),
            ("confidence.uncertain_factor", c.uncertain_factor),
            ("confidence.oncogenic_boost", c.oncogenic_boost),
            ("confidence.likely_oncogenic_boost", c.likely_oncogenic_boost),
        ] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(TierError::Config(format!("{} must be a positive number, got {}", name, factor)));
            }
        }
        for (name, adjustment) in [
            ("confidence.tumor_only_penalty", c.tumor_only_penalty),
            ("confidence.consistency_bonus", c.consistency_bonus),
        ] {
            if !(0.0..=1.0).contains(&adjustment) {
                return Err(TierError::Config(format!("{} must lie in [0, 1], got {}", name, adjustment)));
            }
        }

        let p = &self.purity;
        if p.min_variants == 0 {
            return Err(TierError::Config("purity.min_variants must be at least 1".into()));
        }
        if p.min_vaf >= p.max_vaf {
            return Err(TierError::Config(format!(
                "purity VAF bounds inverted: [{}, {}]",
                p.min_vaf, p.max_vaf
            )));
        }
        if p.bin_width <= 0.0 || p.bin_width > 0.5 {
            return Err(TierError::Config(format!("purity bin width out of range: {}", p.bin_width)));
        }
        if !(0.0..=1.0).contains(&p.quantile) || !(0.0..=1.0).contains(&p.prior_blend) {
            return Err(TierError::Config("purity quantile and prior blend must lie in [0, 1]".into()));
        }
        for (name, v) in [
            ("purity.fallback_purity", p.fallback_purity),
            ("purity.fallback_confidence", p.fallback_confidence),
            ("purity.max_confidence", p.max_confidence),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(TierError::Config(format!("{} must lie in [0, 1], got {}", name, v)));
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
