//! Scoring objects and the aggregate [`TierResult`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use oncotier_common::{ActionabilityContext, AnalysisType, Evidence, EvidenceStrength, OncoKbLevel, ViccCriterion};
use oncotier_dsc::DynamicSomaticConfidence;

// ---------------------------------------------------------------------------
// VICC
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViccClassification {
    Oncogenic,
    LikelyOncogenic,
    UncertainSignificance,
    LikelyBenign,
    Benign,
}

impl ViccClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViccClassification::Oncogenic => "Oncogenic",
            ViccClassification::LikelyOncogenic => "Likely Oncogenic",
            ViccClassification::UncertainSignificance => "Uncertain Significance",
            ViccClassification::LikelyBenign => "Likely Benign",
            ViccClassification::Benign => "Benign",
        }
    }

    pub fn is_oncogenic(&self) -> bool {
        matches!(self, ViccClassification::Oncogenic | ViccClassification::LikelyOncogenic)
    }

    pub fn is_benign(&self) -> bool {
        matches!(self, ViccClassification::Benign | ViccClassification::LikelyBenign)
    }
}

/// Per-criterion VICC points, their total and the resulting class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViccScoring {
    /// All sixteen criteria, zero where no evidence fired
    pub criteria: BTreeMap<ViccCriterion, i32>,
    pub total_score: i32,
    pub classification: ViccClassification,
}

impl ViccScoring {
    pub fn score(&self, criterion: ViccCriterion) -> i32 {
        self.criteria.get(&criterion).copied().unwrap_or(0)
    }
}

impl Default for ViccScoring {
    fn default() -> Self {
        Self {
            criteria: ViccCriterion::ALL.iter().map(|c| (*c, 0)).collect(),
            total_score: 0,
            classification: ViccClassification::UncertainSignificance,
        }
    }
}

// ---------------------------------------------------------------------------
// AMP
// ---------------------------------------------------------------------------

/// AMP/ASCO/CAP tier ladder, strongest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AmpTier {
    #[serde(rename = "TIER_IA")]
    TierIA,
    #[serde(rename = "TIER_IB")]
    TierIB,
    #[serde(rename = "TIER_IIC")]
    TierIIC,
    #[serde(rename = "TIER_IID")]
    TierIID,
    #[serde(rename = "TIER_IIE")]
    TierIIE,
    #[serde(rename = "TIER_III")]
    TierIII,
    #[serde(rename = "TIER_IV")]
    TierIV,
}

impl AmpTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmpTier::TierIA => "Tier IA",
            AmpTier::TierIB => "Tier IB",
            AmpTier::TierIIC => "Tier IIC",
            AmpTier::TierIID => "Tier IID",
            AmpTier::TierIIE => "Tier IIE",
            AmpTier::TierIII => "Tier III",
            AmpTier::TierIV => "Tier IV",
        }
    }

    /// Tier I or Tier II.
    pub fn is_actionable(&self) -> bool {
        *self <= AmpTier::TierIIE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextTierAssignment {
    pub context: ActionabilityContext,
    pub tier: AmpTier,
    /// Strongest strength category among the context's evidence
    pub evidence_strength: Option<EvidenceStrength>,
    pub evidence_score: f64,
    pub confidence: f64,
    pub evidence_count: usize,
    pub fda_approved: bool,
    pub guideline_included: bool,
    pub expert_consensus: bool,
    /// Tier before DSC gating or VICC refinement changed it
    #[serde(default)]
    pub original_tier: Option<AmpTier>,
}

impl ContextTierAssignment {
    /// Assignment with no supporting evidence, used when refinement
    /// creates a context.
    pub fn without_evidence(context: ActionabilityContext, tier: AmpTier, confidence: f64) -> Self {
        Self {
            context,
            tier,
            evidence_strength: None,
            evidence_score: 0.0,
            confidence,
            evidence_count: 0,
            fda_approved: false,
            guideline_included: false,
            expert_consensus: false,
            original_tier: None,
        }
    }

    /// Move to `tier`, remembering the first tier this context held.
    pub fn retier(&mut self, tier: AmpTier) {
        if tier != self.tier {
            self.original_tier.get_or_insert(self.tier);
            self.tier = tier;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AMPScoring {
    pub contexts: BTreeMap<ActionabilityContext, ContextTierAssignment>,
    pub cancer_type_specific: bool,
    pub related_cancer_types: Vec<String>,
    /// Mean confidence of the assigned contexts
    pub overall_confidence: f64,
    /// Fraction of the three contexts backed by evidence
    pub completeness: f64,
}

impl AMPScoring {
    pub fn tier(&self, context: ActionabilityContext) -> Option<AmpTier> {
        self.contexts.get(&context).map(|c| c.tier)
    }

    pub fn best_tier(&self) -> Option<AmpTier> {
        self.contexts.values().map(|c| c.tier).min()
    }

    /// Recompute the summary figures after contexts changed.
    pub fn refresh_summary(&mut self) {
        let n = self.contexts.len();
        self.overall_confidence = if n == 0 {
            0.0
        } else {
            self.contexts.values().map(|c| c.confidence).sum::<f64>() / n as f64
        };
        let backed = self.contexts.values().filter(|c| c.evidence_count > 0).count();
        self.completeness = backed as f64 / ActionabilityContext::ALL.len() as f64;
    }
}

// ---------------------------------------------------------------------------
// OncoKB
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OncoKBScoring {
    /// Strongest sensitivity level; resistance levels never count here
    pub highest_level: Option<OncoKbLevel>,
    pub resistance_levels: Vec<OncoKbLevel>,
    /// Therapy names per level, sorted and de-duplicated
    pub therapies: BTreeMap<OncoKbLevel, Vec<String>>,
    pub cancer_type_specific: bool,
    /// "Oncogenic", "Likely Oncogenic" or "Unknown"
    pub oncogenicity: String,
}

impl Default for OncoKBScoring {
    fn default() -> Self {
        Self {
            highest_level: None,
            resistance_levels: vec![],
            therapies: BTreeMap::new(),
            cancer_type_specific: false,
            oncogenicity: "Unknown".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate result
// ---------------------------------------------------------------------------

/// Everything the core concludes about one (variant, cancer type, analysis type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierResult {
    pub variant_id: String,
    pub gene: Option<String>,
    pub hgvs_p: Option<String>,
    pub cancer_type: String,
    pub analysis_type: AnalysisType,

    pub vicc: ViccScoring,
    pub oncokb: OncoKBScoring,
    pub amp: AMPScoring,
    /// Present only without a matched normal
    pub dsc: Option<DynamicSomaticConfidence>,

    pub evidence: Vec<Evidence>,

    /// Best tier across contexts; Tier III when no context was assigned
    pub primary_tier: AmpTier,
    pub overall_confidence: f64,
    /// Fraction of the three guidelines with any evidence
    pub data_completeness: f64,
    /// Stage failures that were replaced by defaults
    pub warnings: Vec<String>,
}

impl TierResult {
    pub fn tier(&self, context: ActionabilityContext) -> Option<AmpTier> {
        self.amp.tier(context)
    }

    pub fn classification(&self) -> ViccClassification {
        self.vicc.classification
    }
}
