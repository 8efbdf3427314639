/// Evidence items and the closed set of criterion codes they can carry.
///
/// Every code belongs to exactly one guideline, so the guideline of an
/// `Evidence` is derived from its code rather than stored next to it.

use serde::{Deserialize, Serialize};

use crate::error::{check_unit_interval, Result};

// ---------------------------------------------------------------------------
// Guideline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Guideline {
    /// VICC/CGC oncogenicity point scoring
    Vicc,
    /// AMP/ASCO/CAP multi-context actionability tiers
    Amp,
    /// OncoKB therapeutic levels of evidence
    OncoKb,
}

impl Guideline {
    pub const ALL: [Guideline; 3] = [Guideline::Vicc, Guideline::Amp, Guideline::OncoKb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Guideline::Vicc => "VICC",
            Guideline::Amp => "AMP",
            Guideline::OncoKb => "OncoKB",
        }
    }
}

// ---------------------------------------------------------------------------
// VICC/CGC criteria
// ---------------------------------------------------------------------------

/// The sixteen VICC/CGC oncogenicity criteria.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViccCriterion {
    /// Null variant in a bona fide tumour suppressor
    Ovs1,
    /// Same amino-acid change as an established oncogenic variant
    Os1,
    /// Well-established functional studies
    Os2,
    /// Hotspot with high recurrence
    Os3,
    /// Located in a critical functional domain
    Om1,
    /// Protein length change from in-frame indel or stop loss
    Om2,
    /// Hotspot with moderate recurrence
    Om3,
    /// Gene with an established spectrum of pathogenic variants
    Om4,
    /// Computational evidence supports a damaging effect
    Op1,
    /// Somatic variant in a gene with a single genetic aetiology
    Op2,
    /// Hotspot with low recurrence
    Op3,
    /// Absent from population databases
    Op4,
    /// Minor allele frequency above 5%
    Sbvs1,
    /// Minor allele frequency above 1%
    Sbs1,
    /// Functional or database evidence of no damaging effect
    Sbs2,
    /// Computational evidence suggests no impact
    Sbp1,
}

impl ViccCriterion {
    pub const ALL: [ViccCriterion; 16] = [
        ViccCriterion::Ovs1, ViccCriterion::Os1, ViccCriterion::Os2, ViccCriterion::Os3,
        ViccCriterion::Om1, ViccCriterion::Om2, ViccCriterion::Om3, ViccCriterion::Om4,
        ViccCriterion::Op1, ViccCriterion::Op2, ViccCriterion::Op3, ViccCriterion::Op4,
        ViccCriterion::Sbvs1, ViccCriterion::Sbs1, ViccCriterion::Sbs2, ViccCriterion::Sbp1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViccCriterion::Ovs1 => "OVS1",
            ViccCriterion::Os1 => "OS1",
            ViccCriterion::Os2 => "OS2",
            ViccCriterion::Os3 => "OS3",
            ViccCriterion::Om1 => "OM1",
            ViccCriterion::Om2 => "OM2",
            ViccCriterion::Om3 => "OM3",
            ViccCriterion::Om4 => "OM4",
            ViccCriterion::Op1 => "OP1",
            ViccCriterion::Op2 => "OP2",
            ViccCriterion::Op3 => "OP3",
            ViccCriterion::Op4 => "OP4",
            ViccCriterion::Sbvs1 => "SBVS1",
            ViccCriterion::Sbs1 => "SBS1",
            ViccCriterion::Sbs2 => "SBS2",
            ViccCriterion::Sbp1 => "SBP1",
        }
    }

    /// Nominal SOP point value of the criterion.
    pub fn nominal_points(&self) -> i32 {
        match self {
            ViccCriterion::Ovs1 => 8,
            ViccCriterion::Os1 | ViccCriterion::Os2 | ViccCriterion::Os3 => 4,
            ViccCriterion::Om1 | ViccCriterion::Om2 | ViccCriterion::Om3 | ViccCriterion::Om4 => 2,
            ViccCriterion::Op1 | ViccCriterion::Op2 | ViccCriterion::Op3 | ViccCriterion::Op4 => 1,
            ViccCriterion::Sbvs1 => -8,
            ViccCriterion::Sbs1 | ViccCriterion::Sbs2 => -4,
            ViccCriterion::Sbp1 => -1,
        }
    }

    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ViccCriterion::Sbvs1 | ViccCriterion::Sbs1 | ViccCriterion::Sbs2 | ViccCriterion::Sbp1
        )
    }
}

// ---------------------------------------------------------------------------
// AMP contexts and strength categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActionabilityContext {
    Therapeutic,
    Diagnostic,
    Prognostic,
}

impl ActionabilityContext {
    pub const ALL: [ActionabilityContext; 3] = [
        ActionabilityContext::Therapeutic,
        ActionabilityContext::Diagnostic,
        ActionabilityContext::Prognostic,
    ];

    /// Classify a free-text evidence type by keyword.
    pub fn from_keyword(text: &str) -> Option<Self> {
        let t = text.to_lowercase();
        if t.contains("predictive") || t.contains("therap") || t.contains("drug") || t.contains("sensitiv")
            || t.contains("resist")
        {
            Some(ActionabilityContext::Therapeutic)
        } else if t.contains("diagnos") {
            Some(ActionabilityContext::Diagnostic)
        } else if t.contains("prognos") || t.contains("survival") || t.contains("outcome") {
            Some(ActionabilityContext::Prognostic)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionabilityContext::Therapeutic => "therapeutic",
            ActionabilityContext::Diagnostic => "diagnostic",
            ActionabilityContext::Prognostic => "prognostic",
        }
    }
}

/// Evidence-strength categories, strongest first. The derived `Ord`
/// follows declaration order, so the minimum of a set is its strongest member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    FdaApproved,
    ProfessionalGuideline,
    ExpertConsensus,
    MultipleStudies,
    CaseReports,
    Investigational,
    Preclinical,
}

impl EvidenceStrength {
    pub const PRIORITY: [EvidenceStrength; 7] = [
        EvidenceStrength::FdaApproved,
        EvidenceStrength::ProfessionalGuideline,
        EvidenceStrength::ExpertConsensus,
        EvidenceStrength::MultipleStudies,
        EvidenceStrength::CaseReports,
        EvidenceStrength::Investigational,
        EvidenceStrength::Preclinical,
    ];

    /// Contribution of one item of this strength to a context evidence score.
    pub fn weight(&self) -> f64 {
        match self {
            EvidenceStrength::FdaApproved => 1.00,
            EvidenceStrength::ProfessionalGuideline => 0.95,
            EvidenceStrength::ExpertConsensus => 0.80,
            EvidenceStrength::MultipleStudies => 0.65,
            EvidenceStrength::CaseReports => 0.45,
            EvidenceStrength::Investigational => 0.35,
            EvidenceStrength::Preclinical => 0.25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceStrength::FdaApproved => "fda_approved",
            EvidenceStrength::ProfessionalGuideline => "professional_guideline",
            EvidenceStrength::ExpertConsensus => "expert_consensus",
            EvidenceStrength::MultipleStudies => "multiple_studies",
            EvidenceStrength::CaseReports => "case_reports",
            EvidenceStrength::Investigational => "investigational",
            EvidenceStrength::Preclinical => "preclinical",
        }
    }
}

// ---------------------------------------------------------------------------
// OncoKB levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OncoKbLevel {
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[serde(rename = "LEVEL_3A")]
    Level3A,
    #[serde(rename = "LEVEL_3B")]
    Level3B,
    #[serde(rename = "LEVEL_4")]
    Level4,
    #[serde(rename = "LEVEL_R1")]
    R1,
    #[serde(rename = "LEVEL_R2")]
    R2,
}

impl OncoKbLevel {
    /// Parse "1", "LEVEL_1", "Level 3A", "R1" and similar spellings.
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .to_uppercase()
            .replace("LEVEL", "")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match norm.as_str() {
            "1" => Some(OncoKbLevel::Level1),
            "2" | "2A" => Some(OncoKbLevel::Level2),
            "3A" => Some(OncoKbLevel::Level3A),
            "3B" | "2B" => Some(OncoKbLevel::Level3B),
            "4" => Some(OncoKbLevel::Level4),
            "R1" => Some(OncoKbLevel::R1),
            "R2" => Some(OncoKbLevel::R2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OncoKbLevel::Level1 => "LEVEL_1",
            OncoKbLevel::Level2 => "LEVEL_2",
            OncoKbLevel::Level3A => "LEVEL_3A",
            OncoKbLevel::Level3B => "LEVEL_3B",
            OncoKbLevel::Level4 => "LEVEL_4",
            OncoKbLevel::R1 => "LEVEL_R1",
            OncoKbLevel::R2 => "LEVEL_R2",
        }
    }

    pub fn is_resistance(&self) -> bool {
        matches!(self, OncoKbLevel::R1 | OncoKbLevel::R2)
    }

    /// AMP strength category implied by a therapeutic level in the matched tumour type.
    pub fn amp_strength(&self) -> EvidenceStrength {
        match self {
            OncoKbLevel::Level1 | OncoKbLevel::R1 => EvidenceStrength::FdaApproved,
            OncoKbLevel::Level2 => EvidenceStrength::ProfessionalGuideline,
            OncoKbLevel::Level3A | OncoKbLevel::R2 => EvidenceStrength::MultipleStudies,
            OncoKbLevel::Level3B => EvidenceStrength::MultipleStudies,
            OncoKbLevel::Level4 => EvidenceStrength::Preclinical,
        }
    }

    /// Evidence confidence carried by a match at this level.
    pub fn confidence(&self) -> f64 {
        match self {
            OncoKbLevel::Level1 | OncoKbLevel::R1 => 0.95,
            OncoKbLevel::Level2 => 0.90,
            OncoKbLevel::Level3A | OncoKbLevel::R2 => 0.75,
            OncoKbLevel::Level3B => 0.65,
            OncoKbLevel::Level4 => 0.50,
        }
    }

    /// VICC-equivalent point contribution of the match.
    pub fn points(&self) -> i32 {
        match self {
            OncoKbLevel::Level1 | OncoKbLevel::Level2 | OncoKbLevel::R1 => 4,
            OncoKbLevel::Level3A | OncoKbLevel::Level3B | OncoKbLevel::R2 => 2,
            OncoKbLevel::Level4 => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Evidence codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "guideline", rename_all = "snake_case")]
pub enum EvidenceCode {
    Vicc { criterion: ViccCriterion },
    Amp { context: ActionabilityContext, strength: EvidenceStrength },
    OncoKb { level: OncoKbLevel },
}

impl EvidenceCode {
    pub fn vicc(criterion: ViccCriterion) -> Self {
        EvidenceCode::Vicc { criterion }
    }

    pub fn amp(context: ActionabilityContext, strength: EvidenceStrength) -> Self {
        EvidenceCode::Amp { context, strength }
    }

    pub fn oncokb(level: OncoKbLevel) -> Self {
        EvidenceCode::OncoKb { level }
    }

    pub fn guideline(&self) -> Guideline {
        match self {
            EvidenceCode::Vicc { .. } => Guideline::Vicc,
            EvidenceCode::Amp { .. } => Guideline::Amp,
            EvidenceCode::OncoKb { .. } => Guideline::OncoKb,
        }
    }

    /// Human-readable label, e.g. "OS3", "AMP:therapeutic:fda_approved", "LEVEL_1".
    pub fn label(&self) -> String {
        match self {
            EvidenceCode::Vicc { criterion } => criterion.as_str().to_string(),
            EvidenceCode::Amp { context, strength } => {
                format!("AMP:{}:{}", context.as_str(), strength.as_str())
            }
            EvidenceCode::OncoKb { level } => level.as_str().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Atomic classification signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub code: EvidenceCode,
    /// Knowledge base or predictor that produced the signal
    pub source: String,
    pub description: String,
    /// Signed point contribution
    pub score: i32,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Provenance payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Evidence {
    pub fn new(
        code: EvidenceCode,
        source: impl Into<String>,
        description: impl Into<String>,
        score: i32,
        confidence: f64,
    ) -> Result<Self> {
        Ok(Self {
            code,
            source: source.into(),
            description: description.into(),
            score,
            confidence: check_unit_interval("evidence confidence", confidence)?,
            data: serde_json::Value::Null,
        })
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn guideline(&self) -> Guideline {
        self.code.guideline()
    }

    pub fn vicc_criterion(&self) -> Option<ViccCriterion> {
        match self.code {
            EvidenceCode::Vicc { criterion } => Some(criterion),
            _ => None,
        }
    }

    pub fn amp_context(&self) -> Option<(ActionabilityContext, EvidenceStrength)> {
        match self.code {
            EvidenceCode::Amp { context, strength } => Some((context, strength)),
            _ => None,
        }
    }

    pub fn oncokb_level(&self) -> Option<OncoKbLevel> {
        match self.code {
            EvidenceCode::OncoKb { level } => Some(level),
            _ => None,
        }
    }

    /// Whether the payload marks this item as matched to the queried tumour type.
    /// Items without the flag are treated as specific.
    pub fn is_cancer_type_specific(&self) -> bool {
        self.data
            .get("cancer_type_specific")
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    /// Drug names recorded in the payload, if any.
    pub fn drugs(&self) -> Vec<String> {
        self.data
            .get("drugs")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|d| d.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_guideline_derived_from_code() {
        let e = Evidence::new(EvidenceCode::vicc(ViccCriterion::Os3), "cancerhotspots", "hotspot", 4, 0.9).unwrap();
        assert_eq!(e.guideline(), Guideline::Vicc);
        assert_eq!(e.vicc_criterion(), Some(ViccCriterion::Os3));
        assert!(e.amp_context().is_none());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        assert!(Evidence::new(EvidenceCode::vicc(ViccCriterion::Op1), "REVEL", "x", 1, 1.2).is_err());
        assert!(Evidence::new(EvidenceCode::vicc(ViccCriterion::Op1), "REVEL", "x", 1, -0.01).is_err());
    }

    #[test]
    fn test_strength_order_is_priority_order() {
        let mut shuffled = vec![
            EvidenceStrength::Preclinical,
            EvidenceStrength::FdaApproved,
            EvidenceStrength::CaseReports,
        ];
        shuffled.sort();
        assert_eq!(shuffled[0], EvidenceStrength::FdaApproved);
        assert_eq!(EvidenceStrength::PRIORITY.iter().min(), Some(&EvidenceStrength::FdaApproved));
    }

    #[test]
    fn test_oncokb_level_parse() {
        assert_eq!(OncoKbLevel::parse("LEVEL_1"), Some(OncoKbLevel::Level1));
        assert_eq!(OncoKbLevel::parse("Level 3A"), Some(OncoKbLevel::Level3A));
        assert_eq!(OncoKbLevel::parse("r2"), Some(OncoKbLevel::R2));
        assert_eq!(OncoKbLevel::parse("5"), None);
        assert!(OncoKbLevel::Level1 < OncoKbLevel::Level4);
    }

    #[test]
    fn test_context_keywords() {
        assert_eq!(ActionabilityContext::from_keyword("Predictive"), Some(ActionabilityContext::Therapeutic));
        assert_eq!(ActionabilityContext::from_keyword("diagnostic"), Some(ActionabilityContext::Diagnostic));
        assert_eq!(ActionabilityContext::from_keyword("Prognostic"), Some(ActionabilityContext::Prognostic));
        assert_eq!(ActionabilityContext::from_keyword("oncogenic"), None);
    }

    #[test]
    fn test_payload_accessors() {
        let e = Evidence::new(EvidenceCode::oncokb(OncoKbLevel::Level1), "OncoKB", "x", 4, 0.95)
            .unwrap()
            .with_data(json!({"drugs": ["Dabrafenib", "Trametinib"], "cancer_type_specific": false}));
        assert_eq!(e.drugs(), vec!["Dabrafenib".to_string(), "Trametinib".to_string()]);
        assert!(!e.is_cancer_type_specific());
    }

    #[test]
    fn test_nominal_points_sign() {
        for c in ViccCriterion::ALL {
            assert_eq!(c.is_benign(), c.nominal_points() < 0, "{}", c.as_str());
        }
    }
}
