//! Overall confidence for a tiering result.

use oncotier_common::config::ConfidenceConfig;
use oncotier_common::{AnalysisType, Evidence};

use crate::result::{AMPScoring, AmpTier, ViccScoring};

const EVIDENCE_QUALITY_WEIGHT: f64 = 0.6;
const EVIDENCE_VOLUME_WEIGHT: f64 = 0.3;
const AMP_WEIGHT: f64 = 0.1;
/// Item count at which the volume term saturates.
const SATURATING_EVIDENCE_COUNT: f64 = 5.0;
const MIN_CONFIDENCE: f64 = 0.1;

/// Whether the VICC call and the AMP tiers tell the same story.
pub fn is_consistent(vicc: &ViccScoring, amp: &AMPScoring) -> bool {
    let c = vicc.classification;
    if c.is_oncogenic() {
        amp.contexts.values().any(|a| a.tier.is_actionable())
    } else if c.is_benign() {
        amp.contexts.values().all(|a| a.tier == AmpTier::TierIV)
    } else {
        false
    }
}

pub fn overall_confidence(
    evidence: &[Evidence],
    vicc: &ViccScoring,
    amp: &AMPScoring,
    analysis_type: AnalysisType,
    config: &ConfidenceConfig,
) -> f64 {
    let quality = if evidence.is_empty() {
        0.0
    } else {
        evidence.iter().map(|e| e.confidence).sum::<f64>() / evidence.len() as f64
    };
    let volume = (evidence.len() as f64 / SATURATING_EVIDENCE_COUNT).min(1.0);

    let mut confidence =
        EVIDENCE_QUALITY_WEIGHT * quality + EVIDENCE_VOLUME_WEIGHT * volume + AMP_WEIGHT * amp.overall_confidence;
    if is_consistent(vicc, amp) {
        confidence += config.consistency_bonus;
    }
    if analysis_type == AnalysisType::TumorOnly {
        confidence -= config.tumor_only_penalty;
    }
    confidence.clamp(MIN_CONFIDENCE, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ContextTierAssignment, ViccClassification};
    use oncotier_common::{ActionabilityContext, EvidenceCode, ViccCriterion};

    fn items(n: usize, conf: f64) -> Vec<Evidence> {
        (0..n)
            .map(|_| Evidence::new(EvidenceCode::vicc(ViccCriterion::Op1), "REVEL", "x", 1, conf).unwrap())
            .collect()
    }

    fn amp_with(tier: AmpTier, conf: f64) -> AMPScoring {
        let mut amp = AMPScoring::default();
        amp.contexts.insert(
            ActionabilityContext::Therapeutic,
            ContextTierAssignment::without_evidence(ActionabilityContext::Therapeutic, tier, conf),
        );
        amp.refresh_summary();
        amp
    }

    fn vicc(classification: ViccClassification) -> ViccScoring {
        ViccScoring { classification, ..Default::default() }
    }

    #[test]
    fn test_consistent_oncogenic_tumor_normal() {
        let c = overall_confidence(
            &items(5, 0.8),
            &vicc(ViccClassification::Oncogenic),
            &amp_with(AmpTier::TierIA, 0.9),
            AnalysisType::TumorNormal,
            &ConfidenceConfig::default(),
        );
        // 0.48 + 0.3 + 0.09 + 0.1
        assert!((c - 0.97).abs() < 1e-9);
    }

    #[test]
    fn test_tumor_only_penalty() {
        let args = (items(2, 0.5), vicc(ViccClassification::UncertainSignificance), amp_with(AmpTier::TierIII, 0.5));
        let tn = overall_confidence(&args.0, &args.1, &args.2, AnalysisType::TumorNormal, &ConfidenceConfig::default());
        let to = overall_confidence(&args.0, &args.1, &args.2, AnalysisType::TumorOnly, &ConfidenceConfig::default());
        assert!((tn - to - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_floor() {
        let c = overall_confidence(
            &[],
            &ViccScoring::default(),
            &AMPScoring::default(),
            AnalysisType::TumorOnly,
            &ConfidenceConfig::default(),
        );
        assert!((c - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_benign_consistency() {
        assert!(is_consistent(&vicc(ViccClassification::Benign), &amp_with(AmpTier::TierIV, 0.8)));
        assert!(is_consistent(&vicc(ViccClassification::LikelyBenign), &AMPScoring::default()));
        assert!(!is_consistent(&vicc(ViccClassification::Benign), &amp_with(AmpTier::TierIIC, 0.8)));
        assert!(!is_consistent(&vicc(ViccClassification::Oncogenic), &amp_with(AmpTier::TierIII, 0.8)));
    }
}
