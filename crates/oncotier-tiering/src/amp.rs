//! AMP/ASCO/CAP multi-context tiering.
//!
//! Each actionability context is scored from its own AMP evidence and placed
//! on the tier ladder by an ordered rule table: a rule fires when the
//! context's strongest evidence is at least as strong as the rule demands
//! and its score reaches the configured threshold. First match wins; Tier IV
//! is never assigned here, only by refinement.

use std::collections::BTreeMap;

use oncotier_common::config::AmpThresholds;
use oncotier_common::{ActionabilityContext, Evidence, EvidenceStrength, Result, TierError};
use oncotier_knowledge::KnowledgeProvider;

use crate::result::{AMPScoring, AmpTier, ContextTierAssignment};

/// Added to the context score for each item beyond the first.
const ADDITIONAL_ITEM_BONUS: f64 = 0.05;

pub struct TierRule {
    /// Weakest strength category the rule accepts
    pub weakest: EvidenceStrength,
    pub threshold: fn(&AmpThresholds) -> f64,
    pub tier: AmpTier,
}

fn ia(t: &AmpThresholds) -> f64 { t.tier_ia }
fn ib(t: &AmpThresholds) -> f64 { t.tier_ib }
fn iic(t: &AmpThresholds) -> f64 { t.tier_iic }
fn iid(t: &AmpThresholds) -> f64 { t.tier_iid }
fn iie(t: &AmpThresholds) -> f64 { t.tier_iie }

pub const TIER_RULES: [TierRule; 5] = [
    TierRule { weakest: EvidenceStrength::ProfessionalGuideline, threshold: ia, tier: AmpTier::TierIA },
    TierRule { weakest: EvidenceStrength::ExpertConsensus, threshold: ib, tier: AmpTier::TierIB },
    TierRule { weakest: EvidenceStrength::MultipleStudies, threshold: iic, tier: AmpTier::TierIIC },
    TierRule { weakest: EvidenceStrength::CaseReports, threshold: iid, tier: AmpTier::TierIID },
    TierRule { weakest: EvidenceStrength::Preclinical, threshold: iie, tier: AmpTier::TierIIE },
];

/// Tier for a context with this strongest strength and score.
pub fn assign_tier(strongest: EvidenceStrength, score: f64, thresholds: &AmpThresholds) -> AmpTier {
    TIER_RULES
        .iter()
        .find(|rule| strongest <= rule.weakest && score >= (rule.threshold)(thresholds))
        .map(|rule| rule.tier)
        .unwrap_or(AmpTier::TierIII)
}

/// Thresholds must lie in [0, 1] and never increase down the ladder.
pub fn check_thresholds(t: &AmpThresholds) -> Result<()> {
    let ladder = [t.tier_ia, t.tier_ib, t.tier_iic, t.tier_iid, t.tier_iie];
    if ladder.iter().chain([&t.min_context_score]).any(|v| !(0.0..=1.0).contains(v)) {
        return Err(TierError::stage("amp", "tier thresholds must lie in [0, 1]"));
    }
    if ladder.windows(2).any(|w| w[0] < w[1]) {
        return Err(TierError::stage("amp", format!("tier thresholds not monotone: {:?}", ladder)));
    }
    Ok(())
}

/// Context evidence score: best single item (strength weight × confidence)
/// plus a small bonus per corroborating item, capped at 1.
pub fn context_score(items: &[(EvidenceStrength, &Evidence)]) -> f64 {
    let best = items
        .iter()
        .map(|(s, e)| s.weight() * e.confidence)
        .fold(0.0_f64, f64::max);
    let extra = items.len().saturating_sub(1) as f64 * ADDITIONAL_ITEM_BONUS;
    (best + extra).min(1.0)
}

pub fn score_amp(
    evidence: &[Evidence],
    cancer_type: &str,
    thresholds: &AmpThresholds,
    knowledge: &dyn KnowledgeProvider,
) -> Result<AMPScoring> {
    check_thresholds(thresholds)?;

    let mut contexts = BTreeMap::new();
    let mut specific = false;

    for context in ActionabilityContext::ALL {
        let items: Vec<(EvidenceStrength, &Evidence)> = evidence
            .iter()
            .filter_map(|e| match e.amp_context() {
                Some((c, strength)) if c == context => Some((strength, e)),
                _ => None,
            })
            .collect();
        if items.is_empty() {
            continue;
        }

        let score = context_score(&items);
        if score < thresholds.min_context_score {
            continue;
        }
        let Some(strongest) = items.iter().map(|(s, _)| *s).min() else {
            continue;
        };
        let has = |s: EvidenceStrength| items.iter().any(|(x, _)| *x == s);
        specific |= items.iter().any(|(_, e)| e.is_cancer_type_specific());

        contexts.insert(
            context,
            ContextTierAssignment {
                context,
                tier: assign_tier(strongest, score, thresholds),
                evidence_strength: Some(strongest),
                evidence_score: score,
                confidence: items.iter().map(|(_, e)| e.confidence).sum::<f64>() / items.len() as f64,
                evidence_count: items.len(),
                fda_approved: has(EvidenceStrength::FdaApproved),
                guideline_included: has(EvidenceStrength::ProfessionalGuideline),
                expert_consensus: has(EvidenceStrength::ExpertConsensus),
                original_tier: None,
            },
        );
    }

    let mut scoring = AMPScoring {
        contexts,
        cancer_type_specific: specific,
        related_cancer_types: knowledge.related_cancer_types(cancer_type),
        overall_confidence: 0.0,
        completeness: 0.0,
    };
    scoring.refresh_summary();
    Ok(scoring)
}
