//! Post-scoring adjustments to AMP tiers.
//!
//! DSC gating runs first and only in tumour-only mode; VICC refinement runs
//! after it in both modes. Each moved context keeps its first tier in
//! `original_tier`.

use tracing::debug;

use oncotier_common::config::{ConfidenceConfig, DscConfig};
use oncotier_common::ActionabilityContext;
use oncotier_dsc::DynamicSomaticConfidence;

use crate::result::{AMPScoring, AmpTier, ContextTierAssignment, ViccClassification};

/// Demote tiers the somatic evidence cannot support.
///
/// Tier I needs DSC above `tier_i_gate` (otherwise Tier IIC if it clears the
/// Tier II gate, else Tier III). Tier II needs DSC above `tier_ii_gate`.
/// Context confidence is capped at the DSC score.
pub fn apply_dsc_gating(amp: &mut AMPScoring, dsc: &DynamicSomaticConfidence, config: &DscConfig) {
    let score = dsc.dsc_score;
    for assignment in amp.contexts.values_mut() {
        let gated = match assignment.tier {
            AmpTier::TierIA | AmpTier::TierIB if score <= config.tier_i_gate => {
                if score > config.tier_ii_gate {
                    AmpTier::TierIIC
                } else {
                    AmpTier::TierIII
                }
            }
            AmpTier::TierIIC | AmpTier::TierIID | AmpTier::TierIIE if score <= config.tier_ii_gate => AmpTier::TierIII,
            tier => tier,
        };
        if gated != assignment.tier {
            debug!(context = assignment.context.as_str(), from = assignment.tier.as_str(), to = gated.as_str(), dsc = score, "DSC gate");
        }
        assignment.retier(gated);
        assignment.confidence = assignment.confidence.min(score);
    }
    amp.refresh_summary();
}

/// Reconcile AMP tiers with the VICC oncogenicity call.
///
/// Benign calls force every context to Tier IV, creating contexts that had
/// no evidence. Uncertain calls pull Tier I down to III and IIC/IID down to
/// IIE. Oncogenic calls only raise confidence.
pub fn apply_vicc_refinement(amp: &mut AMPScoring, classification: ViccClassification, config: &ConfidenceConfig) {
    match classification {
        ViccClassification::Benign | ViccClassification::LikelyBenign => {
            for context in ActionabilityContext::ALL {
                amp.contexts
                    .entry(context)
                    .and_modify(|a| {
                        a.retier(AmpTier::TierIV);
                        a.confidence *= config.benign_factor;
                    })
                    .or_insert_with(|| {
                        ContextTierAssignment::without_evidence(context, AmpTier::TierIV, config.benign_factor)
                    });
            }
        }
        ViccClassification::UncertainSignificance => {
            for a in amp.contexts.values_mut() {
                let tier = match a.tier {
                    AmpTier::TierIA | AmpTier::TierIB => AmpTier::TierIII,
                    AmpTier::TierIIC | AmpTier::TierIID => AmpTier::TierIIE,
                    tier => tier,
                };
                a.retier(tier);
                a.confidence *= config.uncertain_factor;
            }
        }
        ViccClassification::Oncogenic | ViccClassification::LikelyOncogenic => {
            let boost = if classification == ViccClassification::Oncogenic {
                config.oncogenic_boost
            } else {
                config.likely_oncogenic_boost
            };
            for a in amp.contexts.values_mut() {
                a.confidence = (a.confidence * boost).min(1.0);
            }
        }
    }
    amp.refresh_summary();
}
