//! Evidence aggregation across all channels.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use oncotier_common::{AnalysisType, AnnotatedVariant, Evidence, Result};
use oncotier_knowledge::KnowledgeProvider;

use crate::channels::{Channel, ChannelContext};

/// A channel that returned an error and was replaced by an empty result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelFailure {
    pub channel: Channel,
    pub message: String,
}

/// Evidence from every channel that succeeded, plus the ones that did not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregationReport {
    pub evidence: Vec<Evidence>,
    pub failures: Vec<ChannelFailure>,
}

impl AggregationReport {
    /// Fold one channel's outcome into the report.
    fn absorb(&mut self, channel: Channel, outcome: Result<Vec<Evidence>>) {
        match outcome {
            Ok(items) => {
                debug!(channel = channel.as_str(), count = items.len(), "Channel evaluated");
                self.evidence.extend(items);
            }
            Err(e) => {
                warn!(channel = channel.as_str(), error = %e, "Evidence channel failed; contributing no evidence");
                self.failures.push(ChannelFailure { channel, message: e.to_string() });
            }
        }
    }
}

/// Runs the seven evidence channels against an injected knowledge provider.
#[derive(Clone)]
pub struct EvidenceAggregator {
    knowledge: Arc<dyn KnowledgeProvider>,
}

impl EvidenceAggregator {
    pub fn new(knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &dyn KnowledgeProvider {
        self.knowledge.as_ref()
    }

    /// All evidence for one variant in one tumour-type context.
    /// Missing knowledge yields fewer items, never an error.
    pub fn aggregate(
        &self,
        variant: &AnnotatedVariant,
        cancer_type: &str,
        analysis_type: AnalysisType,
    ) -> Vec<Evidence> {
        self.aggregate_with_report(variant, cancer_type, analysis_type).evidence
    }

    pub fn aggregate_with_report(
        &self,
        variant: &AnnotatedVariant,
        cancer_type: &str,
        analysis_type: AnalysisType,
    ) -> AggregationReport {
        let ctx = ChannelContext {
            variant,
            cancer_type,
            analysis_type,
            knowledge: self.knowledge.as_ref(),
        };
        let mut report = AggregationReport::default();
        for channel in Channel::ALL {
            report.absorb(channel, channel.evaluate(&ctx));
        }
        report
    }
}

impl std::fmt::Debug for EvidenceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceAggregator").finish_non_exhaustive()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use oncotier_common::{EvidenceCode, TierError, ViccCriterion};
    use oncotier_knowledge::MockKnowledgeProvider;

    #[test]
    fn test_failed_channel_recorded_and_others_kept() {
        let mut report = AggregationReport::default();
        let ok = Evidence::new(EvidenceCode::vicc(ViccCriterion::Os3), "COSMIC", "hotspot", 4, 0.9).unwrap();

        report.absorb(Channel::Hotspot, Ok(vec![ok.clone()]));
        report.absorb(Channel::FunctionalPrediction, Err(TierError::MalformedInput("REVEL=abc".into())));
        report.absorb(Channel::ProteinDomain, Ok(vec![]));

        assert_eq!(report.evidence, vec![ok]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].channel, Channel::FunctionalPrediction);
        assert!(report.failures[0].message.contains("REVEL"));
    }

    #[test]
    fn test_empty_knowledge_yields_no_evidence() {
        let agg = EvidenceAggregator::new(Arc::new(MockKnowledgeProvider::new()));
        let variant = AnnotatedVariant::new("3", 178936091, "G", "A");
        let report = agg.aggregate_with_report(&variant, "Breast Cancer", AnalysisType::TumorNormal);
        assert!(report.evidence.is_empty());
        assert!(report.failures.is_empty());
    }
}
