//! Evidence channels.

pub mod population;
pub mod hotspot;
pub mod gene_role;
pub mod functional;
pub mod clinical;
pub mod domain;
pub mod variant_db;

use serde::{Deserialize, Serialize};

use oncotier_common::{AnalysisType, AnnotatedVariant, Evidence, Result};
use oncotier_knowledge::KnowledgeProvider;

/// Everything a channel may read. Channels never see each other's output.
pub struct ChannelContext<'a> {
    pub variant: &'a AnnotatedVariant,
    pub cancer_type: &'a str,
    pub analysis_type: AnalysisType,
    pub knowledge: &'a dyn KnowledgeProvider,
}

impl<'a> ChannelContext<'a> {
    pub fn tumor_only(&self) -> bool {
        !self.analysis_type.has_matched_normal()
    }

    /// Gene symbol and HGVS protein notation, when both are present.
    pub fn gene_and_protein(&self) -> Option<(&'a str, &'a str)> {
        Some((self.variant.gene()?, self.variant.hgvs_p.as_deref()?))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    PopulationFrequency,
    Hotspot,
    GeneRole,
    FunctionalPrediction,
    ClinicalEvidence,
    ProteinDomain,
    VariantDatabase,
}

impl Channel {
    /// Evaluation order.
    pub const ALL: [Channel; 7] = [
        Channel::PopulationFrequency,
        Channel::Hotspot,
        Channel::GeneRole,
        Channel::FunctionalPrediction,
        Channel::ClinicalEvidence,
        Channel::ProteinDomain,
        Channel::VariantDatabase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::PopulationFrequency => "population_frequency",
            Channel::Hotspot => "hotspot",
            Channel::GeneRole => "gene_role",
            Channel::FunctionalPrediction => "functional_prediction",
            Channel::ClinicalEvidence => "clinical_evidence",
            Channel::ProteinDomain => "protein_domain",
            Channel::VariantDatabase => "variant_database",
        }
    }

    pub fn evaluate(&self, ctx: &ChannelContext<'_>) -> Result<Vec<Evidence>> {
        match self {
            Channel::PopulationFrequency => population::evaluate(ctx),
            Channel::Hotspot => hotspot::evaluate(ctx),
            Channel::GeneRole => gene_role::evaluate(ctx),
            Channel::FunctionalPrediction => functional::evaluate(ctx),
            Channel::ClinicalEvidence => clinical::evaluate(ctx),
            Channel::ProteinDomain => domain::evaluate(ctx),
            Channel::VariantDatabase => variant_db::evaluate(ctx),
        }
    }
}
