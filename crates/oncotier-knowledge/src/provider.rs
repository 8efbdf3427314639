//! Trait for knowledge-base access.
//!
//! Provides an abstraction over curated lookup tables (gene roles, hotspot
//! counts, population frequencies, therapeutic associations, ClinVar-style
//! counts, protein domains, tumour-type taxonomy), so the evidence channels
//! are not coupled to how those tables are loaded.

use serde::{Deserialize, Serialize};

use oncotier_common::{OncoKbLevel, PopulationFrequency};

/// Cancer-gene role flags for one gene.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneRole {
    #[serde(default)]
    pub oncogene: bool,
    #[serde(default)]
    pub tumor_suppressor: bool,
    /// Listed in the Cancer Gene Census
    #[serde(default)]
    pub cancer_gene_census: bool,
    /// Hereditary cancer-predisposition gene
    #[serde(default)]
    pub predisposition: bool,
}

/// Curated variant–drug–tumour-type association.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TherapeuticAssociation {
    pub gene: String,
    /// Protein change ("V600E", "p.Val600Glu") or a gene-level class
    /// such as "Oncogenic Mutations"
    pub alteration: String,
    pub cancer_type: String,
    pub level: OncoKbLevel,
    #[serde(default)]
    pub drugs: Vec<String>,
    #[serde(default = "default_association_source")]
    pub source: String,
}

fn default_association_source() -> String { "OncoKB".to_string() }

/// Gene-level pathogenic/benign variant counts (ClinVar-style).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantCounts {
    pub pathogenic: u32,
    pub benign: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProteinDomain {
    pub name: String,
    /// 1-based inclusive start residue
    pub start: u32,
    /// 1-based inclusive end residue
    pub end: u32,
    #[serde(default)]
    pub critical: bool,
}

impl ProteinDomain {
    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Read-only knowledge lookups.
///
/// Every method treats an unknown key as "no evidence": `None` or an empty
/// vector, never an error. Implementations must be safe to share between
/// worker threads.
pub trait KnowledgeProvider: Send + Sync {
    /// Cancer-gene role flags.
    fn gene_role(&self, gene: &str) -> Option<GeneRole>;

    /// Number of tumour samples carrying this protein change.
    fn hotspot_samples(&self, gene: &str, protein_change: &str) -> Option<u32>;

    /// Population allele frequencies recorded for this protein change.
    fn population_frequencies(&self, gene: &str, protein_change: &str) -> Vec<PopulationFrequency>;

    /// Therapeutic associations curated for a gene, across all tumour types.
    fn therapeutic_associations(&self, gene: &str) -> Vec<TherapeuticAssociation>;

    /// Gene-level pathogenic/benign variant counts.
    fn variant_counts(&self, gene: &str) -> Option<VariantCounts>;

    /// Annotated protein domains of a gene's canonical product.
    fn protein_domains(&self, gene: &str) -> Vec<ProteinDomain>;

    /// Whether `candidate` is the same tumour type as `query`, or an ancestor
    /// or descendant of it in the taxonomy.
    fn is_related_cancer_type(&self, _query: &str, _candidate: &str) -> bool {
        false
    }

    /// Tumour types related to `cancer_type` in the taxonomy.
    fn related_cancer_types(&self, _cancer_type: &str) -> Vec<String> {
        vec![]
    }
}
