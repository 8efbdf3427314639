//! Mock provider with hardcoded data for unit tests.

use std::collections::HashMap;

use oncotier_common::hgvs::same_protein_change;
use oncotier_common::{OncoKbLevel, PopulationFrequency};

use crate::provider::{GeneRole, KnowledgeProvider, ProteinDomain, TherapeuticAssociation, VariantCounts};

/// Builder-style in-memory provider.
///
/// Gene symbols are stored upper-cased; protein changes are compared with
/// [`same_protein_change`], so "p.Val600Glu" and "V600E" hit the same entry.
#[derive(Debug, Clone, Default)]
pub struct MockKnowledgeProvider {
    roles: HashMap<String, GeneRole>,
    hotspots: Vec<(String, String, u32)>,
    frequencies: Vec<(String, String, PopulationFrequency)>,
    associations: Vec<TherapeuticAssociation>,
    counts: HashMap<String, VariantCounts>,
    domains: HashMap<String, Vec<ProteinDomain>>,
    /// (child, parent) edges of the tumour-type taxonomy
    taxonomy: Vec<(String, String)>,
}

impl MockKnowledgeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oncogene(mut self, gene: &str) -> Self {
        let role = self.roles.entry(gene.to_uppercase()).or_default();
        role.oncogene = true;
        role.cancer_gene_census = true;
        self
    }

    pub fn with_tumor_suppressor(mut self, gene: &str) -> Self {
        let role = self.roles.entry(gene.to_uppercase()).or_default();
        role.tumor_suppressor = true;
        role.cancer_gene_census = true;
        self
    }

    pub fn with_gene_role(mut self, gene: &str, role: GeneRole) -> Self {
        self.roles.insert(gene.to_uppercase(), role);
        self
    }

    pub fn with_hotspot(mut self, gene: &str, protein_change: &str, samples: u32) -> Self {
        self.hotspots.push((gene.to_uppercase(), protein_change.to_string(), samples));
        self
    }

    pub fn with_population_frequency(
        mut self,
        gene: &str,
        protein_change: &str,
        population: &str,
        frequency: f64,
    ) -> Self {
        self.frequencies.push((
            gene.to_uppercase(),
            protein_change.to_string(),
            PopulationFrequency {
                population: population.to_string(),
                frequency,
                source: Some("mock".to_string()),
            },
        ));
        self
    }

    pub fn with_therapy(
        mut self,
        gene: &str,
        alteration: &str,
        cancer_type: &str,
        level: OncoKbLevel,
        drugs: &[&str],
    ) -> Self {
        self.associations.push(TherapeuticAssociation {
            gene: gene.to_uppercase(),
            alteration: alteration.to_string(),
            cancer_type: cancer_type.to_string(),
            level,
            drugs: drugs.iter().map(|d| d.to_string()).collect(),
            source: "OncoKB".to_string(),
        });
        self
    }

    pub fn with_variant_counts(mut self, gene: &str, pathogenic: u32, benign: u32) -> Self {
        self.counts.insert(gene.to_uppercase(), VariantCounts { pathogenic, benign });
        self
    }

    pub fn with_domain(mut self, gene: &str, name: &str, start: u32, end: u32, critical: bool) -> Self {
        self.domains.entry(gene.to_uppercase()).or_default().push(ProteinDomain {
            name: name.to_string(),
            start,
            end,
            critical,
        });
        self
    }

    pub fn with_cancer_subtype(mut self, child: &str, parent: &str) -> Self {
        self.taxonomy.push((child.to_lowercase(), parent.to_lowercase()));
        self
    }
}

impl KnowledgeProvider for MockKnowledgeProvider {
    fn gene_role(&self, gene: &str) -> Option<GeneRole> {
        self.roles.get(&gene.to_uppercase()).copied()
    }

    fn hotspot_samples(&self, gene: &str, protein_change: &str) -> Option<u32> {
        let gene = gene.to_uppercase();
        self.hotspots
            .iter()
            .filter(|(g, pc, _)| *g == gene && same_protein_change(pc, protein_change))
            .map(|(_, _, n)| *n)
            .max()
    }

    fn population_frequencies(&self, gene: &str, protein_change: &str) -> Vec<PopulationFrequency> {
        let gene = gene.to_uppercase();
        self.frequencies
            .iter()
            .filter(|(g, pc, _)| *g == gene && same_protein_change(pc, protein_change))
            .map(|(_, _, f)| f.clone())
            .collect()
    }

    fn therapeutic_associations(&self, gene: &str) -> Vec<TherapeuticAssociation> {
        let gene = gene.to_uppercase();
        self.associations.iter().filter(|a| a.gene == gene).cloned().collect()
    }

    fn variant_counts(&self, gene: &str) -> Option<VariantCounts> {
        self.counts.get(&gene.to_uppercase()).copied()
    }

    fn protein_domains(&self, gene: &str) -> Vec<ProteinDomain> {
        self.domains.get(&gene.to_uppercase()).cloned().unwrap_or_default()
    }

    fn is_related_cancer_type(&self, query: &str, candidate: &str) -> bool {
        let (q, c) = (query.to_lowercase(), candidate.to_lowercase());
        q == c
            || self.taxonomy.iter().any(|(child, parent)| {
                (*child == q && *parent == c) || (*child == c && *parent == q)
            })
    }

    fn related_cancer_types(&self, cancer_type: &str) -> Vec<String> {
        let q = cancer_type.to_lowercase();
        let mut related: Vec<String> = self
            .taxonomy
            .iter()
            .filter_map(|(child, parent)| {
                if *child == q {
                    Some(parent.clone())
                } else if *parent == q {
                    Some(child.clone())
                } else {
                    None
                }
            })
            .collect();
        related.sort();
        related.dedup();
        related
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider() {
        let provider = MockKnowledgeProvider::new()
            .with_oncogene("BRAF")
            .with_hotspot("BRAF", "V600E", 897)
            .with_variant_counts("TP53", 1200, 40);

        assert!(provider.gene_role("braf").unwrap().oncogene);
        assert_eq!(provider.hotspot_samples("BRAF", "p.Val600Glu"), Some(897));
        assert_eq!(provider.hotspot_samples("BRAF", "p.Val600Lys"), None);
        assert_eq!(provider.variant_counts("TP53").unwrap().pathogenic, 1200);
        assert!(provider.gene_role("MYC").is_none());
        assert!(provider.protein_domains("MYC").is_empty());
    }

    #[test]
    fn test_taxonomy() {
        let provider = MockKnowledgeProvider::new()
            .with_cancer_subtype("Lung Adenocarcinoma", "Non-Small Cell Lung Cancer");

        assert!(provider.is_related_cancer_type("lung adenocarcinoma", "Non-Small Cell Lung Cancer"));
        assert!(provider.is_related_cancer_type("Non-Small Cell Lung Cancer", "Lung Adenocarcinoma"));
        assert!(!provider.is_related_cancer_type("Melanoma", "Lung Adenocarcinoma"));
        assert_eq!(
            provider.related_cancer_types("Lung Adenocarcinoma"),
            vec!["non-small cell lung cancer".to_string()]
        );
    }
}
