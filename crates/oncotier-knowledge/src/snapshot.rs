//! Serde-loadable, read-only knowledge tables.
//!
//! A snapshot is produced by whatever loads the curated flat files and is
//! immutable afterwards. Gene keys are normalised to upper case on load.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use oncotier_common::hgvs::same_protein_change;
use oncotier_common::{PopulationFrequency, Result};

use crate::provider::{GeneRole, KnowledgeProvider, ProteinDomain, TherapeuticAssociation, VariantCounts};

/// One node of the tumour-type taxonomy (OncoTree-style).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancerTypeNode {
    /// Short code, e.g. "LUAD"
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeSnapshot {
    #[serde(default)]
    pub gene_roles: BTreeMap<String, GeneRole>,
    /// gene → protein change → tumour sample count
    #[serde(default)]
    pub hotspots: BTreeMap<String, BTreeMap<String, u32>>,
    /// gene → protein change → population frequencies
    #[serde(default)]
    pub population_frequencies: BTreeMap<String, BTreeMap<String, Vec<PopulationFrequency>>>,
    #[serde(default)]
    pub therapeutic_associations: Vec<TherapeuticAssociation>,
    #[serde(default)]
    pub variant_counts: BTreeMap<String, VariantCounts>,
    #[serde(default)]
    pub protein_domains: BTreeMap<String, Vec<ProteinDomain>>,
    #[serde(default)]
    pub cancer_types: Vec<CancerTypeNode>,
}

impl KnowledgeSnapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(content)?;
        Ok(snapshot.normalised())
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let snapshot: Self = serde_yaml::from_str(content)?;
        Ok(snapshot.normalised())
    }

    /// Upper-case every gene key so lookups are case-insensitive.
    pub fn normalised(mut self) -> Self {
        fn upper_keys<V>(map: BTreeMap<String, V>) -> BTreeMap<String, V> {
            map.into_iter().map(|(k, v)| (k.to_uppercase(), v)).collect()
        }
        self.gene_roles = upper_keys(self.gene_roles);
        self.hotspots = upper_keys(self.hotspots);
        self.population_frequencies = upper_keys(self.population_frequencies);
        self.variant_counts = upper_keys(self.variant_counts);
        self.protein_domains = upper_keys(self.protein_domains);
        for assoc in &mut self.therapeutic_associations {
            assoc.gene = assoc.gene.to_uppercase();
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.gene_roles.is_empty()
            && self.hotspots.is_empty()
            && self.population_frequencies.is_empty()
            && self.therapeutic_associations.is_empty()
            && self.variant_counts.is_empty()
            && self.protein_domains.is_empty()
            && self.cancer_types.is_empty()
    }

    fn find_node(&self, name_or_code: &str) -> Option<&CancerTypeNode> {
        self.cancer_types.iter().find(|n| {
            n.code.eq_ignore_ascii_case(name_or_code) || n.name.eq_ignore_ascii_case(name_or_code)
        })
    }

    /// Codes of every ancestor of `node`, nearest first. Cycles are cut.
    fn ancestors(&self, node: &CancerTypeNode) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        let mut current = node.parent.clone();
        while let Some(code) = current {
            if !seen.insert(code.to_uppercase()) {
                break;
            }
            current = self.find_node(&code).and_then(|n| n.parent.clone());
            out.push(code);
        }
        out
    }
}

impl KnowledgeProvider for KnowledgeSnapshot {
    fn gene_role(&self, gene: &str) -> Option<GeneRole> {
        self.gene_roles.get(&gene.to_uppercase()).copied()
    }

    fn hotspot_samples(&self, gene: &str, protein_change: &str) -> Option<u32> {
        self.hotspots
            .get(&gene.to_uppercase())?
            .iter()
            .filter(|(pc, _)| same_protein_change(pc, protein_change))
            .map(|(_, n)| *n)
            .max()
    }

    fn population_frequencies(&self, gene: &str, protein_change: &str) -> Vec<PopulationFrequency> {
        self.population_frequencies
            .get(&gene.to_uppercase())
            .map(|by_change| {
                by_change
                    .iter()
                    .filter(|(pc, _)| same_protein_change(pc, protein_change))
                    .flat_map(|(_, freqs)| freqs.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn therapeutic_associations(&self, gene: &str) -> Vec<TherapeuticAssociation> {
        let gene = gene.to_uppercase();
        self.therapeutic_associations
            .iter()
            .filter(|a| a.gene == gene)
            .cloned()
            .collect()
    }

    fn variant_counts(&self, gene: &str) -> Option<VariantCounts> {
        self.variant_counts.get(&gene.to_uppercase()).copied()
    }

    fn protein_domains(&self, gene: &str) -> Vec<ProteinDomain> {
        self.protein_domains.get(&gene.to_uppercase()).cloned().unwrap_or_default()
    }

    fn is_related_cancer_type(&self, query: &str, candidate: &str) -> bool {
        let (Some(q), Some(c)) = (self.find_node(query), self.find_node(candidate)) else {
            return query.eq_ignore_ascii_case(candidate);
        };
        q.code.eq_ignore_ascii_case(&c.code)
            || self.ancestors(q).iter().any(|a| a.eq_ignore_ascii_case(&c.code))
            || self.ancestors(c).iter().any(|a| a.eq_ignore_ascii_case(&q.code))
    }

    fn related_cancer_types(&self, cancer_type: &str) -> Vec<String> {
        let Some(node) = self.find_node(cancer_type) else {
            return vec![];
        };
        let mut related: BTreeSet<String> = self
            .ancestors(node)
            .iter()
            .filter_map(|code| self.find_node(code).map(|n| n.name.clone()))
            .collect();
        for other in &self.cancer_types {
            if other.code != node.code
                && self.ancestors(other).iter().any(|a| a.eq_ignore_ascii_case(&node.code))
            {
                related.insert(other.name.clone());
            }
        }
        related.into_iter().collect()
    }
}
