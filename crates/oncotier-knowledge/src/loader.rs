//! Load-once gate around a knowledge snapshot.
//!
//! The first lookup triggers the load; concurrent first lookups block on the
//! same `OnceLock` and all observe the one snapshot. A failed load is logged
//! and replaced by an empty snapshot, so lookups degrade to "no evidence".

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing::{info, warn};

use oncotier_common::PopulationFrequency;

use crate::provider::{GeneRole, KnowledgeProvider, ProteinDomain, TherapeuticAssociation, VariantCounts};
use crate::snapshot::KnowledgeSnapshot;

/// Source of a knowledge snapshot.
pub trait KnowledgeLoader: Send + Sync {
    fn load(&self) -> Result<KnowledgeSnapshot>;

    /// Short description for log lines.
    fn describe(&self) -> String {
        "knowledge loader".to_string()
    }
}

/// Loads a JSON or YAML snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotFileLoader {
    path: PathBuf,
}

impl SnapshotFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KnowledgeLoader for SnapshotFileLoader {
    fn load(&self) -> Result<KnowledgeSnapshot> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read knowledge snapshot: {:?}", self.path))?;
        let snapshot = match self.path.extension().and_then(|e| e.to_str()) {
            Some("json") => KnowledgeSnapshot::from_json(&content)?,
            Some("yaml") | Some("yml") => KnowledgeSnapshot::from_yaml(&content)?,
            other => anyhow::bail!("Unsupported snapshot extension {:?} for {:?}", other, self.path),
        };
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("snapshot file {}", self.path.display())
    }
}

/// Provider that loads its snapshot on first access and never again.
pub struct LazyKnowledgeBase<L: KnowledgeLoader> {
    loader: L,
    snapshot: OnceLock<KnowledgeSnapshot>,
}

impl<L: KnowledgeLoader> LazyKnowledgeBase<L> {
    pub fn new(loader: L) -> Self {
        Self { loader, snapshot: OnceLock::new() }
    }

    /// The loaded snapshot, loading it if this is the first access.
    pub fn snapshot(&self) -> &KnowledgeSnapshot {
        self.snapshot.get_or_init(|| match self.loader.load() {
            Ok(snapshot) => {
                info!(
                    source = %self.loader.describe(),
                    genes = snapshot.gene_roles.len(),
                    associations = snapshot.therapeutic_associations.len(),
                    "Knowledge snapshot loaded"
                );
                snapshot
            }
            Err(e) => {
                warn!(source = %self.loader.describe(), error = %e, "Knowledge load failed; continuing without knowledge-base evidence");
                KnowledgeSnapshot::default()
            }
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.get().is_some()
    }
}

impl<L: KnowledgeLoader> KnowledgeProvider for LazyKnowledgeBase<L> {
    fn gene_role(&self, gene: &str) -> Option<GeneRole> {
        self.snapshot().gene_role(gene)
    }

    fn hotspot_samples(&self, gene: &str, protein_change: &str) -> Option<u32> {
        self.snapshot().hotspot_samples(gene, protein_change)
    }

    fn population_frequencies(&self, gene: &str, protein_change: &str) -> Vec<PopulationFrequency> {
        self.snapshot().population_frequencies(gene, protein_change)
    }

    fn therapeutic_associations(&self, gene: &str) -> Vec<TherapeuticAssociation> {
        self.snapshot().therapeutic_associations(gene)
    }

    fn variant_counts(&self, gene: &str) -> Option<VariantCounts> {
        self.snapshot().variant_counts(gene)
    }

    fn protein_domains(&self, gene: &str) -> Vec<ProteinDomain> {
        self.snapshot().protein_domains(gene)
    }

    fn is_related_cancer_type(&self, query: &str, candidate: &str) -> bool {
        self.snapshot().is_related_cancer_type(query, candidate)
    }

    fn related_cancer_types(&self, cancer_type: &str) -> Vec<String> {
        self.snapshot().related_cancer_types(cancer_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FailingLoader;

    impl KnowledgeLoader for FailingLoader {
        fn load(&self) -> Result<KnowledgeSnapshot> {
            anyhow::bail!("tables missing")
        }
    }

    #[test]
    fn test_failed_load_degrades_to_empty() {
        let kb = LazyKnowledgeBase::new(FailingLoader);
        assert!(!kb.is_loaded());
        assert!(kb.gene_role("BRAF").is_none());
        assert!(kb.is_loaded());
        assert!(kb.snapshot().is_empty());
    }

    #[test]
    fn test_file_loader_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"gene_roles": {{"kras": {{"oncogene": true}}}}}}"#).unwrap();
        let kb = LazyKnowledgeBase::new(SnapshotFileLoader::new(file.path()));
        assert!(kb.gene_role("KRAS").unwrap().oncogene);
    }

    #[test]
    fn test_file_loader_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        assert!(SnapshotFileLoader::new(file.path()).load().is_err());
    }
}
