/// Annotated variant record handed to the core by the upstream annotation step.
/// Never mutated once constructed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hgvs::ProteinChange;

// ---------------------------------------------------------------------------
// Analysis type
// ---------------------------------------------------------------------------

/// Whether a matched normal sample was sequenced alongside the tumour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    TumorNormal,
    TumorOnly,
}

impl AnalysisType {
    pub fn has_matched_normal(&self) -> bool {
        matches!(self, AnalysisType::TumorNormal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::TumorNormal => "tumor_normal",
            AnalysisType::TumorOnly => "tumor_only",
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationFrequency {
    /// Population label, e.g. "gnomAD_AF" or "gnomAD_NFE"
    pub population: String,
    /// Allele frequency in [0, 1]
    pub frequency: f64,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotspotRecord {
    pub source: String,
    /// Number of independent tumour samples carrying the change
    pub samples: u32,
    #[serde(default)]
    pub hotspot_type: Option<String>,
}

/// A previously curated clinical evidence item (CIViC-style).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalEvidenceRecord {
    pub source: String,
    /// Evidence grade, A (validated) through E (inferential)
    pub evidence_level: String,
    /// predictive | diagnostic | prognostic | oncogenic | functional | predisposing
    pub evidence_type: String,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub disease: Option<String>,
    #[serde(default)]
    pub drugs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Consequence classes
// ---------------------------------------------------------------------------

/// Coarse class of a Sequence Ontology consequence term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsequenceClass {
    Truncating,
    Missense,
    InFrame,
    StopLost,
    SpliceRegion,
    Synonymous,
    Other,
}

impl ConsequenceClass {
    pub fn from_term(term: &str) -> Self {
        match term.trim().to_lowercase().as_str() {
            "stop_gained" | "frameshift_variant" | "splice_acceptor_variant"
            | "splice_donor_variant" | "start_lost" | "transcript_ablation" => ConsequenceClass::Truncating,
            "missense_variant" | "missense" => ConsequenceClass::Missense,
            "inframe_insertion" | "inframe_deletion" | "protein_altering_variant" => ConsequenceClass::InFrame,
            "stop_lost" => ConsequenceClass::StopLost,
            "splice_region_variant" | "splice_donor_5th_base_variant" | "splice_donor_region_variant"
            | "splice_polypyrimidine_tract_variant" => ConsequenceClass::SpliceRegion,
            "synonymous_variant" | "stop_retained_variant" | "start_retained_variant" => ConsequenceClass::Synonymous,
            _ => ConsequenceClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsequenceClass::Truncating => "truncating",
            ConsequenceClass::Missense => "missense",
            ConsequenceClass::InFrame => "inframe",
            ConsequenceClass::StopLost => "stop_lost",
            ConsequenceClass::SpliceRegion => "splice_region",
            ConsequenceClass::Synonymous => "synonymous",
            ConsequenceClass::Other => "other",
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedVariant {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    #[serde(default)]
    pub gene_symbol: Option<String>,
    #[serde(default)]
    pub transcript_id: Option<String>,
    /// Sequence Ontology consequence terms, e.g. "missense_variant"
    #[serde(default)]
    pub consequences: Vec<String>,
    #[serde(default)]
    pub hgvs_c: Option<String>,  // e.g. c.1799T>A
    #[serde(default)]
    pub hgvs_p: Option<String>,  // e.g. p.Val600Glu
    #[serde(default)]
    pub vaf: Option<f64>,
    #[serde(default)]
    pub total_depth: Option<u32>,
    #[serde(default = "default_filter")]
    pub filter_status: String,
    #[serde(default)]
    pub population_frequencies: Vec<PopulationFrequency>,
    #[serde(default)]
    pub hotspot_evidence: Vec<HotspotRecord>,
    #[serde(default)]
    pub clinical_evidence: Vec<ClinicalEvidenceRecord>,
    /// Raw functional-prediction scores keyed by plugin field name
    #[serde(default)]
    pub plugin_data: BTreeMap<String, serde_json::Value>,
}

fn default_filter() -> String { "PASS".to_string() }

impl AnnotatedVariant {
    /// Minimal record at a locus; remaining fields are filled by struct update.
    pub fn new(chromosome: &str, position: u64, reference: &str, alternate: &str) -> Self {
        Self {
            chromosome: chromosome.to_string(),
            position,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            gene_symbol: None,
            transcript_id: None,
            consequences: vec![],
            hgvs_c: None,
            hgvs_p: None,
            vaf: None,
            total_depth: None,
            filter_status: default_filter(),
            population_frequencies: vec![],
            hotspot_evidence: vec![],
            clinical_evidence: vec![],
            plugin_data: BTreeMap::new(),
        }
    }

    /// Stable identifier `chrom:pos:ref>alt`.
    pub fn variant_id(&self) -> String {
        format!("{}:{}:{}>{}", self.chromosome, self.position, self.reference, self.alternate)
    }

    pub fn gene(&self) -> Option<&str> {
        self.gene_symbol.as_deref().filter(|g| !g.is_empty())
    }

    pub fn is_snv(&self) -> bool {
        self.reference.len() == 1 && self.alternate.len() == 1
    }

    pub fn is_pass(&self) -> bool {
        let status = self.filter_status.trim();
        status.eq_ignore_ascii_case("PASS") || status == "."
    }

    pub fn consequence_classes(&self) -> Vec<ConsequenceClass> {
        self.consequences
            .iter()
            .flat_map(|c| c.split('&'))
            .map(ConsequenceClass::from_term)
            .collect()
    }

    pub fn has_consequence(&self, class: ConsequenceClass) -> bool {
        self.consequence_classes().contains(&class)
    }

    /// Loss-of-function consequence (stop gained, frameshift, canonical splice).
    pub fn is_truncating(&self) -> bool {
        self.has_consequence(ConsequenceClass::Truncating)
    }

    /// Consequence that can plausibly activate an oncogene.
    pub fn is_activating(&self) -> bool {
        self.consequence_classes()
            .iter()
            .any(|c| matches!(c, ConsequenceClass::Missense | ConsequenceClass::InFrame))
    }

    /// Protein-altering consequence of any kind.
    pub fn is_impactful(&self) -> bool {
        self.consequence_classes().iter().any(|c| {
            matches!(
                c,
                ConsequenceClass::Truncating
                    | ConsequenceClass::Missense
                    | ConsequenceClass::InFrame
                    | ConsequenceClass::StopLost
            )
        })
    }

    /// Parsed HGVS protein change, if the notation is present and parseable.
    pub fn protein_change(&self) -> Option<ProteinChange> {
        self.hgvs_p.as_deref().and_then(ProteinChange::parse)
    }

    /// Highest population allele frequency across all records.
    pub fn max_population_frequency(&self) -> Option<f64> {
        self.population_frequencies
            .iter()
            .map(|p| p.frequency)
            .filter(|f| f.is_finite())
            .fold(None, |acc, f| Some(acc.map_or(f, |a: f64| a.max(f))))
    }

    /// Largest hotspot sample count among the attached hotspot records.
    pub fn max_hotspot_samples(&self) -> Option<u32> {
        self.hotspot_evidence.iter().map(|h| h.samples).max()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn braf() -> AnnotatedVariant {
        AnnotatedVariant {
            gene_symbol: Some("BRAF".to_string()),
            consequences: vec!["missense_variant".to_string()],
            hgvs_p: Some("p.Val600Glu".to_string()),
            ..AnnotatedVariant::new("7", 140453136, "A", "T")
        }
    }

    #[test]
    fn test_variant_id() {
        assert_eq!(braf().variant_id(), "7:140453136:A>T");
    }

    #[test]
    fn test_consequence_classes() {
        let v = braf();
        assert!(v.is_activating());
        assert!(v.is_impactful());
        assert!(!v.is_truncating());

        let stop = AnnotatedVariant {
            consequences: vec!["stop_gained&splice_region_variant".to_string()],
            ..AnnotatedVariant::new("17", 7577120, "G", "A")
        };
        assert!(stop.is_truncating());
        assert!(stop.has_consequence(ConsequenceClass::SpliceRegion));
    }

    #[test]
    fn test_filter_status() {
        let mut v = braf();
        assert!(v.is_pass());
        v.filter_status = "LowQual".to_string();
        assert!(!v.is_pass());
    }

    #[test]
    fn test_max_population_frequency() {
        let mut v = braf();
        assert_eq!(v.max_population_frequency(), None);
        v.population_frequencies = vec![
            PopulationFrequency { population: "AFR".into(), frequency: 0.02, source: None },
            PopulationFrequency { population: "NFE".into(), frequency: 0.07, source: None },
        ];
        assert_eq!(v.max_population_frequency(), Some(0.07));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"chromosome":"12","position":25398284,"reference":"C","alternate":"T"}"#;
        let v: AnnotatedVariant = serde_json::from_str(json).unwrap();
        assert_eq!(v.filter_status, "PASS");
        assert!(v.plugin_data.is_empty());
        assert!(v.is_snv());
    }
}
