//! oncotier-common — Shared types, errors, and configuration used across all oncotier crates.

pub mod error;
pub mod variant;
pub mod evidence;
pub mod hgvs;
pub mod config;

// Re-export commonly used types
pub use error::{Result, TierError};
pub use variant::{AnalysisType, AnnotatedVariant, ClinicalEvidenceRecord, HotspotRecord, PopulationFrequency};
pub use evidence::{
    ActionabilityContext, Evidence, EvidenceCode, EvidenceStrength, Guideline, OncoKbLevel, ViccCriterion,
};
pub use config::TieringConfig;
