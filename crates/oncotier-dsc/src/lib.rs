//! oncotier-dsc — Tumour purity estimation and Dynamic Somatic Confidence.
//!
//! Both are used only when no matched normal was sequenced: purity sets the
//! VAF a somatic variant should show, and DSC turns the fit to that
//! expectation plus prior knowledge into a probability-like somatic score.

pub mod purity;
pub mod dsc;

pub use dsc::{DscCalculator, DynamicSomaticConfidence};
pub use purity::{PurityEstimate, PurityEstimator, PurityMethod, PurityQuality, VafSummary};
