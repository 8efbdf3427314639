//! oncotier-tiering — Multi-guideline tier assignment.
//!
//! Runs the per-variant state machine: evidence aggregation, DSC (tumour-only
//! only), VICC oncogenicity scoring, OncoKB leveling, AMP multi-context
//! tiering, DSC gating, VICC refinement and overall confidence. Every scoring
//! stage returns a `Result`; the engine substitutes a neutral default on
//! failure so a variant always gets a [`TierResult`].

pub mod result;
pub mod vicc;
pub mod oncokb;
pub mod amp;
pub mod refine;
pub mod confidence;
pub mod engine;

pub use engine::{CohortClassification, TieringEngine};
pub use result::{
    AMPScoring, AmpTier, ContextTierAssignment, OncoKBScoring, TierResult, ViccClassification, ViccScoring,
};
