//! oncotier-knowledge — Read-only knowledge lookups consumed by the evidence aggregator.
//!
//! The core never reaches for a process-wide cache: a provider is built once
//! and injected as `Arc<dyn KnowledgeProvider>`.

pub mod provider;
pub mod mock;
pub mod snapshot;
pub mod loader;

pub use provider::{GeneRole, KnowledgeProvider, ProteinDomain, TherapeuticAssociation, VariantCounts};
pub use mock::MockKnowledgeProvider;
pub use snapshot::{CancerTypeNode, KnowledgeSnapshot};
pub use loader::{KnowledgeLoader, LazyKnowledgeBase, SnapshotFileLoader};
