//! oncotier-evidence — Turns one annotated variant into independent evidence items.
//!
//! Seven channels run in a fixed order, each unaware of the others. A channel
//! that fails contributes nothing; the rest still run.

pub mod aggregator;
pub mod channels;

pub use aggregator::{AggregationReport, ChannelFailure, EvidenceAggregator};
pub use channels::{Channel, ChannelContext};
