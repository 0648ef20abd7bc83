//! Platewatch Consensus Library
//!
//! Pure functions that reconcile many users' submissions about the same
//! plate into a single per-field verdict: majority vote per field,
//! manufacturer-name normalization, and the aggregate consensus result.
//! Nothing in this crate performs I/O; the service layer feeds it
//! submissions and persists the outcome.

pub mod calculator;
pub mod normalizer;
pub mod resolver;

pub use calculator::{compute_consensus, compute_overall_confidence, ConsensusFields, ConsensusResult};
pub use normalizer::{normalize_make, MakeMatch, KNOWN_MAKES};
pub use resolver::{majority_vote, FieldConsensus};
