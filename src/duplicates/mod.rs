//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Building the sharded digest index of the reference tree
//! - Classifying candidate files as duplicate, unique or unknown

pub mod classifier;
pub mod index;

pub use classifier::{
    Classification, ClassificationOutcome, ClassifierConfig, ClassifyError, ClassifySummary,
    DuplicateClassifier, OutcomeStatus, TreeRole,
};
pub use index::{HashIndex, IndexStats, SHARD_COUNT};
