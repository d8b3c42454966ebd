//! # RPG Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - World and combatant fixtures
//! - Accuracy tables for combat tuning
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accuracy;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
