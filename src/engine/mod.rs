//! Inspection rules engine
//!
//! Pure functions and in-memory state: catalog lookups, checklist derivation,
//! the per-inspection aggregator, pricing and document composition. Nothing
//! in here performs I/O or fails; edge cases resolve to clamped, empty or
//! placeholder values.

pub mod catalog;
pub mod checklist;
pub mod pricing;
pub mod report;
pub mod session;

pub use session::{CompletionStats, InspectionSession};
