//! Domain types and DTOs
//!
//! These types define the data structures for inspections and the service
//! types they cover.

pub mod inspections;
pub mod service_types;

// Re-export commonly used types
pub use inspections::*;
pub use service_types::*;
