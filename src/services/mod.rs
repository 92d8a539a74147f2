//! Service layer modules.
//!
//! Contains the Postgres-backed inspection store.

pub mod inspection_store;
