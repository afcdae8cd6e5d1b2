//! Workspace placeholder crate.
//!
//! This crate exists so hosts can depend on `album-catalog` and reach the
//! catalog facade (`core-service`) through the `service` feature without
//! wiring each workspace crate individually.

#[cfg(feature = "service")]
pub use core_service::*;
