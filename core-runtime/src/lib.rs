//! # Core Runtime Module
//!
//! Provides the ambient runtime infrastructure for the album catalog:
//! - Logging and tracing setup
//! - Configuration management
//!
//! ## Overview
//!
//! Other crates only emit `tracing` events and read a [`CatalogConfig`];
//! this crate decides how events are rendered and where configuration values
//! come from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CatalogConfig, CatalogConfigBuilder};
pub use error::{Error, Result};
