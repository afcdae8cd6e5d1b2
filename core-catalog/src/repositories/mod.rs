//! # Repository Pattern Implementation
//!
//! Storage access for the album graph.
//!
//! ## Architecture
//!
//! - [`AlbumRepository`] reads albums from translated queries and applies
//!   version-bumping updates
//! - [`AlbumUnitOfWork`] groups inserts and deletes into one transaction
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling

pub mod album;

pub use album::{AlbumRepository, AlbumUnitOfWork, SqliteAlbumRepository, SqliteUnitOfWork};
