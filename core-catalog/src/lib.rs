//! # Album Catalog Module
//!
//! Owns the album catalog database and the services on top of it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema, migrations and connection pooling
//! - Translation of loosely typed search criteria into bound SQL
//! - Repository access to the album, artist and track tables
//! - Version-checked updates and transactional create/delete

pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod repositories;
pub mod schema;
pub mod services;

pub use error::{CatalogError, ErrorKind, NotFoundReason, Result};
pub use models::{
    Album, AlbumChanges, AlbumDetails, AlbumId, AlbumType, Artist, NewAlbum, NewArtist, NewTrack,
    Track,
};
pub use query::{Criteria, CriterionValue, Dialect, QueryBuilder};
pub use repositories::{AlbumRepository, AlbumUnitOfWork, SqliteAlbumRepository};
pub use services::{AlbumReadService, AlbumWriteService, UpdateParams};
