//! Album lookups by id and by criteria.

use crate::error::{CatalogError, NotFoundReason, Result};
use crate::models::{Album, AlbumId};
use crate::query::{Criteria, QueryBuilder, GENRE_FLAGS, INTERPRET};
use crate::repositories::AlbumRepository;
use crate::schema::ALBUM_TABLE;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

static RECOGNIZED_CRITERIA: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    ALBUM_TABLE
        .columns
        .iter()
        .map(|c| c.name)
        .chain(std::iter::once(INTERPRET))
        .chain(GENRE_FLAGS.iter().map(|(flag, _)| *flag))
        .collect()
});

/// Read side of the catalog
#[derive(Clone)]
pub struct AlbumReadService {
    repo: Arc<dyn AlbumRepository>,
    query_builder: QueryBuilder,
}

impl AlbumReadService {
    pub fn new(repo: Arc<dyn AlbumRepository>) -> Self {
        Self::with_query_builder(repo, QueryBuilder::default())
    }

    pub fn with_query_builder(repo: Arc<dyn AlbumRepository>, query_builder: QueryBuilder) -> Self {
        Self {
            repo,
            query_builder,
        }
    }

    /// Names accepted by [`find`](Self::find): every album column plus
    /// `interpret`, `pop` and `alternative`.
    pub fn recognized_criteria() -> &'static BTreeSet<&'static str> {
        &RECOGNIZED_CRITERIA
    }

    /// Fetch one album with its artist and tracks.
    ///
    /// # Errors
    /// `NotFound` when no album has this id.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: AlbumId) -> Result<Album> {
        let query = self.query_builder.build_by_id(id);

        let album = self
            .repo
            .find_one(&query)
            .await?
            .ok_or_else(|| CatalogError::not_found(id))?;

        debug!(album_id = %id, tracks = album.tracks.len(), "Album found");
        Ok(album)
    }

    /// Search albums.
    ///
    /// `None` or empty criteria list every album, possibly none. Otherwise
    /// every name must be recognized and at least one album must match.
    ///
    /// # Errors
    /// - `NotFound(InvalidCriteria)` for an unrecognized name
    /// - `NotFound(NoMatches)` when valid criteria match nothing
    pub async fn find(&self, criteria: Option<&Criteria>) -> Result<Vec<Album>> {
        let criteria = match criteria {
            Some(criteria) if !criteria.is_empty() => criteria,
            _ => {
                let query = self.query_builder.build(&Criteria::new());
                return self.repo.find_many(&query).await;
            }
        };

        let unknown: Vec<String> = criteria
            .names()
            .filter(|name| !RECOGNIZED_CRITERIA.contains(name))
            .map(str::to_string)
            .collect();

        if !unknown.is_empty() {
            debug!(names = ?unknown, "Rejecting unrecognized criteria");
            return Err(CatalogError::NotFound(NotFoundReason::InvalidCriteria {
                names: unknown,
            }));
        }

        let query = self.query_builder.build(criteria);
        let albums = self.repo.find_many(&query).await?;

        if albums.is_empty() {
            return Err(CatalogError::NotFound(NotFoundReason::NoMatches(
                criteria.to_json(),
            )));
        }

        debug!(count = albums.len(), "Albums found");
        Ok(albums)
    }
}
