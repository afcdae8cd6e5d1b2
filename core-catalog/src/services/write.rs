//! Album creation, optimistic updates and cascading deletes.

use crate::error::{CatalogError, Result};
use crate::models::{AlbumChanges, AlbumId, NewAlbum};
use crate::repositories::AlbumRepository;
use crate::services::read::AlbumReadService;
use bridge_traits::{Clock, Mailer};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// `"N"` with one to three digits, as sent in an `If-Match` header
static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(\d{1,3})"$"#).expect("static regex"));

/// Input of [`AlbumWriteService::update`]
#[derive(Debug, Clone)]
pub struct UpdateParams {
    pub id: AlbumId,
    pub changes: AlbumChanges,
    /// Raw version token, quotes included
    pub version: String,
}

impl UpdateParams {
    pub fn new(id: AlbumId, changes: AlbumChanges, version: impl Into<String>) -> Self {
        Self {
            id,
            changes,
            version: version.into(),
        }
    }
}

/// Parse a version token such as `"3"` into its number
pub fn parse_version_token(token: &str) -> Result<i64> {
    VERSION_TOKEN
        .captures(token)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<i64>().ok())
        .ok_or_else(|| CatalogError::VersionInvalid {
            version: token.to_string(),
        })
}

/// Write side of the catalog
#[derive(Clone)]
pub struct AlbumWriteService {
    repo: Arc<dyn AlbumRepository>,
    read_service: AlbumReadService,
    clock: Arc<dyn Clock>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl AlbumWriteService {
    /// Create a write service that sends no notifications
    pub fn new(
        repo: Arc<dyn AlbumRepository>,
        read_service: AlbumReadService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            read_service,
            clock,
            mailer: None,
        }
    }

    /// Announce every created album through `mailer`
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Create an album together with its artist and tracks.
    ///
    /// The notification is dispatched after commit and never awaited.
    ///
    /// # Errors
    /// - `InvalidInput` when a field breaks a validation rule
    /// - `EanExists` when the EAN is taken; nothing is written
    #[instrument(skip(self, new_album), fields(ean = %new_album.details.ean))]
    pub async fn create(&self, new_album: NewAlbum) -> Result<AlbumId> {
        new_album
            .validate()
            .map_err(|message| CatalogError::InvalidInput {
                field: "Album".to_string(),
                message,
            })?;

        if self.repo.exists_by_ean(&new_album.details.ean).await? {
            return Err(CatalogError::EanExists {
                ean: new_album.details.ean.clone(),
            });
        }

        let now = self.clock.unix_timestamp();

        let mut uow = self.repo.begin().await?;
        let id = uow.insert_album(&new_album.details, now).await?;
        uow.insert_artist(id, &new_album.artist).await?;
        for track in &new_album.tracks {
            uow.insert_track(id, track).await?;
        }
        uow.commit().await?;

        info!(
            album_id = %id,
            tracks = new_album.tracks.len(),
            "Album created"
        );

        self.notify_created(id, &new_album);
        Ok(id)
    }

    /// Apply `changes` if the caller's version is not stale.
    ///
    /// Checks run in order and stop at the first failure: token syntax,
    /// existence, staleness, then validation of the merged album.
    ///
    /// # Returns
    /// The album's new version
    #[instrument(skip(self, params), fields(album_id = %params.id, version = %params.version))]
    pub async fn update(&self, params: UpdateParams) -> Result<i64> {
        let UpdateParams {
            id,
            changes,
            version,
        } = params;

        let submitted = parse_version_token(&version)?;

        let mut album = self.read_service.find_by_id(id).await?;

        // Newer-than-stored tokens are accepted
        if submitted < album.version {
            debug!(submitted, stored = album.version, "Rejecting stale version");
            return Err(CatalogError::VersionOutdated { version: submitted });
        }

        changes
            .validate()
            .map_err(|message| CatalogError::InvalidInput {
                field: "Album".to_string(),
                message,
            })?;

        album.apply(changes);
        album
            .validate()
            .map_err(|message| CatalogError::InvalidInput {
                field: "Album".to_string(),
                message,
            })?;
        album.updated_at = self.clock.unix_timestamp();

        let new_version = self.repo.update(&album).await?;

        info!(album_id = %id, new_version, "Album updated");
        Ok(new_version)
    }

    /// Delete an album, its artist and its tracks in one transaction.
    ///
    /// # Returns
    /// `true` if the album row was deleted
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AlbumId) -> Result<bool> {
        let album = self.read_service.find_by_id(id).await?;

        let mut uow = self.repo.begin().await?;
        uow.delete_artist(album.artist.id).await?;
        for track in &album.tracks {
            uow.delete_track(track.id).await?;
        }
        let deleted = uow.delete_album(id).await?;
        uow.commit().await?;

        info!(
            album_id = %id,
            tracks = album.tracks.len(),
            deleted,
            "Album deleted"
        );
        Ok(deleted > 0)
    }

    fn notify_created(&self, id: AlbumId, album: &NewAlbum) {
        let Some(mailer) = self.mailer.clone() else {
            return;
        };

        let subject = format!("New album {}", id);
        let body = format!(
            "New album <strong>{}</strong> by {} with id {}",
            album.details.title, album.artist.name, id
        );

        tokio::spawn(async move {
            if let Err(e) = mailer.send(&subject, &body).await {
                warn!(album_id = %id, error = %e, "Failed to send album notification");
            }
        });
    }
}
