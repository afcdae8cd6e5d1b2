//! Album repository trait and implementation

use crate::error::{CatalogError, Result};
use crate::models::{
    genres_from_column, genres_to_column, Album, AlbumDetails, AlbumId, AlbumType, Artist,
    NewArtist, NewTrack, Track,
};
use crate::query::{AlbumQuery, BindValue};
use async_trait::async_trait;
use sqlx::sqlite::SqliteArguments;
use sqlx::query::QueryAs;
use sqlx::{query, query_as, query_scalar, FromRow, Sqlite, SqlitePool, Transaction};
use tracing::debug;

/// Album repository interface for data access operations
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Run a single-album query and fold its rows into one album graph
    ///
    /// # Returns
    /// - `Ok(Some(album))` if found, with artist and tracks
    /// - `Ok(None)` if the query matched no row
    async fn find_one(&self, query: &AlbumQuery) -> Result<Option<Album>>;

    /// Run a list query. Albums carry their artist but no tracks.
    async fn find_many(&self, query: &AlbumQuery) -> Result<Vec<Album>>;

    /// Whether any album already uses `ean`
    async fn exists_by_ean(&self, ean: &str) -> Result<bool>;

    /// Persist the album's own fields and bump its version
    ///
    /// # Returns
    /// The version stored after the update
    ///
    /// # Errors
    /// Returns error if:
    /// - Album does not exist
    /// - The new EAN belongs to another album
    /// - Database error occurs
    async fn update(&self, album: &Album) -> Result<i64>;

    /// Start a transactional unit of work
    async fn begin(&self) -> Result<Box<dyn AlbumUnitOfWork>>;
}

/// Writes that must succeed or fail together.
///
/// Dropping a unit without calling [`commit`](AlbumUnitOfWork::commit)
/// rolls every write back.
#[async_trait]
pub trait AlbumUnitOfWork: Send {
    /// Insert the album row with version 0
    async fn insert_album(&mut self, details: &AlbumDetails, timestamp: i64) -> Result<AlbumId>;

    async fn insert_artist(&mut self, album_id: AlbumId, artist: &NewArtist) -> Result<i64>;

    async fn insert_track(&mut self, album_id: AlbumId, track: &NewTrack) -> Result<i64>;

    /// Returns the number of deleted rows
    async fn delete_artist(&mut self, artist_id: i64) -> Result<u64>;

    /// Returns the number of deleted rows
    async fn delete_track(&mut self, track_id: i64) -> Result<u64>;

    /// Returns the number of deleted rows
    async fn delete_album(&mut self, album_id: AlbumId) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// SQLite implementation of AlbumRepository
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    /// Create a new SqliteAlbumRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn find_one(&self, album_query: &AlbumQuery) -> Result<Option<Album>> {
        let rows = bind_all(query_as::<_, AlbumTrackRow>(&album_query.sql), &album_query.binds)
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "Fetched album graph rows");
        fold_album_graph(rows)
    }

    async fn find_many(&self, album_query: &AlbumQuery) -> Result<Vec<Album>> {
        let rows = bind_all(query_as::<_, AlbumRow>(&album_query.sql), &album_query.binds)
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "Fetched album rows");
        rows.into_iter().map(|row| row.into_album(Vec::new())).collect()
    }

    async fn exists_by_ean(&self, ean: &str) -> Result<bool> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM album WHERE ean = ?")
            .bind(ean)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn update(&self, album: &Album) -> Result<i64> {
        let details = &album.details;

        let version: Option<i64> = query_scalar(
            r#"
            UPDATE album
            SET version = version + 1, ean = ?, rating = ?, album_type = ?, title = ?,
                price = ?, discount = ?, available = ?, release_date = ?, homepage = ?,
                genres = ?, updated_at = ?
            WHERE id = ?
            RETURNING version
            "#,
        )
        .bind(&details.ean)
        .bind(details.rating)
        .bind(details.album_type.map(|t| t.as_str()))
        .bind(&details.title)
        .bind(details.price)
        .bind(details.discount)
        .bind(details.available)
        .bind(&details.release_date)
        .bind(&details.homepage)
        .bind(genres_to_column(&details.genres))
        .bind(album.updated_at)
        .bind(album.id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ean_conflict(e, &details.ean))?;

        version.ok_or_else(|| CatalogError::not_found(album.id))
    }

    async fn begin(&self) -> Result<Box<dyn AlbumUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }
}

/// Unit of work backed by one SQLite transaction
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl AlbumUnitOfWork for SqliteUnitOfWork {
    async fn insert_album(&mut self, details: &AlbumDetails, timestamp: i64) -> Result<AlbumId> {
        let result = query(
            r#"
            INSERT INTO album (
                version, ean, rating, album_type, title, price, discount, available,
                release_date, homepage, genres, created_at, updated_at
            )
            VALUES (0, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&details.ean)
        .bind(details.rating)
        .bind(details.album_type.map(|t| t.as_str()))
        .bind(&details.title)
        .bind(details.price)
        .bind(details.discount)
        .bind(details.available)
        .bind(&details.release_date)
        .bind(&details.homepage)
        .bind(genres_to_column(&details.genres))
        .bind(timestamp)
        .bind(timestamp)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| ean_conflict(e, &details.ean))?;

        Ok(AlbumId(result.last_insert_rowid()))
    }

    async fn insert_artist(&mut self, album_id: AlbumId, artist: &NewArtist) -> Result<i64> {
        let result = query("INSERT INTO artist (album_id, name, birth_date) VALUES (?, ?, ?)")
            .bind(album_id.0)
            .bind(&artist.name)
            .bind(&artist.birth_date)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn insert_track(&mut self, album_id: AlbumId, track: &NewTrack) -> Result<i64> {
        let result = query(
            "INSERT INTO track (album_id, title, duration, featured_artist) VALUES (?, ?, ?, ?)",
        )
        .bind(album_id.0)
        .bind(&track.title)
        .bind(&track.duration)
        .bind(&track.featured_artist)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn delete_artist(&mut self, artist_id: i64) -> Result<u64> {
        let result = query("DELETE FROM artist WHERE id = ?")
            .bind(artist_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_track(&mut self, track_id: i64) -> Result<u64> {
        let result = query("DELETE FROM track WHERE id = ?")
            .bind(track_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_album(&mut self, album_id: AlbumId) -> Result<u64> {
        let result = query("DELETE FROM album WHERE id = ?")
            .bind(album_id.0)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Row mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct AlbumRow {
    id: i64,
    version: i64,
    ean: String,
    rating: Option<i32>,
    album_type: Option<String>,
    title: String,
    price: f64,
    discount: Option<f64>,
    available: bool,
    release_date: Option<String>,
    homepage: Option<String>,
    genres: Option<String>,
    created_at: i64,
    updated_at: i64,
    artist_id: i64,
    artist_name: String,
    artist_birth_date: Option<String>,
}

impl AlbumRow {
    fn into_album(self, tracks: Vec<Track>) -> Result<Album> {
        let album_type = self
            .album_type
            .as_deref()
            .map(str::parse::<AlbumType>)
            .transpose()
            .map_err(|e| CatalogError::Database(sqlx::Error::Decode(e.into())))?;

        let id = AlbumId(self.id);

        Ok(Album {
            id,
            version: self.version,
            details: AlbumDetails {
                ean: self.ean,
                rating: self.rating,
                album_type,
                title: self.title,
                price: self.price,
                discount: self.discount,
                available: self.available,
                release_date: self.release_date,
                homepage: self.homepage,
                genres: genres_from_column(self.genres.as_deref()),
            },
            artist: Artist {
                id: self.artist_id,
                album_id: id,
                name: self.artist_name,
                birth_date: self.artist_birth_date,
            },
            tracks,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Album row plus the left-joined track columns
#[derive(Debug, FromRow)]
struct AlbumTrackRow {
    #[sqlx(flatten)]
    album: AlbumRow,
    track_id: Option<i64>,
    track_title: Option<String>,
    track_duration: Option<String>,
    track_featured_artist: Option<String>,
}

/// Fold one-row-per-track results into a single album
fn fold_album_graph(rows: Vec<AlbumTrackRow>) -> Result<Option<Album>> {
    let mut rows = rows.into_iter();
    let Some(mut first) = rows.next() else {
        return Ok(None);
    };

    let album_id = AlbumId(first.album.id);
    let mut tracks = Vec::new();
    let mut push_track = |row: &mut AlbumTrackRow| {
        if let (Some(id), Some(title)) = (row.track_id, row.track_title.take()) {
            tracks.push(Track {
                id,
                album_id,
                title,
                duration: row.track_duration.take(),
                featured_artist: row.track_featured_artist.take(),
            });
        }
    };

    push_track(&mut first);
    for mut row in rows {
        push_track(&mut row);
    }

    first.album.into_album(tracks).map(Some)
}

fn bind_all<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    binds: &'q [BindValue],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for bind in binds {
        query = match bind {
            BindValue::Integer(value) => query.bind(*value),
            BindValue::Real(value) => query.bind(*value),
            BindValue::Text(value) => query.bind(value.as_str()),
            BindValue::Bool(value) => query.bind(*value),
        };
    }
    query
}

/// Map a unique violation on `album.ean` to `EanExists`
fn ean_conflict(error: sqlx::Error, ean: &str) -> CatalogError {
    let is_ean_violation = error
        .as_database_error()
        .map(|db| db.is_unique_violation() && db.message().contains("album.ean"))
        .unwrap_or(false);

    if is_ean_violation {
        CatalogError::EanExists {
            ean: ean.to_string(),
        }
    } else {
        CatalogError::Database(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::query::{Criteria, QueryBuilder};

    async fn setup_repo() -> SqliteAlbumRepository {
        let pool = create_test_pool().await.unwrap();
        SqliteAlbumRepository::new(pool)
    }

    async fn insert_graph(repo: &SqliteAlbumRepository, ean: &str, artist: &str) -> AlbumId {
        let mut uow = repo.begin().await.unwrap();
        let mut details = AlbumDetails::new(ean, "TitelTest", 99.99);
        details.genres = vec!["POP".to_string(), "ROCK".to_string()];
        let id = uow.insert_album(&details, 1_700_000_000).await.unwrap();
        uow.insert_artist(id, &NewArtist::new(artist)).await.unwrap();
        uow.insert_track(id, &NewTrack::new("First", "3:25"))
            .await
            .unwrap();
        uow.insert_track(id, &NewTrack::new("Second", "4:10"))
            .await
            .unwrap();
        uow.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let repo = setup_repo().await;
        let id = insert_graph(&repo, "0602445706679", "Andrea").await;

        let query = QueryBuilder::default().build_by_id(id);
        let album = repo.find_one(&query).await.unwrap().unwrap();

        assert_eq!(album.id, id);
        assert_eq!(album.version, 0);
        assert_eq!(album.artist.name, "Andrea");
        assert_eq!(album.artist.album_id, id);
        assert_eq!(album.tracks.len(), 2);
        assert_eq!(album.tracks[0].title, "First");
        assert_eq!(album.details.genres, vec!["POP", "ROCK"]);
        assert_eq!(album.created_at, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_find_one_without_tracks() {
        let repo = setup_repo().await;
        let mut uow = repo.begin().await.unwrap();
        let id = uow
            .insert_album(&AlbumDetails::new("96385074", "Bare", 5.0), 0)
            .await
            .unwrap();
        uow.insert_artist(id, &NewArtist::new("Solo")).await.unwrap();
        uow.commit().await.unwrap();

        let album = repo
            .find_one(&QueryBuilder::default().build_by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert!(album.tracks.is_empty());
        assert!(album.details.genres.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let repo = setup_repo().await;
        {
            let mut uow = repo.begin().await.unwrap();
            uow.insert_album(&AlbumDetails::new("0602445706679", "Gone", 1.0), 0)
                .await
                .unwrap();
        }

        assert!(!repo.exists_by_ean("0602445706679").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_many_and_exists() {
        let repo = setup_repo().await;
        insert_graph(&repo, "0602445706679", "Andrea").await;
        insert_graph(&repo, "0028948592241", "Lizzo").await;

        let all = repo
            .find_many(&QueryBuilder::default().build(&Criteria::new()))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|a| a.tracks.is_empty()));

        assert!(repo.exists_by_ean("0028948592241").await.unwrap());
        assert!(!repo.exists_by_ean("96385074").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let repo = setup_repo().await;
        let id = insert_graph(&repo, "0602445706679", "Andrea").await;
        let mut album = repo
            .find_one(&QueryBuilder::default().build_by_id(id))
            .await
            .unwrap()
            .unwrap();

        album.details.title = "Renamed".to_string();
        assert_eq!(repo.update(&album).await.unwrap(), 1);
        assert_eq!(repo.update(&album).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_album() {
        let repo = setup_repo().await;
        let id = insert_graph(&repo, "0602445706679", "Andrea").await;
        let mut album = repo
            .find_one(&QueryBuilder::default().build_by_id(id))
            .await
            .unwrap()
            .unwrap();
        album.id = AlbumId(999);

        let err = repo.update(&album).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_ean_maps_to_ean_exists() {
        let repo = setup_repo().await;
        insert_graph(&repo, "0602445706679", "Andrea").await;

        let mut uow = repo.begin().await.unwrap();
        let err = uow
            .insert_album(&AlbumDetails::new("0602445706679", "Copy", 1.0), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::EanExists { .. }));
    }
}
