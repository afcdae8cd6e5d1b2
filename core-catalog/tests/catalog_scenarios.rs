//! End-to-end catalog scenarios against an in-memory database.

use bridge_traits::FixedClock;
use core_catalog::db::create_test_pool;
use core_catalog::{
    AlbumChanges, AlbumDetails, AlbumId, AlbumReadService, AlbumRepository, AlbumWriteService,
    CatalogError, Criteria, ErrorKind, NewAlbum, NewArtist, NewTrack, NotFoundReason,
    SqliteAlbumRepository, UpdateParams,
};
use sqlx::SqlitePool;
use std::sync::Arc;

struct Catalog {
    pool: SqlitePool,
    read: AlbumReadService,
    write: AlbumWriteService,
}

async fn catalog() -> Catalog {
    let pool = create_test_pool().await.expect("test pool");
    let repo: Arc<dyn AlbumRepository> = Arc::new(SqliteAlbumRepository::new(pool.clone()));
    let read = AlbumReadService::new(repo.clone());
    let write = AlbumWriteService::new(
        repo,
        read.clone(),
        Arc::new(FixedClock::from_unix(1_555_555_555)),
    );
    Catalog { pool, read, write }
}

fn album(ean: &str, title: &str, artist: &str) -> NewAlbum {
    NewAlbum::new(AlbumDetails::new(ean, title, 9.99), NewArtist::new(artist))
}

async fn seed(catalog: &Catalog) -> (AlbumId, AlbumId, AlbumId) {
    let mut pop = album("0602445706679", "TitelTest", "Andrea");
    pop.details.rating = Some(4);
    pop.details.genres = vec!["POP".to_string(), "DANCE".to_string()];
    let pop = pop
        .with_track(NewTrack::new("Intro", "1:02"))
        .with_track(NewTrack::new("Hit", "3:25"));

    let mut alt = album("0028948592241", "Cuz I Love You", "Lizzo");
    alt.details.rating = Some(5);
    alt.details.available = true;
    alt.details.genres = vec!["ALTERNATIVE".to_string()];

    let bare = album("96385074", "No Genres", "Grandmaster");

    (
        catalog.write.create(pop).await.unwrap(),
        catalog.write.create(alt).await.unwrap(),
        catalog.write.create(bare).await.unwrap(),
    )
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn create_assigns_id_and_version_zero() {
    let catalog = catalog().await;
    let mut new_album = album("0602445706679", "TitelTest", "Andrea");
    new_album.details.price = 99.99;
    new_album.details.rating = Some(4);

    let id = catalog.write.create(new_album).await.unwrap();
    let stored = catalog.read.find_by_id(id).await.unwrap();

    assert_eq!(stored.id, id);
    assert_eq!(stored.version, 0);
    assert_eq!(stored.details.title, "TitelTest");
    assert_eq!(stored.details.price, 99.99);
    assert_eq!(stored.details.rating, Some(4));
}

#[tokio::test]
async fn interpret_matches_artist_substring_case_insensitively() {
    let catalog = catalog().await;
    let (andrea, _, grandmaster) = seed(&catalog).await;

    let criteria = Criteria::new().with("interpret", "ND");
    let albums = catalog.read.find(Some(&criteria)).await.unwrap();

    let ids: Vec<AlbumId> = albums.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![andrea, grandmaster]);
    assert!(albums
        .iter()
        .all(|a| a.artist.name.to_lowercase().contains("nd")));
}

#[tokio::test]
async fn genre_flags_and_equality_are_conjoined() {
    let catalog = catalog().await;
    let (andrea, lizzo, _) = seed(&catalog).await;

    let pop = catalog
        .read
        .find(Some(&Criteria::new().with("pop", true)))
        .await
        .unwrap();
    assert_eq!(pop.len(), 1);
    assert_eq!(pop[0].id, andrea);

    let alt_available = catalog
        .read
        .find(Some(
            &Criteria::new()
                .with("alternative", "true")
                .with("available", true)
                .with("rating", 5),
        ))
        .await
        .unwrap();
    assert_eq!(alt_available.len(), 1);
    assert_eq!(alt_available[0].id, lizzo);

    let err = catalog
        .read
        .find(Some(&Criteria::new().with("pop", true).with("rating", 5)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unmatched_rating_reports_no_albums_found() {
    let catalog = catalog().await;
    seed(&catalog).await;

    let err = catalog
        .read
        .find(Some(&Criteria::new().with("rating", 99)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::NotFound(NotFoundReason::NoMatches(_))
    ));
    assert!(err.to_string().to_lowercase().contains("no albums found"));
}

#[tokio::test]
async fn unknown_criterion_is_invalid_criteria() {
    let catalog = catalog().await;
    seed(&catalog).await;

    let err = catalog
        .read
        .find(Some(&Criteria::new().with("label", "Atlantic")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CatalogError::NotFound(NotFoundReason::InvalidCriteria { .. })
    ));
}

#[tokio::test]
async fn find_without_criteria_lists_everything() {
    let catalog = catalog().await;
    assert!(catalog.read.find(None).await.unwrap().is_empty());

    seed(&catalog).await;
    let all = catalog.read.find(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn genres_are_never_null() {
    let catalog = catalog().await;
    let (_, _, bare) = seed(&catalog).await;

    let album = catalog.read.find_by_id(bare).await.unwrap();
    assert!(album.details.genres.is_empty());
    assert!(album.tracks.is_empty());
}

#[tokio::test]
async fn duplicate_ean_leaves_storage_unchanged() {
    let catalog = catalog().await;
    seed(&catalog).await;
    let before = (
        count(&catalog.pool, "album").await,
        count(&catalog.pool, "artist").await,
        count(&catalog.pool, "track").await,
    );

    let duplicate = album("0602445706679", "Copy", "Someone")
        .with_track(NewTrack::new("Copied", "2:00"));
    let err = catalog.write.create(duplicate).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EanExists);
    assert_eq!(err.status_code(), 422);
    let after = (
        count(&catalog.pool, "album").await,
        count(&catalog.pool, "artist").await,
        count(&catalog.pool, "track").await,
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn update_version_boundaries() {
    let catalog = catalog().await;
    let (id, _, _) = seed(&catalog).await;
    let changes = AlbumChanges::new("0602445706679", "TitelTest", 99.99);

    let version = catalog
        .write
        .update(UpdateParams::new(id, changes.clone(), "\"0\""))
        .await
        .unwrap();
    assert_eq!(version, 1);

    let version = catalog
        .write
        .update(UpdateParams::new(id, changes.clone(), "\"1\""))
        .await
        .unwrap();
    assert_eq!(version, 2);

    // stored - 1
    let err = catalog
        .write
        .update(UpdateParams::new(id, changes.clone(), "\"1\""))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::VersionOutdated { version: 1 }));
    assert_eq!(err.status_code(), 412);

    // stored + 1
    let version = catalog
        .write
        .update(UpdateParams::new(id, changes, "\"3\""))
        .await
        .unwrap();
    assert_eq!(version, 3);
}

#[tokio::test]
async fn negative_version_token_is_invalid() {
    let catalog = catalog().await;
    let (id, _, _) = seed(&catalog).await;

    let err = catalog
        .write
        .update(UpdateParams::new(
            id,
            AlbumChanges::new("0602445706679", "TitelTest", 99.99),
            "\"-1\"",
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::VersionInvalid { ref version } if version == "\"-1\""));
}

#[tokio::test]
async fn delete_removes_artist_and_tracks() {
    let catalog = catalog().await;
    let (id, lizzo, _) = seed(&catalog).await;

    assert!(catalog.write.delete(id).await.unwrap());

    let err = catalog.read.find_by_id(id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(NotFoundReason::Id(gone)) if gone == id));

    let orphans: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM artist WHERE album_id = ?) + (SELECT COUNT(*) FROM track WHERE album_id = ?)",
    )
    .bind(id.0)
    .bind(id.0)
    .fetch_one(&catalog.pool)
    .await
    .unwrap();
    assert_eq!(orphans, 0);

    // Other albums untouched
    assert_eq!(catalog.read.find_by_id(lizzo).await.unwrap().artist.name, "Lizzo");
}

#[tokio::test]
async fn padded_genres_survive_storage_and_update() {
    let catalog = catalog().await;
    let mut padded = album("0602445706679", "TitelTest", "Andrea");
    padded.details.genres = vec![" POP".to_string(), "ROCK ".to_string()];
    let id = catalog.write.create(padded).await.unwrap();

    let stored = catalog.read.find_by_id(id).await.unwrap();
    assert_eq!(stored.details.genres, vec!["POP", "ROCK"]);

    let version = catalog
        .write
        .update(UpdateParams::new(
            id,
            AlbumChanges::new("0602445706679", "TitelTest", 9.99),
            "\"0\"",
        ))
        .await
        .unwrap();
    assert_eq!(version, 1);

    let mut twice = album("0028948592241", "Twice", "Lizzo");
    twice.details.genres = vec!["POP".to_string(), "POP ".to_string()];
    let err = catalog.write.create(twice).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(count(&catalog.pool, "album").await, 1);
}

#[tokio::test]
async fn update_can_clear_nullable_fields() {
    let catalog = catalog().await;
    let mut new_album = album("0602445706679", "TitelTest", "Andrea");
    new_album.details.homepage = Some("https://test.de/".to_string());
    new_album.details.rating = Some(4);
    let id = catalog.write.create(new_album).await.unwrap();

    let mut changes = AlbumChanges::new("0602445706679", "TitelTest", 9.99);
    changes.homepage = Some(None);
    catalog
        .write
        .update(UpdateParams::new(id, changes, "\"0\""))
        .await
        .unwrap();

    let stored = catalog.read.find_by_id(id).await.unwrap();
    assert_eq!(stored.details.homepage, None);
    assert_eq!(stored.details.rating, Some(4));
}
