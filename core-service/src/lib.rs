//! Core service façade and bootstrap helpers.
//!
//! This crate wires the runtime configuration, the SQLite pool and the host
//! collaborators (`Mailer`, `Clock`) into a single [`CatalogService`] handle.
//! Transports (REST, GraphQL, CLI) talk to the catalog only through it and
//! map failures with [`CoreError::status_code`].

pub mod error;

pub use error::{CoreError, Result};

pub use core_catalog::{
    Album, AlbumChanges, AlbumDetails, AlbumId, AlbumType, Artist, CatalogError, Criteria,
    CriterionValue, ErrorKind, NewAlbum, NewArtist, NewTrack, NotFoundReason, Track,
    UpdateParams,
};
pub use core_runtime::{CatalogConfig, CatalogConfigBuilder};

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{Clock, LogMailer, Mailer, SystemClock};
use core_catalog::db::{create_pool, DatabaseConfig};
use core_catalog::{AlbumReadService, AlbumRepository, AlbumWriteService, SqliteAlbumRepository};
use sqlx::SqlitePool;
use tracing::info;

/// Host collaborators the catalog needs.
#[derive(Clone)]
pub struct CatalogDependencies {
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
}

impl CatalogDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>) -> Self {
        Self { mailer, clock }
    }
}

impl Default for CatalogDependencies {
    /// Log-only mailer and the system clock
    fn default() -> Self {
        Self {
            mailer: Arc::new(LogMailer),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Install the global `tracing` subscriber described by `config`.
///
/// Call once at startup, before [`CatalogService::bootstrap`].
pub fn init_logging(config: &CatalogConfig) -> Result<()> {
    core_runtime::logging::init_logging(config.logging_config())?;
    Ok(())
}

/// Parse criteria sent as a flat JSON object, e.g. `{"interpret":"nd"}`.
pub fn parse_criteria(json: &str) -> Result<Criteria> {
    serde_json::from_str(json).map_err(|e| {
        CoreError::Catalog(CatalogError::InvalidInput {
            field: "criteria".to_string(),
            message: e.to_string(),
        })
    })
}

fn database_config(config: &CatalogConfig) -> DatabaseConfig {
    let base = match &config.database_path {
        Some(path) => DatabaseConfig::new(path)
            .min_connections(config.min_connections)
            .max_connections(config.max_connections),
        None => DatabaseConfig::in_memory(),
    };

    base.acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
}

/// Primary façade exposed to transports.
#[derive(Clone)]
pub struct CatalogService {
    config: Arc<CatalogConfig>,
    pool: SqlitePool,
    read: AlbumReadService,
    write: AlbumWriteService,
}

impl CatalogService {
    /// Open the configured database and build the services with default
    /// collaborators.
    pub async fn bootstrap(config: CatalogConfig) -> Result<Self> {
        Self::bootstrap_with(config, CatalogDependencies::default()).await
    }

    /// Open the configured database and build the services around `deps`.
    pub async fn bootstrap_with(config: CatalogConfig, deps: CatalogDependencies) -> Result<Self> {
        config.validate()?;

        info!(
            database = %config.database_label(),
            notifications = config.notifications_enabled,
            "Bootstrapping album catalog"
        );

        let pool = create_pool(database_config(&config)).await?;
        Ok(Self::from_pool(config, pool, deps))
    }

    /// Build the services on an existing, migrated pool.
    pub fn from_pool(config: CatalogConfig, pool: SqlitePool, deps: CatalogDependencies) -> Self {
        let repo: Arc<dyn AlbumRepository> = Arc::new(SqliteAlbumRepository::new(pool.clone()));
        let read = AlbumReadService::new(Arc::clone(&repo));

        let mut write = AlbumWriteService::new(repo, read.clone(), deps.clock);
        if config.notifications_enabled {
            write = write.with_mailer(deps.mailer);
        }

        Self {
            config: Arc::new(config),
            pool,
            read,
            write,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub async fn find_by_id(&self, id: AlbumId) -> Result<Album> {
        Ok(self.read.find_by_id(id).await?)
    }

    pub async fn find(&self, criteria: Option<&Criteria>) -> Result<Vec<Album>> {
        Ok(self.read.find(criteria).await?)
    }

    pub async fn create(&self, album: NewAlbum) -> Result<AlbumId> {
        Ok(self.write.create(album).await?)
    }

    pub async fn update(&self, params: UpdateParams) -> Result<i64> {
        Ok(self.write.update(params).await?)
    }

    pub async fn delete(&self, id: AlbumId) -> Result<bool> {
        Ok(self.write.delete(id).await?)
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn shutdown(self) {
        self.pool.close().await;
        info!("Album catalog shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::FixedClock;
    use mockall::mock;

    mock! {
        pub Notifier {}

        #[async_trait]
        impl Mailer for Notifier {
            async fn send(&self, subject: &str, body: &str) -> bridge_traits::error::Result<()>;
        }
    }

    fn new_album() -> NewAlbum {
        NewAlbum::new(
            AlbumDetails::new("0602445706679", "TitelTest", 99.99),
            NewArtist::new("Andrea"),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_in_memory() {
        let config = CatalogConfig::builder()
            .notifications_enabled(false)
            .build()
            .unwrap();
        let service = CatalogService::bootstrap(config).await.unwrap();

        let id = service.create(new_album()).await.unwrap();
        let album = service.find_by_id(id).await.unwrap();
        assert_eq!(album.details.title, "TitelTest");

        let criteria = parse_criteria(r#"{"interpret":"nd"}"#).unwrap();
        assert_eq!(service.find(Some(&criteria)).await.unwrap().len(), 1);

        assert!(service.delete(id).await.unwrap());
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_disabled_notifications_never_call_mailer() {
        let config = CatalogConfig::builder()
            .notifications_enabled(false)
            .build()
            .unwrap();
        // No expectations: a send would panic
        let deps = CatalogDependencies::new(
            Arc::new(MockNotifier::new()),
            Arc::new(FixedClock::from_unix(0)),
        );

        let service = CatalogService::bootstrap_with(config, deps).await.unwrap();
        service.create(new_album()).await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_keep_status_codes() {
        let service = CatalogService::bootstrap(CatalogConfig::default())
            .await
            .unwrap();

        let err = service.find_by_id(AlbumId(5)).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(matches!(
            err.as_catalog(),
            Some(CatalogError::NotFound(NotFoundReason::Id(AlbumId(5))))
        ));

        let err = service
            .update(UpdateParams::new(
                AlbumId(5),
                AlbumChanges::new("0602445706679", "TitelTest", 1.0),
                "abc",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 412);
    }

    #[test]
    fn test_parse_criteria_rejects_non_objects() {
        let err = parse_criteria("[1, 2]").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = CatalogConfig {
            max_connections: 0,
            ..CatalogConfig::default()
        };
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let err = runtime
            .block_on(CatalogService::bootstrap(config))
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Runtime(_)));
    }
}
