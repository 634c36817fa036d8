//! Reusable server runtime.
//!
//! Provides [`ServerHandle`] that owns the full lifecycle: logging, metrics
//! recorder, datastore, migrations, REST API and graceful shutdown. The
//! `api-key-service` binary and the `keyctl` CLI both build on it.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::application::ApiKeyService;
use crate::config::{AppConfig, LogFormat, LoggingConfig, SecurityConfig};
use crate::domain::ApiKeyRepository;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{
    init_database, listen_for_shutdown_signals, DatabaseConfig, InMemoryApiKeyRepository,
    SeaOrmApiKeyRepository, ShutdownSignal,
};
use crate::interfaces::http::{create_api_router, ApiContext};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the level.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let result = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// The recorder is process-global, so a restart within one process reuses it.
fn prometheus_handle() -> Result<PrometheusHandle, ServerError> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;
    info!("📊 Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

/// A repository plus the connection behind it, if any
pub struct Datastore {
    pub repository: Arc<dyn ApiKeyRepository>,
    pub connection: Option<DatabaseConnection>,
}

impl Datastore {
    /// Open the datastore named by `config`, migrating it when asked
    pub async fn open(config: &DatabaseConfig, migrate: bool) -> Result<Self, ServerError> {
        if config.is_memory() {
            warn!("Using in-memory key store; keys are lost on restart");
            return Ok(Self {
                repository: Arc::new(InMemoryApiKeyRepository::new()),
                connection: None,
            });
        }

        let db = init_database(config).await?;
        if migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        Ok(Self {
            repository: Arc::new(SeaOrmApiKeyRepository::new(db.clone())),
            connection: Some(db),
        })
    }

    pub async fn close(self) {
        let Some(db) = self.connection else {
            return;
        };
        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }
    }
}

fn warn_on_management_access(security: &SecurityConfig) {
    let has_token = security
        .admin_token
        .as_deref()
        .is_some_and(|t| !t.is_empty());
    if has_token {
        return;
    }
    if security.allow_open_management {
        warn!("⚠️ No admin token configured and allow_open_management=true: key management is OPEN to anyone");
    } else {
        warn!("No admin token configured: /api/v1/api-keys will reject every request");
    }
}

/// Options for starting the service.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running service.
///
/// ```rust,no_run
/// use api_key_service::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Address the REST API is bound to.
    pub local_addr: SocketAddr,
    pub service: Arc<ApiKeyService>,

    shutdown: ShutdownSignal,
    datastore: Datastore,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the service with the given options.
    pub async fn start(opts: ServerOptions) -> Result<Self, ServerError> {
        let app_cfg = opts.config;
        info!("Starting API key service...");

        let prometheus = prometheus_handle()?;

        let datastore = Datastore::open(&app_cfg.database_config(), opts.auto_migrate).await?;
        let service = Arc::new(ApiKeyService::new(datastore.repository.clone()));

        warn_on_management_access(&app_cfg.security);
        if app_cfg.rate_limit.enabled {
            info!(
                "Rate limiting key routes: {}/s, burst {}",
                app_cfg.rate_limit.per_second, app_cfg.rate_limit.burst_size
            );
        }

        let api_router = create_api_router(ApiContext {
            service: service.clone(),
            security: app_cfg.security.clone(),
            rate_limit: app_cfg.rate_limit.clone(),
            metrics: Some(prometheus),
        });

        let addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownSignal::new();
        let api_shutdown = shutdown.clone();
        let api_server = axum::serve(
            listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            local_addr,
            service,
            shutdown,
            datastore,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Trigger shutdown on SIGTERM / SIGINT.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    /// Wait until the API server stops, then close the datastore.
    pub async fn wait(self) {
        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        self.datastore.close().await;
        info!("👋 API key service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        self.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::infrastructure::database::MEMORY_URL;

    #[tokio::test]
    async fn test_memory_datastore_has_no_connection() {
        let store = Datastore::open(&DatabaseConfig { url: MEMORY_URL.to_string() }, true)
            .await
            .unwrap();
        assert!(store.connection.is_none());
        assert!(store.repository.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_sqlite_datastore_is_migrated() {
        let store = Datastore::open(&DatabaseConfig { url: "sqlite::memory:".to_string() }, true)
            .await
            .unwrap();
        assert!(store.repository.list().await.unwrap().is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut config = AppConfig::default();
        config.server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        config.database.url = MEMORY_URL.to_string();

        let handle = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await
        .unwrap();
        assert_ne!(handle.local_addr.port(), 0);

        handle.shutdown().await;
    }
}
