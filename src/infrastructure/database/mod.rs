pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmApiKeyRepository;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

/// URL that selects the in-memory repository instead of a database
pub const MEMORY_URL: &str = "memory://";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./api_keys.db?mode=rwc")
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./api_keys.db?mode=rwc".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_URL
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);
    let mut opts = ConnectOptions::new(config.url.clone());
    opts.sqlx_logging(false);
    if config.url.contains(":memory:") {
        // every pooled connection would open its own empty database
        opts.max_connections(1);
    }
    let db = Database::connect(opts).await?;
    info!("Database connected successfully");
    Ok(db)
}
