//! # API Key Service
//!
//! Issue, manage and validate API keys over a small REST API.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: The API key record and the repository trait
//! - **application**: Key minting and validation use cases
//! - **infrastructure**: SeaORM and in-memory storage, graceful shutdown
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Runtime bootstrap shared by the binaries

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryApiKeyRepository, SeaOrmApiKeyRepository};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiContext};
