//! API key service
//!
//! Reads configuration from a TOML file (`APIKEY_SERVICE_CONFIG`, or
//! ~/.config/api-key-service/config.toml).

use std::path::PathBuf;

use tracing::{error, info};

use api_key_service::config::LoggingConfig;
use api_key_service::server::{init_tracing, ServerHandle, ServerOptions};
use api_key_service::{default_config_path, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("APIKEY_SERVICE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load config: {}. Using defaults.", e);
            let mut cfg = AppConfig::default();
            cfg.apply_env_overrides();
            cfg
        }
    };

    let handle = match ServerHandle::start(ServerOptions {
        config: app_cfg,
        auto_migrate: true,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start server: {}", e);
            return Err(e.into());
        }
    };

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");
    handle.wait().await;

    Ok(())
}
