//! keyctl - API key service operator CLI
//!
//! Runs the server, or manages keys directly against the configured
//! database without going through HTTP.
//!
//! ```sh
//! # Run the server with default config (~/.config/api-key-service/config.toml)
//! keyctl serve
//!
//! # Custom config path, port override
//! keyctl --config /etc/api-key-service/config.toml serve --port 9000
//!
//! # Validate config without starting
//! keyctl serve --check
//!
//! # Manage keys
//! keyctl create "CI pipeline"
//! keyctl list --reveal
//! keyctl --json validate key-number-123456
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use api_key_service::application::{ApiKeyService, KeyCheck};
use api_key_service::config::{AppConfig, LoggingConfig};
use api_key_service::domain::ApiKey;
use api_key_service::interfaces::http::modules::api_keys::dto::ApiKeyDto;
use api_key_service::server::{init_tracing, Datastore, ServerHandle, ServerOptions};

/// Issue, manage and validate API keys.
#[derive(Parser, Debug)]
#[command(
    name = "keyctl",
    version,
    about = "API key service and key management CLI",
    long_about = "Runs the API key REST service, or manages keys directly \
                  against the configured database.\n\n\
                  Default config: ~/.config/api-key-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "APIKEY_SERVICE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the database URL (`memory://` for a throwaway store).
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST API server.
    Serve {
        /// Override the listen port.
        #[arg(long)]
        port: Option<u16>,

        /// Validate the configuration file and exit without starting the server.
        #[arg(long)]
        check: bool,

        /// Skip database migrations on startup.
        #[arg(long)]
        no_migrate: bool,
    },
    /// List keys, newest first.
    List {
        /// Print full key values instead of the masked form.
        #[arg(long)]
        reveal: bool,
    },
    /// Create a key and print it once in full.
    Create { name: String },
    /// Change a key's name.
    Rename { id: String, name: String },
    /// Delete a key permanently.
    Delete { id: String },
    /// Check a key and record its use.
    Validate { key: String },
    /// Apply pending database migrations and exit.
    Migrate,
}

fn load_config(cli: &Cli) -> AppConfig {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(api_key_service::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&logging_with_override(&cfg.logging, cli));
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_tracing(&logging_with_override(&LoggingConfig::default(), cli));
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            let mut cfg = AppConfig::default();
            cfg.apply_env_overrides();
            cfg
        }
    };

    if let Some(ref url) = cli.database_url {
        info!("CLI override: database_url = {}", url);
        config.database.url = url.clone();
    }
    config
}

/// Key management commands default to warnings only so output stays clean.
fn logging_with_override(logging: &LoggingConfig, cli: &Cli) -> LoggingConfig {
    let mut logging = logging.clone();
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    } else if !matches!(cli.command, Command::Serve { .. }) {
        logging.level = "warn".to_string();
    }
    logging
}

fn print_key(key: ApiKeyDto, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(&key).unwrap_or_default());
        return;
    }
    println!("{}", key.id);
    println!("   Name        : {}", key.name);
    println!("   Key         : {}", key.key.as_deref().unwrap_or(&key.masked_key));
    println!("   Created at  : {}", key.created_at);
    println!("   Last used   : {}", key.last_used.as_deref().unwrap_or("never"));
}

async fn serve(mut config: AppConfig, port: Option<u16>, check: bool, no_migrate: bool) -> Result<(), String> {
    if let Some(port) = port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    if check {
        println!("✅ Configuration is valid");
        println!("   API address : {}", config.server.address());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        println!(
            "   Admin token : {}",
            if config.security.admin_token.is_some() { "set" } else { "not set" }
        );
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !no_migrate,
    })
    .await
    .map_err(|e| e.to_string())?;

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}

/// Open the configured datastore with pending migrations applied, so key
/// commands work against a fresh database.
async fn open_datastore(config: &AppConfig) -> Result<Datastore, String> {
    Datastore::open(&config.database_config(), true)
        .await
        .map_err(|e| e.to_string())
}

async fn manage(cli: &Cli, config: &AppConfig) -> Result<(), String> {
    let store = open_datastore(config).await?;
    let service = ApiKeyService::new(store.repository.clone());

    let result = run_command(&cli.command, &service, cli.json).await;
    store.close().await;
    result
}

async fn run_command(command: &Command, service: &ApiKeyService, json: bool) -> Result<(), String> {
    match command {
        Command::List { reveal } => {
            let keys = service.list().await.map_err(|e| e.to_string())?;
            let to_dto: fn(ApiKey) -> ApiKeyDto = if *reveal {
                ApiKeyDto::revealed
            } else {
                ApiKeyDto::masked
            };
            let dtos: Vec<ApiKeyDto> = keys.into_iter().map(to_dto).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&dtos).unwrap_or_default());
            } else if dtos.is_empty() {
                println!("No API keys");
            } else {
                for key in dtos {
                    print_key(key, false);
                }
            }
        }
        Command::Create { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("name is required".to_string());
            }
            let key = service.create(name).await.map_err(|e| e.to_string())?;
            print_key(ApiKeyDto::revealed(key), json);
        }
        Command::Rename { id, name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("name is required".to_string());
            }
            let key = service.rename(id, name).await.map_err(|e| e.to_string())?;
            print_key(ApiKeyDto::masked(key), json);
        }
        Command::Delete { id } => {
            service.delete(id).await.map_err(|e| e.to_string())?;
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("🗑️  Deleted {}", id);
            }
        }
        Command::Validate { key } => {
            match service.validate(Some(key.as_str())).await.map_err(|e| e.to_string())? {
                KeyCheck::Valid(record) => {
                    if !json {
                        println!("✅ Valid API key");
                    }
                    print_key(ApiKeyDto::revealed(record), json);
                }
                KeyCheck::Invalid => return Err("Invalid API key".to_string()),
            }
        }
        Command::Migrate => {
            if json {
                println!("{}", serde_json::json!({ "migrated": true }));
            } else {
                println!("✅ Migrations applied");
            }
        }
        Command::Serve { .. } => return Err("serve does not run against a datastore".to_string()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config(&cli);

    let result = match cli.command {
        Command::Serve {
            port,
            check,
            no_migrate,
        } => serve(config, port, check, no_migrate).await,
        _ => manage(&cli, &config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", serde_json::json!({ "error": e }));
            } else {
                eprintln!("❌ {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config
    }

    #[tokio::test]
    async fn test_key_commands_work_on_fresh_database() {
        let store = open_datastore(&sqlite_memory_config()).await.unwrap();
        let service = ApiKeyService::new(store.repository.clone());

        let create = Command::Create { name: "CI".to_string() };
        assert!(run_command(&create, &service, true).await.is_ok());

        let keys = service.list().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "CI");

        let list = Command::List { reveal: false };
        assert!(run_command(&list, &service, true).await.is_ok());
        store.close().await;
    }

    #[tokio::test]
    async fn test_blank_name_and_unknown_key_fail() {
        let store = open_datastore(&sqlite_memory_config()).await.unwrap();
        let service = ApiKeyService::new(store.repository.clone());

        let blank = Command::Create { name: "  ".to_string() };
        assert_eq!(run_command(&blank, &service, false).await.unwrap_err(), "name is required");

        let unknown = Command::Validate { key: "key-number-000000".to_string() };
        assert_eq!(run_command(&unknown, &service, false).await.unwrap_err(), "Invalid API key");
        store.close().await;
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["keyctl", "list", "--reveal", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Command::List { reveal: true }));
    }
}
