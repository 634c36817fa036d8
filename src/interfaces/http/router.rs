//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::middleware::{
    admin_auth_middleware, api_key_middleware, AdminAuthState, ApiKeyAuthState,
};
use super::modules::api_keys::dto::{ApiKeyDto, CreateApiKeyRequest, RenameApiKeyRequest};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::summarizer::dto::{RepositorySummary, SummarizeRequest};
use super::modules::validation::dto::{ValidateKeyRequest, ValidateKeyResponse};
use super::modules::{api_keys, health, summarizer, validation};
use crate::application::ApiKeyService;
use crate::config::{RateLimitConfig, SecurityConfig};

/// Everything the HTTP layer needs from the outside
#[derive(Clone)]
pub struct ApiContext {
    pub service: Arc<ApiKeyService>,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    /// `None` leaves `/metrics` unmounted
    pub metrics: Option<PrometheusHandle>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Admin token from security.admin_token"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        validation::validate_key,
        summarizer::summarize_repository,
        api_keys::list_api_keys,
        api_keys::create_api_key,
        api_keys::rename_api_key,
        api_keys::delete_api_key,
    ),
    components(
        schemas(
            ApiResponse<String>,
            ApiKeyDto,
            CreateApiKeyRequest,
            RenameApiKeyRequest,
            ValidateKeyRequest,
            ValidateKeyResponse,
            SummarizeRequest,
            RepositorySummary,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Validation", description = "Check a presented API key and record its use"),
        (name = "Summarizer", description = "Key-protected repository summaries"),
        (name = "API Keys", description = "List, create, rename and delete API keys"),
    ),
    info(
        title = "API Key Service",
        version = "0.1.0",
        description = "Issue, manage and validate API keys",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Per-IP limiter for the routes that accept client keys
fn key_routes_with_rate_limit(routes: Router, config: &RateLimitConfig) -> Router {
    if !config.enabled {
        return routes;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .finish();

    match governor_conf {
        Some(conf) => routes.route_layer(GovernorLayer::new(Arc::new(conf))),
        None => {
            warn!(
                "Invalid rate limit settings (per_second={}, burst_size={}); rate limiting disabled",
                config.per_second, config.burst_size
            );
            routes
        }
    }
}

/// Create the API router with all routes
pub fn create_api_router(ctx: ApiContext) -> Router {
    let service = ctx.service.clone();

    // Management routes (admin token)
    let admin_state = AdminAuthState::from_config(&ctx.security);
    let api_key_routes = Router::new()
        .route(
            "/",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route(
            "/{id}",
            put(api_keys::rename_api_key).delete(api_keys::delete_api_key),
        )
        .layer(middleware::from_fn_with_state(
            admin_state,
            admin_auth_middleware,
        ))
        .with_state(api_keys::ApiKeyHandlerState {
            service: service.clone(),
        });

    // Routes that take a client key
    let validation_routes = Router::new()
        .route("/validate-key", post(validation::validate_key))
        .with_state(validation::ValidationState {
            service: service.clone(),
        });

    let summarizer_routes = Router::new()
        .route(
            "/github-summarizer",
            post(summarizer::summarize_repository),
        )
        .route_layer(middleware::from_fn_with_state(
            ApiKeyAuthState {
                service: service.clone(),
            },
            api_key_middleware,
        ));

    let key_routes = key_routes_with_rate_limit(
        validation_routes.merge(summarizer_routes),
        &ctx.rate_limit,
    );

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            service,
            started_at: Arc::new(Instant::now()),
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1", key_routes)
        .nest("/api/v1/api-keys", api_key_routes);

    if let Some(handle) = ctx.metrics {
        router = router.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
