//! # Authorization Engine HTTP Adapter
//!
//! The HTTP surface around `warden-rbac`'s engine: an axum server that
//! resolves a caller's trusted identity headers into a `Principal`
//! ([`warden_auth`]) and then asks `RbacEngine` whether that principal may
//! act on the resource a route names.
//!
//! ## Middleware Stack
//!
//! Requests flow through middleware in this order:
//! 1. **Security Headers**: HSTS, CSP, X-Frame-Options
//! 2. **Request ID**: Unique tracking for request tracing
//! 3. **Tracing**: Structured logging with correlation IDs
//! 4. **Compression**: Gzip/Brotli response compression
//! 5. **CORS**: Cross-origin resource sharing policies
//! 6. **Principal resolution**: trusted-header identity extraction, scoped
//!    to `/api/v1` only — `/health` and `/ready` stay open to unauthenticated
//!    probes.
//!
//! ## Usage
//!
//! Start the server:
//! ```bash
//! cargo run --bin warden-server
//! ```
//!
//! The server will be available at:
//! - **API**: http://localhost:3000/api/v1/
//! - **Health**: http://localhost:3000/health
//! - **Docs**: http://localhost:3000/swagger-ui

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use axum::http::{HeaderName, HeaderValue, Method};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use warden_auth::{principal_middleware, AuthState};
use warden_core::{Config, CorsConfig, DatabasePool};
use warden_rbac::{CompiledSchemaSet, PgRbacRepository, RbacEngine, RbacRepository};

mod api_middleware;
mod error;
mod handlers;
mod health;
mod state;

use crate::{
    handlers::{applications, permissions, projects, roles},
    state::AppState,
};

/// Builds a CORS layer from configuration settings.
///
/// - **Origins**: Specific domains or "*" wildcard (development only)
/// - **Methods**: HTTP methods allowed for cross-origin requests
/// - **Headers**: Request headers permitted in CORS requests
/// - **Credentials**: Whether to allow cookies and authorization headers
/// - **Max Age**: How long browsers cache preflight responses
///
/// Production should never use "*" for allowed origins; `Config::load`
/// already refuses to start with that combination, so this only has to
/// render whatever configuration made it through.
fn build_cors_layer(cors_config: &CorsConfig) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            cors_config.allowed_origins.iter().map(|origin| origin.parse()).collect();
        cors = cors.allow_origin(origins?);
    }

    if cors_config.allowed_methods.contains(&"*".to_string()) {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Result<Vec<Method>, _> =
            cors_config.allowed_methods.iter().map(|method| method.parse()).collect();
        cors = cors.allow_methods(methods?);
    }

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Result<Vec<HeaderName>, _> =
            cors_config.allowed_headers.iter().map(|header| header.parse()).collect();
        cors = cors.allow_headers(headers?);
    }

    if !cors_config.expose_headers.is_empty() {
        let expose_headers: Result<Vec<HeaderName>, _> =
            cors_config.expose_headers.iter().map(|header| header.parse()).collect();
        cors = cors.expose_headers(expose_headers?);
    }

    cors = cors.allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting warden-api server...");

    // `Config::load` fails fast on malformed or placeholder values, so there
    // is no separate post-load security validation pass to run here.
    let config = Config::load()?;
    info!("Configuration loaded successfully");

    let db = DatabasePool::new(&config.database).await?;
    info!("Database pool initialized");

    let schemas = CompiledSchemaSet::compile()?;
    info!("RBAC schemas compiled");

    let repo: Arc<dyn RbacRepository> = Arc::new(PgRbacRepository::new(db.get().clone()));
    let rbac = RbacEngine::new(schemas, repo.clone());
    let auth = AuthState { repo };

    let app_state = AppState { config: config.clone(), db, rbac, auth: auth.clone() };

    let app = create_app(app_state, auth)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(state: AppState, auth: AuthState) -> Result<Router, Box<dyn std::error::Error>> {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            health::health_check,
            health::readiness_check,
        ),
        components(schemas()),
        tags(
            (name = "health", description = "Health check endpoints"),
            (name = "projects", description = "Project access checks"),
            (name = "applications", description = "Application listing and filtering"),
            (name = "roles", description = "Role listing"),
            (name = "permissions", description = "Batch permissions introspection"),
        )
    )]
    struct ApiDoc;

    let cors_layer = build_cors_layer(&state.config.cors)?;

    let router = Router::new()
        .nest("/api/v1", create_api_routes(auth))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", axum::routing::get(health::health_check))
        .route("/ready", axum::routing::get(health::readiness_check))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(api_middleware::security_headers::security_headers_middleware))
                .layer(axum::middleware::from_fn(api_middleware::request_id::request_id_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(cors_layer),
        )
        .with_state(state)
        .fallback(handler_404);

    Ok(router)
}

/// The authenticated API surface. `principal_middleware` runs only here,
/// not on `/health`/`/ready`, so load balancers and orchestrators never need
/// an identity header to probe liveness.
fn create_api_routes(auth: AuthState) -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::project_routes().merge(applications::application_routes()))
        .nest("/roles", roles::role_routes())
        .nest("/permissions", permissions::permissions_routes())
        .layer(axum::middleware::from_fn_with_state(auth, principal_middleware))
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Resource not found" })))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warden_api=debug,warden_auth=debug,warden_rbac=debug,warden_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
