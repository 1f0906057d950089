//! HTTP API
//!
//! All resources are served under `/api/v1`. Handlers validate request
//! bodies before touching the database and answer errors as
//! `{"error": .., "status": ..}`.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    config::{AppConfig, ServerConfig},
    database::Database,
    errors::FleetError,
    geocoding::ReverseGeocoder,
    ingest::EnrichmentSettings,
    validation::ValidationError,
};

mod alarms;
mod devices;
mod licenses;
mod maintenance;
mod movements;
mod routes;
mod users;
mod vehicles;
mod work_orders;

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub enrichment: EnrichmentSettings,
}

impl AppState {
    pub fn new(db: Database, geocoder: Arc<dyn ReverseGeocoder>, config: &AppConfig) -> Self {
        Self {
            db,
            geocoder,
            enrichment: EnrichmentSettings::from(&config.geocoding),
        }
    }
}

/// JSON body whose rejection is reported as a validation error
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(FleetError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejection is reported as a validation error
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(FleetError))]
pub struct ApiQuery<T>(pub T);

/// Status 201 with the created resource
pub(crate) fn created<T: serde::Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Handler answering 405 for a disabled operation
pub(crate) async fn not_allowed(method: Method) -> FleetError {
    FleetError::MethodNotAllowed(method.to_string())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok", "database": "up"}))),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded", "database": "down"})),
            )
        }
    }
}

/// All `/api/v1` routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(alarms::router())
        .merge(devices::router())
        .merge(users::router())
        .merge(vehicles::router())
        .merge(licenses::router())
        .merge(routes::router())
        .merge(movements::router())
        .merge(maintenance::router())
        .merge(work_orders::router())
}

/// Build the application router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let allowed_hosts = Arc::new(server.allowed_hosts.clone());
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(middleware::from_fn_with_state(allowed_hosts, check_host))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
        .with_state(state)
}

/// Reject requests whose `Host` is not one of the allowed hosts
///
/// An empty list allows every host.
async fn check_host(
    State(allowed): State<Arc<Vec<String>>>,
    request: Request,
    next: Next,
) -> Result<Response, FleetError> {
    if !allowed.is_empty() {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !host_allowed(&allowed, host) {
            warn!("Rejected request for host {:?}", host);
            return Err(ValidationError::field("host", format!("{host:?} is not allowed")).into());
        }
    }
    Ok(next.run(request).await)
}

/// `*` allows any host, a leading dot allows the domain and its subdomains
fn host_allowed(allowed: &[String], host: &str) -> bool {
    let name = host
        .rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map_or(host, |(name, _)| name)
        .to_ascii_lowercase();
    if name.is_empty() {
        return false;
    }
    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        match pattern.strip_prefix('.') {
            _ if pattern == "*" => true,
            Some(domain) => name == domain || name.ends_with(&pattern),
            None => name == pattern,
        }
    })
}

/// CORS from the configured origins, permissive when none are set
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
