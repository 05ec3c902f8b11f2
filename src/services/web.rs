//! Axum-based HTTP server for turnout management.
//!
//! Provides REST endpoints for:
//! - GET `/turnouts` - All turnouts (`?readable=0` for numeric states)
//! - GET `/turnouts?address=N` - One turnout
//! - PUT `/turnouts?address=N` - Toggle a turnout
//! - POST `/turnouts?address=N&type=T&id=I` - Create or update a DCC turnout
//! - POST `/turnouts?address=N&closed=..&thrown=..` - Create or update an OpenLCB turnout
//! - DELETE `/turnouts?address=N` - Remove a turnout
//! - GET `/turnouts/status` - Legacy `<H ..>` bulk status

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::error::TurnoutError;
use crate::registry::TurnoutRegistry;
use crate::traits::{EventSink, PacketScheduler, Storage};
use crate::turnout::TurnoutRecord;

use super::api::{ApiResponse, RemovedResponse, TurnoutQuery};

/// Registry handle shared with the route handlers.
pub type SharedRegistry<S, E, P> = Arc<TurnoutRegistry<S, E, P>>;

// ============================================================================
// Error Mapping
// ============================================================================

/// HTTP status for a registry error.
pub fn error_status(err: &TurnoutError) -> StatusCode {
    match err {
        TurnoutError::NotFound(_) => StatusCode::NOT_FOUND,
        TurnoutError::InvalidAddress(_) | TurnoutError::InvalidEventId(_) => {
            StatusCode::BAD_REQUEST
        }
        TurnoutError::AddressInUse(_) => StatusCode::CONFLICT,
        TurnoutError::Storage(_) | TurnoutError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: TurnoutError) -> Response {
    (error_status(&err), Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::err(message)),
    )
        .into_response()
}

fn parse_query(
    query: Result<Query<TurnoutQuery>, QueryRejection>,
) -> Result<TurnoutQuery, Response> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

fn required_address(query: &TurnoutQuery) -> Result<u16, Response> {
    query
        .address
        .ok_or_else(|| bad_request("Missing address parameter"))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /turnouts - All turnouts, or one with `?address=N`
async fn get_turnouts<S, E, P>(
    State(registry): State<SharedRegistry<S, E, P>>,
    query: Result<Query<TurnoutQuery>, QueryRejection>,
) -> Response
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    let query = match parse_query(query) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let readable = query.readable();
    match query.address {
        Some(address) => match registry.get(address) {
            Some(turnout) => Json(ApiResponse::ok(turnout.to_record(readable))).into_response(),
            None => error_response(TurnoutError::NotFound(address)),
        },
        None => {
            let records: Vec<TurnoutRecord> = registry
                .turnouts()
                .iter()
                .map(|turnout| turnout.to_record(readable))
                .collect();
            Json(ApiResponse::ok(records)).into_response()
        }
    }
}

/// PUT /turnouts?address=N - Toggle a turnout
async fn toggle_turnout<S, E, P>(
    State(registry): State<SharedRegistry<S, E, P>>,
    query: Result<Query<TurnoutQuery>, QueryRejection>,
) -> Response
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    let (query, address) = match parse_query(query)
        .and_then(|query| required_address(&query).map(|address| (query, address)))
    {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    if let Err(err) = registry.toggle(address) {
        return error_response(err);
    }
    match registry.get(address) {
        Some(turnout) => Json(ApiResponse::ok(turnout.to_record(query.readable()))).into_response(),
        None => error_response(TurnoutError::NotFound(address)),
    }
}

/// POST /turnouts?address=N - Create or update a turnout
async fn create_or_update_turnout<S, E, P>(
    State(registry): State<SharedRegistry<S, E, P>>,
    query: Result<Query<TurnoutQuery>, QueryRejection>,
) -> Response
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    let (query, address) = match parse_query(query)
        .and_then(|query| required_address(&query).map(|address| (query, address)))
    {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    let kind = match query.turnout_type() {
        Ok(kind) => kind,
        Err(message) => return bad_request(message),
    };
    let result = if query.is_openlcb() {
        registry.create_or_update_olcb(
            address,
            query.closed.as_deref().unwrap_or_default(),
            query.thrown.as_deref().unwrap_or_default(),
            kind,
        )
    } else {
        registry.create_or_update_dcc(address, kind, query.id)
    };
    match result {
        Ok(turnout) => Json(ApiResponse::ok(turnout.to_record(query.readable()))).into_response(),
        Err(err) => error_response(err),
    }
}

/// DELETE /turnouts?address=N - Remove a turnout
async fn remove_turnout<S, E, P>(
    State(registry): State<SharedRegistry<S, E, P>>,
    query: Result<Query<TurnoutQuery>, QueryRejection>,
) -> Response
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    let address = match parse_query(query).and_then(|query| required_address(&query)) {
        Ok(address) => address,
        Err(response) => return response,
    };
    if registry.remove(address) {
        Json(ApiResponse::ok(RemovedResponse { address })).into_response()
    } else {
        error_response(TurnoutError::NotFound(address))
    }
}

/// GET /turnouts/status - Legacy bulk status text
async fn wire_status<S, E, P>(State(registry): State<SharedRegistry<S, E, P>>) -> String
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    registry.state_for_wire_protocol()
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<S, E, P>(registry: SharedRegistry<S, E, P>, config: &WebServerConfig) -> Router
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
{
    let mut router = Router::new()
        .route(
            "/turnouts",
            get(get_turnouts::<S, E, P>)
                .put(toggle_turnout::<S, E, P>)
                .post(create_or_update_turnout::<S, E, P>)
                .delete(remove_turnout::<S, E, P>),
        )
        .route("/turnouts/status", get(wire_status::<S, E, P>))
        .fallback(not_found)
        .with_state(registry);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server
///
/// Serves until `shutdown` completes, then finishes in-flight requests.
pub async fn run_server<S, E, P, F>(
    registry: SharedRegistry<S, E, P>,
    config: WebServerConfig,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    S: Storage + Send + Sync + 'static,
    E: EventSink + Send + Sync + 'static,
    P: PacketScheduler + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(registry, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("[Web] Listening on http://{}", config.addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_mapping() {
        assert_eq!(error_status(&TurnoutError::NotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(
            error_status(&TurnoutError::InvalidAddress(0)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&TurnoutError::AddressInUse(4)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&TurnoutError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_config_from_web_config() {
        let config =
            WebServerConfig::from_config(&WebConfig::default().with_port(3000).with_cors(false));
        assert_eq!(config.addr.port(), 3000);
        assert!(!config.cors_permissive);
    }
}
