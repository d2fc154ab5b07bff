//! axum router and listener for the request gateway.
//!
//! Every route funnels into [`RequestGateway::handle`], run on the blocking
//! pool under one mutex, so exactly one request is serviced at a time and
//! the typing delays never stall the async runtime.  Because the blocking
//! task is detached from the handler future, a client that disconnects
//! mid-request does not cut a type-out short.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Form, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tracing::{debug, error, info, warn};

use crate::application::gateway::{GatewayRequest, GatewayResponse, RequestGateway, Route};
use crate::application::status::{ConnectionState, StatusReporter};

/// Gateway shared between handlers; the mutex serializes requests.
pub type SharedGateway = Arc<Mutex<RequestGateway>>;

type Pairs = Vec<(String, String)>;

const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound before the retry ceiling.
    #[error("could not bind {addr} after {attempts} attempts: {source}")]
    Bind {
        addr: SocketAddr,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Where to listen and how long to keep trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSettings {
    pub addr: SocketAddr,
    pub retry_interval: Duration,
    pub retry_ceiling: Duration,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Builds the router for all gateway routes.
pub fn build_router(gateway: SharedGateway) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/type", post(type_text))
        .route(
            "/presets",
            get(get_presets).post(set_preset).delete(delete_preset),
        )
        .route("/favicon.ico", get(favicon))
        .layer(GlobalConcurrencyLimitLayer::new(1))
        .with_state(gateway)
}

async fn root(
    State(gateway): State<SharedGateway>,
    headers: HeaderMap,
    query: Option<Query<Pairs>>,
) -> Response {
    dispatch(gateway, Route::Root, gateway_request(&headers, query, None)).await
}

async fn type_text(
    State(gateway): State<SharedGateway>,
    headers: HeaderMap,
    query: Option<Query<Pairs>>,
    form: Option<Form<Pairs>>,
) -> Response {
    dispatch(gateway, Route::Type, gateway_request(&headers, query, form)).await
}

async fn get_presets(
    State(gateway): State<SharedGateway>,
    headers: HeaderMap,
    query: Option<Query<Pairs>>,
) -> Response {
    dispatch(gateway, Route::GetPresets, gateway_request(&headers, query, None)).await
}

async fn set_preset(
    State(gateway): State<SharedGateway>,
    headers: HeaderMap,
    query: Option<Query<Pairs>>,
    form: Option<Form<Pairs>>,
) -> Response {
    dispatch(gateway, Route::SetPreset, gateway_request(&headers, query, form)).await
}

async fn delete_preset(
    State(gateway): State<SharedGateway>,
    headers: HeaderMap,
    query: Option<Query<Pairs>>,
    form: Option<Form<Pairs>>,
) -> Response {
    dispatch(gateway, Route::DeletePreset, gateway_request(&headers, query, form)).await
}

async fn favicon(State(gateway): State<SharedGateway>) -> Response {
    dispatch(gateway, Route::Favicon, GatewayRequest::default()).await
}

/// Malformed query strings or bodies count as "no arguments" so the auth
/// gate still answers first.
fn gateway_request(
    headers: &HeaderMap,
    query: Option<Query<Pairs>>,
    form: Option<Form<Pairs>>,
) -> GatewayRequest {
    GatewayRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        query: query.map(|Query(pairs)| pairs).unwrap_or_default(),
        form: form.map(|Form(pairs)| pairs).unwrap_or_default(),
    }
}

async fn dispatch(gateway: SharedGateway, route: Route, request: GatewayRequest) -> Response {
    let joined = tokio::task::spawn_blocking(move || {
        let gateway = gateway.lock().unwrap_or_else(PoisonError::into_inner);
        gateway.handle(route, &request)
    })
    .await;

    match joined {
        Ok(response) => {
            debug!(?route, status = response.status.code(), "request handled");
            response.into_response()
        }
        Err(e) => {
            error!(?route, "request handler failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        if let Some(content_type) = self.content_type {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type.mime()),
            );
        }
        if let Some(challenge) = self.challenge.and_then(|c| HeaderValue::from_str(&c).ok()) {
            headers.insert(header::WWW_AUTHENTICATE, challenge);
        }

        (status, headers, Body::from(self.body)).into_response()
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// Binds `settings.addr`, retrying every `retry_interval` until
/// `retry_ceiling` has elapsed.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] with the last bind error once the ceiling
/// is reached.
pub async fn bind_with_retry(settings: ListenerSettings) -> Result<TcpListener, ServerError> {
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match TcpListener::bind(settings.addr).await {
            Ok(listener) => return Ok(listener),
            Err(source) if start.elapsed() >= settings.retry_ceiling => {
                return Err(ServerError::Bind {
                    addr: settings.addr,
                    attempts,
                    source,
                });
            }
            Err(e) => {
                debug!("bind {} failed (attempt {attempts}): {e}", settings.addr);
                tokio::time::sleep(settings.retry_interval).await;
            }
        }
    }
}

/// Serves `gateway` on an already-bound listener until `running` is cleared.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the accept loop fails.
pub async fn serve_listener(
    listener: TcpListener,
    gateway: SharedGateway,
    reporter: Arc<dyn StatusReporter>,
    running: Arc<AtomicBool>,
) -> Result<(), ServerError> {
    let local = listener.local_addr().map_err(ServerError::Serve)?;
    reporter.connection(&ConnectionState::Connected { addr: local });
    info!("HTTP server listening on {local}");

    let result = axum::serve(listener, build_router(gateway))
        .with_graceful_shutdown(wait_for_shutdown(running))
        .await
        .map_err(ServerError::Serve);

    reporter.connection(&ConnectionState::Disconnected);
    result
}

/// Binds with retry, reports connection state, then serves until `running`
/// is cleared.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the listener never comes up, or
/// [`ServerError::Serve`] if the accept loop fails.
pub async fn run_server(
    settings: ListenerSettings,
    gateway: SharedGateway,
    reporter: Arc<dyn StatusReporter>,
    running: Arc<AtomicBool>,
) -> Result<(), ServerError> {
    reporter.connection(&ConnectionState::Connecting {
        addr: settings.addr,
    });

    let listener = match bind_with_retry(settings).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!("{e}");
            reporter.connection(&ConnectionState::Disconnected);
            return Err(e);
        }
    };

    serve_listener(listener, gateway, reporter, running).await
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }
    info!("shutdown flag set; stopping HTTP server");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
