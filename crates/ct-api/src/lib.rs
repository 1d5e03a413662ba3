use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use clap::Parser;
use ct_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use ct_common::{CandidateService, PreselectionConfig, ServiceError};
use dotenvy::dotenv;
use tokio::sync::Mutex;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;

pub use config::{AppConfig, RateLimitConfig};
use error::ApiError;
use handlers::{candidates, health, metrics, reports};
use rate_limit::ClientRateLimiter;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const MAX_BODY_BYTES: usize = 64 * 1024;
const READINESS_DRAIN: Duration = Duration::from_millis(200);

pub struct AppState {
    pub config: AppConfig,
    pub readiness: AtomicBool,
    pub(crate) rate_limiter: ClientRateLimiter,
    service: Arc<CandidateService>,
    // The CSV store has no locking of its own.
    store_lock: Arc<Mutex<()>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, service: CandidateService, limits: RateLimitConfig) -> Self {
        Self {
            config,
            readiness: AtomicBool::new(true),
            rate_limiter: ClientRateLimiter::new(limits),
            service: Arc::new(service),
            store_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs one service operation on the blocking pool with exclusive access
    /// to the store, mapping its failure into an HTTP error.
    pub async fn with_service<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&CandidateService) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.store_lock).lock_owned().await;
        let service = Arc::clone(&self.service);

        tokio::task::spawn_blocking(move || {
            let outcome = op(&service);
            drop(permit);
            outcome
        })
        .await
        .map_err(|join_err| ApiError::Internal(format!("service task aborted: {join_err}")))?
        .map_err(ApiError::from)
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.load(Ordering::SeqCst)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id,
    )
}

/// Makes the request id available to `ApiError` responses.
async fn scope_request_id(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    error::scope_request_id(request_id, next.run(req)).await
}

pub fn create_router(state: SharedState) -> Router {
    let collection = || {
        get(candidates::list_candidates)
            .post(candidates::create_candidate)
            .delete(candidates::clear_candidates)
    };

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .route("/health", get(health::readyz))
        .route("/metrics", get(metrics::export))
        .route("/candidates", collection())
        .route("/candidates/", collection())
        .route("/candidates/:id", get(candidates::get_candidate))
        .route("/reports", get(reports::generate_report))
        .route("/reports/", get(reports::generate_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_by_client_ip,
        ))
        .layer(middleware::from_fn(scope_request_id))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// State backed by files under `dir` with default scoring and rate limits.
pub fn test_state(dir: &std::path::Path) -> SharedState {
    let config = AppConfig::for_tests(dir);
    let service = config.build_service(PreselectionConfig::default());
    Arc::new(AppState::new(config, service, RateLimitConfig::default()))
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));
    ct_metrics::init_metrics();

    let config = AppConfig::from_cli(config::Cli::parse())?;
    let service = config.build_service(PreselectionConfig::from_env());
    let state: SharedState = Arc::new(AppState::new(
        config.clone(),
        service,
        RateLimitConfig::from_env(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(format!("cannot bind {addr}: {err}")))?;

    info!(
        %addr,
        data_path = %config.data_path.display(),
        report_dir = %config.report_dir.display(),
        "ct-api listening"
    );

    let app = create_router(state.clone()).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(drain_on_signal(state))
        .await
        .map_err(|err| ApiError::Internal(format!("server error: {err}")))
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
        let _ = tokio::signal::ctrl_c().await;
        return "SIGINT";
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}

/// Flips readiness off on shutdown and waits briefly so probes see it
/// before the listener closes.
async fn drain_on_signal(state: SharedState) {
    let signal = termination_signal().await;
    info!(signal, "shutdown requested");
    state.readiness.store(false, Ordering::SeqCst);
    tokio::time::sleep(READINESS_DRAIN).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn responses_carry_generated_request_id() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(&X_REQUEST_ID));
    }

    #[tokio::test]
    async fn supplied_request_id_is_echoed_on_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/candidates/9")
                    .header(&X_REQUEST_ID, "trace-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[&X_REQUEST_ID], "trace-42");
    }

    #[tokio::test]
    async fn with_service_maps_service_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = test_state(dir.path());

        let count = state
            .with_service(|service| Ok(service.store().count()?))
            .await
            .unwrap();
        assert_eq!(count, 0);

        let err = state
            .with_service(|_| -> Result<(), ServiceError> {
                Err(ct_common::QueryError::ScoreUnavailable.into())
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
