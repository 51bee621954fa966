//! HTTP server setup and the module-fetch handler.
//!
//! # Responsibilities
//! - Create Axum Router with the module handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener, stop on shutdown signal
//! - Translate module-fetch requests into repository calls
//!
//! # Request States
//! ```text
//! Received → Parsed → Routed → { Served | Rejected }
//!                   ↘ Unclaimed (no route / not implemented)
//!          ↘ Malformed
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::ProxyOutcome;
use crate::observability::metrics;
use crate::protocol::{ArtifactRequest, ModuleRequest, SuffixError};
use crate::repository::BackendError;
use crate::routing::PatternRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<PatternRouter>,
    /// Answer 404 rather than 403 for missing assets on claimed modules.
    pub fallthrough_on_missing: bool,
}

/// HTTP server for the module proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and routes.
    pub fn new(config: ProxyConfig, routes: Arc<PatternRouter>) -> Self {
        let state = AppState {
            router: routes,
            fallthrough_on_missing: config.fallthrough_on_missing,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(module_handler))
            .route("/", any(module_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// The Axum router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Module-fetch handler.
async fn module_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let outcome = translate(&state, &method, &path, &request_id).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = outcome.status().as_u16(),
        outcome = outcome.label(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request resolved"
    );
    metrics::record_request(method.as_str(), outcome.label(), outcome.status().as_u16(), start_time);

    outcome.into_response()
}

/// Walk one request through parse, route, and backend call.
pub async fn translate(state: &AppState, method: &Method, path: &str, request_id: &str) -> ProxyOutcome {
    if method != Method::GET {
        return ProxyOutcome::MethodNotAllowed;
    }

    // 1. Parse
    let request = match ModuleRequest::parse(path) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Malformed request");
            return ProxyOutcome::Malformed;
        }
    };
    let artifact = ArtifactRequest::parse(&request.suffix);
    if let Err(SuffixError::Malformed(ref suffix)) = artifact {
        tracing::warn!(request_id = %request_id, module = %request.module, suffix = %suffix, "Malformed request suffix");
        return ProxyOutcome::Malformed;
    }

    // 2. Route
    let Some(route) = state.router.resolve(&request.module) else {
        tracing::debug!(request_id = %request_id, module = %request.module, "No route matched");
        return ProxyOutcome::Unclaimed;
    };

    // Past this point the module is ours: refuse rather than fall through.
    let artifact = match artifact {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                module = %request.module,
                pattern = %route.pattern(),
                error = %e,
                "Unsupported request"
            );
            return ProxyOutcome::Rejected;
        }
    };

    // 3. Backend
    match route.backend().fetch(&request.module, &artifact).await {
        Ok(body) => ProxyOutcome::Served {
            body,
            content_type: artifact.content_type(),
        },
        Err(e @ BackendError::NotImplemented { .. }) => {
            tracing::debug!(
                request_id = %request_id,
                module = %request.module,
                pattern = %route.pattern(),
                reason = %e,
                "Operation not implemented, deferring to next proxy"
            );
            ProxyOutcome::Unclaimed
        }
        Err(e @ BackendError::NotFound { .. }) if state.fallthrough_on_missing => {
            tracing::info!(
                request_id = %request_id,
                module = %request.module,
                pattern = %route.pattern(),
                reason = %e,
                "Asset missing, deferring to next proxy"
            );
            ProxyOutcome::Unclaimed
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                module = %request.module,
                pattern = %route.pattern(),
                error = %e,
                "Backend request failed"
            );
            ProxyOutcome::Rejected
        }
    }
}
