//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run the modifier chain around each transaction
//! - Forward requests upstream unless a modifier skips the round trip
//! - Observability (metrics, request IDs)

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Response, StatusCode, Version},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{request_id, upstream_uri};
use crate::http::response::{error_response, synthetic_response};
use crate::modifier::{Context, ModifierChain};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<ModifierChain>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Option<Arc<str>>,
}

/// HTTP server for the modifying proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server running `chain` on every transaction.
    pub fn new(config: ProxyConfig, chain: ModifierChain) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            chain: Arc::new(chain),
            client,
            upstream: config.upstream.address.as_deref().map(Arc::from),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = ?self.config.upstream.address,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Runs request modifiers, performs the round trip (unless skipped), then
/// runs response modifiers.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response<Body> {
    let start_time = Instant::now();
    let method = request.method().clone();
    let mut ctx = Context::new(request_id(request.headers()));

    tracing::debug!(
        request_id = %ctx.id(),
        client = %client_addr,
        method = %method,
        uri = %request.uri(),
        "Proxying request"
    );

    state.chain.modify_request(&mut ctx, &mut request);

    let (mut response, upstream) = if ctx.skip_round_trip() {
        tracing::debug!(request_id = %ctx.id(), "Round trip skipped by modifier");
        metrics::record_round_trip_skipped();
        drop(request);
        (synthetic_response(), "skipped".to_string())
    } else {
        let Some(uri) = upstream_uri(request.uri(), request.headers(), state.upstream.as_deref()) else {
            tracing::warn!(request_id = %ctx.id(), uri = %request.uri(), "No upstream target");
            metrics::record_request(method.as_str(), 400, "none", start_time);
            return error_response(StatusCode::BAD_REQUEST, "No upstream target");
        };

        let upstream = uri
            .authority()
            .map(|a| a.to_string())
            .unwrap_or_default();
        *request.uri_mut() = uri;
        *request.version_mut() = Version::HTTP_11;

        match state.client.request(request).await {
            Ok(upstream_response) => {
                let (parts, body) = upstream_response.into_parts();
                (Response::from_parts(parts, Body::new(body)), upstream)
            }
            Err(e) => {
                tracing::error!(request_id = %ctx.id(), upstream = %upstream, error = %e, "Upstream error");
                metrics::record_request(method.as_str(), 502, &upstream, start_time);
                return error_response(StatusCode::BAD_GATEWAY, "Upstream request failed");
            }
        }
    };

    state.chain.modify_response(&mut ctx, &mut response);

    metrics::record_request(method.as_str(), response.status().as_u16(), &upstream, start_time);
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
