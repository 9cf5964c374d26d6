//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router mounted under the context path
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Classify each request: WebSocket upgrade, static asset, ordinary
//! - Forward requests to the origin with response capture attached

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, ConnectInfo, FromRequestParts, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ExtensionSet, ObservabilityConfig, ProxyConfig};
use crate::http::capture::CaptureBody;
use crate::http::forward::Forwarder;
use crate::http::origin::{Origin, OriginError};
use crate::http::websocket;
use crate::mirror::StaticMirror;
use crate::observability::logging::{self, ResponseLogging};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    /// `None` when mirroring is disabled.
    pub mirror: Option<StaticMirror>,
    pub extensions: Arc<ExtensionSet>,
    pub observability: ObservabilityConfig,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails only if the origin URL cannot be parsed.
    pub fn new(config: ProxyConfig, extensions: ExtensionSet) -> Result<Self, OriginError> {
        let origin = Arc::new(Origin::parse(&config.origin.url)?);

        let mirror = config
            .mirror
            .mirror_root()
            .map(|root| StaticMirror::new(origin.clone(), root));

        let state = AppState {
            forwarder: Forwarder::new(origin),
            mirror,
            extensions: Arc::new(extensions),
            observability: config.observability.clone(),
        };

        let router = Self::build_router(&config.listener.context_path, state);
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(context_path: &str, state: AppState) -> Router {
        let base = context_path.trim_end_matches('/');

        let router = if base.is_empty() {
            Router::new()
                .route("/{*path}", any(proxy_handler))
                .route("/", any(proxy_handler))
        } else {
            Router::new()
                .route(&format!("{}/{{*path}}", base), any(proxy_handler))
                .route(&format!("{}/", base), any(proxy_handler))
                .route(base, any(proxy_handler))
        };

        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server, accepting connections on the given listener until the
    /// shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.config.origin.url,
            context_path = %self.config.listener.context_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
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

/// Request router.
///
/// WebSocket upgrades go to the bridge and nothing else happens. Everything
/// else is forwarded; static assets additionally trigger a detached mirror.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let method = request.method().clone();
    let uri = request.uri().clone();

    // 1. WebSocket upgrade
    if websocket::is_upgrade_request(request.headers()) {
        let origin_url = state.forwarder.origin().websocket_url(&uri);
        tracing::info!(request_id = %request_id, uri = %uri, origin = %origin_url, "WebSocket upgrade");

        let (mut parts, _body) = request.into_parts();
        return match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(ws) => websocket::bridge(ws, origin_url, request_id),
            Err(rejection) => {
                tracing::warn!(request_id = %request_id, error = %rejection, "WebSocket upgrade failed");
                rejection.into_response()
            }
        };
    }

    // 2. Static asset mirroring
    match &state.mirror {
        Some(mirror) if state.extensions.is_static_asset(uri.path()) => {
            tracing::info!(request_id = %request_id, method = %method, uri = %uri, "save");

            let mirror = mirror.clone();
            let uri = uri.clone();
            let request_id = request_id.clone();
            tokio::spawn(async move {
                if let Err(e) = mirror.mirror(&uri).await {
                    tracing::warn!(request_id = %request_id, uri = %uri, error = %e, "Failed to mirror static file");
                }
            });
        }
        _ => {
            tracing::info!(request_id = %request_id, method = %method, uri = %uri, "proxy");
        }
    }

    // 3. Request capture
    let request = if state.observability.debug {
        tracing::info!(request_id = %request_id, headers = ?request.headers(), "Request headers");

        let (parts, body) = request.into_parts();
        let (body, captured) = CaptureBody::new(body);
        tokio::spawn(logging::log_request_body(
            request_id.clone(),
            parts.headers.clone(),
            captured,
            state.observability.request_body_limit,
        ));
        Request::from_parts(parts, Body::new(body))
    } else {
        request
    };

    // 4. Forward
    match state.forwarder.forward(request, Some(addr)).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(method.as_str(), status.as_u16(), start_time);

            let (parts, body) = response.into_parts();
            // Without debug output only the size is needed.
            let (body, captured) = if state.observability.debug {
                CaptureBody::new(body)
            } else {
                CaptureBody::counting(body)
            };
            tokio::spawn(logging::log_response(
                request_id,
                status,
                parts.headers.clone(),
                captured,
                ResponseLogging {
                    debug: state.observability.debug,
                    body_limit: state.observability.response_body_limit,
                },
            ));

            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, uri = %uri, error = %e, "Upstream error");
            metrics::record_request(method.as_str(), 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
