//! HTTP application assembly: router, middleware stack and state.

use std::sync::Arc;

use anyhow::Context;
use axum::body::Body;
use axum::http::{HeaderValue, Method, Request};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use brain_domain::config::{CorsConfig, ServerConfig};

use crate::api;
use crate::state::AppState;

/// Build the complete application with every middleware layer applied.
///
/// `max_concurrent_requests` is a single process-wide budget: every route
/// shares one semaphore, so a slow `/chat` holds a permit that `/health`
/// also waits on.
pub fn app(state: AppState, server: &ServerConfig) -> anyhow::Result<Router> {
    let cors_layer = build_cors_layer(&server.cors);

    // ── Concurrency limit (backpressure protection) ────────────────
    let max_concurrent = server.max_concurrent_requests;
    tracing::info!(max_concurrent, "concurrency limit set");

    // ── Request spans ────────────────────────────────────────────────
    let trace_layer = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let request_id = uuid::Uuid::new_v4();
        tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        )
    });

    let router = api::router()
        .layer(trace_layer)
        .layer(cors_layer)
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent));

    // ── Rate-limit layer (per-IP token bucket via governor) ─────────
    let app = match &server.rate_limit {
        Some(rl) => {
            use tower_governor::governor::GovernorConfigBuilder;
            use tower_governor::GovernorLayer;

            let gov_config = GovernorConfigBuilder::default()
                .per_second(rl.requests_per_second)
                .burst_size(rl.burst_size)
                .finish()
                .context("rate_limit: requests_per_second and burst_size must be > 0")?;

            tracing::info!(
                requests_per_second = rl.requests_per_second,
                burst_size = rl.burst_size,
                "per-IP rate limiting enabled"
            );

            router
                .layer(GovernorLayer {
                    config: Arc::new(gov_config),
                })
                .with_state(state)
        }
        None => {
            tracing::info!("per-IP rate limiting disabled (no [server.rate_limit] in config)");
            router.with_state(state)
        }
    };

    Ok(app)
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Origins may end in a `:*` port wildcard (e.g. `http://localhost:*`),
/// which matches any numeric port on that host.  A lone `"*"` allows all
/// origins.
pub fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    use axum::http::header;

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let headers = [
        header::CONTENT_TYPE,
        header::HeaderName::from_static("user_id"),
        header::HeaderName::from_static("session_id"),
        header::HeaderName::from_static("user-id"),
        header::HeaderName::from_static("session-id"),
    ];

    // allow_credentials is incompatible with wildcard origins.
    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\"; all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            wildcard_prefixes.push(origin.trim_end_matches('*').to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            let origin_str = origin.to_str().unwrap_or("");
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}
