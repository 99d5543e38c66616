//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Data routes sit behind the authentication gate. The {kind}
    // segment is validated in the handlers; static routes like /health
    // take priority over the capture.
    let data_routes = Router::new()
        .route("/{kind}", get(handlers::list_files))
        .route("/{kind}/{public_id}", get(handlers::fetch_group))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Health check (intentionally unauthenticated for probes).
    let public_routes = Router::new().route("/health", get(handlers::health_check));

    let mut router = Router::new().merge(public_routes).merge(data_routes);

    // SECURITY: when enabled, network-restrict /metrics to authorized
    // Prometheus scraper IPs. See crate::metrics for details.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
