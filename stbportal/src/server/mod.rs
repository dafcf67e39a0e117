pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tokio::sync::watch;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::portal::Portal;

/// Paths MAG firmwares are known to request the portal on.
pub const PORTAL_PATHS: [&str; 4] = ["/c", "/c/", "/portal.php", "/stalker_portal/server/load.php"];
pub const REGISTER_PATH: &str = "/register";

#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<Portal>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let mut portal_routes = Router::new();
    for path in PORTAL_PATHS {
        portal_routes = portal_routes.route(
            path,
            get(routes::portal)
                .post(routes::portal)
                .options(routes::portal_preflight),
        );
    }

    let portal_routes = portal_routes
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, X-MAC, MAC"),
        ));

    Router::new()
        .route("/", get(routes::index))
        .route(REGISTER_PATH, post(routes::register))
        .merge(portal_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until the shutdown signal flips.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Portal listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    Ok(())
}
