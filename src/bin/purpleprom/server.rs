use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context as _, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use purpleprom::metrics::MetricsRegistry;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn bind(path: &str, port: u16, registry: Arc<MetricsRegistry>) -> Result<()> {
    let app = Router::new()
        .route(path, get(scrape))
        .with_state(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener: {addr}"))?;

    info!("serving metrics on http://{addr}{path}");

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!("metrics server stopped: {err:#}");
        }
    });

    Ok(())
}

async fn scrape(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    match registry.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, registry.content_type())], body).into_response(),
        Err(err) => {
            warn!("failed to render metrics: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")).into_response()
        }
    }
}
