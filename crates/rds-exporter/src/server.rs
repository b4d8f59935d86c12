use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use rds_exporter_collect::Exporter;
use rds_exporter_collect::exposition::CONTENT_TYPE;
use tower_http::trace::TraceLayer;
use tracing::Level;

#[derive(Clone)]
struct AppState {
    exporter: Exporter,
    metrics_path: Arc<str>,
}

pub fn router(exporter: Exporter, metrics_path: &str) -> Router {
    let state = AppState {
        exporter,
        metrics_path: Arc::from(metrics_path),
    };

    let mut router = Router::new().route(metrics_path, get(metrics));
    if metrics_path != "/" {
        router = router.route("/", get(landing));
    }
    router
        .layer(
            TraceLayer::new_for_http()
                .on_request(tower_http::trace::DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, router: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind metrics listener {addr}"))?;
    tracing::info!(addr = %addr, "metrics listener ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received ctrl-c, shutting down");
        })
        .await
        .context("metrics server failed")
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.exporter.scrape().await {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render exposition");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn landing(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Aliyun RDS Exporter</title></head>\n<body>\n\
         <h1>Aliyun RDS Exporter</h1>\n<p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n</html>\n",
        path = state.metrics_path
    ))
}
