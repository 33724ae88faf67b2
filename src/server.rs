//! HTTP trigger surface.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::tasks::{Runner, Trigger};

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Squad Notifier</title></head>
  <body>
    <h1>Squad Notifier</h1>
    <p>Posts a summary of open pull requests to Slack on a schedule.</p>
    <p>Visit <a href="/refresh">/refresh</a> to send the summary now.</p>
  </body>
</html>
"#;

/// Build the HTTP router.
pub fn build_router<R>(runner: Arc<R>) -> Router
where
    R: Runner + 'static,
{
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/refresh", get(refresh_handler::<R>))
        .layer(TraceLayer::new_for_http())
        .with_state(runner)
}

/// Serve the router until `shutdown` resolves.
pub async fn run_server<R, S>(runner: Arc<R>, addr: SocketAddr, shutdown: S) -> Result<()>
where
    R: Runner + 'static,
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_router(runner);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Squad notifier listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Runs a full notification pass before responding.
async fn refresh_handler<R>(State(runner): State<Arc<R>>) -> impl IntoResponse
where
    R: Runner + 'static,
{
    match runner.execute(&Trigger::Manual).await {
        Ok(report) => (StatusCode::OK, format!("Refresh complete: {report}\n")),
        Err(err) => {
            error!(error = %format!("{err:#}"), "Manual refresh failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Refresh failed: {err:#}\n"),
            )
        }
    }
}
