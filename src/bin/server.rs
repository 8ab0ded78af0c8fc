use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use fitprint::api::{LayoutRequest, LayoutResponse, build_layout};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

async fn layout(
    Json(req): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /layout"
    );

    let response = build_layout(&req).map_err(|e| {
        tracing::warn!(error = %e, "rejected layout request");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    tracing::info!(
        pages = response.page_count,
        minimum = response.minimum_pages,
        oversized = response.oversized.len(),
        "layout generated"
    );
    Ok(Json(response))
}

#[tokio::main]
async fn main() {
    // Reporting stays off unless SENTRY_DSN is set.
    let _sentry = sentry::init((
        std::env::var("SENTRY_DSN").ok(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/layout", post(layout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.expect("server error");
}
