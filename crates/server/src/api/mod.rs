use crate::config::AppState;
use anyhow::{Context, Result};
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Bind and serve until the process is stopped
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let sse_path = state.transport.config().sse_path.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("MCP server listening on {} (SSE endpoint {})", addr, sse_path);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Create the HTTP router: SSE transport routes plus a health check
pub fn create_router(state: AppState) -> Router {
    let transport_routes = state.transport.router();

    Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::new(state))
        .merge(transport_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().include_headers(true))
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                )
                .layer(CorsLayer::permissive()),
        )
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.name,
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.server.registry().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router() -> Router {
        let mut config = ServerConfig::default();
        config.weather.enabled = false;
        create_router(AppState::new("generic-mcp", &config).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "generic-mcp");
        assert_eq!(value["tools"], 1);
    }

    #[tokio::test]
    async fn test_sse_route_is_mounted() {
        let response = router()
            .oneshot(Request::builder().uri("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_message_route_requires_session() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/messages/")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bind_failure_reports_address() {
        let holder = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = holder.local_addr().unwrap().to_string();

        let mut config = ServerConfig::default();
        config.weather.enabled = false;
        let state = AppState::new("generic-mcp", &config).unwrap();

        let err = serve(&addr, state).await.unwrap_err();
        assert!(err.to_string().contains(&format!("Failed to bind {}", addr)));
    }
}
