use axum::{
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use std::{net::SocketAddr, process::ExitCode};
use tracing::{error, info};

use muhasaba::{config, health, views};

const ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 5000);

/// Root endpoint response
async fn root() -> impl IntoResponse {
    info!("Root endpoint called");
    Html(views::pages::bootstrap_page())
}

async fn status() -> impl IntoResponse {
    Json(health::static_status())
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/status", get(status))
}

#[tokio::main]
async fn main() -> ExitCode {
    config::init_tracing("info", false);

    info!("🚀 بدء تشغيل نظام المحاسبة الاحترافي...");

    let addr = SocketAddr::from(ADDR);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {}", addr, err);
            return ExitCode::FAILURE;
        }
    };

    info!("🌐 Listening on http://{}", addr);
    if let Err(err) = axum::serve(listener, app()).await {
        error!("server error: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn fetch(path: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_bootstrap_page_and_status() {
        config::init_tracing("info", false);

        let (status, body) = fetch("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, views::pages::bootstrap_page());

        let (status, body) = fetch("/status").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "success");

        let (status, _) = fetch("/dashboard").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
