//! Status and health endpoints.
//!
//! - `/status`: fixed payload, identical to the bootstrap server's
//! - `/api/status`: status plus database connectivity
//! - `/health`: database ping, 503 when the database is unreachable

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
}

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            start_time: Instant::now(),
        }
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn check(&self) -> HealthInfo {
        let database = match crate::db::check_connection(&self.db_pool).await {
            Ok(()) => HealthStatus::Up,
            Err(e) => {
                warn!(error = %e, "database health check failed");
                HealthStatus::Down
            }
        };

        HealthInfo {
            status: database,
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds: self.uptime(),
        }
    }
}

/// The fixed status document served at `/status`
pub fn static_status() -> Value {
    json!({
        "status": "success",
        "message": "النظام يعمل بنجاح",
        "completion": "100%",
        "phases": "10/10 مكتملة",
    })
}

pub async fn status() -> impl IntoResponse {
    Json(static_status())
}

/// Database-backed health check
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");
    let health = state.check().await;

    let status_code = match health.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

pub async fn api_status(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let health = state.check().await;
    let database = match health.database {
        HealthStatus::Up => "متصلة",
        HealthStatus::Down => "غير متصلة",
    };

    Json(json!({
        "status": "success",
        "message": "النظام يعمل بنجاح",
        "database": database,
        "version": health.version,
        "uptime_seconds": health.uptime_seconds,
        "timestamp": health.timestamp,
    }))
}

/// Creates router with the status and health endpoints
pub fn health_routes(db_pool: Arc<DatabaseConnection>) -> Router {
    let health_state = Arc::new(HealthState::new(db_pool));

    Router::new()
        .route("/status", get(status))
        .route("/api/status", get(api_status))
        .route("/health", get(health_check))
        .with_state(health_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_status_payload() {
        let status = static_status();
        assert_eq!(status["status"], "success");
        assert_eq!(status["message"], "النظام يعمل بنجاح");
        assert_eq!(status["completion"], "100%");
        assert_eq!(status["phases"], "10/10 مكتملة");
        assert_eq!(status.as_object().map(|o| o.len()), Some(4));
    }
}
