//! Muhasaba: an Arabic accounting and invoicing web application.
//!
//! The library holds the web application together with the shared pieces
//! used by the companion tools: the sample data seeder, the error-handler
//! patcher, the HTTP smoke tests and database maintenance.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod health;
pub mod maintenance;
pub mod middleware_helpers;
pub mod migrator;
pub mod patcher;
pub mod seed;
pub mod services;
pub mod smoke;
pub mod tracing;
pub mod views;

use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use crate::{
    auth::{require_session, SessionManager},
    config::AppConfig,
    handlers::{invoices, pages, parties, payments},
    services::{
        customers::CustomerService, invoices::InvoiceService, payments::PaymentService,
        suppliers::SupplierService,
    },
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        let sessions = SessionManager::from_config(&config);
        Self {
            db,
            config: Arc::new(config),
            sessions,
        }
    }

    pub fn customers(&self) -> CustomerService {
        CustomerService::new(self.db.clone())
    }

    pub fn suppliers(&self) -> SupplierService {
        SupplierService::new(self.db.clone())
    }

    pub fn invoices(&self) -> InvoiceService {
        InvoiceService::new(
            self.db.clone(),
            services::invoices::vat_rate_decimal(self.config.vat_rate),
        )
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.db.clone())
    }
}

// Common response wrappers
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Pages that require a signed-in user
fn page_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/customers", get(parties::list_customers))
        .route("/add_customer", post(parties::add_customer))
        .route("/suppliers", get(parties::list_suppliers))
        .route("/add_supplier", post(parties::add_supplier))
        .route("/invoices", get(invoices::list_all))
        .route("/sales_invoices", get(invoices::list_sales))
        .route(
            "/add_sales_invoice",
            get(invoices::new_sales).post(invoices::create_sales),
        )
        .route("/sales_invoices/:id/delete", post(invoices::delete_sales))
        .route("/purchase_invoices", get(invoices::list_purchases))
        .route(
            "/add_purchase_invoice",
            get(invoices::new_purchase).post(invoices::create_purchase),
        )
        .route(
            "/purchase_invoices/:id/delete",
            post(invoices::delete_purchase),
        )
        .route("/payments", get(payments::list))
        .route(
            "/add_payment",
            get(payments::new_payment).post(payments::create),
        )
        .route("/payments/:id/delete", post(payments::delete))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

/// Builds the complete application router
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(pages::landing))
        .route("/login", get(pages::login_form).post(pages::login))
        .route("/logout", get(pages::logout));

    Router::new()
        .merge(public)
        .merge(page_routes(state.clone()))
        .nest("/api/v1", handlers::api::api_v1_routes(state.clone()))
        .fallback(pages::not_found)
        .with_state(state.clone())
        .merge(health::health_routes(state.db.clone()))
        .layer(middleware::from_fn(
            middleware_helpers::security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}

/// Creates the schema and the default administrator
pub async fn bootstrap_database(db: &DatabaseConnection) -> Result<(), errors::ServiceError> {
    db::run_migrations(db).await?;
    services::users::ensure_default_admin(db).await?;
    Ok(())
}
