//! JSON API under `/api/v1`, guarded by the session cookie.

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::get,
    Json, Router,
};

use super::common::{PaginatedResponse, PaginationParams};
use crate::{
    auth::require_api_session,
    entities::{customer, invoice, payment, purchase_invoice, supplier},
    services::payments::PaymentSummary,
    ApiResponse, ApiResult, AppState,
};

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let (page, per_page) = params.normalized();
    let found = state.customers().list(page, per_page).await?;
    Ok(Json(ApiResponse::success(found.into())))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<customer::Model> {
    Ok(Json(ApiResponse::success(state.customers().get(id).await?)))
}

async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<supplier::Model>> {
    let (page, per_page) = params.normalized();
    let found = state.suppliers().list(page, per_page).await?;
    Ok(Json(ApiResponse::success(found.into())))
}

async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<supplier::Model> {
    Ok(Json(ApiResponse::success(state.suppliers().get(id).await?)))
}

async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<invoice::Model>> {
    let (page, per_page) = params.normalized();
    let found = state.invoices().list_sales(page, per_page).await?;
    Ok(Json(ApiResponse::success(found.into())))
}

async fn list_purchase_invoices(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<purchase_invoice::Model>> {
    let (page, per_page) = params.normalized();
    let found = state.invoices().list_purchases(page, per_page).await?;
    Ok(Json(ApiResponse::success(found.into())))
}

async fn list_payments(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<payment::Model>> {
    let (page, per_page) = params.normalized();
    let found = state.payments().list(page, per_page).await?;
    Ok(Json(ApiResponse::success(found.into())))
}

async fn payment_summary(State(state): State<AppState>) -> ApiResult<PaymentSummary> {
    Ok(Json(ApiResponse::success(state.payments().summary().await?)))
}

pub fn api_v1_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/:id", get(get_customer))
        .route("/suppliers", get(list_suppliers))
        .route("/suppliers/:id", get(get_supplier))
        .route("/invoices", get(list_invoices))
        .route("/purchase-invoices", get(list_purchase_invoices))
        .route("/payments", get(list_payments))
        .route("/payments/summary", get(payment_summary))
        .route_layer(middleware::from_fn_with_state(state, require_api_session))
}
