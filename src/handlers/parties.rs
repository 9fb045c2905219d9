//! Customer and supplier pages.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension, Form,
};

use super::common::{html, is_form_error, redirect_with_notice, HtmlError, HtmlResult, NoticeQuery};
use crate::{
    auth::SessionUser,
    services::{customers::NewCustomer, suppliers::NewSupplier},
    views::{self, Notice},
    AppState,
};

pub async fn list_customers(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<NoticeQuery>,
) -> HtmlResult {
    let rows = state
        .customers()
        .all()
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    Ok(Html(views::parties::customers(&user, &rows, query.notice(), None, None)).into_response())
}

pub async fn add_customer(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<NewCustomer>,
) -> HtmlResult {
    let service = state.customers();
    match service.create(form.clone()).await {
        Ok(_) => Ok(redirect_with_notice("/customers", Notice::Created).into_response()),
        Err(e) if is_form_error(&e) => {
            let rows = service.all().await.map_err(|e| HtmlError::new(e, &user))?;
            Ok(html(
                StatusCode::BAD_REQUEST,
                views::parties::customers(&user, &rows, None, Some(&e.user_message()), Some(&form)),
            ))
        }
        Err(e) => Err(HtmlError::new(e, &user)),
    }
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<NoticeQuery>,
) -> HtmlResult {
    let rows = state
        .suppliers()
        .all()
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    Ok(Html(views::parties::suppliers(&user, &rows, query.notice(), None, None)).into_response())
}

pub async fn add_supplier(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<NewSupplier>,
) -> HtmlResult {
    let service = state.suppliers();
    match service.create(form.clone()).await {
        Ok(_) => Ok(redirect_with_notice("/suppliers", Notice::Created).into_response()),
        Err(e) if is_form_error(&e) => {
            let rows = service.all().await.map_err(|e| HtmlError::new(e, &user))?;
            Ok(html(
                StatusCode::BAD_REQUEST,
                views::parties::suppliers(&user, &rows, None, Some(&e.user_message()), Some(&form)),
            ))
        }
        Err(e) => Err(HtmlError::new(e, &user)),
    }
}
