use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension, Form,
};

use super::common::{html, is_form_error, redirect_with_notice, HtmlError, HtmlResult, NoticeQuery};
use crate::{
    auth::SessionUser,
    forms::PaymentForm,
    services::payments::PaymentSummary,
    views::{self, Notice},
    AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<NoticeQuery>,
) -> HtmlResult {
    let service = state.payments();
    let rows = service.all().await.map_err(|e| HtmlError::new(e, &user))?;
    let summary = PaymentSummary::from_payments(&rows);
    Ok(Html(views::payments::payments_page(
        &user,
        &rows,
        &summary,
        query.notice(),
    ))
    .into_response())
}

async fn render_form(
    state: &AppState,
    user: &SessionUser,
    error: Option<&str>,
    values: Option<&PaymentForm>,
) -> Result<String, HtmlError> {
    let invoices: Vec<(i32, String)> = state
        .invoices()
        .all_sales()
        .await
        .map_err(|e| HtmlError::new(e, user))?
        .into_iter()
        .map(|i| (i.id, i.invoice_number))
        .collect();
    Ok(views::payments::payment_form(user, &invoices, error, values))
}

pub async fn new_payment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> HtmlResult {
    let page = render_form(&state, &user, None, None).await?;
    Ok(Html(page).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<PaymentForm>,
) -> HtmlResult {
    let result = match form.parse() {
        Ok(input) => state.payments().create(input).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(redirect_with_notice("/payments", Notice::Created).into_response()),
        Err(e) if is_form_error(&e) => {
            let page = render_form(&state, &user, Some(&e.user_message()), Some(&form)).await?;
            Ok(html(StatusCode::BAD_REQUEST, page))
        }
        Err(e) => Err(HtmlError::new(e, &user)),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i32>,
) -> HtmlResult {
    state
        .payments()
        .delete(id)
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    Ok(redirect_with_notice("/payments", Notice::Deleted).into_response())
}
