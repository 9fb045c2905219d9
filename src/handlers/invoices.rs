//! Sales and purchase invoice pages.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension, Form,
};
use rust_decimal::Decimal;

use super::common::{html, is_form_error, redirect_with_notice, HtmlError, HtmlResult, NoticeQuery};
use crate::{
    auth::SessionUser,
    errors::ServiceError,
    forms::InvoiceForm,
    views::{
        self,
        invoices::{InvoiceKind, InvoiceRow},
        Notice,
    },
    AppState,
};

/// `(id, name)` pairs for the party select box
async fn party_options(state: &AppState, kind: InvoiceKind) -> Result<Vec<(i32, String)>, ServiceError> {
    Ok(match kind {
        InvoiceKind::Sales => state
            .customers()
            .all()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect(),
        InvoiceKind::Purchase => state
            .suppliers()
            .all()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect(),
    })
}

fn default_tax_percent(state: &AppState) -> Decimal {
    state.invoices().vat_rate() * Decimal::ONE_HUNDRED
}

async fn render_form(
    state: &AppState,
    user: &SessionUser,
    kind: InvoiceKind,
    error: Option<&str>,
    values: Option<&InvoiceForm>,
) -> Result<String, HtmlError> {
    let parties = party_options(state, kind)
        .await
        .map_err(|e| HtmlError::new(e, user))?;
    Ok(views::invoices::invoice_form(
        user,
        kind,
        &parties,
        default_tax_percent(state),
        error,
        values,
    ))
}

pub async fn list_sales(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<NoticeQuery>,
) -> HtmlResult {
    let rows = state
        .invoices()
        .all_sales()
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    let rows: Vec<InvoiceRow<'_>> = rows.iter().map(InvoiceRow::from).collect();
    Ok(Html(views::invoices::invoice_list(
        &user,
        InvoiceKind::Sales,
        &rows,
        query.notice(),
    ))
    .into_response())
}

pub async fn list_purchases(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<NoticeQuery>,
) -> HtmlResult {
    let rows = state
        .invoices()
        .all_purchases()
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    let rows: Vec<InvoiceRow<'_>> = rows.iter().map(InvoiceRow::from).collect();
    Ok(Html(views::invoices::invoice_list(
        &user,
        InvoiceKind::Purchase,
        &rows,
        query.notice(),
    ))
    .into_response())
}

pub async fn list_all(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> HtmlResult {
    let service = state.invoices();
    let sales = service
        .all_sales()
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    let purchases = service
        .all_purchases()
        .await
        .map_err(|e| HtmlError::new(e, &user))?;

    let sales: Vec<InvoiceRow<'_>> = sales.iter().map(InvoiceRow::from).collect();
    let purchases: Vec<InvoiceRow<'_>> = purchases.iter().map(InvoiceRow::from).collect();
    Ok(Html(views::invoices::all_invoices(&user, &sales, &purchases)).into_response())
}

pub async fn new_sales(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> HtmlResult {
    let page = render_form(&state, &user, InvoiceKind::Sales, None, None).await?;
    Ok(Html(page).into_response())
}

pub async fn new_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> HtmlResult {
    let page = render_form(&state, &user, InvoiceKind::Purchase, None, None).await?;
    Ok(Html(page).into_response())
}

async fn create(
    state: AppState,
    user: SessionUser,
    kind: InvoiceKind,
    form: InvoiceForm,
) -> HtmlResult {
    let service = state.invoices();
    let result = match form.parse() {
        Ok(input) => match kind {
            InvoiceKind::Sales => service.create_sales(input).await.map(|_| ()),
            InvoiceKind::Purchase => service.create_purchase(input).await.map(|_| ()),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(redirect_with_notice(kind.list_path(), Notice::Created).into_response()),
        Err(e) if is_form_error(&e) => {
            let page = render_form(&state, &user, kind, Some(&e.user_message()), Some(&form)).await?;
            Ok(html(StatusCode::BAD_REQUEST, page))
        }
        Err(e) => Err(HtmlError::new(e, &user)),
    }
}

pub async fn create_sales(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<InvoiceForm>,
) -> HtmlResult {
    create(state, user, InvoiceKind::Sales, form).await
}

pub async fn create_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<InvoiceForm>,
) -> HtmlResult {
    create(state, user, InvoiceKind::Purchase, form).await
}

pub async fn delete_sales(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i32>,
) -> HtmlResult {
    state
        .invoices()
        .delete_sales(id)
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    Ok(redirect_with_notice(InvoiceKind::Sales.list_path(), Notice::Deleted).into_response())
}

pub async fn delete_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i32>,
) -> HtmlResult {
    state
        .invoices()
        .delete_purchase(id)
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    Ok(redirect_with_notice(InvoiceKind::Purchase.list_path(), Notice::Deleted).into_response())
}
