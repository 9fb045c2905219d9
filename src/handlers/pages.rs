use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use tracing::{info, warn};

use super::common::{html, HtmlError, HtmlResult};
use crate::{
    auth::SessionUser,
    forms::LoginForm,
    services::{dashboard, users},
    views, AppState,
};

pub const INVALID_CREDENTIALS: &str = "اسم المستخدم أو كلمة المرور غير صحيحة";

pub async fn landing() -> Html<String> {
    Html(views::pages::landing())
}

/// Shows the login form; a signed-in user goes straight to the dashboard
pub async fn login_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.sessions.user_from_headers(&headers).is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    Html(views::pages::login(None, "")).into_response()
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> HtmlResult {
    let user = users::authenticate(&*state.db, &form.username, &form.password).await?;

    let Some(user) = user else {
        warn!(username = %form.username, "failed login attempt");
        return Ok(html(
            StatusCode::UNAUTHORIZED,
            views::pages::login(Some(INVALID_CREDENTIALS), &form.username),
        ));
    };

    let token = state.sessions.issue(&user)?;
    info!(user_id = user.id, "user signed in");
    Ok((
        [(header::SET_COOKIE, state.sessions.cookie(&token))],
        Redirect::to("/dashboard"),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> HtmlResult {
    let stats = dashboard::collect(&*state.db)
        .await
        .map_err(|e| HtmlError::new(e, &user))?;
    Ok(Html(views::pages::dashboard(&user, &stats)).into_response())
}

/// Fallback for unknown paths
pub async fn not_found(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = state.sessions.user_from_headers(&headers);
    html(
        StatusCode::NOT_FOUND,
        views::pages::error_page(StatusCode::NOT_FOUND, "الصفحة غير موجودة", user.as_ref()),
    )
}
