mod common;

use axum::http::StatusCode;
use common::{body_text, location, session_cookie, TestApp};
use muhasaba::services::users::DEFAULT_ADMIN_FULL_NAME;

const PROTECTED_PAGES: [&str; 10] = [
    "/dashboard",
    "/customers",
    "/suppliers",
    "/invoices",
    "/sales_invoices",
    "/add_sales_invoice",
    "/purchase_invoices",
    "/add_purchase_invoice",
    "/payments",
    "/add_payment",
];

#[tokio::test]
async fn protected_pages_redirect_to_login_without_session() {
    let app = TestApp::new().await;

    for path in PROTECTED_PAGES {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&response).as_deref(), Some("/login"), "{}", path);
    }
}

#[tokio::test]
async fn protected_pages_render_with_session() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    for path in PROTECTED_PAGES {
        let response = app.get(path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        let body = body_text(response).await;
        assert!(body.contains(r#"dir="rtl""#), "{}", path);
    }
}

#[tokio::test]
async fn forged_cookie_is_rejected() {
    let app = TestApp::new().await;
    let response = app.get("/dashboard", Some("session=not-a-token")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn landing_page_is_public() {
    let app = TestApp::new().await;
    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"href="/login""#));
}

#[tokio::test]
async fn failed_login_rerenders_form_with_message() {
    let app = TestApp::new().await;
    let response = app
        .post_form(
            "/login",
            &[("username", "admin"), ("password", "wrong")],
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    let body = body_text(response).await;
    assert!(body.contains("اسم المستخدم أو كلمة المرور غير صحيحة"));
    assert!(body.contains("<form"));
}

#[tokio::test]
async fn successful_login_redirects_to_dashboard() {
    let app = TestApp::new().await;
    let response = app
        .post_form(
            "/login",
            &[("username", "admin"), ("password", "admin123")],
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));
    let cookie = session_cookie(&response).expect("session cookie");
    assert!(cookie.starts_with("session="));

    let dashboard = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    let body = body_text(dashboard).await;
    assert!(body.contains(DEFAULT_ADMIN_FULL_NAME));
}

#[tokio::test]
async fn login_form_skips_signed_in_users() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/dashboard"));

    let anonymous = app.get("/login", None).await;
    assert_eq!(anonymous.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
    let cleared = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn unknown_path_renders_not_found_page() {
    let app = TestApp::new().await;
    let response = app.get("/no-such-page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("404"));
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::new().await;
    let response = app.get("/", None).await;
    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(
        headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(
        headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
}

#[tokio::test]
async fn payments_page_passes_smoke_inspection() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app.get("/payments", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;

    let mut report = muhasaba::smoke::SmokeReport::default();
    muhasaba::smoke::inspect_payments_page(&body, &mut report);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report
        .notes
        .iter()
        .any(|note| note.contains("لا توجد مدفوعات")));
}
