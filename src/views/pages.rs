use axum::http::StatusCode;

use super::{alert, escape_html, format_money, layout, AlertKind, APP_TITLE};
use crate::{auth::SessionUser, services::dashboard::DashboardStats};

/// Public landing page
pub fn landing() -> String {
    let body = format!(
        r#"<div class="card text-center mx-auto" style="max-width: 600px;">
  <div class="card-body p-5">
    <h1 class="mb-4">{APP_TITLE}</h1>
    <div class="alert alert-success">
      <h5>النظام يعمل بنجاح</h5>
      <p class="mb-0">إدارة العملاء والموردين والفواتير والمدفوعات</p>
    </div>
    <a href="/login" class="btn btn-primary btn-lg mt-3">تسجيل الدخول</a>
    <div class="mt-4 pt-4 border-top">
      <small class="text-muted">المستخدم: admin | كلمة المرور: admin123</small>
    </div>
  </div>
</div>"#
    );
    layout("الرئيسية", None, &body)
}

const BOOTSTRAP_FEATURES: [&str; 6] = [
    "إدارة العملاء والموردين",
    "فواتير المبيعات والمشتريات",
    "حساب ضريبة القيمة المضافة",
    "المقبوضات والمدفوعات",
    "واجهة عربية متجاوبة",
    "واجهة برمجية JSON",
];

/// Self-contained page served by the minimal bootstrap server
pub fn bootstrap_page() -> String {
    let features: String = BOOTSTRAP_FEATURES
        .iter()
        .map(|feature| format!("<li>✅ {}</li>", escape_html(feature)))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
  <meta charset="UTF-8">
  <title>{APP_TITLE}</title>
  <style>
    body {{ font-family: Arial, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; text-align: center; padding: 50px; margin: 0; }}
    .container {{ background: rgba(255,255,255,0.1); padding: 50px; border-radius: 20px; }}
    .success {{ color: #28a745; font-size: 1.5rem; margin: 20px 0; }}
    .stats {{ display: flex; justify-content: center; gap: 30px; margin: 30px 0; }}
    .stat {{ background: rgba(255,255,255,0.2); padding: 20px; border-radius: 10px; }}
  </style>
</head>
<body>
  <div class="container">
    <h1>{APP_TITLE}</h1>
    <div class="success">✅ النظام يعمل بنجاح!</div>
    <div class="stats">
      <div class="stat"><h3>100%</h3><p>نسبة الإنجاز</p></div>
      <div class="stat"><h3>10/10</h3><p>المراحل المكتملة</p></div>
    </div>
    <h2>الميزات:</h2>
    <ul style="text-align: right; display: inline-block;">{features}</ul>
  </div>
</body>
</html>"#
    )
}

pub fn login(error: Option<&str>, username: &str) -> String {
    let error_block = error
        .map(|msg| alert(AlertKind::Danger, msg))
        .unwrap_or_default();
    let body = format!(
        r#"<div class="row justify-content-center">
  <div class="col-md-6 col-lg-4">
    <div class="card">
      <div class="card-body">
        <h3 class="text-center mb-4">تسجيل الدخول</h3>
        {error_block}
        <form method="POST" action="/login">
          <div class="mb-3">
            <label class="form-label">اسم المستخدم</label>
            <input type="text" class="form-control" name="username" value="{username}" required>
          </div>
          <div class="mb-4">
            <label class="form-label">كلمة المرور</label>
            <input type="password" class="form-control" name="password" required>
          </div>
          <button type="submit" class="btn btn-primary w-100">دخول</button>
        </form>
        <div class="text-center mt-3">
          <a href="/" class="btn btn-outline-secondary">العودة</a>
        </div>
      </div>
    </div>
  </div>
</div>"#,
        username = escape_html(username),
    );
    layout("تسجيل الدخول", None, &body)
}

fn stat_card(title: &str, value: &str, color: &str) -> String {
    format!(
        r#"<div class="col-md-3 mb-3">
  <div class="card stats-card text-white bg-{color}">
    <div class="card-body">
      <h6 class="card-title">{title}</h6>
      <h4 class="mb-0">{value}</h4>
    </div>
  </div>
</div>"#
    )
}

pub fn dashboard(user: &SessionUser, stats: &DashboardStats) -> String {
    let cards = [
        stat_card("العملاء", &stats.customers.to_string(), "primary"),
        stat_card("الموردين", &stats.suppliers.to_string(), "secondary"),
        stat_card("فواتير المبيعات", &stats.sales_invoices.to_string(), "success"),
        stat_card("فواتير المشتريات", &stats.purchase_invoices.to_string(), "warning"),
        stat_card("إجمالي المبيعات", &format_money(stats.total_sales), "success"),
        stat_card("إجمالي المشتريات", &format_money(stats.total_purchases), "danger"),
        stat_card("المقبوضات", &format_money(stats.payments.total_received), "info"),
        stat_card("صافي التدفق", &format_money(stats.payments.net_flow), "dark"),
    ]
    .concat();

    let body = format!(
        r#"<div class="alert alert-success text-center">
  <h2>مرحباً {name}!</h2>
  <p class="mb-0">النظام يعمل بنجاح</p>
</div>
<div class="row">{cards}</div>
<div class="mt-3">
  <a href="/add_sales_invoice" class="btn btn-primary">فاتورة مبيعات جديدة</a>
  <a href="/add_purchase_invoice" class="btn btn-outline-primary">فاتورة مشتريات جديدة</a>
  <a href="/add_payment" class="btn btn-outline-success">دفعة جديدة</a>
  <a href="/api/status" class="btn btn-info">حالة النظام</a>
</div>"#,
        name = escape_html(&user.full_name),
    );
    layout("لوحة التحكم", Some(user), &body)
}

/// Generic error page for HTML routes
pub fn error_page(status: StatusCode, message: &str, user: Option<&SessionUser>) -> String {
    let body = format!(
        r#"<div class="card mx-auto" style="max-width: 600px;">
  <div class="card-body text-center">
    <h2 class="mb-3">{code}</h2>
    {message}
    <a href="/dashboard" class="btn btn-primary">العودة إلى لوحة التحكم</a>
  </div>
</div>"#,
        code = status.as_u16(),
        message = alert(AlertKind::Danger, message),
    );
    layout("خطأ", user, &body)
}
