//! Server-rendered RTL pages.
//!
//! Pages are assembled from `format!` fragments. Anything that came from a
//! user or the database goes through [`escape_html`] first.

pub mod invoices;
pub mod pages;
pub mod parties;
pub mod payments;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::auth::SessionUser;

pub const APP_TITLE: &str = "نظام المحاسبة الاحترافي";
pub const CURRENCY: &str = "ر.س";

const BOOTSTRAP_RTL_CSS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.rtl.min.css";

/// Escapes text for HTML element and attribute context
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_opt(input: Option<&str>) -> String {
    input.map(escape_html).unwrap_or_default()
}

/// `1234567.8` -> `1,234,567.80`
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

pub fn format_money(value: Decimal) -> String {
    format!("{} {}", format_amount(value), CURRENCY)
}

pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
    Info,
}

impl AlertKind {
    fn class(&self) -> &'static str {
        match self {
            Self::Success => "alert-success",
            Self::Danger => "alert-danger",
            Self::Info => "alert-info",
        }
    }
}

pub fn alert(kind: AlertKind, message: &str) -> String {
    format!(
        r#"<div class="alert {}" role="alert">{}</div>"#,
        kind.class(),
        escape_html(message)
    )
}

/// Outcome notices passed through the redirect after a form post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Created,
    Deleted,
}

impl Notice {
    pub fn from_query(code: Option<&str>) -> Option<Self> {
        match code? {
            "created" => Some(Self::Created),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Created => alert(AlertKind::Success, "تم الحفظ بنجاح"),
            Self::Deleted => alert(AlertKind::Success, "تم الحذف بنجاح"),
        }
    }
}

fn navbar(user: &SessionUser) -> String {
    let links = [
        ("/dashboard", "لوحة التحكم"),
        ("/customers", "العملاء"),
        ("/suppliers", "الموردين"),
        ("/sales_invoices", "المبيعات"),
        ("/purchase_invoices", "المشتريات"),
        ("/invoices", "الفواتير"),
        ("/payments", "المدفوعات"),
    ];
    let items: String = links
        .iter()
        .map(|(href, label)| {
            format!(r#"<li class="nav-item"><a class="nav-link" href="{href}">{label}</a></li>"#)
        })
        .collect();

    format!(
        r#"<nav class="navbar navbar-expand-lg navbar-dark" style="background: linear-gradient(45deg, #667eea, #764ba2);">
  <div class="container">
    <a class="navbar-brand" href="/dashboard">{APP_TITLE}</a>
    <ul class="navbar-nav me-auto">{items}</ul>
    <span class="navbar-text text-white ms-3">{name}</span>
    <a class="nav-link text-white" href="/logout">خروج</a>
  </div>
</nav>"#,
        name = escape_html(&user.full_name),
    )
}

/// Wraps a page body in the shared RTL document shell
pub fn layout(title: &str, user: Option<&SessionUser>, body: &str) -> String {
    let nav = user.map(navbar).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - {APP_TITLE}</title>
  <link href="{BOOTSTRAP_RTL_CSS}" rel="stylesheet">
  <style>
    body {{ background-color: #f8f9fa; }}
    .stats-card {{ border-radius: 15px; box-shadow: 0 5px 15px rgba(0,0,0,0.08); }}
  </style>
</head>
<body>
{nav}
<div class="container mt-4">
{body}
</div>
</body>
</html>"#,
        title = escape_html(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;y&#x27;"
        );
        assert_eq!(escape_html("شركة النور"), "شركة النور");
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(999.5)), "999.50");
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_amount(dec!(-4500)), "-4,500.00");
        assert_eq!(format_money(dec!(1000)), "1,000.00 ر.س");
    }

    #[test]
    fn layout_is_rtl_and_escapes_user_name() {
        let user = SessionUser {
            user_id: 1,
            username: "admin".into(),
            full_name: "<b>مدير</b>".into(),
        };
        let html = layout("لوحة التحكم", Some(&user), "<p>x</p>");
        assert!(html.contains(r#"<html dir="rtl" lang="ar">"#));
        assert!(html.contains("&lt;b&gt;مدير&lt;/b&gt;"));
        assert!(html.contains("/logout"));
    }

    #[test]
    fn notices_round_trip_through_query_codes() {
        assert_eq!(Notice::from_query(Some("created")), Some(Notice::Created));
        assert_eq!(Notice::from_query(Some("bogus")), None);
        assert_eq!(Notice::from_query(None), None);
        assert!(Notice::Deleted.render().contains("alert-success"));
    }
}
