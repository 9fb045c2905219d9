//! HTTP page checks against a running server.
//!
//! Each check is one test in the [`SmokeReport`]. Transport failures are
//! recorded as failed tests and never abort a suite.

pub mod html;

use std::{fmt, time::Duration};

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Suite {
    Invoices,
    Payments,
    All,
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoices => write!(f, "invoices"),
            Self::Payments => write!(f, "payments"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Totals plus collected error messages
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    /// Informational observations that do not affect the counts
    pub notes: Vec<String>,
}

impl SmokeReport {
    pub fn pass(&mut self, check: &str) {
        self.total += 1;
        self.passed += 1;
        info!(check, "passed");
    }

    pub fn fail(&mut self, check: &str, message: impl Into<String>) {
        let message = message.into();
        self.total += 1;
        self.failed += 1;
        warn!(check, %message, "failed");
        self.errors.push(message);
    }

    /// A content problem on a page that itself loaded
    pub fn content_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "content check failed");
        self.errors.push(message);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }

    pub fn merge(&mut self, other: SmokeReport) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.errors.extend(other.errors);
        self.notes.extend(other.notes);
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "إجمالي الاختبارات: {}", self.total)?;
        writeln!(f, "الاختبارات الناجحة: {}", self.passed)?;
        writeln!(f, "الاختبارات الفاشلة: {}", self.failed)?;
        writeln!(f, "معدل النجاح: {:.1}%", self.success_rate())?;
        for note in &self.notes {
            writeln!(f, "  • {}", note)?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "الأخطاء:")?;
            for error in &self.errors {
                writeln!(f, "  - {}", error)?;
            }
        }
        Ok(())
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: StatusCode,
    pub body: String,
}

/// Cookie-keeping client bound to one server
pub struct SmokeClient {
    client: Client,
    base_url: String,
}

impl SmokeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SmokeError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SmokeError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts the login form; the session cookie lands in the store
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        info!(status = %response.status(), "login submitted");
        Ok(response.status())
    }

    pub async fn get(&self, path: &str) -> Result<Fetched, reqwest::Error> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(Fetched { status, body })
    }

    async fn login_for_suite(&self, report: &mut SmokeReport) {
        match self.login(DEFAULT_USERNAME, DEFAULT_PASSWORD).await {
            Ok(status) => report.note(format!("تسجيل الدخول: {}", status.as_u16())),
            Err(err) => report.note(format!("تعذر تسجيل الدخول: {}", err)),
        }
    }

    /// Fetches `path` and counts the check; returns the body on HTTP 200
    async fn check_page(&self, report: &mut SmokeReport, path: &str, label: &str) -> Option<String> {
        match self.get(path).await {
            Ok(page) if page.status == StatusCode::OK => {
                report.pass(path);
                Some(page.body)
            }
            Ok(page) => {
                report.fail(
                    path,
                    format!("خطأ HTTP {} في {}", page.status.as_u16(), path),
                );
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, path, "transport error");
                report.fail(path, format!("خطأ في الاتصال بـ{}", label));
                None
            }
        }
    }

    /// Invoice list and form pages
    pub async fn invoices_suite(&self) -> SmokeReport {
        let mut report = SmokeReport::default();
        self.login_for_suite(&mut report).await;

        if let Some(body) = self
            .check_page(&mut report, "/sales_invoices", "فواتير المبيعات")
            .await
        {
            if !contains_any(&body, &["فواتير المبيعات", "المبيعات"]) {
                report.content_error("محتوى صفحة فواتير المبيعات غير صحيح");
            }
        }

        if let Some(body) = self
            .check_page(&mut report, "/add_sales_invoice", "إضافة فاتورة المبيعات")
            .await
        {
            if !has_form(&body) || !contains_any(&body, &["عميل", "مبلغ"]) {
                report.content_error("نموذج إضافة فاتورة المبيعات مفقود");
            }
        }

        if let Some(body) = self
            .check_page(&mut report, "/purchase_invoices", "فواتير المشتريات")
            .await
        {
            if !contains_any(&body, &["فواتير المشتريات", "المشتريات"]) {
                report.content_error("محتوى صفحة فواتير المشتريات غير صحيح");
            }
        }

        if let Some(body) = self
            .check_page(&mut report, "/add_purchase_invoice", "إضافة فاتورة المشتريات")
            .await
        {
            if !has_form(&body) || !contains_any(&body, &["مورد", "مبلغ"]) {
                report.content_error("نموذج إضافة فاتورة المشتريات مفقود");
            }
        }

        self.check_page(&mut report, "/invoices", "الفواتير العامة")
            .await;

        report
    }

    /// Payments page structure
    pub async fn payments_suite(&self) -> SmokeReport {
        let mut report = SmokeReport::default();
        self.login_for_suite(&mut report).await;

        let Some(body) = self
            .check_page(&mut report, "/payments", "صفحة المدفوعات")
            .await
        else {
            return report;
        };
        inspect_payments_page(&body, &mut report);
        report
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn run(&self, suite: Suite) -> SmokeReport {
        match suite {
            Suite::Invoices => self.invoices_suite().await,
            Suite::Payments => self.payments_suite().await,
            Suite::All => {
                let mut report = self.invoices_suite().await;
                report.merge(self.payments_suite().await);
                report
            }
        }
    }
}

fn contains_any(body: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| body.contains(needle))
}

fn has_form(body: &str) -> bool {
    body.to_lowercase().contains("<form")
}

/// Records what the payments page shows; `alert-danger` blocks are errors
pub fn inspect_payments_page(body: &str, report: &mut SmokeReport) {
    let doc = html::parse(body);
    if let Some(title) = html::first_text(&doc, "h2") {
        report.note(format!("العنوان: {}", title));
    }

    if html::exists(&doc, "table#paymentsTable") {
        report.note(format!(
            "عدد الصفوف: {}",
            html::count(&doc, "table#paymentsTable tr")
        ));
        if html::exists(&doc, "table#paymentsTable > tbody") {
            report.note(format!(
                "عدد صفوف البيانات: {}",
                html::count(&doc, "table#paymentsTable > tbody > tr")
            ));
        } else {
            report.content_error("لا يوجد tbody في جدول المدفوعات");
        }
    } else if body.contains(crate::views::payments::NO_PAYMENTS_MESSAGE) {
        report.note("رسالة: لا توجد مدفوعات");
    } else {
        report.note("جدول المدفوعات غير موجود");
    }

    let errors = html::count_with_class(&doc, "div", &["alert-danger"]);
    if errors > 0 {
        report.content_error(format!("أخطاء موجودة في صفحة المدفوعات: {}", errors));
    }

    report.note(format!(
        "عدد البطاقات: {}",
        html::count_with_class(&doc, "div", &["card"])
    ));
    report.note(format!(
        "بطاقات الإحصائيات: {}",
        html::count_with_class(
            &doc,
            "div",
            &["stats-card", "bg-success", "bg-danger", "bg-primary", "bg-info"]
        )
    ));
}
