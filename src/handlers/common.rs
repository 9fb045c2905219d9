use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::SessionUser,
    errors::ServiceError,
    services::Page,
    views::{self, Notice},
};

const MAX_PER_PAGE: u64 = 100;
/// Keeps `page * per_page` far from `u64` overflow when computing offsets
const MAX_PAGE: u64 = u32::MAX as u64;

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Page number and page size clamped to usable values
    pub fn normalized(&self) -> (u64, u64) {
        (
            self.page.clamp(1, MAX_PAGE),
            self.per_page.clamp(1, MAX_PER_PAGE),
        )
    }
}

/// Standard pagination response metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 || per_page == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            pagination: PaginationMeta::new(page.page, page.per_page, page.total),
            data: page.items,
        }
    }
}

/// `?notice=` carried by post-redirect-get
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn notice(&self) -> Option<Notice> {
        Notice::from_query(self.notice.as_deref())
    }
}

pub fn redirect_with_notice(path: &str, notice: Notice) -> Redirect {
    Redirect::to(&format!("{}?notice={}", path, notice.code()))
}

pub fn html(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}

/// Errors a user can fix by correcting the submitted form
pub fn is_form_error(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::ValidationError(_) | ServiceError::Conflict(_)
    )
}

/// Error raised by an HTML route, rendered as the error page
#[derive(Debug)]
pub struct HtmlError {
    pub error: ServiceError,
    pub user: Option<SessionUser>,
}

impl HtmlError {
    pub fn new(error: impl Into<ServiceError>, user: &SessionUser) -> Self {
        Self {
            error: error.into(),
            user: Some(user.clone()),
        }
    }
}

impl From<ServiceError> for HtmlError {
    fn from(error: ServiceError) -> Self {
        Self { error, user: None }
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if self.error.is_internal() {
            tracing::error!(error = %self.error, "page request failed");
        } else {
            tracing::debug!(error = %self.error, "page request rejected");
        }
        html(
            status,
            views::pages::error_page(status, &self.error.user_message(), self.user.as_ref()),
        )
    }
}

pub type HtmlResult = Result<Response, HtmlError>;
