//! Page handlers, one module per section of the site.

pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod students;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use registrar_core::EnrollmentStatus;

use crate::error::ClientError;
use crate::flash::Flash;
use crate::render::{escape, layout};

/// A failed page: redirect elsewhere with an error flash.
#[derive(Debug)]
pub struct PageError {
    location: String,
    flash: Flash,
}

impl PageError {
    pub fn new(location: impl Into<String>, flash: Flash) -> Self {
        PageError {
            location: location.into(),
            flash,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.flash.redirect(&self.location).into_response()
    }
}

pub type PageResult = Result<Response, PageError>;

/// Turns an API failure into a redirect with the mapped flash.
pub trait OrRedirect<T> {
    fn or_redirect(self, location: &str) -> Result<T, PageError>;
}

impl<T> OrRedirect<T> for Result<T, ClientError> {
    fn or_redirect(self, location: &str) -> Result<T, PageError> {
        self.map_err(|err| {
            warn!(error = %err, %location, "API call failed, redirecting");
            PageError::new(location, Flash::error(err.user_message()))
        })
    }
}

/// Status filter from a query value.
///
/// Missing or empty means `default`; `all` means no filter; anything
/// unrecognized is treated as `all`.
pub(crate) fn status_filter(
    raw: Option<&str>,
    default: Option<EnrollmentStatus>,
) -> Option<EnrollmentStatus> {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse().ok(),
    }
}

/// Filter links for the status values, with the current one marked.
pub(crate) fn status_tabs(path: &str, current: Option<EnrollmentStatus>) -> String {
    let mut tabs = String::from("<p>Show: ");
    let options = std::iter::once(("all", current.is_none())).chain(
        EnrollmentStatus::ALL
            .iter()
            .map(|status| (status.as_str(), current == Some(*status))),
    );
    for (value, selected) in options {
        if selected {
            tabs.push_str(&format!("<strong>{value}</strong> "));
        } else {
            tabs.push_str(&format!(r#"<a href="{path}?status={value}">{value}</a> "#));
        }
    }
    tabs.push_str("</p>");
    tabs
}

pub(crate) fn field_is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub async fn not_found() -> Response {
    let content = format!(
        "<h1>Page not found</h1><p>{}</p><p><a href=\"/\">Back to the dashboard</a></p>",
        escape("The page you asked for does not exist.")
    );
    (StatusCode::NOT_FOUND, layout("Not found", None, &content)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter() {
        let active = Some(EnrollmentStatus::Active);
        assert_eq!(status_filter(None, active), active);
        assert_eq!(status_filter(Some(""), active), active);
        assert_eq!(status_filter(Some("all"), active), None);
        assert_eq!(status_filter(Some("paused"), active), None);
        assert_eq!(
            status_filter(Some("dropped"), None),
            Some(EnrollmentStatus::Dropped)
        );
    }

    #[test]
    fn test_status_tabs_mark_current() {
        let tabs = status_tabs("/enrollments/student/3", Some(EnrollmentStatus::Completed));
        assert!(tabs.contains("<strong>completed</strong>"));
        assert!(tabs.contains(r#"<a href="/enrollments/student/3?status=all">all</a>"#));
        assert!(!tabs.contains("?status=completed"));
    }

    #[test]
    fn test_page_error_redirects_with_flash() {
        let response = PageError::new("/courses", Flash::error("Course is full")).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/courses?notice=Course+is+full&level=error"
        );
    }
}
