//! # API Client
//!
//! Typed access to registrar-api over HTTP.
//!
//! ```text
//! page handler ──► ApiClient::enroll(..) ──► POST {base}/enrollments
//!                                             │
//!                 ClientResult<Enrollment> ◄──┘ 2xx → decode body
//!                                               4xx/5xx → ClientError::Api { status, detail }
//! ```
//!
//! One `reqwest::Client` is shared by every request, with the configured
//! timeout applied to each.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use registrar_core::{
    Course, CourseUpdate, CourseWithStudents, Enrollment, EnrollmentStatus,
    EnrollmentStatusUpdate, EnrollmentWithCourse, EnrollmentWithStudent, NewCourse,
    NewEnrollment, NewStudent, Page, PageRequest, Stats, Student, StudentUpdate,
    StudentWithEnrollments, MAX_PAGE_LIMIT,
};

use crate::error::{ClientError, ClientResult};

/// Query pairs appended to a request URL.
pub type QueryPairs = Vec<(&'static str, String)>;

/// HTTP client for registrar-api.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

impl ApiClient {
    /// Builds a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(ApiClient { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // System
    // =========================================================================

    pub async fn stats(&self) -> ClientResult<Stats> {
        self.get("stats", Vec::new()).await
    }

    // =========================================================================
    // Students
    // =========================================================================

    pub async fn list_students(
        &self,
        search: Option<&str>,
        request: PageRequest,
    ) -> ClientResult<Page<Student>> {
        let mut query = page_query(request);
        push_search(&mut query, search);
        self.get("students", query).await
    }

    pub async fn get_student(&self, id: i64) -> ClientResult<StudentWithEnrollments> {
        self.get(&format!("students/{id}"), Vec::new()).await
    }

    pub async fn create_student(&self, new: &NewStudent) -> ClientResult<Student> {
        self.send(Method::POST, "students", new).await
    }

    pub async fn update_student(&self, id: i64, update: &StudentUpdate) -> ClientResult<Student> {
        self.send(Method::PUT, &format!("students/{id}"), update).await
    }

    pub async fn delete_student(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("students/{id}")).await
    }

    // =========================================================================
    // Courses
    // =========================================================================

    pub async fn list_courses(
        &self,
        search: Option<&str>,
        available_only: bool,
        request: PageRequest,
    ) -> ClientResult<Page<Course>> {
        let mut query = page_query(request);
        push_search(&mut query, search);
        if available_only {
            query.push(("available_only", "true".to_string()));
        }
        self.get("courses", query).await
    }

    /// Every course, in one request of the largest allowed page.
    pub async fn all_courses(&self) -> ClientResult<Vec<Course>> {
        let request = PageRequest {
            skip: 0,
            limit: MAX_PAGE_LIMIT,
        };
        Ok(self.list_courses(None, false, request).await?.items)
    }

    pub async fn get_course(&self, id: i64) -> ClientResult<Course> {
        self.get(&format!("courses/{id}"), Vec::new()).await
    }

    pub async fn course_students(&self, id: i64) -> ClientResult<CourseWithStudents> {
        self.get(&format!("courses/{id}/students"), Vec::new()).await
    }

    pub async fn create_course(&self, new: &NewCourse) -> ClientResult<Course> {
        self.send(Method::POST, "courses", new).await
    }

    pub async fn update_course(&self, id: i64, update: &CourseUpdate) -> ClientResult<Course> {
        self.send(Method::PUT, &format!("courses/{id}"), update).await
    }

    pub async fn delete_course(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("courses/{id}")).await
    }

    // =========================================================================
    // Enrollments
    // =========================================================================

    pub async fn enroll(&self, new: &NewEnrollment) -> ClientResult<Enrollment> {
        self.send(Method::POST, "enrollments", new).await
    }

    pub async fn list_enrollments(
        &self,
        status: Option<EnrollmentStatus>,
        request: PageRequest,
    ) -> ClientResult<Page<Enrollment>> {
        self.get("enrollments", status_query(status, request)).await
    }

    pub async fn student_enrollments(
        &self,
        student_id: i64,
        status: Option<EnrollmentStatus>,
        request: PageRequest,
    ) -> ClientResult<Page<EnrollmentWithCourse>> {
        self.get(
            &format!("enrollments/student/{student_id}"),
            status_query(status, request),
        )
        .await
    }

    pub async fn course_enrollments(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
        request: PageRequest,
    ) -> ClientResult<Page<EnrollmentWithStudent>> {
        self.get(
            &format!("enrollments/course/{course_id}"),
            status_query(status, request),
        )
        .await
    }

    pub async fn get_enrollment(&self, id: i64) -> ClientResult<Enrollment> {
        self.get(&format!("enrollments/{id}"), Vec::new()).await
    }

    pub async fn set_enrollment_status(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> ClientResult<Enrollment> {
        self.send(
            Method::PUT,
            &format!("enrollments/{id}"),
            &EnrollmentStatusUpdate { status },
        )
        .await
    }

    pub async fn delete_enrollment(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("enrollments/{id}")).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Resolves `path` below the base URL and appends `query`.
    pub fn endpoint(&self, path: &str, query: &[(&'static str, String)]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: QueryPairs) -> ClientResult<T> {
        let url = self.endpoint(path, &query)?;
        debug!(method = "GET", %url, "API request");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.endpoint(path, &[])?;
        debug!(%method, %url, "API request");
        let response = self.http.request(method, url).json(body).send().await?;
        decode(response).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        let url = self.endpoint(path, &[])?;
        debug!(method = "DELETE", %url, "API request");
        let response = self.http.delete(url).send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

fn page_query(request: PageRequest) -> QueryPairs {
    vec![
        ("skip", request.skip.to_string()),
        ("limit", request.limit.to_string()),
    ]
}

fn push_search(query: &mut QueryPairs, search: Option<&str>) {
    if let Some(term) = search.map(str::trim).filter(|term| !term.is_empty()) {
        query.push(("search", term.to_string()));
    }
}

fn status_query(status: Option<EnrollmentStatus>, request: PageRequest) -> QueryPairs {
    let mut query = page_query(request);
    if let Some(status) = status {
        query.push(("status", status.as_str().to_string()));
    }
    query
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

/// Passes 2xx responses through and turns the rest into `ClientError::Api`.
async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = error_detail(&body);
    warn!(status = status.as_u16(), %detail, "API request failed");

    Err(ClientError::Api {
        status: status.as_u16(),
        detail,
    })
}

/// `detail`, then `message`, then the raw body, then a fallback.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(detail),
            ..
        }) => detail,
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => "API request failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_below_base_path() {
        let root = client("http://localhost:8000");
        assert_eq!(
            root.endpoint("students/7", &[]).unwrap().as_str(),
            "http://localhost:8000/students/7"
        );

        let nested = client("http://gateway.local/registrar/");
        assert_eq!(
            nested.endpoint("courses", &[]).unwrap().as_str(),
            "http://gateway.local/registrar/courses"
        );
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let api = client("http://localhost:8000");
        let mut query = page_query(PageRequest::for_page(3, 20));
        push_search(&mut query, Some("  o'neil & co "));

        let url = api.endpoint("students", &query).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/students?skip=40&limit=20&search=o%27neil+%26+co"
        );
    }

    #[test]
    fn test_blank_search_and_status_omitted() {
        let mut query = page_query(PageRequest::default());
        push_search(&mut query, Some("   "));
        assert_eq!(query.len(), 2);

        let with_status = status_query(Some(EnrollmentStatus::Dropped), PageRequest::default());
        assert_eq!(with_status.last().unwrap(), &("status", "dropped".to_string()));
        assert_eq!(status_query(None, PageRequest::default()).len(), 2);
    }

    #[test]
    fn test_error_detail_fallbacks() {
        assert_eq!(error_detail(r#"{"detail":"Course is full"}"#), "Course is full");
        assert_eq!(error_detail(r#"{"message":"Bad gateway"}"#), "Bad gateway");
        assert_eq!(error_detail("upstream timeout\n"), "upstream timeout");
        assert_eq!(error_detail(""), "API request failed");
    }
}
