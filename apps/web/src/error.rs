//! # Frontend Error Types
//!
//! Failures talking to registrar-api, and how each one is shown to the user.
//!
//! ## Flash Mapping
//! ```text
//! ┌────────────────────────────┬──────────┬────────────────────────────────────┐
//! │ Failure                    │ Status   │ Flash                              │
//! ├────────────────────────────┼──────────┼────────────────────────────────────┤
//! │ API 404                    │ 404      │ "The requested resource was not    │
//! │                            │          │  found."                           │
//! │ API 5xx / unreachable      │ 5xx, 503 │ "A server error occurred. Please   │
//! │                            │          │  try again later."                 │
//! │ API other 4xx              │ 4xx      │ the API's `detail`                 │
//! │ request timed out          │ 408      │ "Request timed out. Please try     │
//! │                            │          │  again."                           │
//! └────────────────────────────┴──────────┴────────────────────────────────────┘
//! ```

use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const SERVER_ERROR_MESSAGE: &str = "A server error occurred. Please try again later.";
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";
pub const UNREACHABLE_MESSAGE: &str = "Unable to connect to the API server.";

/// Errors from [`ApiClient`](crate::client::ApiClient) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a non-success status.
    ///
    /// ## When This Occurs
    /// - Missing student, course or enrollment (404)
    /// - Rule rejection such as a full course or duplicate email (400)
    /// - Server failure (500)
    #[error("API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The request did not finish within the configured timeout.
    #[error("Request timed out. Please try again.")]
    Timeout,

    /// The API could not be reached or the connection broke.
    ///
    /// ## When This Occurs
    /// - registrar-api is not running
    /// - DNS or TLS failure for `api.base_url`
    #[error("Unable to connect to the API server. ({0})")]
    Unreachable(String),

    /// A success response whose body did not match the expected shape.
    #[error("Invalid API response: {0}")]
    Decode(String),

    /// A request URL could not be built.
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP-style status for the failure, as the user-facing mapping sees it.
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Api { status, .. } => *status,
            ClientError::Timeout => 408,
            ClientError::Unreachable(_) => 503,
            ClientError::Decode(_) | ClientError::Url(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }

    /// The API's explanation, or the transport message.
    pub fn detail(&self) -> String {
        match self {
            ClientError::Api { detail, .. } => detail.clone(),
            ClientError::Timeout => TIMEOUT_MESSAGE.to_string(),
            ClientError::Unreachable(_) => UNREACHABLE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// The text to flash for this failure.
    pub fn user_message(&self) -> String {
        match self.status() {
            404 => NOT_FOUND_MESSAGE.to_string(),
            status if status >= 500 => SERVER_ERROR_MESSAGE.to_string(),
            _ => self.detail(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Unreachable(err.to_string())
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, detail: &str) -> ClientError {
        ClientError::Api {
            status,
            detail: detail.to_string(),
        }
    }

    #[test]
    fn test_not_found_uses_generic_message() {
        let err = api(404, "Student not found");
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), NOT_FOUND_MESSAGE);
        assert_eq!(err.detail(), "Student not found");
    }

    #[test]
    fn test_client_errors_show_detail() {
        assert_eq!(api(400, "Course is full").user_message(), "Course is full");
        assert_eq!(ClientError::Timeout.user_message(), TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_server_side_failures_are_generic() {
        assert_eq!(api(500, "Internal server error").user_message(), SERVER_ERROR_MESSAGE);
        assert_eq!(
            ClientError::Unreachable("connection refused".to_string()).user_message(),
            SERVER_ERROR_MESSAGE
        );
        assert_eq!(
            ClientError::Decode("missing field `id`".to_string()).user_message(),
            SERVER_ERROR_MESSAGE
        );
    }
}
