//! # Flash Messages
//!
//! One-shot notices shown after a redirect. The message rides in the
//! redirect's query string, so the frontend keeps no session state:
//!
//! ```text
//! POST /students/7/delete
//!      │
//!      ▼
//! 303 Location: /students?notice=Student+%22Alice%22+deleted+successfully%21&level=success
//!      │
//!      ▼
//! GET /students?notice=...&level=success   →  page renders the banner once
//! ```
//!
//! Links built from the rendered page never carry `notice` or `level`, so the
//! banner disappears on the next navigation.

use std::fmt;

use axum::http::header::REFERER;
use axum::http::HeaderMap;
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use url::Url;

/// Query keys reserved for flash transport.
pub const NOTICE_KEY: &str = "notice";
pub const LEVEL_KEY: &str = "level";

/// Banner style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    #[default]
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message to show once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Flash {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// `location` with this flash appended to its query string.
    pub fn location(&self, location: &str) -> String {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .append_pair(NOTICE_KEY, &self.message)
            .append_pair(LEVEL_KEY, self.level.as_str())
            .finish();

        let separator = if location.contains('?') { '&' } else { '?' };
        format!("{location}{separator}{encoded}")
    }

    /// A 303 redirect to `location` carrying this flash.
    pub fn redirect(&self, location: &str) -> Redirect {
        Redirect::to(&self.location(location))
    }
}

/// Flash query parameters, extracted next to each page's own parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FlashParams {
    pub notice: Option<String>,
    pub level: Option<Level>,
}

impl FlashParams {
    pub fn into_flash(self) -> Option<Flash> {
        let message = self.notice.filter(|notice| !notice.trim().is_empty())?;
        Some(Flash::new(self.level.unwrap_or_default(), message))
    }
}

/// The local path the request came from, or `fallback`.
///
/// Only the path and query of the `Referer` are kept, so a redirect never
/// leaves this site. Earlier flash parameters are stripped.
pub fn back_or(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| Url::parse(referer).ok())
        .map(|url| local_path(&url))
        .unwrap_or_else(|| fallback.to_string())
}

fn local_path(url: &Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != NOTICE_KEY && key != LEVEL_KEY)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        return url.path().to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(kept)
        .finish();
    format!("{}?{}", url.path(), query)
}
