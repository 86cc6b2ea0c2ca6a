//! HTML building blocks shared by every page.
//!
//! Pages are assembled by pushing `format!` output onto a `String`. Anything that came from
//! the API or the request goes through [`escape`] first.

use axum::response::Html;

use registrar_core::{EnrollmentStatus, Page};

use crate::flash::Flash;

const APP_NAME: &str = "Registrar";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #222; }
nav { background: #263238; padding: 0.75rem 1.5rem; }
nav a { color: #eceff1; margin-right: 1.25rem; text-decoration: none; }
nav a.brand { font-weight: bold; }
main { padding: 1.5rem; max-width: 1100px; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border-bottom: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }
form.inline { display: inline; }
.flash { padding: 0.6rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.flash-success { background: #e8f5e9; } .flash-info { background: #e3f2fd; }
.flash-warning { background: #fff8e1; } .flash-error { background: #ffebee; }
.badge { padding: 0.1rem 0.5rem; border-radius: 8px; font-size: 0.85em; }
.badge-active { background: #c8e6c9; } .badge-dropped { background: #ffcdd2; }
.badge-completed { background: #bbdefb; }
.stats { display: flex; gap: 1rem; } .stats div { border: 1px solid #ddd; padding: 1rem; border-radius: 4px; }
label { display: block; margin-top: 0.6rem; }
"#;

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wraps page content in the site chrome. `title` is escaped here.
pub fn layout(title: &str, flash: Option<&Flash>, content: &str) -> Html<String> {
    let mut html = String::with_capacity(content.len() + 2048);
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | {APP_NAME}</title>
<style>{STYLE}</style>
</head>
<body>
<nav>
<a class="brand" href="/">{APP_NAME}</a>
<a href="/students">Students</a>
<a href="/courses">Courses</a>
<a href="/enrollments">Enrollments</a>
</nav>
<main>
"#,
        title = escape(title),
    ));

    if let Some(flash) = flash {
        html.push_str(&flash_banner(flash));
    }
    html.push_str(content);
    html.push_str("\n</main>\n</body>\n</html>\n");
    Html(html)
}

pub fn flash_banner(flash: &Flash) -> String {
    format!(
        r#"<div class="flash flash-{}" role="alert">{}</div>"#,
        flash.level,
        escape(&flash.message)
    )
}

pub fn status_badge(status: EnrollmentStatus) -> String {
    format!(r#"<span class="badge badge-{0}">{0}</span>"#, status.as_str())
}

/// A labelled `<input>`.
pub fn input(label: &str, name: &str, kind: &str, value: &str, required: bool) -> String {
    format!(
        r#"<label for="{name}">{label}</label><input id="{name}" name="{name}" type="{kind}" value="{value}"{required}>"#,
        label = escape(label),
        value = escape(value),
        required = if required { " required" } else { "" },
    )
}

/// A labelled `<textarea>`.
pub fn textarea(label: &str, name: &str, value: &str) -> String {
    format!(
        r#"<label for="{name}">{label}</label><textarea id="{name}" name="{name}" rows="4">{value}</textarea>"#,
        label = escape(label),
        value = escape(value),
    )
}

/// A one-button POST form, optionally confirmed in the browser first.
pub fn post_button(action: &str, text: &str, confirm: Option<&str>) -> String {
    let onsubmit = confirm
        .map(|question| format!(r#" onsubmit="return confirm('{}');""#, escape(&question.replace('\'', "\\'"))))
        .unwrap_or_default();
    format!(
        r#"<form class="inline" method="post" action="{}"{onsubmit}><button type="submit">{}</button></form>"#,
        escape(action),
        escape(text),
    )
}

/// Previous / next links for a list page.
///
/// `base_query` holds the page's other filters and must already be
/// URL-encoded (or empty).
pub fn pagination<T>(path: &str, base_query: &str, page: &Page<T>) -> String {
    if page.total_pages() <= 1 {
        return String::new();
    }

    let link = |number: i64| {
        if base_query.is_empty() {
            format!("{path}?page={number}")
        } else {
            format!("{path}?{base_query}&page={number}")
        }
    };

    let mut nav = String::from(r#"<p class="pagination">"#);
    if page.has_prev() {
        nav.push_str(&format!(r#"<a href="{}">&laquo; Previous</a> "#, escape(&link(page.page - 1))));
    }
    nav.push_str(&format!(
        "Page {} of {} ({} total)",
        page.page,
        page.total_pages(),
        page.total
    ));
    if page.has_next() {
        nav.push_str(&format!(r#" <a href="{}">Next &raquo;</a>"#, escape(&link(page.page + 1))));
    }
    nav.push_str("</p>");
    nav
}
