//! Dashboard and frontend health.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use crate::flash::{Flash, FlashParams};
use crate::render::layout;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

/// Counters from `/stats` and links to each section. Renders even when the
/// API is down, with a warning instead of numbers.
async fn index(State(state): State<SharedState>, Query(flash): Query<FlashParams>) -> Html<String> {
    let mut banner = flash.into_flash();

    let stats = match state.api.stats().await {
        Ok(stats) => format!(
            r#"<div class="stats">
<div><h2>{}</h2>Students</div>
<div><h2>{}</h2>Courses</div>
<div><h2>{}</h2>Active enrollments</div>
</div>"#,
            stats.total_students, stats.total_courses, stats.active_enrollments
        ),
        Err(err) => {
            warn!(error = %err, "Could not load stats");
            banner.get_or_insert_with(|| Flash::warning(err.user_message()));
            String::from("<p>Statistics are unavailable right now.</p>")
        }
    };

    let content = format!(
        r#"<h1>Student Enrollment</h1>
{stats}
<h2>Manage</h2>
<ul>
<li><a href="/students">Students</a> (<a href="/students/new">add</a>)</li>
<li><a href="/courses">Courses</a> (<a href="/courses/new">add</a>)</li>
<li><a href="/enrollments">Enrollments</a></li>
</ul>"#
    );

    layout("Dashboard", banner.as_ref(), &content)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "app": "registrar-web" }))
}
