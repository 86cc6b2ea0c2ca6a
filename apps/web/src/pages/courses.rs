//! Course pages: catalogue, create, detail with roster, edit, delete.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::info;

use registrar_core::{Course, CourseUpdate, NewCourse, PageRequest, DEFAULT_MAX_STUDENTS};

use crate::flash::{Flash, FlashParams};
use crate::pages::{field_is_blank, OrRedirect, PageResult};
use crate::render::{escape, input, layout, pagination, post_button, textarea};
use crate::SharedState;

const LIST_PATH: &str = "/courses";

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/courses", get(list).post(create))
        .route("/courses/new", get(new_form))
        .route("/courses/{id}", get(detail))
        .route("/courses/{id}/edit", get(edit_form).post(update))
        .route("/courses/{id}/delete", post(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub search: Option<String>,
    pub available_only: Option<String>,
}

impl ListParams {
    fn available_only(&self) -> bool {
        matches!(self.available_only.as_deref(), Some("true" | "on" | "1"))
    }
}

/// Raw course form. Numbers stay text until [`CourseForm::parse`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CourseForm {
    pub course_code: String,
    pub name: String,
    pub description: String,
    pub credits: String,
    pub max_students: String,
}

/// A course form whose numbers parsed.
#[derive(Debug, PartialEq)]
struct ParsedCourse {
    course_code: String,
    name: String,
    description: String,
    credits: i64,
    max_students: i64,
}

impl CourseForm {
    fn from_course(course: &Course) -> Self {
        CourseForm {
            course_code: course.course_code.clone(),
            name: course.name.clone(),
            description: course.description.clone().unwrap_or_default(),
            credits: course.credits.to_string(),
            max_students: course.max_students.to_string(),
        }
    }

    /// Checks required fields and parses numbers. A blank capacity means the
    /// default of 30.
    fn parse(&self, include_code: bool) -> Result<ParsedCourse, String> {
        if (include_code && field_is_blank(&self.course_code))
            || field_is_blank(&self.name)
            || field_is_blank(&self.credits)
        {
            return Err(if include_code {
                "Course code, name, and credits are required".to_string()
            } else {
                "Course name and credits are required".to_string()
            });
        }

        let credits = self
            .credits
            .trim()
            .parse()
            .map_err(|_| "Credits must be a whole number".to_string())?;
        let max_students = if field_is_blank(&self.max_students) {
            DEFAULT_MAX_STUDENTS
        } else {
            self.max_students
                .trim()
                .parse()
                .map_err(|_| "Max students must be a whole number".to_string())?
        };

        Ok(ParsedCourse {
            course_code: self.course_code.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            credits,
            max_students,
        })
    }
}

// =============================================================================
// List
// =============================================================================

async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let search = params.search.as_deref().map(str::trim).unwrap_or("");
    let available_only = params.available_only();
    let request = PageRequest::for_page(params.page.unwrap_or(1), state.config.page_size);
    let page = state
        .api
        .list_courses(Some(search), available_only, request)
        .await
        .or_redirect("/")?;

    let mut content = format!(
        r#"<h1>Courses</h1>
<p><a href="/courses/new">Add course</a></p>
<form method="get" action="{LIST_PATH}">
<input name="search" type="search" placeholder="Code, name or description" value="{}">
<label class="inline"><input name="available_only" type="checkbox" value="true"{}> Only courses with open seats</label>
<button type="submit">Filter</button>
</form>"#,
        escape(search),
        if available_only { " checked" } else { "" },
    );

    if page.items.is_empty() {
        content.push_str("<p>No courses found.</p>");
    } else {
        content.push_str(
            "<table><tr><th>Code</th><th>Name</th><th>Credits</th><th>Enrolled</th><th>Seats left</th><th></th></tr>",
        );
        for course in &page.items {
            content.push_str(&format!(
                r#"<tr><td>{}</td><td><a href="/courses/{id}">{}</a></td><td>{}</td><td>{} / {}</td><td>{}</td><td><a href="/courses/{id}/edit">Edit</a> <a href="/enrollments/course/{id}">Enrollments</a></td></tr>"#,
                escape(&course.course_code),
                escape(&course.name),
                course.credits,
                course.enrolled_count,
                course.max_students,
                course.available_seats,
                id = course.id,
            ));
        }
        content.push_str("</table>");
    }

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if !search.is_empty() {
        query.append_pair("search", search);
    }
    if available_only {
        query.append_pair("available_only", "true");
    }
    content.push_str(&pagination(LIST_PATH, &query.finish(), &page));

    Ok(layout("Courses", flash.into_flash().as_ref(), &content).into_response())
}

// =============================================================================
// Create
// =============================================================================

async fn new_form(Query(flash): Query<FlashParams>) -> Html<String> {
    let form = CourseForm {
        credits: "3".to_string(),
        max_students: DEFAULT_MAX_STUDENTS.to_string(),
        ..CourseForm::default()
    };
    course_form_page(None, &form, flash.into_flash().as_ref())
}

async fn create(State(state): State<SharedState>, Form(form): Form<CourseForm>) -> PageResult {
    let parsed = match form.parse(true) {
        Ok(parsed) => parsed,
        Err(message) => {
            return Ok(course_form_page(None, &form, Some(&Flash::error(message))).into_response())
        }
    };

    let new = NewCourse {
        course_code: parsed.course_code,
        name: parsed.name,
        description: (!parsed.description.is_empty()).then_some(parsed.description),
        credits: parsed.credits,
        max_students: parsed.max_students,
    };

    match state.api.create_course(&new).await {
        Ok(course) => {
            info!(id = course.id, code = %course.course_code, "Course created");
            let flash = Flash::success(format!(r#"Course "{}" created successfully!"#, course.name));
            Ok(flash.redirect(&format!("/courses/{}", course.id)).into_response())
        }
        Err(err) => {
            let flash = Flash::error(format!("Error creating course: {}", err.user_message()));
            Ok(course_form_page(None, &form, Some(&flash)).into_response())
        }
    }
}

// =============================================================================
// Detail
// =============================================================================

async fn detail(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let roster = state.api.course_students(id).await.or_redirect(LIST_PATH)?;
    let course = &roster.course;

    let mut content = format!(
        r#"<h1>{code}: {name}</h1>
<p>{description}</p>
<p>Credits: {credits}<br>Enrolled: {enrolled} of {max} ({available} seats left)</p>
<p><a href="/courses/{id}/edit">Edit</a> <a href="/enrollments/course/{id}">All enrollments</a> {delete}</p>
<h2>Enrolled students</h2>"#,
        code = escape(&course.course_code),
        name = escape(&course.name),
        description = escape(course.description.as_deref().unwrap_or("No description.")),
        credits = course.credits,
        enrolled = course.enrolled_count,
        max = course.max_students,
        available = course.available_seats,
        delete = post_button(&format!("/courses/{id}/delete"), "Delete", Some("Delete this course?")),
    );

    if roster.enrollments.is_empty() {
        content.push_str("<p>No students are enrolled.</p>");
    } else {
        content.push_str("<table><tr><th>Student ID</th><th>Name</th><th>Email</th><th>Enrolled</th></tr>");
        for item in &roster.enrollments {
            content.push_str(&format!(
                r#"<tr><td>{}</td><td><a href="/students/{}">{}</a></td><td>{}</td><td>{}</td></tr>"#,
                escape(&item.student.student_id),
                item.student.id,
                escape(&item.student.name),
                escape(&item.student.email),
                item.enrollment.enrollment_date.format("%Y-%m-%d"),
            ));
        }
        content.push_str("</table>");
    }

    Ok(layout(&course.name, flash.into_flash().as_ref(), &content).into_response())
}

// =============================================================================
// Edit
// =============================================================================

async fn edit_form(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let course = state.api.get_course(id).await.or_redirect(LIST_PATH)?;
    let form = CourseForm::from_course(&course);
    Ok(course_form_page(Some(&course), &form, flash.into_flash().as_ref()).into_response())
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<CourseForm>,
) -> PageResult {
    let current = state.api.get_course(id).await.or_redirect(LIST_PATH)?;
    let detail_path = format!("/courses/{id}");

    let parsed = match form.parse(false) {
        Ok(parsed) => parsed,
        Err(message) => {
            return Ok(course_form_page(Some(&current), &form, Some(&Flash::error(message))).into_response())
        }
    };

    let update = course_changes(&current, &parsed);
    if update.is_empty() {
        return Ok(Flash::info("No changes made").redirect(&detail_path).into_response());
    }

    match state.api.update_course(id, &update).await {
        Ok(_) => {
            info!(id, "Course updated");
            Ok(Flash::success("Course updated successfully!")
                .redirect(&detail_path)
                .into_response())
        }
        Err(err) => {
            let flash = Flash::error(format!("Error updating course: {}", err.user_message()));
            Ok(course_form_page(Some(&current), &form, Some(&flash)).into_response())
        }
    }
}

/// Changed fields only. A cleared description is sent as `""`.
fn course_changes(current: &Course, parsed: &ParsedCourse) -> CourseUpdate {
    let description = current.description.as_deref().unwrap_or("");
    CourseUpdate {
        name: (parsed.name != current.name).then(|| parsed.name.clone()),
        description: (parsed.description != description).then(|| parsed.description.clone()),
        credits: (parsed.credits != current.credits).then_some(parsed.credits),
        max_students: (parsed.max_students != current.max_students).then_some(parsed.max_students),
    }
}

// =============================================================================
// Delete
// =============================================================================

async fn delete(State(state): State<SharedState>, Path(id): Path<i64>) -> PageResult {
    let detail_path = format!("/courses/{id}");
    state.api.delete_course(id).await.or_redirect(&detail_path)?;

    info!(id, "Course deleted");
    Ok(Flash::success("Course deleted successfully!")
        .redirect(LIST_PATH)
        .into_response())
}

// =============================================================================
// Form
// =============================================================================

fn course_form_page(existing: Option<&Course>, form: &CourseForm, flash: Option<&Flash>) -> Html<String> {
    let (title, action, code_field) = match existing {
        Some(course) => (
            format!("Edit {}", course.course_code),
            format!("/courses/{}/edit", course.id),
            format!("<p>Course code: {}</p>", escape(&course.course_code)),
        ),
        None => (
            "New course".to_string(),
            LIST_PATH.to_string(),
            input("Course code", "course_code", "text", &form.course_code, true),
        ),
    };

    let content = format!(
        r#"<h1>{}</h1>
<form method="post" action="{action}">
{code_field}
{}
{}
{}
{}
<p><button type="submit">Save</button> <a href="{LIST_PATH}">Cancel</a></p>
</form>"#,
        escape(&title),
        input("Name", "name", "text", &form.name, true),
        textarea("Description", "description", &form.description),
        input("Credits (1-12)", "credits", "number", &form.credits, true),
        input("Max students (1-500)", "max_students", "number", &form.max_students, false),
    );

    layout(&title, flash, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(code: &str, name: &str, credits: &str, max: &str) -> CourseForm {
        CourseForm {
            course_code: code.to_string(),
            name: name.to_string(),
            description: "  ".to_string(),
            credits: credits.to_string(),
            max_students: max.to_string(),
        }
    }

    #[test]
    fn test_parse_requires_fields() {
        let err = form("", "Calculus", "4", "").parse(true).unwrap_err();
        assert_eq!(err, "Course code, name, and credits are required");

        let err = form("", "Calculus", "", "").parse(false).unwrap_err();
        assert_eq!(err, "Course name and credits are required");
    }

    #[test]
    fn test_parse_numbers_and_default_capacity() {
        let parsed = form(" MATH101 ", "Calculus I", " 4 ", "").parse(true).unwrap();
        assert_eq!(parsed.course_code, "MATH101");
        assert_eq!(parsed.credits, 4);
        assert_eq!(parsed.max_students, 30);
        assert_eq!(parsed.description, "");

        let err = form("MATH101", "Calculus I", "four", "").parse(true).unwrap_err();
        assert_eq!(err, "Credits must be a whole number");
    }

    #[test]
    fn test_changes_include_cleared_description() {
        let current = Course::new(
            1,
            "CS101".to_string(),
            "Intro".to_string(),
            Some("Basics".to_string()),
            3,
            30,
            0,
        );
        let parsed = form("CS101", "Intro", "3", "30").parse(false).unwrap();
        let update = course_changes(&current, &parsed);
        assert_eq!(
            update,
            CourseUpdate {
                description: Some(String::new()),
                ..CourseUpdate::default()
            }
        );

        let unchanged = CourseForm::from_course(&current).parse(false).unwrap();
        assert!(course_changes(&current, &unchanged).is_empty());
    }

    #[test]
    fn test_available_only_flag() {
        let on = ListParams {
            available_only: Some("true".to_string()),
            ..ListParams::default()
        };
        assert!(on.available_only());
        assert!(!ListParams::default().available_only());
    }
}
