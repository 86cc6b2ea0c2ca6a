//! Student pages: list, create, detail, edit, delete.

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::info;

use registrar_core::{EnrollmentWithCourse, NewStudent, PageRequest, Student, StudentUpdate};

use crate::flash::{Flash, FlashParams};
use crate::pages::{field_is_blank, OrRedirect, PageResult};
use crate::render::{escape, input, layout, pagination, post_button, status_badge};
use crate::SharedState;

const LIST_PATH: &str = "/students";

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/students", get(list).post(create))
        .route("/students/new", get(new_form))
        .route("/students/{id}", get(detail))
        .route("/students/{id}/edit", get(edit_form).post(update))
        .route("/students/{id}/delete", post(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StudentForm {
    pub student_id: String,
    pub name: String,
    pub email: String,
}

impl StudentForm {
    fn from_student(student: &Student) -> Self {
        StudentForm {
            student_id: student.student_id.clone(),
            name: student.name.clone(),
            email: student.email.clone(),
        }
    }

    /// Required-field messages, empty when the form is complete.
    fn missing(&self, include_id: bool) -> Vec<&'static str> {
        let mut errors = Vec::new();
        if include_id && field_is_blank(&self.student_id) {
            errors.push("Student ID is required");
        }
        if field_is_blank(&self.name) {
            errors.push("Name is required");
        }
        if field_is_blank(&self.email) {
            errors.push("Email is required");
        }
        errors
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
    let request = PageRequest::for_page(params.page.unwrap_or(1), state.config.page_size);
    let page = state
        .api
        .list_students(Some(search), request)
        .await
        .or_redirect("/")?;

    let mut content = format!(
        r#"<h1>Students</h1>
<p><a href="/students/new">Add student</a></p>
<form method="get" action="{LIST_PATH}">
<input name="search" type="search" placeholder="Name, email or student ID" value="{}">
<button type="submit">Search</button>
</form>"#,
        escape(search)
    );

    if page.items.is_empty() {
        content.push_str("<p>No students found.</p>");
    } else {
        content.push_str(
            "<table><tr><th>Student ID</th><th>Name</th><th>Email</th><th>Registered</th><th></th></tr>",
        );
        for student in &page.items {
            content.push_str(&format!(
                r#"<tr><td>{}</td><td><a href="/students/{id}">{}</a></td><td>{}</td><td>{}</td><td><a href="/students/{id}/edit">Edit</a> <a href="/enrollments/student/{id}">Enrollments</a></td></tr>"#,
                escape(&student.student_id),
                escape(&student.name),
                escape(&student.email),
                student.created_at.format("%Y-%m-%d"),
                id = student.id,
            ));
        }
        content.push_str("</table>");
    }

    let base_query = if search.is_empty() {
        String::new()
    } else {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("search", search)
            .finish()
    };
    content.push_str(&pagination(LIST_PATH, &base_query, &page));

    Ok(layout("Students", flash.into_flash().as_ref(), &content).into_response())
}

// =============================================================================
// Create
// =============================================================================

async fn new_form(Query(flash): Query<FlashParams>) -> Html<String> {
    student_form_page(None, &StudentForm::default(), flash.into_flash().as_ref())
}

async fn create(State(state): State<SharedState>, Form(form): Form<StudentForm>) -> PageResult {
    let missing = form.missing(true);
    if !missing.is_empty() {
        let flash = Flash::error(missing.join(". "));
        return Ok(student_form_page(None, &form, Some(&flash)).into_response());
    }

    let new = NewStudent {
        student_id: form.student_id.trim().to_string(),
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
    };

    match state.api.create_student(&new).await {
        Ok(student) => {
            info!(id = student.id, student_id = %student.student_id, "Student created");
            let flash = Flash::success(format!(r#"Student "{}" created successfully!"#, student.name));
            Ok(flash.redirect(&format!("/students/{}", student.id)).into_response())
        }
        Err(err) => {
            let flash = Flash::error(format!("Error creating student: {}", err.user_message()));
            Ok(student_form_page(None, &form, Some(&flash)).into_response())
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
    let student = state.api.get_student(id).await.or_redirect(LIST_PATH)?;
    let (active, past): (Vec<_>, Vec<_>) = student
        .enrollments
        .iter()
        .partition(|item| item.enrollment.status.is_active());

    let mut content = format!(
        r#"<h1>{name}</h1>
<p>Student ID: {student_id}<br>Email: {email}<br>Registered: {created}</p>
<p><a href="/students/{id}/edit">Edit</a> <a href="/enrollments/student/{id}">Manage enrollments</a> {delete}</p>"#,
        name = escape(&student.student.name),
        student_id = escape(&student.student.student_id),
        email = escape(&student.student.email),
        created = student.student.created_at.format("%Y-%m-%d %H:%M"),
        delete = post_button(
            &format!("/students/{id}/delete"),
            "Delete",
            Some("Delete this student and all of their enrollments?")
        ),
    );

    content.push_str("<h2>Current courses</h2>");
    content.push_str(&enrollment_table(&active, "Not enrolled in any course."));
    content.push_str("<h2>Past enrollments</h2>");
    content.push_str(&enrollment_table(&past, "No past enrollments."));

    Ok(layout(&student.student.name, flash.into_flash().as_ref(), &content).into_response())
}

fn enrollment_table(items: &[&EnrollmentWithCourse], empty: &str) -> String {
    if items.is_empty() {
        return format!("<p>{}</p>", escape(empty));
    }

    let mut table = String::from(
        "<table><tr><th>Code</th><th>Course</th><th>Credits</th><th>Enrolled</th><th>Status</th></tr>",
    );
    for item in items {
        table.push_str(&format!(
            r#"<tr><td>{}</td><td><a href="/courses/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            escape(&item.course.course_code),
            item.course.id,
            escape(&item.course.name),
            item.course.credits,
            item.enrollment.enrollment_date.format("%Y-%m-%d"),
            status_badge(item.enrollment.status),
        ));
    }
    table.push_str("</table>");
    table
}

// =============================================================================
// Edit
// =============================================================================

async fn edit_form(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(flash): Query<FlashParams>,
) -> PageResult {
    let student = state.api.get_student(id).await.or_redirect(LIST_PATH)?;
    let form = StudentForm::from_student(&student.student);
    Ok(student_form_page(Some(&student.student), &form, flash.into_flash().as_ref()).into_response())
}

/// Sends only the fields that changed; an unchanged form is not an error.
async fn update(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Form(form): Form<StudentForm>,
) -> PageResult {
    let current = state.api.get_student(id).await.or_redirect(LIST_PATH)?.student;
    let detail_path = format!("/students/{id}");

    let missing = form.missing(false);
    if !missing.is_empty() {
        let flash = Flash::error(missing.join(". "));
        return Ok(student_form_page(Some(&current), &form, Some(&flash)).into_response());
    }

    let update = student_changes(&current, &form);
    if update.is_empty() {
        return Ok(Flash::info("No changes made").redirect(&detail_path).into_response());
    }

    match state.api.update_student(id, &update).await {
        Ok(_) => {
            info!(id, "Student updated");
            Ok(Flash::success("Student updated successfully!")
                .redirect(&detail_path)
                .into_response())
        }
        Err(err) => {
            let flash = Flash::error(format!("Error updating student: {}", err.user_message()));
            Ok(student_form_page(Some(&current), &form, Some(&flash)).into_response())
        }
    }
}

fn student_changes(current: &Student, form: &StudentForm) -> StudentUpdate {
    let name = form.name.trim();
    let email = form.email.trim();
    StudentUpdate {
        name: (name != current.name).then(|| name.to_string()),
        email: (email != current.email).then(|| email.to_string()),
    }
}

// =============================================================================
// Delete
// =============================================================================

async fn delete(State(state): State<SharedState>, Path(id): Path<i64>) -> PageResult {
    let student = state.api.get_student(id).await.or_redirect(LIST_PATH)?.student;
    state
        .api
        .delete_student(id)
        .await
        .or_redirect(&format!("/students/{id}"))?;

    info!(id, student_id = %student.student_id, "Student deleted");
    let flash = Flash::success(format!(r#"Student "{}" deleted successfully!"#, student.name));
    Ok(flash.redirect(LIST_PATH).into_response())
}

// =============================================================================
// Form
// =============================================================================

/// The create form when `existing` is `None`, the edit form otherwise.
fn student_form_page(existing: Option<&Student>, form: &StudentForm, flash: Option<&Flash>) -> Html<String> {
    let (title, action, id_field) = match existing {
        Some(student) => (
            format!("Edit {}", student.name),
            format!("/students/{}/edit", student.id),
            format!("<p>Student ID: {}</p>", escape(&student.student_id)),
        ),
        None => (
            "New student".to_string(),
            LIST_PATH.to_string(),
            input("Student ID", "student_id", "text", &form.student_id, true),
        ),
    };

    let content = format!(
        r#"<h1>{}</h1>
<form method="post" action="{action}">
{id_field}
{}
{}
<p><button type="submit">Save</button> <a href="{LIST_PATH}">Cancel</a></p>
</form>"#,
        escape(&title),
        input("Name", "name", "text", &form.name, true),
        input("Email", "email", "email", &form.email, true),
    );

    layout(&title, flash, &content)
}
