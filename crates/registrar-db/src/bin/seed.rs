//! # Sample Data Loader
//!
//! Populates the database with sample students, courses and enrollments for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./registrar.db
//! cargo run -p registrar-db --bin seed
//!
//! # Specify database path
//! cargo run -p registrar-db --bin seed -- --db ./data/registrar.db
//! ```
//!
//! Records that already exist (same student_id / course_code, or an active
//! enrollment for the pair) are skipped, so running it twice is harmless.

use std::env;

use registrar_core::{Course, CoreError, NewCourse, NewEnrollment, NewStudent, Student};
use registrar_db::{Database, DbConfig, DbError};
use tracing_subscriber::EnvFilter;

/// (student_id, name, email)
const STUDENTS: &[(&str, &str, &str)] = &[
    ("STU001", "Alice Johnson", "alice.johnson@university.edu"),
    ("STU002", "Bob Smith", "bob.smith@university.edu"),
    ("STU003", "Carol Davis", "carol.davis@university.edu"),
    ("STU004", "David Wilson", "david.wilson@university.edu"),
    ("STU005", "Emma Brown", "emma.brown@university.edu"),
    ("STU006", "Frank Miller", "frank.miller@university.edu"),
    ("STU007", "Grace Lee", "grace.lee@university.edu"),
    ("STU008", "Henry Chen", "henry.chen@university.edu"),
];

/// (course_code, name, description, credits, max_students)
const COURSES: &[(&str, &str, &str, i64, i64)] = &[
    (
        "CS101",
        "Introduction to Computer Science",
        "Fundamentals of programming and computational thinking",
        3,
        30,
    ),
    (
        "CS201",
        "Data Structures and Algorithms",
        "Advanced programming concepts and algorithm design",
        4,
        25,
    ),
    ("MATH101", "Calculus I", "Differential and integral calculus", 4, 40),
    ("PHYS101", "Physics I", "Mechanics and thermodynamics", 4, 35),
    (
        "ENG101",
        "English Composition",
        "Academic writing and critical thinking",
        3,
        20,
    ),
    (
        "HIST101",
        "World History",
        "Global historical perspectives from ancient to modern times",
        3,
        45,
    ),
    ("BIO101", "Introduction to Biology", "Fundamentals of life sciences", 4, 30),
    ("CHEM101", "General Chemistry", "Basic principles of chemistry", 4, 25),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./registrar.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Registrar Sample Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./registrar.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Registrar Sample Data Loader");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let (total, applied) = registrar_db::migrations::migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({applied}/{total})");

    println!();
    println!("Creating students...");
    let students = seed_students(&db).await?;

    println!();
    println!("Creating courses...");
    let courses = seed_courses(&db).await?;

    println!();
    println!("Creating enrollments...");
    seed_enrollments(&db, &students, &courses).await?;

    let stats = db.stats().get().await?;
    println!();
    println!("✓ Seed complete!");
    println!("  Students:           {}", stats.total_students);
    println!("  Courses:            {}", stats.total_courses);
    println!("  Active enrollments: {}", stats.active_enrollments);

    db.close().await;
    Ok(())
}

async fn seed_students(db: &Database) -> Result<Vec<Student>, DbError> {
    let mut students = Vec::with_capacity(STUDENTS.len());

    for (student_id, name, email) in STUDENTS {
        if let Some(existing) = db.students().find_by_student_id(student_id).await? {
            println!("⚠ Student already exists: {name}");
            students.push(existing);
            continue;
        }

        let new = NewStudent {
            student_id: student_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };
        match db.students().create(&new).await {
            Ok(student) => {
                println!("✓ Created student: {name}");
                students.push(student);
            }
            Err(e) => eprintln!("✗ Failed to create student {name}: {e}"),
        }
    }

    Ok(students)
}

async fn seed_courses(db: &Database) -> Result<Vec<Course>, DbError> {
    let mut courses = Vec::with_capacity(COURSES.len());

    for (course_code, name, description, credits, max_students) in COURSES {
        if let Some(existing) = db.courses().find_by_code(course_code).await? {
            println!("⚠ Course already exists: {name}");
            courses.push(existing);
            continue;
        }

        let new = NewCourse {
            course_code: course_code.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            credits: *credits,
            max_students: *max_students,
        };
        match db.courses().create(&new).await {
            Ok(course) => {
                println!("✓ Created course: {name}");
                courses.push(course);
            }
            Err(e) => eprintln!("✗ Failed to create course {name}: {e}"),
        }
    }

    Ok(courses)
}

/// Enrolls student `i` in 2 to 5 courses, spread over the catalogue.
async fn seed_enrollments(db: &Database, students: &[Student], courses: &[Course]) -> Result<(), DbError> {
    if courses.is_empty() {
        return Ok(());
    }

    for (i, student) in students.iter().enumerate() {
        let wanted = (2 + i % 4).min(courses.len());

        for k in 0..wanted {
            let course = &courses[(i + k * 3) % courses.len()];
            let pair = NewEnrollment {
                student_id: student.id,
                course_id: course.id,
            };

            match db.enrollments().enroll(&pair).await {
                Ok(_) => println!("✓ Enrolled {} in {}", student.name, course.name),
                Err(DbError::Rule(CoreError::Conflict(_))) => {
                    println!("⚠ {} already enrolled in {}", student.name, course.name)
                }
                Err(e) => eprintln!("✗ Failed to enroll {} in {}: {e}", student.name, course.name),
            }
        }
    }

    Ok(())
}
