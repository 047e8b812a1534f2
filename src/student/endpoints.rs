//! Request handlers for the student endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::Claims,
    pagination::{PageMetadata, PageQuery},
    response::ApiResponse,
};

use super::{
    NewStudent, Prn, UpdateStudent,
    db::{StudentFilter, get_student_with_totals, insert_student, list_students, update_student},
};

/// The query parameters for listing students.
#[derive(Default, Deserialize)]
pub struct StudentListQuery {
    search: Option<String>,
    year: Option<String>,
    division: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// Lists students with their fine totals, filtered and paged.
pub async fn get_students(
    State(state): State<AppState>,
    _claims: Claims,
    Query(query): Query<StudentListQuery>,
) -> Result<ApiResponse, Error> {
    let page = state.pagination_config.resolve(PageQuery {
        page: query.page,
        limit: query.limit,
    });
    let filter = StudentFilter {
        search: query.search.filter(|search| !search.trim().is_empty()),
        year: query.year,
        division: query.division,
    };

    let (students, total) = {
        let connection = state.db_connection.lock().unwrap();
        list_students(&filter, page, &connection)?
    };

    Ok(ApiResponse::ok(json!({
        "students": students,
        "pagination": PageMetadata::new(page, total),
    })))
}

/// Creates a student.
pub async fn create_student(
    State(state): State<AppState>,
    _claims: Claims,
    Json(body): Json<NewStudent>,
) -> Result<ApiResponse, Error> {
    let student = body.into_checked()?;

    let student = {
        let connection = state.db_connection.lock().unwrap();
        insert_student(student, &connection)?
    };

    Ok(ApiResponse::created(
        "Student created.",
        json!({ "student": student }),
    ))
}

/// Looks up a single student by PRN, with their fine totals and fines.
///
/// A miss is not an error here, the response succeeds with null data so the
/// client can distinguish "no such student" from a failed request.
pub async fn get_student(
    State(state): State<AppState>,
    _claims: Claims,
    Path(prn): Path<String>,
) -> Result<ApiResponse, Error> {
    let prn = Prn::new(&prn)?;

    let result = {
        let connection = state.db_connection.lock().unwrap();
        match get_student_with_totals(&prn, &connection)? {
            Some(student) => {
                let fines =
                    crate::fine::db::list_fines_for_student(student.student.id, &connection)?;
                Some((student, fines))
            }
            None => None,
        }
    };

    match result {
        Some((student, fines)) => Ok(ApiResponse::ok(json!({
            "student": student,
            "fines": fines,
        }))),
        None => Ok(ApiResponse::ok(serde_json::Value::Null).with_message("Student not found.")),
    }
}

/// Applies a partial update to a student.
pub async fn put_student(
    State(state): State<AppState>,
    _claims: Claims,
    Path(prn): Path<String>,
    Json(body): Json<UpdateStudent>,
) -> Result<ApiResponse, Error> {
    let prn = Prn::new(&prn)?;

    let student = {
        let connection = state.db_connection.lock().unwrap();
        update_student(&prn, body, &connection)?
    };

    Ok(ApiResponse::ok(json!({ "student": student })).with_message("Student updated."))
}
