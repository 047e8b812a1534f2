//! Request handlers for the fine endpoints, nested under a student's PRN.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::Claims,
    response::ApiResponse,
    student::{Prn, db::student_id_by_prn},
};

use super::{
    FineId, NewFine, UpdateFine,
    db::{add_fine, delete_fine, fine_totals, update_fine},
};

/// Records a fine or fee payment against a student.
pub async fn add_student_fine(
    State(state): State<AppState>,
    _claims: Claims,
    Path(prn): Path<String>,
    Json(body): Json<NewFine>,
) -> Result<ApiResponse, Error> {
    let prn = Prn::new(&prn)?;
    let fine = body.into_checked()?;

    let (fine, totals) = {
        let connection = state.db_connection.lock().unwrap();
        let student_id = student_id_by_prn(&prn, &connection)?.ok_or(Error::StudentNotFound)?;

        let fine = add_fine(student_id, fine, &connection)?;
        let totals = fine_totals(student_id, &connection)?;
        (fine, totals)
    };

    Ok(ApiResponse::created(
        "Fine recorded.",
        json!({
            "fine": fine,
            "totalFines": totals.total_fines,
            "unpaidFines": totals.unpaid_fines,
            "fineCount": totals.fine_count,
        }),
    ))
}

/// Applies a partial update to one of a student's fines.
pub async fn put_student_fine(
    State(state): State<AppState>,
    _claims: Claims,
    Path((prn, fine_id)): Path<(String, FineId)>,
    Json(body): Json<UpdateFine>,
) -> Result<ApiResponse, Error> {
    let prn = Prn::new(&prn)?;

    let (fine, totals) = {
        let connection = state.db_connection.lock().unwrap();
        let student_id = student_id_by_prn(&prn, &connection)?.ok_or(Error::StudentNotFound)?;

        let fine = update_fine(student_id, fine_id, body, &connection)?;
        let totals = fine_totals(student_id, &connection)?;
        (fine, totals)
    };

    Ok(ApiResponse::ok(json!({
        "fine": fine,
        "totalFines": totals.total_fines,
        "unpaidFines": totals.unpaid_fines,
        "fineCount": totals.fine_count,
    }))
    .with_message("Fine updated."))
}

/// Deletes one of a student's fines.
pub async fn delete_student_fine(
    State(state): State<AppState>,
    _claims: Claims,
    Path((prn, fine_id)): Path<(String, FineId)>,
) -> Result<ApiResponse, Error> {
    let prn = Prn::new(&prn)?;

    let totals = {
        let connection = state.db_connection.lock().unwrap();
        let student_id = student_id_by_prn(&prn, &connection)?.ok_or(Error::StudentNotFound)?;

        delete_fine(student_id, fine_id, &connection)?;
        fine_totals(student_id, &connection)?
    };

    Ok(ApiResponse::ok(json!({
        "totalFines": totals.total_fines,
        "unpaidFines": totals.unpaid_fines,
        "fineCount": totals.fine_count,
    }))
    .with_message("Fine deleted."))
}
