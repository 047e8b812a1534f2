//! Bulk deletion of income records from the report screen.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::Claims,
    fine::FineId,
    response::ApiResponse,
    student::{Prn, db::student_id_by_prn},
};

/// One fine to delete, addressed by the student's PRN and the fine ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkDeleteItem {
    /// The PRN of the student the fine belongs to.
    #[serde(rename = "studentPRN")]
    pub student_prn: String,
    /// The ID of the fine to delete.
    #[serde(rename = "fineId")]
    pub fine_id: FineId,
}

/// The request body for a bulk income delete.
#[derive(Deserialize)]
pub struct BulkDeleteBody {
    items: Vec<BulkDeleteItem>,
}

/// Deletes a batch of income records.
///
/// Items that do not resolve to an existing fine are reported back rather
/// than failing the whole batch.
pub async fn bulk_delete_income(
    State(state): State<AppState>,
    _claims: Claims,
    Json(body): Json<BulkDeleteBody>,
) -> Result<ApiResponse, Error> {
    if body.items.is_empty() {
        return Err(Error::Validation(
            "At least one item is required.".to_owned(),
        ));
    }

    let mut deleted_count = 0u64;
    let mut not_found: Vec<BulkDeleteItem> = Vec::new();

    let connection = state.db_connection.lock().unwrap();

    for item in body.items {
        let student_id = match Prn::new(&item.student_prn) {
            Ok(prn) => student_id_by_prn(&prn, &connection)?,
            Err(_) => None,
        };

        let rows_changed = match student_id {
            Some(student_id) => connection.execute(
                "DELETE FROM fine WHERE id = ?1 AND student_id = ?2",
                (item.fine_id, student_id),
            )?,
            None => 0,
        };

        if rows_changed == 0 {
            not_found.push(item);
        } else {
            deleted_count += 1;
        }
    }

    tracing::info!(
        "bulk income delete: {} deleted, {} not found",
        deleted_count,
        not_found.len()
    );

    Ok(ApiResponse::ok(json!({
        "deletedCount": deleted_count,
        "notFoundCount": not_found.len(),
        "notFound": not_found,
    }))
    .with_message("Bulk delete completed."))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::test_utils::{test_server, test_state_with_admin};

    async fn server_with_fine() -> (TestServer, String, i64) {
        let (state, _admin, token, _password) = test_state_with_admin();
        let server = test_server(state);

        server
            .post("/api/students")
            .authorization_bearer(&token)
            .json(&json!({ "prn": "PRN001", "name": "Asha" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        let created = server
            .post("/api/students/PRN001/fines")
            .authorization_bearer(&token)
            .json(&json!({ "amount": 500.0 }))
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let fine_id = created.json::<Value>()["data"]["fine"]["id"].as_i64().unwrap();

        (server, token, fine_id)
    }

    #[tokio::test]
    async fn valid_items_are_deleted_and_invalid_ones_reported() {
        let (server, token, fine_id) = server_with_fine().await;

        let response = server
            .delete("/api/reports/income/bulk-delete")
            .authorization_bearer(&token)
            .json(&json!({
                "items": [
                    { "studentPRN": "prn001", "fineId": fine_id },
                    { "studentPRN": "PRN404", "fineId": 999 },
                ]
            }))
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["deletedCount"], 1);
        assert_eq!(data["notFoundCount"], 1);
        assert_eq!(data["notFound"][0]["studentPRN"], "PRN404");

        let student = server
            .get("/api/students/PRN001")
            .authorization_bearer(&token)
            .await;
        assert_eq!(student.json::<Value>()["data"]["student"]["fineCount"], 0);
    }

    #[tokio::test]
    async fn fine_of_another_student_is_not_deleted() {
        let (server, token, fine_id) = server_with_fine().await;
        server
            .post("/api/students")
            .authorization_bearer(&token)
            .json(&json!({ "prn": "PRN002", "name": "Bilal" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .delete("/api/reports/income/bulk-delete")
            .authorization_bearer(&token)
            .json(&json!({
                "items": [{ "studentPRN": "PRN002", "fineId": fine_id }]
            }))
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["deletedCount"], 0);
        assert_eq!(data["notFoundCount"], 1);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let (server, token, _fine_id) = server_with_fine().await;

        let response = server
            .delete("/api/reports/income/bulk-delete")
            .authorization_bearer(&token)
            .json(&json!({ "items": [] }))
            .await;

        response.assert_status_bad_request();
    }
}
