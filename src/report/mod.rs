//! Aggregated and paginated reports over the fine and expenditure data.

use axum::extract::State;
use serde_json::json;

use crate::{
    AppState, Error, auth::token::Claims, expenditure::db::total_expenditure,
    fine::db::total_income, response::ApiResponse,
};

pub mod bulk_delete;
pub mod student_payments;
pub mod transactions;

/// Returns the overall income, expenditure and net balance.
pub async fn get_report_summary(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<ApiResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let total_income = total_income(&connection)?;
    let total_expenditure = total_expenditure(&connection)?;

    Ok(ApiResponse::ok(json!({
        "totalIncome": total_income,
        "totalExpenditure": total_expenditure,
        "netBalance": total_income - total_expenditure,
    })))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::test_utils::{test_server, test_state_with_admin};

    #[tokio::test]
    async fn summary_reports_the_net_balance() {
        let (state, _admin, token, _password) = test_state_with_admin();
        let server = test_server(state);

        server
            .post("/api/students")
            .authorization_bearer(&token)
            .json(&json!({ "prn": "PRN001", "name": "Asha" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        server
            .post("/api/students/PRN001/fines")
            .authorization_bearer(&token)
            .json(&json!({ "amount": 1500.0 }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        server
            .post("/api/expenditures")
            .authorization_bearer(&token)
            .json(&json!({ "amount": 600.0, "description": "Lab supplies" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .get("/api/reports/summary")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["totalIncome"], 1500.0);
        assert_eq!(data["totalExpenditure"], 600.0);
        assert_eq!(data["netBalance"], 900.0);
    }
}
