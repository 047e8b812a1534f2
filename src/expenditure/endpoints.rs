//! Request handlers for the expenditure endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::Claims,
    pagination::{PageMetadata, PageQuery},
    response::ApiResponse,
};

use super::{
    ExpenditureId, NewExpenditure, UpdateExpenditure,
    db::{
        self, ExpenditureFilter, delete_expenditure, insert_expenditure, list_expenditures,
        update_expenditure,
    },
};

/// The query parameters for listing expenditures.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenditureListQuery {
    category: Option<String>,
    department: Option<String>,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// Lists expenditures, filtered and paged, most recent first.
pub async fn get_expenditures(
    State(state): State<AppState>,
    _claims: Claims,
    Query(query): Query<ExpenditureListQuery>,
) -> Result<ApiResponse, Error> {
    let page = state.pagination_config.resolve(PageQuery {
        page: query.page,
        limit: query.limit,
    });
    let filter = ExpenditureFilter {
        category: query.category,
        department: query.department,
        from_date: query.from_date,
        to_date: query.to_date,
    };

    let (expenditures, total) = {
        let connection = state.db_connection.lock().unwrap();
        list_expenditures(&filter, page, &connection)?
    };

    Ok(ApiResponse::ok(json!({
        "expenditures": expenditures,
        "pagination": PageMetadata::new(page, total),
    })))
}

/// Records an expenditure, attributed to the authenticated admin.
pub async fn post_expenditure(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<NewExpenditure>,
) -> Result<ApiResponse, Error> {
    let expenditure = body.into_checked()?;

    let expenditure = {
        let connection = state.db_connection.lock().unwrap();
        insert_expenditure(expenditure, claims.sub, &connection)?
    };

    Ok(ApiResponse::created(
        "Expenditure recorded.",
        json!({ "expenditure": expenditure }),
    ))
}

/// Fetches a single expenditure.
pub async fn get_expenditure(
    State(state): State<AppState>,
    _claims: Claims,
    Path(expenditure_id): Path<ExpenditureId>,
) -> Result<ApiResponse, Error> {
    let expenditure = {
        let connection = state.db_connection.lock().unwrap();
        db::get_expenditure(expenditure_id, &connection)?
    };

    Ok(ApiResponse::ok(json!({ "expenditure": expenditure })))
}

/// Applies a partial update to an expenditure.
pub async fn put_expenditure(
    State(state): State<AppState>,
    _claims: Claims,
    Path(expenditure_id): Path<ExpenditureId>,
    Json(body): Json<UpdateExpenditure>,
) -> Result<ApiResponse, Error> {
    let expenditure = {
        let connection = state.db_connection.lock().unwrap();
        update_expenditure(expenditure_id, body, &connection)?
    };

    Ok(ApiResponse::ok(json!({ "expenditure": expenditure })).with_message("Expenditure updated."))
}

/// Deletes an expenditure.
pub async fn remove_expenditure(
    State(state): State<AppState>,
    _claims: Claims,
    Path(expenditure_id): Path<ExpenditureId>,
) -> Result<ApiResponse, Error> {
    {
        let connection = state.db_connection.lock().unwrap();
        delete_expenditure(expenditure_id, &connection)?;
    }

    Ok(ApiResponse::message_only("Expenditure deleted."))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::test_utils::{test_server, test_state_with_admin};

    async fn server_with_admin() -> (TestServer, String) {
        let (state, _admin, token, _password) = test_state_with_admin();
        (test_server(state), token)
    }

    async fn create_expenditure(server: &TestServer, token: &str, body: Value) -> i64 {
        let response = server
            .post("/api/expenditures")
            .authorization_bearer(token)
            .json(&body)
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["expenditure"]["id"]
            .as_i64()
            .unwrap()
    }

    #[tokio::test]
    async fn create_attributes_the_admin() {
        let (state, admin, token, _password) = test_state_with_admin();
        let server = test_server(state);

        let response = server
            .post("/api/expenditures")
            .authorization_bearer(&token)
            .json(&json!({ "amount": 250.0, "description": "Lab supplies" }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let expenditure = &response.json::<Value>()["data"]["expenditure"];
        assert_eq!(expenditure["addedBy"], admin.id);
        assert_eq!(expenditure["category"], "other");
    }

    #[tokio::test]
    async fn empty_description_is_rejected() {
        let (server, token) = server_with_admin().await;

        let response = server
            .post("/api/expenditures")
            .authorization_bearer(&token)
            .json(&json!({ "amount": 250.0, "description": "  " }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let (server, token) = server_with_admin().await;
        create_expenditure(
            &server,
            &token,
            json!({ "amount": 100.0, "description": "Pens", "category": "stationery" }),
        )
        .await;
        create_expenditure(
            &server,
            &token,
            json!({ "amount": 500.0, "description": "Router", "category": "equipment" }),
        )
        .await;

        let response = server
            .get("/api/expenditures")
            .authorization_bearer(&token)
            .add_query_param("category", "equipment")
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["expenditures"].as_array().unwrap().len(), 1);
        assert_eq!(data["expenditures"][0]["description"], "Router");
        assert_eq!(data["pagination"]["totalItems"], 1);
    }

    #[tokio::test]
    async fn get_returns_the_expenditure() {
        let (server, token) = server_with_admin().await;
        let id = create_expenditure(
            &server,
            &token,
            json!({ "amount": 250.0, "description": "Lab supplies" }),
        )
        .await;

        let response = server
            .get(&format!("/api/expenditures/{id}"))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let expenditure = &response.json::<Value>()["data"]["expenditure"];
        assert_eq!(expenditure["description"], "Lab supplies");

        server
            .get("/api/expenditures/999")
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let (server, token) = server_with_admin().await;
        let id = create_expenditure(
            &server,
            &token,
            json!({ "amount": 250.0, "description": "Lab supplies" }),
        )
        .await;

        let updated = server
            .put(&format!("/api/expenditures/{id}"))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 300.0 }))
            .await;
        updated.assert_status_ok();
        assert_eq!(
            updated.json::<Value>()["data"]["expenditure"]["amount"],
            300.0
        );

        server
            .delete(&format!("/api/expenditures/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        server
            .delete(&format!("/api/expenditures/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn summary_aggregates_by_category() {
        let (server, token) = server_with_admin().await;
        create_expenditure(
            &server,
            &token,
            json!({ "amount": 100.0, "description": "Pens", "category": "stationery" }),
        )
        .await;
        create_expenditure(
            &server,
            &token,
            json!({ "amount": 500.0, "description": "Router", "category": "equipment" }),
        )
        .await;

        let response = server
            .get("/api/expenditures/summary")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["totalExpenditure"], 600.0);
        assert_eq!(data["byCategory"][0]["label"], "equipment");
        assert_eq!(data["byCategory"][0]["total"], 500.0);
    }
}
