//! Request handlers for the payment category endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, Error, auth::token::Claims, fine::PaymentType, response::ApiResponse};

use super::{
    CategoryId, NewCategory, UpdateCategory,
    db::{create_category, delete_category, list_categories, update_category},
};

/// The query parameters for listing payment categories.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListQuery {
    #[serde(rename = "type")]
    category_type: Option<PaymentType>,
    active_only: Option<bool>,
}

/// Lists payment categories, optionally filtered by type and active status.
pub async fn get_categories(
    State(state): State<AppState>,
    _claims: Claims,
    Query(query): Query<CategoryListQuery>,
) -> Result<ApiResponse, Error> {
    let categories = {
        let connection = state.db_connection.lock().unwrap();
        list_categories(
            query.category_type,
            query.active_only.unwrap_or(false),
            &connection,
        )?
    };

    Ok(ApiResponse::ok(json!({
        "count": categories.len(),
        "categories": categories,
    })))
}

/// Creates a payment category.
pub async fn post_category(
    State(state): State<AppState>,
    _claims: Claims,
    Json(body): Json<NewCategory>,
) -> Result<ApiResponse, Error> {
    let category = body.into_checked()?;

    let category = {
        let connection = state.db_connection.lock().unwrap();
        create_category(category, &connection)?
    };

    Ok(ApiResponse::created(
        "Category created.",
        json!({ "category": category }),
    ))
}

/// Applies a partial update to a payment category.
pub async fn put_category(
    State(state): State<AppState>,
    _claims: Claims,
    Path(category_id): Path<CategoryId>,
    Json(body): Json<UpdateCategory>,
) -> Result<ApiResponse, Error> {
    let category = {
        let connection = state.db_connection.lock().unwrap();
        update_category(category_id, body, &connection)?
    };

    Ok(ApiResponse::ok(json!({ "category": category })).with_message("Category updated."))
}

/// Deletes a payment category.
pub async fn remove_category(
    State(state): State<AppState>,
    _claims: Claims,
    Path(category_id): Path<CategoryId>,
) -> Result<ApiResponse, Error> {
    {
        let connection = state.db_connection.lock().unwrap();
        delete_category(category_id, &connection)?;
    }

    Ok(ApiResponse::message_only("Category deleted."))
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

    async fn create_category(server: &TestServer, token: &str, name: &str, kind: &str) -> i64 {
        let response = server
            .post("/api/categories")
            .authorization_bearer(token)
            .json(&json!({ "name": name, "type": kind }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["category"]["id"]
            .as_i64()
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_list_categories() {
        let (server, token) = server_with_admin().await;
        create_category(&server, &token, "Sports", "fee").await;
        create_category(&server, &token, "Library", "fine").await;

        let response = server
            .get("/api/categories")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["count"], 2);
        assert_eq!(data["categories"][0]["name"], "Library");
        assert_eq!(data["categories"][1]["name"], "Sports");
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_case_insensitively() {
        let (server, token) = server_with_admin().await;
        create_category(&server, &token, "Library", "fine").await;

        let response = server
            .post("/api/categories")
            .authorization_bearer(&token)
            .json(&json!({ "name": "LIBRARY" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["message"],
            "Category with this name already exists."
        );
    }

    #[tokio::test]
    async fn type_filter_narrows_the_list() {
        let (server, token) = server_with_admin().await;
        create_category(&server, &token, "Library", "fine").await;
        create_category(&server, &token, "Sports", "fee").await;

        let response = server
            .get("/api/categories")
            .authorization_bearer(&token)
            .add_query_param("type", "fee")
            .await;

        let data = &response.json::<Value>()["data"];
        assert_eq!(data["count"], 1);
        assert_eq!(data["categories"][0]["name"], "Sports");
    }

    #[tokio::test]
    async fn deactivated_categories_are_hidden_from_active_only() {
        let (server, token) = server_with_admin().await;
        let id = create_category(&server, &token, "Library", "fine").await;

        server
            .put(&format!("/api/categories/{id}"))
            .authorization_bearer(&token)
            .json(&json!({ "isActive": false }))
            .await
            .assert_status_ok();

        let response = server
            .get("/api/categories")
            .authorization_bearer(&token)
            .add_query_param("activeOnly", "true")
            .await;

        assert_eq!(response.json::<Value>()["data"]["count"], 0);
    }

    #[tokio::test]
    async fn update_and_delete_missing_category_is_not_found() {
        let (server, token) = server_with_admin().await;

        server
            .put("/api/categories/42")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Library" }))
            .await
            .assert_status_not_found();

        server
            .delete("/api/categories/42")
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }
}
