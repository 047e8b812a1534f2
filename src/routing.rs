//! Application router configuration.
//!
//! Authentication is enforced by the [crate::auth::token::Claims] extractor
//! in each protected handler rather than by a middleware layer, so a route is
//! protected exactly when its handler takes `Claims`.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{
        change_password, forgot_password, get_profile, get_setup_status, login, register_admin,
        reset_password, update_profile, verify_otp,
    },
    category::endpoints::{get_categories, post_category, put_category, remove_category},
    endpoints,
    expenditure::{
        endpoints::{
            get_expenditure, get_expenditures, post_expenditure, put_expenditure,
            remove_expenditure,
        },
        summary::get_expenditure_summary,
    },
    fine::endpoints::{add_student_fine, delete_student_fine, put_student_fine},
    logging::logging_middleware,
    report::{
        bulk_delete::bulk_delete_income, get_report_summary,
        student_payments::get_student_payments, transactions::get_transactions,
    },
    reset::{cancel_reset, reset_database, verify_password},
    student::{
        endpoints::{create_student, get_student, get_students, put_student},
        import::{MAX_UPLOAD_BYTES, import_students},
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::SETUP_STATUS, get(get_setup_status))
        .route(endpoints::REGISTER, post(register_admin))
        .route(endpoints::LOGIN, post(login))
        .route(endpoints::FORGOT_PASSWORD, post(forgot_password))
        .route(endpoints::VERIFY_OTP, post(verify_otp))
        .route(endpoints::RESET_PASSWORD, post(reset_password))
        .route(endpoints::PROFILE, get(get_profile))
        .route(endpoints::UPDATE_PROFILE, put(update_profile))
        .route(endpoints::CHANGE_PASSWORD, put(change_password))
        .route(endpoints::VERIFY_PASSWORD, post(verify_password))
        .route(endpoints::RESET_DATABASE, post(reset_database))
        .route(endpoints::CANCEL_RESET, post(cancel_reset))
        .route(endpoints::CATEGORIES, get(get_categories).post(post_category))
        .route(
            endpoints::CATEGORY,
            put(put_category).delete(remove_category),
        )
        .route(endpoints::STUDENTS, get(get_students).post(create_student))
        .route(
            endpoints::IMPORT_STUDENTS,
            post(import_students).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(endpoints::STUDENT, get(get_student).put(put_student))
        .route(endpoints::STUDENT_FINES, post(add_student_fine))
        .route(
            endpoints::STUDENT_FINE,
            put(put_student_fine).delete(delete_student_fine),
        )
        .route(
            endpoints::EXPENDITURES,
            get(get_expenditures).post(post_expenditure),
        )
        .route(endpoints::EXPENDITURE_SUMMARY, get(get_expenditure_summary))
        .route(
            endpoints::EXPENDITURE,
            get(get_expenditure)
                .put(put_expenditure)
                .delete(remove_expenditure),
        )
        .route(endpoints::STUDENT_PAYMENTS_REPORT, get(get_student_payments))
        .route(endpoints::TRANSACTIONS_REPORT, get(get_transactions))
        .route(endpoints::BULK_DELETE_INCOME, delete(bulk_delete_income))
        .route(endpoints::REPORT_SUMMARY, get(get_report_summary))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The JSON 404 response for unknown routes.
pub async fn get_404_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found.",
        })),
    )
}
