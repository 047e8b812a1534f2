//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid email and password combination.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Registration was attempted after the first admin account was created.
    #[error("an admin account already exists")]
    SetupComplete,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JWT could not be created for a signed-in admin.
    #[error("could not create an authentication token")]
    TokenCreation,

    /// A request field failed validation. The message describes the field and
    /// the constraint that was violated.
    #[error("{0}")]
    Validation(String),

    /// The PRN used to create a student already exists in the database.
    #[error("a student with this PRN already exists")]
    DuplicatePrn,

    /// The category name already exists (compared case-insensitively).
    #[error("a category with this name already exists")]
    DuplicateCategoryName,

    /// A generated receipt number collided with an existing one.
    ///
    /// Receipt numbers are random within a day, so this should be vanishingly
    /// rare. There is no retry loop, the caller can simply resubmit.
    #[error("the generated receipt number already exists")]
    DuplicateReceiptNumber,

    /// The email used to create an admin already exists in the database.
    #[error("an admin with this email already exists")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// No student matches the given PRN.
    #[error("student not found")]
    StudentNotFound,

    /// No fine matches the given id for the given student.
    #[error("fine not found")]
    FineNotFound,

    /// No payment category matches the given id.
    #[error("category not found")]
    CategoryNotFound,

    /// No expenditure matches the given id.
    #[error("expenditure not found")]
    ExpenditureNotFound,

    /// The OTP is wrong, already used or past its expiry.
    #[error("invalid or expired OTP")]
    InvalidOtp,

    /// The password-reset token is wrong, already used or past its expiry.
    #[error("invalid or expired password reset token")]
    InvalidResetToken,

    /// The database-reset challenge token is missing, wrong or expired.
    ///
    /// The caller must verify their password again to get a fresh challenge.
    #[error("password verification is required before resetting the database")]
    InvalidResetChallenge,

    /// The typed confirmation phrase did not exactly match the expected one.
    #[error("confirmation phrase does not match")]
    ConfirmationPhraseMismatch,

    /// Too many attempts against a rate limited endpoint.
    #[error("too many attempts")]
    RateLimited,

    /// The multipart form could not be parsed as an uploaded file.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded file is not a CSV file.
    #[error("file is not a CSV")]
    NotCsv,

    /// The CSV had issues that prevented it from being parsed.
    #[error("could not parse the CSV file: {0}")]
    InvalidCsv(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("student.prn") =>
            {
                Error::DuplicatePrn
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("payment_category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("fine.receipt_number") =>
            {
                Error::DuplicateReceiptNumber
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("admin.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code and client-facing message for the error.
    ///
    /// Internal errors always map to a generic message, the details are only
    /// logged server-side.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password.".to_owned(),
            ),
            Error::SetupComplete => (
                StatusCode::FORBIDDEN,
                "Registration is disabled because an admin account already exists.".to_owned(),
            ),
            Error::TooWeak(feedback) => (
                StatusCode::BAD_REQUEST,
                format!("Password is too weak: {feedback}"),
            ),
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::DuplicatePrn => (
                StatusCode::BAD_REQUEST,
                "A student with this PRN already exists.".to_owned(),
            ),
            Error::DuplicateCategoryName => (
                StatusCode::BAD_REQUEST,
                "Category with this name already exists.".to_owned(),
            ),
            Error::DuplicateReceiptNumber => (
                StatusCode::BAD_REQUEST,
                "The generated receipt number already exists, please retry.".to_owned(),
            ),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                "An admin with this email already exists.".to_owned(),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested resource could not be found.".to_owned(),
            ),
            Error::StudentNotFound => (StatusCode::NOT_FOUND, "Student not found.".to_owned()),
            Error::FineNotFound => (StatusCode::NOT_FOUND, "Fine not found.".to_owned()),
            Error::CategoryNotFound => (StatusCode::NOT_FOUND, "Category not found.".to_owned()),
            Error::ExpenditureNotFound => {
                (StatusCode::NOT_FOUND, "Expenditure not found.".to_owned())
            }
            Error::InvalidOtp => (StatusCode::BAD_REQUEST, "Invalid or expired OTP.".to_owned()),
            Error::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired password reset token.".to_owned(),
            ),
            Error::InvalidResetChallenge => (
                StatusCode::BAD_REQUEST,
                "Password verification is required before resetting the database.".to_owned(),
            ),
            Error::ConfirmationPhraseMismatch => (
                StatusCode::BAD_REQUEST,
                "Confirmation phrase does not match. Type \"DELETE EVERYTHING\" exactly as shown."
                    .to_owned(),
            ),
            Error::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts. Please try again later.".to_owned(),
            ),
            Error::MultipartError(message) => (
                StatusCode::BAD_REQUEST,
                format!("Could not read the uploaded file: {message}"),
            ),
            Error::NotCsv => (
                StatusCode::BAD_REQUEST,
                "Only CSV files are allowed.".to_owned(),
            ),
            Error::InvalidCsv(message) => (
                StatusCode::BAD_REQUEST,
                format!("Could not parse the CSV file: {message}"),
            ),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_owned(),
                )
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
