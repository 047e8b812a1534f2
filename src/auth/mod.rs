//! Admin authentication: first-time setup, login, profile management and the
//! forgot-password flow.
//!
//! The app serves exactly one admin account. Registration is open until that
//! account exists and disabled afterwards.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    admin::{
        NewAdmin, count_admins, get_admin_by_email, get_admin_by_id, get_first_admin, insert_admin,
        update_admin_name, update_admin_password,
    },
    password::{PasswordHash, ValidatedPassword},
    response::ApiResponse,
};

pub mod otp;
pub mod rate_limit;
pub mod token;

use token::{Claims, encode_token};

/// Reports whether first-time setup still needs to happen.
pub async fn get_setup_status(State(state): State<AppState>) -> Result<ApiResponse, Error> {
    let admin_count = {
        let connection = state.db_connection.lock().unwrap();
        count_admins(&connection)?
    };

    Ok(ApiResponse::ok(json!({
        "setupRequired": admin_count == 0
    })))
}

/// The request body for creating the admin account.
#[derive(Deserialize)]
pub struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

/// Creates the admin account during first-time setup.
///
/// Registration is rejected once an admin account exists, password changes
/// after that go through [change_password] or the forgot-password flow.
pub async fn register_admin(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<ApiResponse, Error> {
    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(Error::Validation("Name is required.".to_owned()));
    }

    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation("A valid email is required.".to_owned()));
    }

    let password = ValidatedPassword::new(&body.password)?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let admin = {
        let connection = state.db_connection.lock().unwrap();

        if count_admins(&connection)? > 0 {
            return Err(Error::SetupComplete);
        }

        insert_admin(
            NewAdmin {
                name: name.to_owned(),
                email,
                password_hash,
            },
            &connection,
        )?
    };

    let token = encode_token(admin.id, state.encoding_key())?;

    Ok(ApiResponse::created(
        "Admin account created.",
        json!({ "token": token, "admin": admin }),
    ))
}

/// The request body for logging in.
#[derive(Deserialize)]
pub struct LoginBody {
    email: String,
    password: String,
}

/// Exchanges the admin's credentials for a bearer token.
///
/// Failed lookups and wrong passwords produce the same error so the response
/// does not reveal whether the email is registered.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<ApiResponse, Error> {
    state.login_limiter.lock().unwrap().try_acquire()?;

    let admin = {
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_email(&body.email.trim().to_lowercase(), &connection)
            .map_err(|_| Error::InvalidCredentials)?
    };

    if !admin.password_hash.verify(&body.password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(admin.id, state.encoding_key())?;

    Ok(ApiResponse::ok(json!({ "token": token, "admin": admin })))
}

/// Returns the authenticated admin's profile.
pub async fn get_profile(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<ApiResponse, Error> {
    let admin = {
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_id(claims.sub, &connection)?
    };

    Ok(ApiResponse::ok(json!({ "admin": admin })))
}

/// The request body for updating the admin's profile.
#[derive(Deserialize)]
pub struct UpdateProfileBody {
    name: String,
}

/// Updates the authenticated admin's display name.
pub async fn update_profile(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<UpdateProfileBody>,
) -> Result<ApiResponse, Error> {
    let name = body.name.trim();

    if name.is_empty() {
        return Err(Error::Validation("Name is required.".to_owned()));
    }

    let admin = {
        let connection = state.db_connection.lock().unwrap();
        update_admin_name(claims.sub, name, &connection)?
    };

    Ok(ApiResponse::ok(json!({ "admin": admin })).with_message("Profile updated."))
}

/// The request body for changing the password.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    current_password: String,
    new_password: String,
}

/// Changes the authenticated admin's password after checking the current one.
pub async fn change_password(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<ChangePasswordBody>,
) -> Result<ApiResponse, Error> {
    let admin = {
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_id(claims.sub, &connection)?
    };

    if !admin.password_hash.verify(&body.current_password)? {
        return Err(Error::InvalidCredentials);
    }

    let password = ValidatedPassword::new(&body.new_password)?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = state.db_connection.lock().unwrap();
    update_admin_password(admin.id, &password_hash, &connection)?;

    Ok(ApiResponse::message_only("Password changed successfully."))
}

/// The request body for requesting a password reset OTP.
#[derive(Deserialize)]
pub struct ForgotPasswordBody {
    email: String,
}

/// Starts the forgot-password flow by issuing an OTP.
///
/// The OTP is written to the log for out-of-band delivery. The response is
/// the same whether or not the email matches the admin account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<ApiResponse, Error> {
    state.forgot_password_limiter.lock().unwrap().try_acquire()?;

    let admin = {
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_email(&body.email.trim().to_lowercase(), &connection)
    };

    if let Ok(admin) = admin {
        let otp = state.password_reset.lock().unwrap().issue_otp();
        tracing::info!("password reset OTP for {}: {}", admin.email, otp);
    }

    Ok(ApiResponse::message_only(
        "If the email matches the admin account, an OTP has been issued.",
    ))
}

/// The request body for exchanging an OTP for a reset token.
#[derive(Deserialize)]
pub struct VerifyOtpBody {
    otp: String,
}

/// Exchanges a valid OTP for a single-use password reset token.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<ApiResponse, Error> {
    state.otp_limiter.lock().unwrap().try_acquire()?;

    let reset_token = state.password_reset.lock().unwrap().verify_otp(&body.otp)?;

    Ok(ApiResponse::ok(json!({ "resetToken": reset_token })))
}

/// The request body for setting a new password with a reset token.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    reset_token: String,
    new_password: String,
}

/// Sets a new password using a reset token from [verify_otp].
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<ApiResponse, Error> {
    let password = ValidatedPassword::new(&body.new_password)?;

    state
        .password_reset
        .lock()
        .unwrap()
        .consume_reset_token(&body.reset_token)?;

    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = state.db_connection.lock().unwrap();
    let admin = get_first_admin(&connection)?;
    update_admin_password(admin.id, &password_hash, &connection)?;

    Ok(ApiResponse::message_only("Password reset successfully."))
}
