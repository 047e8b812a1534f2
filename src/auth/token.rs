//! JWT creation, verification and the bearer-token extractor that protects
//! the private routes.

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, Error, admin::AdminId, admin::get_admin_by_id};

/// How long an authentication token stays valid.
pub const TOKEN_DURATION_DAYS: i64 = 7;

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the admin the token was issued to.
    pub sub: AdminId,
    /// The time the token was issued, as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: i64,
}

/// The reasons an authenticated request may be rejected.
///
/// Each variant maps to its own client-facing message so the client can tell
/// a missing token apart from an expired one.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// The request carried no bearer token.
    NoToken,
    /// The bearer token could not be decoded or its signature is wrong.
    InvalidToken,
    /// The bearer token is past its expiry time.
    ExpiredToken,
    /// The token was valid but the admin it refers to no longer exists.
    AdminNotFound,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::NoToken => "Not authorized. No token provided.",
            AuthError::InvalidToken => "Not authorized. Invalid token.",
            AuthError::ExpiredToken => "Not authorized. Token has expired.",
            AuthError::AdminNotFound => "Not authorized. Admin not found.",
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Create a signed token for the admin with `admin_id`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(admin_id: AdminId, encoding_key: &EncodingKey) -> Result<String, Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: admin_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_DURATION_DAYS)).timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("could not encode JWT: {}", error);
        Error::TokenCreation
    })
}

/// Verify and decode a token.
///
/// # Errors
/// Returns [AuthError::ExpiredToken] for a token past its expiry and
/// [AuthError::InvalidToken] for any other decoding failure.
pub fn decode_token(
    token: &str,
    decoding_key: &DecodingKey,
) -> Result<TokenData<Claims>, AuthError> {
    decode(token, decoding_key, &Validation::default()).map_err(|error| match error.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })
}

impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::NoToken)?;

        let state = AppState::from_ref(state);
        let token_data = decode_token(bearer.token(), state.decoding_key())?;

        // A token may outlive the admin it was issued to, e.g. after the
        // database file is replaced.
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_id(token_data.claims.sub, &connection)
            .map_err(|_| AuthError::AdminNotFound)?;

        Ok(token_data.claims)
    }
}
