//! Implements a struct that holds the state of the REST server.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    auth::{otp::PasswordResetState, rate_limit::RateLimiter},
    db::initialize,
    pagination::PaginationConfig,
    reset::ChallengeStore,
};

/// The keys used for signing and verifying JWTs.
#[derive(Clone)]
struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// The state of the REST server.
///
/// All in-process mutable state lives here and is injected into the request
/// handlers, there is no module-level mutable state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The config that controls how to page collections.
    pub pagination_config: PaginationConfig,

    /// Live challenge tokens for the database-reset flow.
    pub reset_challenges: Arc<Mutex<ChallengeStore>>,

    /// The pending OTP and reset token for the forgot-password flow.
    pub password_reset: Arc<Mutex<PasswordResetState>>,

    /// Rate limiter for the login endpoint.
    pub login_limiter: Arc<Mutex<RateLimiter>>,

    /// Rate limiter for the forgot-password endpoint.
    pub forgot_password_limiter: Arc<Mutex<RateLimiter>>,

    /// Rate limiter for the OTP verification endpoint.
    pub otp_limiter: Arc<Mutex<RateLimiter>>,

    jwt_keys: JwtKeys,
}

/// How many login attempts are allowed per fifteen minutes.
const LOGIN_ATTEMPTS: u32 = 10;

/// How many forgot-password requests are allowed per hour.
const FORGOT_PASSWORD_ATTEMPTS: u32 = 5;

/// How many OTP verification attempts are allowed per fifteen minutes.
const OTP_ATTEMPTS: u32 = 10;

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. `jwt_secret` is used for signing and verifying the
    /// authentication tokens.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            pagination_config,
            reset_challenges: Arc::new(Mutex::new(ChallengeStore::new())),
            password_reset: Arc::new(Mutex::new(PasswordResetState::new())),
            login_limiter: Arc::new(Mutex::new(RateLimiter::new(
                LOGIN_ATTEMPTS,
                Duration::from_secs(15 * 60),
            ))),
            forgot_password_limiter: Arc::new(Mutex::new(RateLimiter::new(
                FORGOT_PASSWORD_ATTEMPTS,
                Duration::from_secs(60 * 60),
            ))),
            otp_limiter: Arc::new(Mutex::new(RateLimiter::new(
                OTP_ATTEMPTS,
                Duration::from_secs(15 * 60),
            ))),
            jwt_keys: JwtKeys {
                encoding_key: EncodingKey::from_secret(jwt_secret.as_ref()),
                decoding_key: DecodingKey::from_secret(jwt_secret.as_ref()),
            },
        })
    }

    /// The encoding key for JWTs.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.jwt_keys.encoding_key
    }

    /// The decoding key for JWTs.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.jwt_keys.decoding_key
    }
}
