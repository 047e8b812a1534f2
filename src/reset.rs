//! The database-reset flow.
//!
//! Wiping the database is a two step operation. The admin first re-enters
//! their password and receives a short-lived challenge token, then confirms
//! the reset with that token, their password again and a typed confirmation
//! phrase. All deletions happen in one transaction so a failed reset leaves
//! the data untouched. The admin account itself is never deleted.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use axum::extract::State;
use axum::Json;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    admin::get_admin_by_id,
    auth::token::Claims,
    response::ApiResponse,
};

/// The phrase the admin must type, exactly, to confirm a database reset.
pub const CONFIRMATION_PHRASE: &str = "DELETE EVERYTHING";

/// How long a reset challenge token stays valid.
pub const CHALLENGE_DURATION: Duration = Duration::from_secs(5 * 60);

/// The live challenge tokens for the database-reset flow.
///
/// More than one token can be pending at a time, each expires independently.
#[derive(Debug, Default)]
pub struct ChallengeStore {
    challenges: HashMap<String, Instant>,
}

impl ChallengeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh challenge token.
    pub fn issue(&mut self) -> String {
        self.prune(Instant::now());

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        self.challenges.insert(token.clone(), Instant::now());
        token
    }

    /// Whether `token` is a live challenge.
    pub fn is_live(&mut self, token: &str) -> bool {
        self.prune(Instant::now());
        self.challenges.contains_key(token)
    }

    /// Consume a live challenge, making it unusable afterwards.
    ///
    /// # Errors
    /// Returns [Error::InvalidResetChallenge] if the token is unknown or has
    /// expired.
    pub fn consume(&mut self, token: &str) -> Result<(), Error> {
        self.prune(Instant::now());
        self.challenges
            .remove(token)
            .map(|_| ())
            .ok_or(Error::InvalidResetChallenge)
    }

    /// Drop a challenge without using it. Unknown tokens are ignored.
    pub fn cancel(&mut self, token: &str) {
        self.challenges.remove(token);
    }

    fn prune(&mut self, now: Instant) {
        self.challenges
            .retain(|_, issued_at| now.duration_since(*issued_at) < CHALLENGE_DURATION);
    }
}

/// The request body for starting a database reset.
#[derive(Deserialize)]
pub struct VerifyPasswordBody {
    password: String,
}

/// Handles the first step of a database reset: verify the admin's password
/// and issue a challenge token for the confirmation step.
pub async fn verify_password(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<VerifyPasswordBody>,
) -> Result<ApiResponse, Error> {
    let admin = {
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_id(claims.sub, &connection)?
    };

    if !admin.password_hash.verify(&body.password)? {
        return Err(Error::InvalidCredentials);
    }

    let challenge_token = state.reset_challenges.lock().unwrap().issue();

    tracing::warn!("database reset requested by admin {}", admin.id);

    Ok(ApiResponse::ok(json!({ "challengeToken": challenge_token })))
}

/// The request body for confirming a database reset.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetDatabaseBody {
    challenge_token: String,
    password: String,
    confirmation_phrase: String,
}

/// Handles the final step of a database reset.
///
/// The challenge token must be live, the password must verify and the
/// confirmation phrase must match [CONFIRMATION_PHRASE] exactly. The
/// challenge stays live on a wrong password or phrase so the admin can fix a
/// typo without starting over.
pub async fn reset_database(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<ResetDatabaseBody>,
) -> Result<ApiResponse, Error> {
    if !state
        .reset_challenges
        .lock()
        .unwrap()
        .is_live(&body.challenge_token)
    {
        return Err(Error::InvalidResetChallenge);
    }

    let admin = {
        let connection = state.db_connection.lock().unwrap();
        get_admin_by_id(claims.sub, &connection)?
    };

    if !admin.password_hash.verify(&body.password)? {
        return Err(Error::InvalidCredentials);
    }

    if body.confirmation_phrase != CONFIRMATION_PHRASE {
        return Err(Error::ConfirmationPhraseMismatch);
    }

    state
        .reset_challenges
        .lock()
        .unwrap()
        .consume(&body.challenge_token)?;

    let mut connection = state.db_connection.lock().unwrap();
    let transaction = connection.transaction().map_err(Error::from)?;

    // Fines reference students, so they go first.
    let fines = transaction.execute("DELETE FROM fine", [])?;
    let students = transaction.execute("DELETE FROM student", [])?;
    let expenditures = transaction.execute("DELETE FROM expenditure", [])?;
    let categories = transaction.execute("DELETE FROM payment_category", [])?;

    transaction.commit().map_err(Error::from)?;

    tracing::warn!(
        "database reset by admin {}: {} students, {} fines, {} expenditures, {} categories deleted",
        admin.id,
        students,
        fines,
        expenditures,
        categories
    );

    Ok(ApiResponse::ok(json!({
        "students": students,
        "fines": fines,
        "expenditures": expenditures,
        "categories": categories,
    }))
    .with_message("Database reset completed."))
}

/// The request body for abandoning a pending database reset.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResetBody {
    challenge_token: String,
}

/// Abandons a pending database reset, invalidating the challenge token.
pub async fn cancel_reset(
    State(state): State<AppState>,
    _claims: Claims,
    Json(body): Json<CancelResetBody>,
) -> ApiResponse {
    state
        .reset_challenges
        .lock()
        .unwrap()
        .cancel(&body.challenge_token);

    ApiResponse::message_only("Database reset cancelled.")
}
