//! Helpers shared by the endpoint tests.

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState,
    admin::{Admin, NewAdmin, insert_admin},
    auth::token::encode_token,
    pagination::PaginationConfig,
    password::{PasswordHash, ValidatedPassword},
    routing::build_router,
};

/// The plain-text password of the admin created by [test_state_with_admin].
pub(crate) const TEST_PASSWORD: &str = "averysecurepassword";

/// A low bcrypt cost so the tests stay fast.
const TEST_COST: u32 = 4;

/// An [AppState] backed by an empty in-memory database.
pub(crate) fn test_state() -> AppState {
    AppState::new(
        Connection::open_in_memory().unwrap(),
        "foobar",
        PaginationConfig::default(),
    )
    .unwrap()
}

/// An [AppState] with the admin account already set up, along with the admin,
/// a valid bearer token and the admin's plain-text password.
pub(crate) fn test_state_with_admin() -> (AppState, Admin, String, &'static str) {
    let state = test_state();

    let admin = {
        let connection = state.db_connection.lock().unwrap();
        insert_admin(
            NewAdmin {
                name: "Admin".to_owned(),
                email: "admin@college.edu".to_owned(),
                password_hash: PasswordHash::new(
                    ValidatedPassword::new_unchecked(TEST_PASSWORD),
                    TEST_COST,
                )
                .unwrap(),
            },
            &connection,
        )
        .unwrap()
    };

    let token = encode_token(admin.id, state.encoding_key()).unwrap();

    (state, admin, token, TEST_PASSWORD)
}

/// A [TestServer] running the full application router.
pub(crate) fn test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}
