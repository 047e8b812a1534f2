//! The admin account model and its database queries.
//!
//! The application is designed around a single privileged admin account that
//! is created once during first-time setup.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, password::PasswordHash};

/// Alias for the integer type used for admin IDs.
pub type AdminId = i64;

/// A privileged account that can manage students, fines and expenditures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    /// The admin's ID in the database.
    pub id: AdminId,
    /// The admin's display name.
    pub name: String,
    /// The email the admin signs in with.
    pub email: String,
    /// The admin's hashed password. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The data needed to create the admin account.
pub struct NewAdmin {
    /// The admin's display name.
    pub name: String,
    /// The email the admin signs in with.
    pub email: String,
    /// The admin's hashed password.
    pub password_hash: PasswordHash,
}

fn map_admin_row(row: &Row) -> Result<Admin, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(Admin {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(4)?,
    })
}

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, created_at";

/// The number of admin accounts in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn count_admins(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(*) FROM admin", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Insert the admin account into the database.
///
/// # Errors
/// Returns [Error::DuplicateEmail] if an admin with the same email exists, or
/// an error if there is an SQL error.
pub fn insert_admin(new_admin: NewAdmin, connection: &Connection) -> Result<Admin, Error> {
    let created_at = Utc::now();

    connection.execute(
        "INSERT INTO admin (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        (
            &new_admin.name,
            &new_admin.email,
            new_admin.password_hash.to_string(),
            created_at,
        ),
    )?;

    Ok(Admin {
        id: connection.last_insert_rowid(),
        name: new_admin.name,
        email: new_admin.email,
        password_hash: new_admin.password_hash,
        created_at,
    })
}

/// Get the admin with `admin_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no admin with the given ID.
pub fn get_admin_by_id(admin_id: AdminId, connection: &Connection) -> Result<Admin, Error> {
    connection
        .prepare(&format!("SELECT {ADMIN_COLUMNS} FROM admin WHERE id = :id"))?
        .query_row(&[(":id", &admin_id)], map_admin_row)
        .map_err(|error| error.into())
}

/// Get the admin with `email`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no admin with the given email.
pub fn get_admin_by_email(email: &str, connection: &Connection) -> Result<Admin, Error> {
    connection
        .prepare(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin WHERE email = :email"
        ))?
        .query_row(&[(":email", &email)], map_admin_row)
        .map_err(|error| error.into())
}

/// Get the first admin account, by ID.
///
/// Used by the password reset CLI, where the single-admin assumption holds.
///
/// # Errors
/// Returns [Error::NotFound] if there are no admin accounts.
pub fn get_first_admin(connection: &Connection) -> Result<Admin, Error> {
    connection
        .prepare(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin ORDER BY id ASC LIMIT 1"
        ))?
        .query_row([], map_admin_row)
        .map_err(|error| error.into())
}

/// Update the display name of the admin with `admin_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no admin with the given ID.
pub fn update_admin_name(
    admin_id: AdminId,
    name: &str,
    connection: &Connection,
) -> Result<Admin, Error> {
    let rows_changed = connection.execute(
        "UPDATE admin SET name = ?1 WHERE id = ?2",
        (&name, &admin_id),
    )?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    get_admin_by_id(admin_id, connection)
}

/// Replace the password hash of the admin with `admin_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no admin with the given ID.
pub fn update_admin_password(
    admin_id: AdminId,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_changed = connection.execute(
        "UPDATE admin SET password_hash = ?1 WHERE id = ?2",
        (password_hash.to_string(), &admin_id),
    )?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        password::{PasswordHash, ValidatedPassword},
    };

    use super::{
        NewAdmin, count_admins, get_admin_by_email, get_admin_by_id, get_first_admin, insert_admin,
        update_admin_name, update_admin_password,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn test_password_hash() -> PasswordHash {
        PasswordHash::new(ValidatedPassword::new_unchecked("averysecurepassword"), 4).unwrap()
    }

    #[test]
    fn insert_and_get_admin() {
        let connection = get_test_connection();

        let inserted = insert_admin(
            NewAdmin {
                name: "Admin".to_owned(),
                email: "admin@college.edu".to_owned(),
                password_hash: test_password_hash(),
            },
            &connection,
        )
        .unwrap();

        let selected = get_admin_by_id(inserted.id, &connection).unwrap();

        assert_eq!(inserted, selected);
    }

    #[test]
    fn insert_admin_fails_on_duplicate_email() {
        let connection = get_test_connection();
        let new_admin = || NewAdmin {
            name: "Admin".to_owned(),
            email: "admin@college.edu".to_owned(),
            password_hash: test_password_hash(),
        };

        insert_admin(new_admin(), &connection).unwrap();
        let result = insert_admin(new_admin(), &connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn count_admins_reflects_inserts() {
        let connection = get_test_connection();
        assert_eq!(count_admins(&connection), Ok(0));

        insert_admin(
            NewAdmin {
                name: "Admin".to_owned(),
                email: "admin@college.edu".to_owned(),
                password_hash: test_password_hash(),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(count_admins(&connection), Ok(1));
    }

    #[test]
    fn get_admin_by_email_finds_admin() {
        let connection = get_test_connection();
        let inserted = insert_admin(
            NewAdmin {
                name: "Admin".to_owned(),
                email: "admin@college.edu".to_owned(),
                password_hash: test_password_hash(),
            },
            &connection,
        )
        .unwrap();

        let selected = get_admin_by_email("admin@college.edu", &connection).unwrap();

        assert_eq!(inserted, selected);
    }

    #[test]
    fn get_missing_admin_returns_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_admin_by_id(42, &connection), Err(Error::NotFound));
        assert_eq!(get_first_admin(&connection), Err(Error::NotFound));
    }

    #[test]
    fn update_admin_name_persists() {
        let connection = get_test_connection();
        let inserted = insert_admin(
            NewAdmin {
                name: "Admin".to_owned(),
                email: "admin@college.edu".to_owned(),
                password_hash: test_password_hash(),
            },
            &connection,
        )
        .unwrap();

        let updated = update_admin_name(inserted.id, "New Name", &connection).unwrap();

        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.email, inserted.email);
    }

    #[test]
    fn update_admin_password_persists() {
        let connection = get_test_connection();
        let inserted = insert_admin(
            NewAdmin {
                name: "Admin".to_owned(),
                email: "admin@college.edu".to_owned(),
                password_hash: test_password_hash(),
            },
            &connection,
        )
        .unwrap();

        let new_hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("anothersecurepassword"), 4)
                .unwrap();
        update_admin_password(inserted.id, &new_hash, &connection).unwrap();

        let selected = get_admin_by_id(inserted.id, &connection).unwrap();
        assert!(selected.password_hash.verify("anothersecurepassword").unwrap());
    }
}
