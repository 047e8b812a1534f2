//! Database queries for payment categories.

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};

use crate::{Error, fine::PaymentType};

use super::{CategoryId, CheckedCategory, PaymentCategory, UpdateCategory, validate_name};

const CATEGORY_COLUMNS: &str = "id, name, type, description, is_active";

fn map_category_row(row: &Row) -> Result<PaymentCategory, rusqlite::Error> {
    let raw_type: String = row.get(2)?;

    Ok(PaymentCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: PaymentType::from_db(&raw_type),
        description: row.get(3)?,
        is_active: row.get(4)?,
    })
}

/// List categories ordered by name, optionally filtered by type and active
/// status.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_categories(
    category_type: Option<PaymentType>,
    active_only: bool,
    connection: &Connection,
) -> Result<Vec<PaymentCategory>, Error> {
    let mut where_clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(category_type) = category_type {
        where_clauses.push("type = ?");
        params.push(Value::Text(category_type.as_str().to_owned()));
    }

    if active_only {
        where_clauses.push("is_active = 1");
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM payment_category {where_sql} \
             ORDER BY name COLLATE NOCASE ASC"
        ))?
        .query_map(params_from_iter(params.iter()), map_category_row)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Get the category with `category_id`.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if there is no category with that ID.
pub fn get_category(
    category_id: CategoryId,
    connection: &Connection,
) -> Result<PaymentCategory, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM payment_category WHERE id = :id"
        ))?
        .query_row(&[(":id", &category_id)], map_category_row)
        .optional()?
        .ok_or(Error::CategoryNotFound)
}

/// Insert a payment category.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with the same name,
/// compared case-insensitively, already exists.
pub fn create_category(
    category: CheckedCategory,
    connection: &Connection,
) -> Result<PaymentCategory, Error> {
    connection.execute(
        "INSERT INTO payment_category (name, type, description) VALUES (?1, ?2, ?3)",
        (
            &category.name,
            category.category_type.as_str(),
            &category.description,
        ),
    )?;

    Ok(PaymentCategory {
        id: connection.last_insert_rowid(),
        name: category.name,
        category_type: category.category_type,
        description: category.description,
        is_active: true,
    })
}

/// Apply a partial update to the category with `category_id`.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if there is no category with that ID,
/// [Error::DuplicateCategoryName] if the new name collides with another
/// category, or [Error::Validation] if the new name is invalid.
pub fn update_category(
    category_id: CategoryId,
    update: UpdateCategory,
    connection: &Connection,
) -> Result<PaymentCategory, Error> {
    let existing = get_category(category_id, connection)?;

    let name = match update.name {
        Some(name) => validate_name(&name)?,
        None => existing.name,
    };

    let updated = PaymentCategory {
        id: existing.id,
        name,
        category_type: update.category_type.unwrap_or(existing.category_type),
        description: update.description.unwrap_or(existing.description),
        is_active: update.is_active.unwrap_or(existing.is_active),
    };

    connection.execute(
        "UPDATE payment_category SET name = ?1, type = ?2, description = ?3, is_active = ?4 \
         WHERE id = ?5",
        (
            &updated.name,
            updated.category_type.as_str(),
            &updated.description,
            updated.is_active,
            updated.id,
        ),
    )?;

    Ok(updated)
}

/// Delete the category with `category_id`.
///
/// Fines keep their category as plain text, so deleting a category does not
/// touch existing records.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if there is no category with that ID.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_changed = connection.execute(
        "DELETE FROM payment_category WHERE id = ?1",
        [category_id],
    )?;

    if rows_changed == 0 {
        return Err(Error::CategoryNotFound);
    }

    Ok(())
}
