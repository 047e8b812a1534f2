//! Database queries for expenditures.

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};

use crate::{Error, admin::AdminId, pagination::PageParams};

use super::{
    CheckedExpenditure, Expenditure, ExpenditureId, UpdateExpenditure, validate_amount,
    validate_description, validate_notes,
};

const EXPENDITURE_COLUMNS: &str = "id, amount, description, category, sender_name, \
                                   receiver_name, department, date, added_by, receipt_number, \
                                   notes, created_at";

fn map_expenditure_row(row: &Row) -> Result<Expenditure, rusqlite::Error> {
    Ok(Expenditure {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        sender_name: row.get(4)?,
        receiver_name: row.get(5)?,
        department: row.get(6)?,
        date: row.get(7)?,
        added_by: row.get(8)?,
        receipt_number: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Insert an expenditure, recorded as added by the admin with `added_by`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn insert_expenditure(
    expenditure: CheckedExpenditure,
    added_by: AdminId,
    connection: &Connection,
) -> Result<Expenditure, Error> {
    let created_at = Utc::now();

    connection.execute(
        "INSERT INTO expenditure (amount, description, category, sender_name, receiver_name, \
         department, date, added_by, receipt_number, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            expenditure.amount,
            &expenditure.description,
            &expenditure.category,
            &expenditure.sender_name,
            &expenditure.receiver_name,
            &expenditure.department,
            expenditure.date,
            added_by,
            &expenditure.receipt_number,
            &expenditure.notes,
            created_at,
        ),
    )?;

    Ok(Expenditure {
        id: connection.last_insert_rowid(),
        amount: expenditure.amount,
        description: expenditure.description,
        category: expenditure.category,
        sender_name: expenditure.sender_name,
        receiver_name: expenditure.receiver_name,
        department: expenditure.department,
        date: expenditure.date,
        added_by: Some(added_by),
        receipt_number: expenditure.receipt_number,
        notes: expenditure.notes,
        created_at,
    })
}

/// Get the expenditure with `expenditure_id`.
///
/// # Errors
/// Returns [Error::ExpenditureNotFound] if there is no expenditure with that
/// ID.
pub fn get_expenditure(
    expenditure_id: ExpenditureId,
    connection: &Connection,
) -> Result<Expenditure, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENDITURE_COLUMNS} FROM expenditure WHERE id = :id"
        ))?
        .query_row(&[(":id", &expenditure_id)], map_expenditure_row)
        .optional()?
        .ok_or(Error::ExpenditureNotFound)
}

/// The filters for listing expenditures. Absent filters match everything.
#[derive(Debug, Default, Clone)]
pub struct ExpenditureFilter {
    /// Exact match on the category.
    pub category: Option<String>,
    /// Exact match on the department.
    pub department: Option<String>,
    /// Keep expenditures on or after this date.
    pub from_date: Option<NaiveDate>,
    /// Keep expenditures on or before this date.
    pub to_date: Option<NaiveDate>,
}

/// A page of expenditures matching `filter`, most recent first.
///
/// Returns the page of expenditures and the total number of matches.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_expenditures(
    filter: &ExpenditureFilter,
    page: PageParams,
    connection: &Connection,
) -> Result<(Vec<Expenditure>, u64), Error> {
    let mut where_clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(category) = &filter.category {
        where_clauses.push("category = ?");
        params.push(Value::Text(category.clone()));
    }

    if let Some(department) = &filter.department {
        where_clauses.push("department = ?");
        params.push(Value::Text(department.clone()));
    }

    if let Some(from_date) = filter.from_date {
        where_clauses.push("date >= ?");
        params.push(Value::Text(from_date.to_string()));
    }

    if let Some(to_date) = filter.to_date {
        where_clauses.push("date <= ?");
        params.push(Value::Text(to_date.to_string()));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM expenditure {where_sql}"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = params;
    page_params.push(Value::Integer(page.limit as i64));
    page_params.push(Value::Integer(page.offset() as i64));

    let expenditures = connection
        .prepare(&format!(
            "SELECT {EXPENDITURE_COLUMNS} FROM expenditure {where_sql} \
             ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(page_params.iter()), map_expenditure_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((expenditures, total as u64))
}

/// Apply a partial update to the expenditure with `expenditure_id`.
///
/// # Errors
/// Returns [Error::ExpenditureNotFound] if there is no expenditure with that
/// ID, or [Error::Validation] if an updated field is invalid.
pub fn update_expenditure(
    expenditure_id: ExpenditureId,
    update: UpdateExpenditure,
    connection: &Connection,
) -> Result<Expenditure, Error> {
    let existing = get_expenditure(expenditure_id, connection)?;

    if let Some(amount) = update.amount {
        validate_amount(amount)?;
    }

    let description = match update.description {
        Some(description) => validate_description(&description)?,
        None => existing.description,
    };
    let notes = match update.notes {
        Some(notes) => validate_notes(notes)?,
        None => existing.notes,
    };

    let updated = Expenditure {
        id: existing.id,
        amount: update.amount.unwrap_or(existing.amount),
        description,
        category: update.category.unwrap_or(existing.category),
        sender_name: update.sender_name.unwrap_or(existing.sender_name),
        receiver_name: update.receiver_name.unwrap_or(existing.receiver_name),
        department: update.department.unwrap_or(existing.department),
        date: update.date.unwrap_or(existing.date),
        added_by: existing.added_by,
        receipt_number: match update.receipt_number {
            Some(receipt_number) => receipt_number,
            None => existing.receipt_number,
        },
        notes,
        created_at: existing.created_at,
    };

    connection.execute(
        "UPDATE expenditure SET amount = ?1, description = ?2, category = ?3, sender_name = ?4, \
         receiver_name = ?5, department = ?6, date = ?7, receipt_number = ?8, notes = ?9 \
         WHERE id = ?10",
        (
            updated.amount,
            &updated.description,
            &updated.category,
            &updated.sender_name,
            &updated.receiver_name,
            &updated.department,
            updated.date,
            &updated.receipt_number,
            &updated.notes,
            updated.id,
        ),
    )?;

    Ok(updated)
}

/// Delete the expenditure with `expenditure_id`.
///
/// # Errors
/// Returns [Error::ExpenditureNotFound] if there is no expenditure with that
/// ID.
pub fn delete_expenditure(
    expenditure_id: ExpenditureId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_changed =
        connection.execute("DELETE FROM expenditure WHERE id = ?1", [expenditure_id])?;

    if rows_changed == 0 {
        return Err(Error::ExpenditureNotFound);
    }

    Ok(())
}

/// The sum of all expenditure amounts.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn total_expenditure(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expenditure",
            [],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}
