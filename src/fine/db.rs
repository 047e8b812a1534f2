//! Database queries for fines.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::{Error, student::StudentId};

use super::{
    CheckedFine, Fine, FineId, PaymentType, UpdateFine, receipt::generate_receipt_number,
    validate_reason,
};

const FINE_COLUMNS: &str =
    "id, student_id, amount, reason, type, category, receipt_number, date, is_paid, paid_date";

fn map_fine_row(row: &Row) -> Result<Fine, rusqlite::Error> {
    let raw_type: String = row.get(4)?;

    Ok(Fine {
        id: row.get(0)?,
        student_id: row.get(1)?,
        amount: row.get(2)?,
        reason: row.get(3)?,
        fine_type: PaymentType::from_db(&raw_type),
        category: row.get(5)?,
        receipt_number: row.get(6)?,
        date: row.get(7)?,
        is_paid: row.get(8)?,
        paid_date: row.get(9)?,
    })
}

/// Record a fine against the student with `student_id`.
///
/// A receipt number is generated as part of the insert.
///
/// # Errors
/// Returns [Error::DuplicateReceiptNumber] if the generated receipt number
/// collides with an existing one, or an error if there is an SQL error.
pub fn add_fine(
    student_id: StudentId,
    fine: CheckedFine,
    connection: &Connection,
) -> Result<Fine, Error> {
    let receipt_number = generate_receipt_number();

    connection.execute(
        "INSERT INTO fine (student_id, amount, reason, type, category, receipt_number, date, \
         is_paid, paid_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            student_id,
            fine.amount,
            &fine.reason,
            fine.fine_type.as_str(),
            &fine.category,
            &receipt_number,
            fine.date,
            fine.is_paid,
            fine.paid_date,
        ),
    )?;

    Ok(Fine {
        id: connection.last_insert_rowid(),
        student_id,
        amount: fine.amount,
        reason: fine.reason,
        fine_type: fine.fine_type,
        category: fine.category,
        receipt_number: Some(receipt_number),
        date: fine.date,
        is_paid: fine.is_paid,
        paid_date: fine.paid_date,
    })
}

/// Get the fine with `fine_id` belonging to the student with `student_id`.
///
/// # Errors
/// Returns [Error::FineNotFound] if no such fine exists for that student.
pub fn get_fine(
    student_id: StudentId,
    fine_id: FineId,
    connection: &Connection,
) -> Result<Fine, Error> {
    connection
        .prepare(&format!(
            "SELECT {FINE_COLUMNS} FROM fine WHERE id = :id AND student_id = :student_id"
        ))?
        .query_row(
            &[(":id", &fine_id), (":student_id", &student_id)],
            map_fine_row,
        )
        .optional()?
        .ok_or(Error::FineNotFound)
}

/// All fines for the student with `student_id`, most recent first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_fines_for_student(
    student_id: StudentId,
    connection: &Connection,
) -> Result<Vec<Fine>, Error> {
    connection
        .prepare(&format!(
            "SELECT {FINE_COLUMNS} FROM fine WHERE student_id = :student_id \
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":student_id", &student_id)], map_fine_row)?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Apply a partial update to the fine with `fine_id`.
///
/// # Errors
/// Returns [Error::FineNotFound] if no such fine exists for that student, or
/// [Error::Validation] if the new amount or reason is invalid.
pub fn update_fine(
    student_id: StudentId,
    fine_id: FineId,
    update: UpdateFine,
    connection: &Connection,
) -> Result<Fine, Error> {
    let existing = get_fine(student_id, fine_id, connection)?;

    if let Some(amount) = update.amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::Validation(
                "Amount must be a non-negative number.".to_owned(),
            ));
        }
    }

    let amount = update.amount.unwrap_or(existing.amount);
    let reason = match update.reason {
        Some(reason) => validate_reason(reason)?,
        None => existing.reason,
    };
    let fine_type = update.fine_type.unwrap_or(existing.fine_type);
    let category = update.category.unwrap_or(existing.category);
    let date = update.date.unwrap_or(existing.date);
    let is_paid = update.is_paid.unwrap_or(existing.is_paid);
    let paid_date = match update.paid_date {
        Some(paid_date) => Some(paid_date),
        None if is_paid => existing.paid_date.or(Some(date)),
        None => None,
    };

    connection.execute(
        "UPDATE fine SET amount = ?1, reason = ?2, type = ?3, category = ?4, date = ?5, \
         is_paid = ?6, paid_date = ?7 WHERE id = ?8 AND student_id = ?9",
        (
            amount,
            &reason,
            fine_type.as_str(),
            &category,
            date,
            is_paid,
            paid_date,
            fine_id,
            student_id,
        ),
    )?;

    Ok(Fine {
        id: fine_id,
        student_id,
        amount,
        reason,
        fine_type,
        category,
        receipt_number: existing.receipt_number,
        date,
        is_paid,
        paid_date,
    })
}

/// Delete the fine with `fine_id` belonging to the student with `student_id`.
///
/// # Errors
/// Returns [Error::FineNotFound] if no such fine exists for that student.
pub fn delete_fine(
    student_id: StudentId,
    fine_id: FineId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_changed = connection.execute(
        "DELETE FROM fine WHERE id = ?1 AND student_id = ?2",
        (fine_id, student_id),
    )?;

    if rows_changed == 0 {
        return Err(Error::FineNotFound);
    }

    Ok(())
}

/// A student's aggregated fine figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FineTotals {
    /// The sum of all fine amounts for the student.
    pub total_fines: f64,
    /// The sum of the unpaid fine amounts.
    pub unpaid_fines: f64,
    /// How many fines the student has.
    pub fine_count: i64,
}

/// The aggregated fine figures for the student with `student_id`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn fine_totals(student_id: StudentId, connection: &Connection) -> Result<FineTotals, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0), \
             COALESCE(SUM(CASE WHEN is_paid = 0 THEN amount ELSE 0 END), 0), \
             COUNT(*) \
             FROM fine WHERE student_id = ?1",
            [student_id],
            |row| {
                Ok(FineTotals {
                    total_fines: row.get(0)?,
                    unpaid_fines: row.get(1)?,
                    fine_count: row.get(2)?,
                })
            },
        )
        .map_err(|error| error.into())
}

/// The sum of all fine amounts across all students.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn total_income(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row("SELECT COALESCE(SUM(amount), 0) FROM fine", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        fine::{NewFine, PaymentType, UpdateFine},
        student::{NewStudent, db::insert_student},
    };

    use super::{
        add_fine, delete_fine, fine_totals, get_fine, list_fines_for_student, total_income,
        update_fine,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn seed_student(connection: &Connection) -> i64 {
        insert_student(
            NewStudent::for_test("PRN001", "Asha").into_checked().unwrap(),
            connection,
        )
        .unwrap()
        .id
    }

    fn checked_fine(amount: f64) -> crate::fine::CheckedFine {
        NewFine {
            amount,
            reason: None,
            fine_type: None,
            category: None,
            date: None,
            is_paid: None,
            paid_date: None,
        }
        .into_checked()
        .unwrap()
    }

    #[test]
    fn add_and_get_fine() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);

        let inserted = add_fine(student_id, checked_fine(500.0), &connection).unwrap();
        let selected = get_fine(student_id, inserted.id, &connection).unwrap();

        assert_eq!(inserted, selected);
        assert!(selected.receipt_number.unwrap().starts_with("RCP-"));
    }

    #[test]
    fn totals_cover_paid_and_unpaid_fines() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);

        add_fine(student_id, checked_fine(500.0), &connection).unwrap();
        let mut unpaid = NewFine {
            amount: 1000.0,
            reason: None,
            fine_type: Some(PaymentType::Fee),
            category: None,
            date: None,
            is_paid: Some(false),
            paid_date: None,
        };
        unpaid.reason = Some("Exam fee".to_owned());
        add_fine(student_id, unpaid.into_checked().unwrap(), &connection).unwrap();

        let totals = fine_totals(student_id, &connection).unwrap();

        assert_eq!(totals.total_fines, 1500.0);
        assert_eq!(totals.unpaid_fines, 1000.0);
        assert_eq!(totals.fine_count, 2);
        assert_eq!(total_income(&connection), Ok(1500.0));
    }

    #[test]
    fn update_fine_changes_only_given_fields() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);
        let inserted = add_fine(student_id, checked_fine(500.0), &connection).unwrap();

        let updated = update_fine(
            student_id,
            inserted.id,
            UpdateFine {
                amount: Some(750.0),
                ..UpdateFine::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.amount, 750.0);
        assert_eq!(updated.category, inserted.category);
        assert_eq!(updated.receipt_number, inserted.receipt_number);
    }

    #[test]
    fn update_fine_rejects_negative_amount() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);
        let inserted = add_fine(student_id, checked_fine(500.0), &connection).unwrap();

        let result = update_fine(
            student_id,
            inserted.id,
            UpdateFine {
                amount: Some(-1.0),
                ..UpdateFine::default()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn delete_fine_removes_the_row() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);
        let inserted = add_fine(student_id, checked_fine(500.0), &connection).unwrap();

        delete_fine(student_id, inserted.id, &connection).unwrap();

        assert_eq!(
            get_fine(student_id, inserted.id, &connection),
            Err(Error::FineNotFound)
        );
        assert_eq!(
            delete_fine(student_id, inserted.id, &connection),
            Err(Error::FineNotFound)
        );
    }

    #[test]
    fn fine_for_another_student_is_not_found() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);
        let other_id = insert_student(
            NewStudent::for_test("PRN002", "Bilal").into_checked().unwrap(),
            &connection,
        )
        .unwrap()
        .id;
        let inserted = add_fine(student_id, checked_fine(500.0), &connection).unwrap();

        assert_eq!(
            get_fine(other_id, inserted.id, &connection),
            Err(Error::FineNotFound)
        );
    }

    #[test]
    fn deleting_a_student_cascades_to_fines() {
        let connection = get_test_connection();
        let student_id = seed_student(&connection);
        add_fine(student_id, checked_fine(500.0), &connection).unwrap();

        connection
            .execute("DELETE FROM student WHERE id = ?1", [student_id])
            .unwrap();

        assert!(
            list_fines_for_student(student_id, &connection)
                .unwrap()
                .is_empty()
        );
    }
}
