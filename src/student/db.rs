//! Database queries for students.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};

use crate::{Error, pagination::PageParams};

use super::{CheckedStudent, Prn, Student, StudentId, StudentWithTotals, UpdateStudent};

const STUDENT_COLUMNS: &str = "id, prn, name, department, academic_year, semester, year, \
                               division, roll_no, email, phone, is_active, created_at";

fn map_student_row(row: &Row) -> Result<Student, rusqlite::Error> {
    let raw_prn: String = row.get(1)?;

    Ok(Student {
        id: row.get(0)?,
        prn: Prn::new_unchecked(&raw_prn),
        name: row.get(2)?,
        department: row.get(3)?,
        academic_year: row.get(4)?,
        semester: row.get(5)?,
        year: row.get(6)?,
        division: row.get(7)?,
        roll_no: row.get(8)?,
        email: row.get(9)?,
        phone: row.get(10)?,
        is_active: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn map_student_with_totals_row(row: &Row) -> Result<StudentWithTotals, rusqlite::Error> {
    Ok(StudentWithTotals {
        student: map_student_row(row)?,
        total_fines: row.get(13)?,
        unpaid_fines: row.get(14)?,
        fine_count: row.get(15)?,
    })
}

/// Insert a student into the database.
///
/// # Errors
/// Returns [Error::DuplicatePrn] if a student with the same PRN exists, or an
/// error if there is an SQL error.
pub fn insert_student(student: CheckedStudent, connection: &Connection) -> Result<Student, Error> {
    let created_at = Utc::now();

    connection.execute(
        "INSERT INTO student (prn, name, department, academic_year, semester, year, division, \
         roll_no, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            student.prn.as_ref(),
            &student.name,
            &student.department,
            &student.academic_year,
            &student.semester,
            &student.year,
            &student.division,
            &student.roll_no,
            &student.email,
            &student.phone,
            created_at,
        ),
    )?;

    Ok(Student {
        id: connection.last_insert_rowid(),
        prn: student.prn,
        name: student.name,
        department: student.department,
        academic_year: student.academic_year,
        semester: student.semester,
        year: student.year,
        division: student.division,
        roll_no: student.roll_no,
        email: student.email,
        phone: student.phone,
        is_active: true,
        created_at,
    })
}

/// Get the student with `prn`, if one exists.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_student_by_prn(prn: &Prn, connection: &Connection) -> Result<Option<Student>, Error> {
    connection
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student WHERE prn = :prn"
        ))?
        .query_row(&[(":prn", &prn.as_ref())], map_student_row)
        .optional()
        .map_err(|error| error.into())
}

/// The ID of the student with `prn`, if one exists.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn student_id_by_prn(prn: &Prn, connection: &Connection) -> Result<Option<StudentId>, Error> {
    connection
        .query_row(
            "SELECT id FROM student WHERE prn = ?1",
            [prn.as_ref()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|error| error.into())
}

/// Get the student with `prn` together with their fine totals, if one exists.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_student_with_totals(
    prn: &Prn,
    connection: &Connection,
) -> Result<Option<StudentWithTotals>, Error> {
    connection
        .prepare(
            "SELECT s.id, s.prn, s.name, s.department, s.academic_year, s.semester, s.year, \
             s.division, s.roll_no, s.email, s.phone, s.is_active, s.created_at, \
             COALESCE(SUM(f.amount), 0), \
             COALESCE(SUM(CASE WHEN f.is_paid = 0 THEN f.amount ELSE 0 END), 0), \
             COUNT(f.id)
             FROM student s
             LEFT JOIN fine f ON f.student_id = s.id
             WHERE s.prn = :prn
             GROUP BY s.id",
        )?
        .query_row(&[(":prn", &prn.as_ref())], map_student_with_totals_row)
        .optional()
        .map_err(|error| error.into())
}

/// The filters for listing students. Absent filters match everything.
#[derive(Debug, Default, Clone)]
pub struct StudentFilter {
    /// Case-insensitive substring match on name or PRN.
    pub search: Option<String>,
    /// Exact match on the year of study.
    pub year: Option<String>,
    /// Exact match on the division.
    pub division: Option<String>,
}

/// Build a contains-match LIKE pattern from a search string, escaping the
/// `%`, `_` and `\` characters so the user's text matches literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

/// A page of students matching `filter`, with their fine totals, ordered by
/// name then ID.
///
/// Returns the page of students and the total number of matches.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_students(
    filter: &StudentFilter,
    page: PageParams,
    connection: &Connection,
) -> Result<(Vec<StudentWithTotals>, u64), Error> {
    let mut where_clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(search) = &filter.search {
        where_clauses.push("(s.name LIKE ? ESCAPE '\\' OR s.prn LIKE ? ESCAPE '\\')");
        let pattern = like_pattern(search);
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    if let Some(year) = &filter.year {
        where_clauses.push("s.year = ?");
        params.push(Value::Text(year.clone()));
    }

    if let Some(division) = &filter.division {
        where_clauses.push("s.division = ?");
        params.push(Value::Text(division.clone()));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM student s {where_sql}"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = params;
    page_params.push(Value::Integer(page.limit as i64));
    page_params.push(Value::Integer(page.offset() as i64));

    let students = connection
        .prepare(&format!(
            "SELECT s.id, s.prn, s.name, s.department, s.academic_year, s.semester, s.year, \
             s.division, s.roll_no, s.email, s.phone, s.is_active, s.created_at, \
             COALESCE(SUM(f.amount), 0), \
             COALESCE(SUM(CASE WHEN f.is_paid = 0 THEN f.amount ELSE 0 END), 0), \
             COUNT(f.id)
             FROM student s
             LEFT JOIN fine f ON f.student_id = s.id
             {where_sql}
             GROUP BY s.id
             ORDER BY s.name ASC, s.id ASC
             LIMIT ? OFFSET ?"
        ))?
        .query_map(
            params_from_iter(page_params.iter()),
            map_student_with_totals_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((students, total as u64))
}

/// Apply a partial update to the student with `prn`.
///
/// # Errors
/// Returns [Error::StudentNotFound] if no student has that PRN, or
/// [Error::Validation] if the new name is invalid.
pub fn update_student(
    prn: &Prn,
    update: UpdateStudent,
    connection: &Connection,
) -> Result<Student, Error> {
    let existing = get_student_by_prn(prn, connection)?.ok_or(Error::StudentNotFound)?;

    let name = match update.name {
        Some(name) => {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err(Error::Validation("Name is required.".to_owned()));
            }
            if name.chars().count() > 100 {
                return Err(Error::Validation(
                    "Name cannot be longer than 100 characters.".to_owned(),
                ));
            }
            name
        }
        None => existing.name,
    };

    let updated = Student {
        id: existing.id,
        prn: existing.prn,
        name,
        department: update.department.unwrap_or(existing.department),
        academic_year: update.academic_year.unwrap_or(existing.academic_year),
        semester: update.semester.unwrap_or(existing.semester),
        year: update.year.unwrap_or(existing.year),
        division: update.division.unwrap_or(existing.division),
        roll_no: update.roll_no.unwrap_or(existing.roll_no),
        email: update.email.unwrap_or(existing.email),
        phone: update.phone.unwrap_or(existing.phone),
        is_active: update.is_active.unwrap_or(existing.is_active),
        created_at: existing.created_at,
    };

    connection.execute(
        "UPDATE student SET name = ?1, department = ?2, academic_year = ?3, semester = ?4, \
         year = ?5, division = ?6, roll_no = ?7, email = ?8, phone = ?9, is_active = ?10 \
         WHERE id = ?11",
        (
            &updated.name,
            &updated.department,
            &updated.academic_year,
            &updated.semester,
            &updated.year,
            &updated.division,
            &updated.roll_no,
            &updated.email,
            &updated.phone,
            updated.is_active,
            updated.id,
        ),
    )?;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        fine::{NewFine, db::add_fine},
        pagination::{PageQuery, PaginationConfig},
        student::{NewStudent, Prn, UpdateStudent},
    };

    use super::{
        StudentFilter, get_student_by_prn, get_student_with_totals, insert_student, list_students,
        update_student,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn insert_test_student(prn: &str, name: &str, connection: &Connection) -> crate::student::Student {
        insert_student(
            NewStudent::for_test(prn, name).into_checked().unwrap(),
            connection,
        )
        .unwrap()
    }

    fn default_page() -> crate::pagination::PageParams {
        PaginationConfig::default().resolve(PageQuery::default())
    }

    #[test]
    fn insert_and_get_student() {
        let connection = get_test_connection();

        let inserted = insert_test_student("prn001", "Asha", &connection);
        let selected = get_student_by_prn(&Prn::new("PRN001").unwrap(), &connection).unwrap();

        assert_eq!(Some(inserted), selected);
    }

    #[test]
    fn insert_student_fails_on_duplicate_prn() {
        let connection = get_test_connection();
        insert_test_student("PRN001", "Asha", &connection);

        let result = insert_student(
            NewStudent::for_test("prn001", "Bilal").into_checked().unwrap(),
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicatePrn));
    }

    #[test]
    fn missing_student_is_none() {
        let connection = get_test_connection();

        let result = get_student_by_prn(&Prn::new("PRN404").unwrap(), &connection).unwrap();

        assert_eq!(result, None);
    }

    #[test]
    fn totals_are_zero_for_a_student_without_fines() {
        let connection = get_test_connection();
        insert_test_student("PRN001", "Asha", &connection);

        let result = get_student_with_totals(&Prn::new("PRN001").unwrap(), &connection)
            .unwrap()
            .unwrap();

        assert_eq!(result.total_fines, 0.0);
        assert_eq!(result.fine_count, 0);
    }

    #[test]
    fn totals_sum_the_student_fines() {
        let connection = get_test_connection();
        let student = insert_test_student("PRN001", "Asha", &connection);

        for amount in [500.0, 1000.0] {
            let fine = NewFine {
                amount,
                reason: None,
                fine_type: None,
                category: None,
                date: None,
                is_paid: None,
                paid_date: None,
            };
            add_fine(student.id, fine.into_checked().unwrap(), &connection).unwrap();
        }

        let result = get_student_with_totals(&Prn::new("PRN001").unwrap(), &connection)
            .unwrap()
            .unwrap();

        assert_eq!(result.total_fines, 1500.0);
        assert_eq!(result.fine_count, 2);
    }

    #[test]
    fn list_students_is_ordered_by_name() {
        let connection = get_test_connection();
        insert_test_student("PRN002", "Bilal", &connection);
        insert_test_student("PRN001", "Asha", &connection);

        let (students, total) =
            list_students(&StudentFilter::default(), default_page(), &connection).unwrap();

        assert_eq!(total, 2);
        assert_eq!(students[0].student.name, "Asha");
        assert_eq!(students[1].student.name, "Bilal");
    }

    #[test]
    fn search_matches_name_and_prn() {
        let connection = get_test_connection();
        insert_test_student("PRN001", "Asha", &connection);
        insert_test_student("PRN002", "Bilal", &connection);

        let by_name = StudentFilter {
            search: Some("ash".to_owned()),
            ..StudentFilter::default()
        };
        let (students, total) = list_students(&by_name, default_page(), &connection).unwrap();
        assert_eq!(total, 1);
        assert_eq!(students[0].student.name, "Asha");

        let by_prn = StudentFilter {
            search: Some("PRN002".to_owned()),
            ..StudentFilter::default()
        };
        let (students, _) = list_students(&by_prn, default_page(), &connection).unwrap();
        assert_eq!(students[0].student.name, "Bilal");
    }

    #[test]
    fn search_wildcards_match_literally() {
        let connection = get_test_connection();
        insert_test_student("PRN001", "Asha", &connection);
        insert_test_student("PRN002", "A_ha", &connection);

        let underscore = StudentFilter {
            search: Some("A_".to_owned()),
            ..StudentFilter::default()
        };
        let (students, total) = list_students(&underscore, default_page(), &connection).unwrap();
        assert_eq!(total, 1);
        assert_eq!(students[0].student.name, "A_ha");

        let percent = StudentFilter {
            search: Some("%".to_owned()),
            ..StudentFilter::default()
        };
        let (_, total) = list_students(&percent, default_page(), &connection).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn pagination_limits_the_page() {
        let connection = get_test_connection();
        for i in 0..15 {
            insert_test_student(&format!("PRN{i:03}"), &format!("Student {i:02}"), &connection);
        }

        let page = PaginationConfig::default().resolve(PageQuery {
            page: Some(2),
            limit: Some(10),
        });
        let (students, total) =
            list_students(&StudentFilter::default(), page, &connection).unwrap();

        assert_eq!(total, 15);
        assert_eq!(students.len(), 5);
    }

    #[test]
    fn update_student_changes_only_given_fields() {
        let connection = get_test_connection();
        let inserted = insert_test_student("PRN001", "Asha", &connection);

        let updated = update_student(
            &Prn::new("PRN001").unwrap(),
            UpdateStudent {
                department: Some("IT".to_owned()),
                ..UpdateStudent::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.department, "IT");
        assert_eq!(updated.name, inserted.name);
    }

    #[test]
    fn update_missing_student_is_not_found() {
        let connection = get_test_connection();

        let result = update_student(
            &Prn::new("PRN404").unwrap(),
            UpdateStudent::default(),
            &connection,
        );

        assert_eq!(result, Err(Error::StudentNotFound));
    }
}
