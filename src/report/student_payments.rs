//! The per-student payment report: each student's summed fines and fees.

use axum::extract::{Query, State};
use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::Claims,
    fine::PaymentType,
    pagination::{PageMetadata, PageParams, PageQuery},
    response::ApiResponse,
    student::{StudentId, db::like_pattern},
};

/// Which payment types to include in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentTypeFilter {
    /// Only penalty fines.
    Fine,
    /// Only fee payments.
    Fee,
    /// Both fines and fees.
    #[default]
    Both,
}

impl PaymentTypeFilter {
    /// Parse the query-string value.
    ///
    /// # Errors
    /// Returns [Error::Validation] for anything other than `fine`, `fee` or
    /// `both`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "fine" => Ok(Self::Fine),
            "fee" => Ok(Self::Fee),
            "both" => Ok(Self::Both),
            _ => Err(Error::Validation(
                "Type must be one of fine, fee or both.".to_owned(),
            )),
        }
    }
}

/// One row of the report: a student and their payment totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPaymentRow {
    /// The student's ID in the database.
    pub student_id: StudentId,
    /// The student's PRN.
    pub prn: String,
    /// The student's name.
    pub name: String,
    /// The year of study.
    pub year: String,
    /// The class division.
    pub division: String,
    /// The summed amount of the matching payments.
    pub total_amount: f64,
    /// How many matching payments the student has.
    pub payment_count: i64,
}

/// The filters for the student payment report.
#[derive(Debug, Default, Clone)]
pub struct StudentPaymentFilter {
    /// Which payment types to include.
    pub payment_type: PaymentTypeFilter,
    /// Exact match on the year of study.
    pub year: Option<String>,
    /// Exact match on the division.
    pub division: Option<String>,
    /// Case-insensitive substring match on name or PRN.
    pub search: Option<String>,
}

/// A page of the student payment report, ordered by student name.
///
/// Only students with at least one matching payment appear. Returns the page
/// and the total number of matching students.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn student_payments(
    filter: &StudentPaymentFilter,
    page: PageParams,
    connection: &Connection,
) -> Result<(Vec<StudentPaymentRow>, u64), Error> {
    let mut where_clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    match filter.payment_type {
        PaymentTypeFilter::Fine => {
            where_clauses.push("f.type = ?");
            params.push(Value::Text(PaymentType::Fine.as_str().to_owned()));
        }
        PaymentTypeFilter::Fee => {
            where_clauses.push("f.type = ?");
            params.push(Value::Text(PaymentType::Fee.as_str().to_owned()));
        }
        PaymentTypeFilter::Both => {}
    }

    if let Some(year) = &filter.year {
        where_clauses.push("s.year = ?");
        params.push(Value::Text(year.clone()));
    }

    if let Some(division) = &filter.division {
        where_clauses.push("s.division = ?");
        params.push(Value::Text(division.clone()));
    }

    if let Some(search) = &filter.search {
        where_clauses.push("(s.name LIKE ? ESCAPE '\\' OR s.prn LIKE ? ESCAPE '\\')");
        let pattern = like_pattern(search);
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let total: i64 = connection.query_row(
        &format!(
            "SELECT COUNT(DISTINCT s.id) FROM student s \
             INNER JOIN fine f ON f.student_id = s.id {where_sql}"
        ),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = params;
    page_params.push(Value::Integer(page.limit as i64));
    page_params.push(Value::Integer(page.offset() as i64));

    let rows = connection
        .prepare(&format!(
            "SELECT s.id, s.prn, s.name, s.year, s.division, \
             COALESCE(SUM(f.amount), 0), COUNT(f.id)
             FROM student s
             INNER JOIN fine f ON f.student_id = s.id
             {where_sql}
             GROUP BY s.id
             ORDER BY s.name ASC, s.id ASC
             LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(page_params.iter()), |row| {
            Ok(StudentPaymentRow {
                student_id: row.get(0)?,
                prn: row.get(1)?,
                name: row.get(2)?,
                year: row.get(3)?,
                division: row.get(4)?,
                total_amount: row.get(5)?,
                payment_count: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((rows, total as u64))
}

/// The query parameters of the student payment report.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPaymentQuery {
    #[serde(rename = "type")]
    payment_type: Option<String>,
    year: Option<String>,
    division: Option<String>,
    search: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// Returns the per-student payment report, filtered and paged.
pub async fn get_student_payments(
    State(state): State<AppState>,
    _claims: Claims,
    Query(query): Query<StudentPaymentQuery>,
) -> Result<ApiResponse, Error> {
    let payment_type = match &query.payment_type {
        Some(value) => PaymentTypeFilter::parse(value)?,
        None => PaymentTypeFilter::Both,
    };
    let page = state.pagination_config.resolve(PageQuery {
        page: query.page,
        limit: query.limit,
    });
    let filter = StudentPaymentFilter {
        payment_type,
        year: query.year,
        division: query.division,
        search: query.search.filter(|search| !search.trim().is_empty()),
    };

    let (payments, total) = {
        let connection = state.db_connection.lock().unwrap();
        student_payments(&filter, page, &connection)?
    };

    Ok(ApiResponse::ok(json!({
        "payments": payments,
        "pagination": PageMetadata::new(page, total),
    })))
}
