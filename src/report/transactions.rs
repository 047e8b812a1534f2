//! The unified transaction feed: fine payments and expenditures interleaved
//! into one chronological report.

use axum::extract::{Query, State};
use chrono::NaiveDate;
use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::Claims,
    fine::PaymentType,
    pagination::{PageMetadata, PageParams, PageQuery},
    response::ApiResponse,
};

/// Whether a transaction is money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// A fine or fee payment from a student.
    Income,
    /// A departmental expenditure.
    Expenditure,
}

impl TransactionKind {
    fn from_db(value: &str) -> Self {
        match value {
            "expenditure" => Self::Expenditure,
            _ => Self::Income,
        }
    }

    /// Parse the query-string value.
    ///
    /// # Errors
    /// Returns [Error::Validation] for anything other than `income` or
    /// `expenditure`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "income" => Ok(Self::Income),
            "expenditure" => Ok(Self::Expenditure),
            _ => Err(Error::Validation(
                "Type must be one of income, expenditure or all.".to_owned(),
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expenditure => "expenditure",
        }
    }
}

/// One row of the unified feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// The ID of the underlying fine or expenditure.
    pub id: i64,
    /// Whether this is income or an expenditure.
    pub kind: TransactionKind,
    /// For income rows, whether the payment was a fine or a fee.
    #[serde(rename = "type")]
    pub payment_type: Option<PaymentType>,
    /// The category of the fine or expenditure.
    pub category: String,
    /// The amount in rupees.
    pub amount: f64,
    /// The date of the transaction.
    pub date: NaiveDate,
    /// The paying student for income, the recorded sender for expenditures.
    pub sender_name: Option<String>,
    /// The recipient, for expenditures.
    pub receiver_name: Option<String>,
    /// The receipt number, if there is one.
    pub receipt_number: Option<String>,
    /// For income rows, the PRN of the paying student.
    pub student_prn: Option<String>,
}

fn map_transaction_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    let raw_kind: String = row.get(1)?;
    let raw_type: Option<String> = row.get(2)?;

    Ok(TransactionRecord {
        id: row.get(0)?,
        kind: TransactionKind::from_db(&raw_kind),
        payment_type: raw_type.as_deref().map(PaymentType::from_db),
        category: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        sender_name: row.get(6)?,
        receiver_name: row.get(7)?,
        receipt_number: row.get(8)?,
        student_prn: row.get(9)?,
    })
}

/// The filters for the transaction feed. Absent filters match everything.
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    /// Keep only income or only expenditures.
    pub kind: Option<TransactionKind>,
    /// For income rows, keep only fines or only fees.
    pub payment_type: Option<PaymentType>,
    /// Exact match on the category.
    pub category: Option<String>,
    /// Keep transactions in this calendar year.
    pub year: Option<i32>,
    /// Keep transactions in this calendar month, 1 through 12.
    pub month: Option<u32>,
    /// Keep transactions on or after this date.
    pub from_date: Option<NaiveDate>,
    /// Keep transactions on or before this date.
    pub to_date: Option<NaiveDate>,
    /// Keep transactions of at least this amount.
    pub min_amount: Option<f64>,
    /// Keep transactions of at most this amount.
    pub max_amount: Option<f64>,
}

const FEED_SQL: &str = "SELECT f.id AS id, 'income' AS kind, f.type AS payment_type, \
     f.category AS category, f.amount AS amount, f.date AS date, \
     s.name AS sender_name, NULL AS receiver_name, \
     f.receipt_number AS receipt_number, s.prn AS student_prn \
     FROM fine f INNER JOIN student s ON s.id = f.student_id \
     UNION ALL \
     SELECT e.id, 'expenditure', NULL, e.category, e.amount, e.date, \
     e.sender_name, e.receiver_name, e.receipt_number, NULL \
     FROM expenditure e";

/// A page of the unified transaction feed, most recent first.
///
/// Filters apply before pagination, so a filtered feed pages over the
/// filtered set. Returns the page and the total number of matches.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn list_transactions(
    filter: &TransactionFilter,
    page: PageParams,
    connection: &Connection,
) -> Result<(Vec<TransactionRecord>, u64), Error> {
    let mut where_clauses: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(kind) = filter.kind {
        where_clauses.push("kind = ?");
        params.push(Value::Text(kind.as_str().to_owned()));
    }

    if let Some(payment_type) = filter.payment_type {
        where_clauses.push("payment_type = ?");
        params.push(Value::Text(payment_type.as_str().to_owned()));
    }

    if let Some(category) = &filter.category {
        where_clauses.push("category = ?");
        params.push(Value::Text(category.clone()));
    }

    if let Some(year) = filter.year {
        where_clauses.push("strftime('%Y', date) = ?");
        params.push(Value::Text(format!("{year:04}")));
    }

    if let Some(month) = filter.month {
        where_clauses.push("strftime('%m', date) = ?");
        params.push(Value::Text(format!("{month:02}")));
    }

    if let Some(from_date) = filter.from_date {
        where_clauses.push("date >= ?");
        params.push(Value::Text(from_date.to_string()));
    }

    if let Some(to_date) = filter.to_date {
        where_clauses.push("date <= ?");
        params.push(Value::Text(to_date.to_string()));
    }

    if let Some(min_amount) = filter.min_amount {
        where_clauses.push("amount >= ?");
        params.push(Value::Real(min_amount));
    }

    if let Some(max_amount) = filter.max_amount {
        where_clauses.push("amount <= ?");
        params.push(Value::Real(max_amount));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM ({FEED_SQL}) {where_sql}"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let mut page_params = params;
    page_params.push(Value::Integer(page.limit as i64));
    page_params.push(Value::Integer(page.offset() as i64));

    // Ties on the date break on kind then ID so the ordering is total and
    // pages never overlap.
    let transactions = connection
        .prepare(&format!(
            "SELECT * FROM ({FEED_SQL}) {where_sql} \
             ORDER BY date DESC, kind ASC, id DESC LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(page_params.iter()), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((transactions, total as u64))
}

/// The query parameters of the transaction feed.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    payment_type: Option<String>,
    category: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// Returns the unified transaction feed, filtered and paged.
pub async fn get_transactions(
    State(state): State<AppState>,
    _claims: Claims,
    Query(query): Query<TransactionQuery>,
) -> Result<ApiResponse, Error> {
    let kind = match query.kind.as_deref() {
        None | Some("all") => None,
        Some(value) => Some(TransactionKind::parse(value)?),
    };
    let payment_type = match query.payment_type.as_deref() {
        None | Some("all") => None,
        Some("fine") => Some(PaymentType::Fine),
        Some("fee") => Some(PaymentType::Fee),
        Some(_) => {
            return Err(Error::Validation(
                "Payment type must be one of fine, fee or all.".to_owned(),
            ));
        }
    };

    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(
                "Month must be between 1 and 12.".to_owned(),
            ));
        }
    }

    let page = state.pagination_config.resolve(PageQuery {
        page: query.page,
        limit: query.limit,
    });
    let filter = TransactionFilter {
        kind,
        payment_type,
        category: query.category,
        year: query.year,
        month: query.month,
        from_date: query.from_date,
        to_date: query.to_date,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
    };

    let (transactions, total) = {
        let connection = state.db_connection.lock().unwrap();
        list_transactions(&filter, page, &connection)?
    };

    Ok(ApiResponse::ok(json!({
        "transactions": transactions,
        "pagination": PageMetadata::new(page, total),
    })))
}
