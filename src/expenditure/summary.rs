//! Aggregated views of the expenditure data.

use axum::extract::State;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

use crate::{AppState, Error, auth::token::Claims, response::ApiResponse};

use super::db::total_expenditure;

/// One aggregation bucket: a label, the summed amount and the record count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBucket {
    /// The bucket label: a category, department or `YYYY-MM` month.
    pub label: String,
    /// The summed amount for the bucket.
    pub total: f64,
    /// How many expenditures fall into the bucket.
    pub count: i64,
}

fn grouped_totals(
    group_expr: &str,
    order_by: &str,
    connection: &Connection,
) -> Result<Vec<SummaryBucket>, Error> {
    connection
        .prepare(&format!(
            "SELECT {group_expr} AS label, COALESCE(SUM(amount), 0) AS total, COUNT(*) \
             FROM expenditure GROUP BY label ORDER BY {order_by}"
        ))?
        .query_map([], |row| {
            Ok(SummaryBucket {
                label: row.get(0)?,
                total: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .map(|row| row.map_err(|error| error.into()))
        .collect()
}

/// Expenditure totals grouped by category, largest first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn summary_by_category(connection: &Connection) -> Result<Vec<SummaryBucket>, Error> {
    grouped_totals("category", "total DESC", connection)
}

/// Expenditure totals grouped by department, largest first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn summary_by_department(connection: &Connection) -> Result<Vec<SummaryBucket>, Error> {
    grouped_totals("department", "total DESC", connection)
}

/// Expenditure totals grouped by calendar month, most recent first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn summary_by_month(connection: &Connection) -> Result<Vec<SummaryBucket>, Error> {
    grouped_totals("strftime('%Y-%m', date)", "label DESC", connection)
}

/// Returns the aggregated expenditure summary.
pub async fn get_expenditure_summary(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<ApiResponse, Error> {
    let connection = state.db_connection.lock().unwrap();

    let total = total_expenditure(&connection)?;
    let by_category = summary_by_category(&connection)?;
    let by_department = summary_by_department(&connection)?;
    let monthly = summary_by_month(&connection)?;

    Ok(ApiResponse::ok(json!({
        "totalExpenditure": total,
        "byCategory": by_category,
        "byDepartment": by_department,
        "monthly": monthly,
    })))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    use super::{summary_by_category, summary_by_month};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn seed_expenditure(amount: f64, category: &str, date: &str, connection: &Connection) {
        connection
            .execute(
                "INSERT INTO expenditure (amount, description, category, sender_name, \
                 receiver_name, department, date, created_at)
                 VALUES (?1, 'Test', ?2, '', '', 'CS', ?3, '2025-01-01T00:00:00Z')",
                (amount, category, date),
            )
            .unwrap();
    }

    #[test]
    fn categories_are_ordered_by_total_descending() {
        let connection = get_test_connection();
        seed_expenditure(100.0, "stationery", "2025-01-15", &connection);
        seed_expenditure(500.0, "equipment", "2025-01-20", &connection);
        seed_expenditure(200.0, "stationery", "2025-02-01", &connection);

        let buckets = summary_by_category(&connection).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "equipment");
        assert_eq!(buckets[0].total, 500.0);
        assert_eq!(buckets[1].label, "stationery");
        assert_eq!(buckets[1].total, 300.0);
        assert_eq!(buckets[1].count, 2);
    }

    #[test]
    fn months_are_grouped_most_recent_first() {
        let connection = get_test_connection();
        seed_expenditure(100.0, "stationery", "2025-01-15", &connection);
        seed_expenditure(200.0, "stationery", "2025-01-20", &connection);
        seed_expenditure(50.0, "stationery", "2025-02-01", &connection);

        let buckets = summary_by_month(&connection).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "2025-02");
        assert_eq!(buckets[1].label, "2025-01");
        assert_eq!(buckets[1].total, 300.0);
    }
}
