//! Departmental expenditures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, admin::AdminId};

pub mod db;
pub mod endpoints;
pub mod summary;

/// Alias for the integer type used for expenditure IDs.
pub type ExpenditureId = i64;

/// A record of money spent by the department.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expenditure {
    /// The expenditure's ID in the database.
    pub id: ExpenditureId,
    /// The amount in rupees.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// The spending category, e.g. "equipment".
    pub category: String,
    /// Who the money came from.
    pub sender_name: String,
    /// Who received the money.
    pub receiver_name: String,
    /// The department the spending belongs to.
    pub department: String,
    /// The date of the expenditure.
    pub date: NaiveDate,
    /// The admin who recorded the expenditure, if they still exist.
    pub added_by: Option<AdminId>,
    /// An external receipt or voucher number, if there is one.
    pub receipt_number: Option<String>,
    /// Free-form notes.
    pub notes: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// The data needed to record an expenditure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpenditure {
    /// The amount in rupees.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// The spending category. Defaults to "other".
    #[serde(default)]
    pub category: Option<String>,
    /// Who the money came from.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Who received the money.
    #[serde(default)]
    pub receiver_name: Option<String>,
    /// The department the spending belongs to.
    #[serde(default)]
    pub department: Option<String>,
    /// The date of the expenditure. Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// An external receipt or voucher number.
    #[serde(default)]
    pub receipt_number: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewExpenditure {
    /// Validate the fields and fill in the defaults.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the amount is negative or not a number,
    /// the description is empty or longer than 500 characters, or the notes
    /// are longer than 1000 characters.
    pub fn into_checked(self) -> Result<CheckedExpenditure, Error> {
        validate_amount(self.amount)?;
        let description = validate_description(&self.description)?;
        let notes = validate_notes(self.notes.unwrap_or_default())?;

        Ok(CheckedExpenditure {
            amount: self.amount,
            description,
            category: self.category.unwrap_or_else(|| "other".to_owned()),
            sender_name: self.sender_name.unwrap_or_default(),
            receiver_name: self.receiver_name.unwrap_or_default(),
            department: self.department.unwrap_or_default(),
            date: self.date.unwrap_or_else(|| Utc::now().date_naive()),
            receipt_number: self.receipt_number,
            notes,
        })
    }
}

/// A validated expenditure with all defaults applied, ready to insert.
#[derive(Debug, Clone)]
pub struct CheckedExpenditure {
    /// The amount in rupees.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// The spending category.
    pub category: String,
    /// Who the money came from.
    pub sender_name: String,
    /// Who received the money.
    pub receiver_name: String,
    /// The department the spending belongs to.
    pub department: String,
    /// The date of the expenditure.
    pub date: NaiveDate,
    /// An external receipt or voucher number.
    pub receipt_number: Option<String>,
    /// Free-form notes.
    pub notes: String,
}

/// A partial update to an existing expenditure. Absent fields are left
/// unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenditure {
    /// A new amount in rupees.
    pub amount: Option<f64>,
    /// A new description.
    pub description: Option<String>,
    /// A new spending category.
    pub category: Option<String>,
    /// A new sender name.
    pub sender_name: Option<String>,
    /// A new receiver name.
    pub receiver_name: Option<String>,
    /// A new department.
    pub department: Option<String>,
    /// A new expenditure date.
    pub date: Option<NaiveDate>,
    /// A new receipt number. An explicit `null` clears the stored one, an
    /// absent field leaves it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    pub receipt_number: Option<Option<String>>,
    /// New notes.
    pub notes: Option<String>,
}

/// Deserialize a field so that `null` becomes `Some(None)` while an absent
/// field stays `None` via `#[serde(default)]`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

pub(crate) fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Validation(
            "Amount must be a non-negative number.".to_owned(),
        ));
    }

    Ok(())
}

pub(crate) fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim().to_owned();

    if description.is_empty() {
        return Err(Error::Validation("Description is required.".to_owned()));
    }

    if description.chars().count() > 500 {
        return Err(Error::Validation(
            "Description cannot be longer than 500 characters.".to_owned(),
        ));
    }

    Ok(description)
}

pub(crate) fn validate_notes(notes: String) -> Result<String, Error> {
    if notes.chars().count() > 1000 {
        return Err(Error::Validation(
            "Notes cannot be longer than 1000 characters.".to_owned(),
        ));
    }

    Ok(notes)
}
