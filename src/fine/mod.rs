//! Fines and fee payments collected from students.
//!
//! A fine row records a single payment against a student. The `type` field
//! distinguishes penalty fines from regular fee payments, both share the same
//! table and receipt numbering.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, student::StudentId};

pub mod db;
pub mod endpoints;
pub mod receipt;

/// Alias for the integer type used for fine IDs.
pub type FineId = i64;

/// Whether a payment is a penalty fine or a regular fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// A penalty, e.g. for a late library return.
    Fine,
    /// A regular fee payment, e.g. an exam fee.
    Fee,
}

impl PaymentType {
    /// The string stored in the database for this payment type.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::Fine => "fine",
            PaymentType::Fee => "fee",
        }
    }

    /// Parse the database representation, defaulting to [PaymentType::Fine]
    /// for unrecognized values.
    pub fn from_db(value: &str) -> Self {
        match value {
            "fee" => PaymentType::Fee,
            _ => PaymentType::Fine,
        }
    }
}

/// A fine or fee payment recorded against a student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    /// The fine's ID in the database.
    pub id: FineId,
    /// The ID of the student the fine belongs to.
    pub student_id: StudentId,
    /// The amount in rupees.
    pub amount: f64,
    /// Why the fine was levied.
    pub reason: String,
    /// Whether this is a fine or a fee.
    #[serde(rename = "type")]
    pub fine_type: PaymentType,
    /// The payment category, e.g. "Library".
    pub category: String,
    /// The generated receipt number.
    pub receipt_number: Option<String>,
    /// The date of the fine.
    pub date: NaiveDate,
    /// Whether the fine has been paid.
    pub is_paid: bool,
    /// The date the fine was paid, if it has been.
    pub paid_date: Option<NaiveDate>,
}

/// The data needed to record a fine against a student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFine {
    /// The amount in rupees.
    pub amount: f64,
    /// Why the fine was levied.
    #[serde(default)]
    pub reason: Option<String>,
    /// Whether this is a fine or a fee. Defaults to a fine.
    #[serde(default, rename = "type")]
    pub fine_type: Option<PaymentType>,
    /// The payment category. Defaults to "Others".
    #[serde(default)]
    pub category: Option<String>,
    /// The date of the fine. Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Whether the fine has been paid. Defaults to paid.
    #[serde(default)]
    pub is_paid: Option<bool>,
    /// The date the fine was paid.
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

impl NewFine {
    /// Check the amount and reason and fill in the defaults.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the amount is negative or not a number,
    /// or the reason is longer than 500 characters.
    pub fn into_checked(self) -> Result<CheckedFine, Error> {
        validate_amount(self.amount)?;
        let reason = validate_reason(self.reason.unwrap_or_default())?;

        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        let is_paid = self.is_paid.unwrap_or(true);
        // A paid fine without an explicit paid date is treated as paid on the
        // fine date itself.
        let paid_date = self.paid_date.or(if is_paid { Some(date) } else { None });

        Ok(CheckedFine {
            amount: self.amount,
            reason,
            fine_type: self.fine_type.unwrap_or(PaymentType::Fine),
            category: self.category.unwrap_or_else(|| "Others".to_owned()),
            date,
            is_paid,
            paid_date,
        })
    }
}

/// A validated fine with all defaults applied, ready to insert.
#[derive(Debug, Clone)]
pub struct CheckedFine {
    /// The amount in rupees.
    pub amount: f64,
    /// Why the fine was levied.
    pub reason: String,
    /// Whether this is a fine or a fee.
    pub fine_type: PaymentType,
    /// The payment category.
    pub category: String,
    /// The date of the fine.
    pub date: NaiveDate,
    /// Whether the fine has been paid.
    pub is_paid: bool,
    /// The date the fine was paid, if it has been.
    pub paid_date: Option<NaiveDate>,
}

/// A partial update to an existing fine. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFine {
    /// A new amount in rupees.
    pub amount: Option<f64>,
    /// A new reason.
    pub reason: Option<String>,
    /// A new payment type.
    #[serde(rename = "type")]
    pub fine_type: Option<PaymentType>,
    /// A new payment category.
    pub category: Option<String>,
    /// A new fine date.
    pub date: Option<NaiveDate>,
    /// A new paid status.
    pub is_paid: Option<bool>,
    /// A new paid date.
    pub paid_date: Option<NaiveDate>,
}

pub(crate) fn validate_reason(reason: String) -> Result<String, Error> {
    if reason.chars().count() > 500 {
        return Err(Error::Validation(
            "Reason cannot be longer than 500 characters.".to_owned(),
        ));
    }

    Ok(reason)
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() {
        return Err(Error::Validation("Amount must be a number.".to_owned()));
    }

    if amount < 0.0 {
        return Err(Error::Validation(
            "Amount cannot be negative.".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::{NewFine, PaymentType};

    fn new_fine(amount: f64) -> NewFine {
        NewFine {
            amount,
            reason: None,
            fine_type: None,
            category: None,
            date: None,
            is_paid: None,
            paid_date: None,
        }
    }

    #[test]
    fn defaults_are_applied() {
        let checked = new_fine(500.0).into_checked().unwrap();

        assert_eq!(checked.fine_type, PaymentType::Fine);
        assert_eq!(checked.category, "Others");
        assert_eq!(checked.date, Utc::now().date_naive());
        assert!(checked.is_paid);
        assert_eq!(checked.paid_date, Some(checked.date));
    }

    #[test]
    fn unpaid_fine_has_no_paid_date() {
        let mut fine = new_fine(500.0);
        fine.is_paid = Some(false);

        let checked = fine.into_checked().unwrap();

        assert!(!checked.is_paid);
        assert_eq!(checked.paid_date, None);
    }

    #[test]
    fn explicit_date_is_kept() {
        let mut fine = new_fine(500.0);
        fine.date = Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());

        let checked = fine.into_checked().unwrap();

        assert_eq!(checked.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(new_fine(-1.0).into_checked().is_err());
    }

    #[test]
    fn over_long_reason_is_rejected() {
        let mut fine = new_fine(500.0);
        fine.reason = Some("x".repeat(501));

        assert!(fine.into_checked().is_err());
    }

    #[test]
    fn non_finite_amount_is_rejected() {
        assert!(new_fine(f64::NAN).into_checked().is_err());
        assert!(new_fine(f64::INFINITY).into_checked().is_err());
    }

    #[test]
    fn payment_type_db_round_trip() {
        assert_eq!(PaymentType::from_db("fee"), PaymentType::Fee);
        assert_eq!(PaymentType::from_db("fine"), PaymentType::Fine);
        assert_eq!(PaymentType::from_db("garbage"), PaymentType::Fine);
    }
}
