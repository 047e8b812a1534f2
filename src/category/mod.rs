//! Payment categories used to classify fines and fee payments.

use serde::{Deserialize, Serialize};

use crate::{Error, fine::PaymentType};

pub mod db;
pub mod endpoints;

/// Alias for the integer type used for category IDs.
pub type CategoryId = i64;

/// A named category that fines and fees can be filed under.
///
/// Category names are unique, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCategory {
    /// The category's ID in the database.
    pub id: CategoryId,
    /// The category's name, e.g. "Library".
    pub name: String,
    /// Whether the category applies to fines or fees.
    #[serde(rename = "type")]
    pub category_type: PaymentType,
    /// A free-form description.
    pub description: String,
    /// Inactive categories are kept for old records but hidden from pickers.
    pub is_active: bool,
}

/// The data needed to create a payment category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// The category's name.
    pub name: String,
    /// Whether the category applies to fines or fees. Defaults to fines.
    #[serde(default, rename = "type")]
    pub category_type: Option<PaymentType>,
    /// A free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    /// Validate the name and fill in the defaults.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the name is empty or longer than 50
    /// characters.
    pub fn into_checked(self) -> Result<CheckedCategory, Error> {
        let name = validate_name(&self.name)?;

        Ok(CheckedCategory {
            name,
            category_type: self.category_type.unwrap_or(PaymentType::Fine),
            description: self.description.unwrap_or_default(),
        })
    }
}

/// A validated category with all defaults applied, ready to insert.
#[derive(Debug, Clone)]
pub struct CheckedCategory {
    /// The trimmed category name.
    pub name: String,
    /// Whether the category applies to fines or fees.
    pub category_type: PaymentType,
    /// A free-form description.
    pub description: String,
}

/// A partial update to an existing category. Absent fields are left
/// unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    /// A new name.
    pub name: Option<String>,
    /// A new payment type.
    #[serde(rename = "type")]
    pub category_type: Option<PaymentType>,
    /// A new description.
    pub description: Option<String>,
    /// A new active status.
    pub is_active: Option<bool>,
}

pub(crate) fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim().to_owned();

    if name.is_empty() {
        return Err(Error::Validation("Category name is required.".to_owned()));
    }

    if name.chars().count() > 50 {
        return Err(Error::Validation(
            "Category name cannot be longer than 50 characters.".to_owned(),
        ));
    }

    Ok(name)
}
