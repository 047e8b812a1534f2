//! The student model, its database queries and the student endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

pub mod db;
pub mod endpoints;
pub mod import;

/// Alias for the integer type used for student IDs.
pub type StudentId = i64;

/// A student's permanent registration number.
///
/// PRNs are stored and compared in upper case so lookups are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prn(String);

impl Prn {
    /// Normalize a raw PRN: trimmed and upper-cased.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the PRN is empty after trimming.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let normalized = raw.trim().to_uppercase();

        if normalized.is_empty() {
            return Err(Error::Validation("PRN is required.".to_owned()));
        }

        Ok(Self(normalized))
    }

    /// Create a PRN without normalization. Use for values read back from the
    /// database, which are normalized on the way in.
    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl AsRef<str> for Prn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Prn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// The student's ID in the database.
    pub id: StudentId,
    /// The student's permanent registration number.
    pub prn: Prn,
    /// The student's full name.
    pub name: String,
    /// The department the student belongs to.
    pub department: String,
    /// The academic year, e.g. "2025-26".
    pub academic_year: String,
    /// The current semester.
    pub semester: String,
    /// The year of study, e.g. "SY".
    pub year: String,
    /// The class division.
    pub division: String,
    /// The roll number within the division.
    pub roll_no: String,
    /// The student's email address.
    pub email: String,
    /// The student's phone number.
    pub phone: String,
    /// Whether the student is currently enrolled.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A student together with their aggregated fine figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentWithTotals {
    /// The student record.
    #[serde(flatten)]
    pub student: Student,
    /// The sum of all fine amounts for the student.
    pub total_fines: f64,
    /// The sum of the unpaid fine amounts.
    pub unpaid_fines: f64,
    /// How many fines the student has.
    pub fine_count: i64,
}

/// The data needed to create a student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    /// The student's permanent registration number.
    pub prn: String,
    /// The student's full name.
    pub name: String,
    /// The department the student belongs to.
    #[serde(default)]
    pub department: Option<String>,
    /// The academic year.
    #[serde(default)]
    pub academic_year: Option<String>,
    /// The current semester.
    #[serde(default)]
    pub semester: Option<String>,
    /// The year of study.
    #[serde(default)]
    pub year: Option<String>,
    /// The class division.
    #[serde(default)]
    pub division: Option<String>,
    /// The roll number within the division.
    #[serde(default)]
    pub roll_no: Option<String>,
    /// The student's email address.
    #[serde(default)]
    pub email: Option<String>,
    /// The student's phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewStudent {
    /// Validate the PRN and name and fill in the defaults.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the PRN or name is missing, or the name
    /// is longer than 100 characters.
    pub fn into_checked(self) -> Result<CheckedStudent, Error> {
        let prn = Prn::new(&self.prn)?;
        let name = self.name.trim().to_owned();

        if name.is_empty() {
            return Err(Error::Validation("Name is required.".to_owned()));
        }

        if name.chars().count() > 100 {
            return Err(Error::Validation(
                "Name cannot be longer than 100 characters.".to_owned(),
            ));
        }

        Ok(CheckedStudent {
            prn,
            name,
            department: self.department.unwrap_or_default(),
            academic_year: self.academic_year.unwrap_or_default(),
            semester: self.semester.unwrap_or_default(),
            year: self.year.unwrap_or_default(),
            division: self.division.unwrap_or_default(),
            roll_no: self.roll_no.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_test(prn: &str, name: &str) -> Self {
        Self {
            prn: prn.to_owned(),
            name: name.to_owned(),
            department: None,
            academic_year: None,
            semester: None,
            year: None,
            division: None,
            roll_no: None,
            email: None,
            phone: None,
        }
    }
}

/// A validated student with all defaults applied, ready to insert.
#[derive(Debug, Clone)]
pub struct CheckedStudent {
    /// The normalized PRN.
    pub prn: Prn,
    /// The student's full name.
    pub name: String,
    /// The department the student belongs to.
    pub department: String,
    /// The academic year.
    pub academic_year: String,
    /// The current semester.
    pub semester: String,
    /// The year of study.
    pub year: String,
    /// The class division.
    pub division: String,
    /// The roll number within the division.
    pub roll_no: String,
    /// The student's email address.
    pub email: String,
    /// The student's phone number.
    pub phone: String,
}

/// A partial update to an existing student. Absent fields are left unchanged.
/// The PRN itself cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    /// A new full name.
    pub name: Option<String>,
    /// A new department.
    pub department: Option<String>,
    /// A new academic year.
    pub academic_year: Option<String>,
    /// A new semester.
    pub semester: Option<String>,
    /// A new year of study.
    pub year: Option<String>,
    /// A new class division.
    pub division: Option<String>,
    /// A new roll number.
    pub roll_no: Option<String>,
    /// A new email address.
    pub email: Option<String>,
    /// A new phone number.
    pub phone: Option<String>,
    /// A new enrollment status.
    pub is_active: Option<bool>,
}
