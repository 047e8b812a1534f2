//! Bulk import of students from a CSV file upload.

use axum::extract::{Multipart, State};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, Error, auth::token::Claims, response::ApiResponse};

use super::{NewStudent, db::insert_student};

/// The largest CSV upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A row of the uploaded CSV. Unknown columns are ignored, missing columns
/// come through as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CsvStudentRecord {
    prn: String,
    name: String,
    department: String,
    academic_year: String,
    semester: String,
    year: String,
    division: String,
    roll_no: String,
    email: String,
    phone: String,
}

impl CsvStudentRecord {
    fn into_new_student(self) -> NewStudent {
        let optional = |value: String| (!value.is_empty()).then_some(value);

        NewStudent {
            prn: self.prn,
            name: self.name,
            department: optional(self.department),
            academic_year: optional(self.academic_year),
            semester: optional(self.semester),
            year: optional(self.year),
            division: optional(self.division),
            roll_no: optional(self.roll_no),
            email: optional(self.email),
            phone: optional(self.phone),
        }
    }
}

/// Imports students from an uploaded CSV file.
///
/// Rows with a PRN that already exists are skipped, rows that fail to parse
/// or validate are reported individually. Valid rows are inserted even when
/// other rows fail.
pub async fn import_students(
    State(state): State<AppState>,
    _claims: Claims,
    mut multipart: Multipart,
) -> Result<ApiResponse, Error> {
    let mut file_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(Error::NotCsv);
        }

        file_bytes = Some(
            field
                .bytes()
                .await
                .map_err(|error| Error::MultipartError(error.to_string()))?,
        );
        break;
    }

    let Some(file_bytes) = file_bytes else {
        return Err(Error::Validation("A CSV file is required.".to_owned()));
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(file_bytes.as_ref());

    let mut created_count = 0u64;
    let mut skipped_count = 0u64;
    let mut errors: Vec<String> = Vec::new();

    let connection = state.db_connection.lock().unwrap();

    // The header is row one, the first data row is row two.
    for (index, record) in reader.deserialize::<CsvStudentRecord>().enumerate() {
        let row_number = index + 2;

        let outcome = record
            .map_err(|error| Error::InvalidCsv(error.to_string()))
            .and_then(|record| record.into_new_student().into_checked())
            .and_then(|student| insert_student(student, &connection));

        match outcome {
            Ok(_) => created_count += 1,
            Err(Error::DuplicatePrn) => skipped_count += 1,
            Err(Error::Validation(message)) | Err(Error::InvalidCsv(message)) => {
                errors.push(format!("Row {row_number}: {message}"));
            }
            Err(error) => return Err(error),
        }
    }

    tracing::info!(
        "student import: {} created, {} skipped, {} errors",
        created_count,
        skipped_count,
        errors.len()
    );

    Ok(ApiResponse::ok(json!({
        "createdCount": created_count,
        "skippedCount": skipped_count,
        "errors": errors,
    }))
    .with_message("Import completed."))
}
