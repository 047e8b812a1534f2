//! The API endpoint URIs.

/// The route for checking whether first-time setup is needed.
pub const SETUP_STATUS: &str = "/api/auth/setup-status";
/// The route for creating the admin account during setup.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in.
pub const LOGIN: &str = "/api/auth/login";
/// The route for requesting a password reset OTP.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
/// The route for exchanging an OTP for a reset token.
pub const VERIFY_OTP: &str = "/api/auth/verify-otp";
/// The route for setting a new password with a reset token.
pub const RESET_PASSWORD: &str = "/api/auth/reset-password";
/// The route for reading the admin's profile.
pub const PROFILE: &str = "/api/auth/profile";
/// The route for updating the admin's name.
pub const UPDATE_PROFILE: &str = "/api/auth/update-profile";
/// The route for changing the admin's password.
pub const CHANGE_PASSWORD: &str = "/api/auth/change-password";
/// The route for the first step of a database reset.
pub const VERIFY_PASSWORD: &str = "/api/auth/verify-password";
/// The route for confirming a database reset.
pub const RESET_DATABASE: &str = "/api/auth/reset-database";
/// The route for abandoning a pending database reset.
pub const CANCEL_RESET: &str = "/api/auth/reset-database/cancel";

/// The route for listing and creating payment categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route for updating and deleting a payment category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route for listing and creating students.
pub const STUDENTS: &str = "/api/students";
/// The route for a single student, addressed by PRN.
pub const STUDENT: &str = "/api/students/{prn}";
/// The route for the CSV student import.
pub const IMPORT_STUDENTS: &str = "/api/students/import";
/// The route for recording a fine against a student.
pub const STUDENT_FINES: &str = "/api/students/{prn}/fines";
/// The route for updating and deleting one of a student's fines.
pub const STUDENT_FINE: &str = "/api/students/{prn}/fines/{fine_id}";

/// The route for listing and creating expenditures.
pub const EXPENDITURES: &str = "/api/expenditures";
/// The route for the aggregated expenditure summary.
pub const EXPENDITURE_SUMMARY: &str = "/api/expenditures/summary";
/// The route for fetching, updating and deleting an expenditure.
pub const EXPENDITURE: &str = "/api/expenditures/{expenditure_id}";

/// The route for the per-student payment report.
pub const STUDENT_PAYMENTS_REPORT: &str = "/api/reports/student-payments";
/// The route for the unified transaction feed.
pub const TRANSACTIONS_REPORT: &str = "/api/reports/transactions";
/// The route for bulk-deleting income records.
pub const BULK_DELETE_INCOME: &str = "/api/reports/income/bulk-delete";
/// The route for the overall income and expenditure summary.
pub const REPORT_SUMMARY: &str = "/api/reports/summary";
