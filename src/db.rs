//! Creates the application's database schema.

use rusqlite::Connection;

/// Create the tables and indexes for the domain models, if they do not exist.
///
/// Also turns on foreign key enforcement for `connection`, which SQLite
/// leaves off by default.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS admin (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS student (
            id INTEGER PRIMARY KEY,
            prn TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            department TEXT,
            academic_year TEXT,
            semester TEXT,
            year TEXT,
            division TEXT,
            roll_no TEXT,
            email TEXT,
            phone TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fine (
            id INTEGER PRIMARY KEY,
            student_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            reason TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL DEFAULT 'fine',
            category TEXT NOT NULL DEFAULT 'Others',
            receipt_number TEXT UNIQUE,
            date TEXT NOT NULL,
            is_paid INTEGER NOT NULL DEFAULT 1,
            paid_date TEXT,
            FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_fine_student_id ON fine(student_id);

        CREATE TABLE IF NOT EXISTS expenditure (
            id INTEGER PRIMARY KEY,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'other',
            sender_name TEXT,
            receiver_name TEXT,
            department TEXT,
            date TEXT NOT NULL,
            added_by INTEGER REFERENCES admin(id) ON DELETE SET NULL,
            receipt_number TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS payment_category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            type TEXT NOT NULL DEFAULT 'fine',
            description TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );",
    )
}
