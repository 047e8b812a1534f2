use std::{
    error::Error,
    io,
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use fineledger::{
    admin::{Admin, get_first_admin, update_admin_password},
    password::{PasswordHash, ValidatedPassword},
};

/// A utility for changing the admin account's password from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let admin = get_admin(db_path);
    println!("Resetting password for {}", admin.email);

    let password_hash = match get_new_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    let connection = Connection::open(db_path)?;
    update_admin_password(admin.id, &password_hash, &connection)?;

    println!("Password updated.");
    Ok(())
}

fn get_admin(db_path: &Path) -> Admin {
    println!("Loading admin account from {db_path:#?}");

    let connection = Connection::open(db_path)
        .unwrap_or_else(|_| panic!("Could not open the database at {db_path:?}"));

    get_first_admin(&connection).expect("Could not find an admin account in the database.")
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }
}

fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if let Err(error) = ValidatedPassword::new(&first_password) {
            print_error(error);
            continue;
        }

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        let password_hash =
            match PasswordHash::from_raw_password(&first_password, PasswordHash::DEFAULT_COST) {
                Ok(password_hash) => password_hash,
                Err(error) => {
                    print_error(format!("Could not hash password: {error}. Try again."));
                    continue;
                }
            };

        return Some(password_hash);
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
