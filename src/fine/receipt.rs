//! Receipt number generation.

use chrono::Utc;
use rand::Rng;

/// Generate a receipt number of the form `RCP-YYYYMMDD-NNNNN`.
///
/// The five digit suffix is random, uniqueness is enforced by the database.
pub fn generate_receipt_number() -> String {
    let suffix = rand::thread_rng().gen_range(10_000..=99_999u32);
    format!("RCP-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}
