//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL for the shop database.
///
/// Reads `THREADLINE_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();

    std::env::var("THREADLINE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "THREADLINE_DATABASE_URL not set")
}
