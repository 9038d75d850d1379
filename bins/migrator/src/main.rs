//! Database migration runner for the gym ledger.
//!
//! Usage:
//!   migrator up      - Create the ledger tables
//!   migrator down    - Drop the ledger tables
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use gymledger_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI sets up its own tracing
    cli::run_cli(Migrator).await;
}
