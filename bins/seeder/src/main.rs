//! Database seeder for gym ledger development and testing.
//!
//! Seeds a demo branch with rows in every backing table: legacy income and
//! expense records plus unified transactions, then prints the branch summary.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, NaiveDate, Utc};
use gymledger_core::finance::{
    CreateTransactionInput, FinancialTransaction, TransactionAggregator, TransactionType,
};
use gymledger_db::FinanceRepository;
use gymledger_shared::{AppConfig, types::BranchId};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Demo branch ID (consistent for all seeds)
const DEMO_BRANCH_ID: &str = "00000000-0000-0000-0000-00000000b001";

type Aggregator = TransactionAggregator<FinanceRepository>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymledger_core=info,gymledger_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = gymledger_db::connect_with(&config.database).await?;
    let ledger = TransactionAggregator::with_config(FinanceRepository::new(db), config.finance);

    let branch_id = demo_branch_id()?;
    let existing = ledger.fetch(Some(branch_id)).await?;
    if !existing.is_empty() {
        println!("  Demo branch already has {} rows, skipping...", existing.len());
        return Ok(());
    }

    println!("Seeding membership income...");
    seed_income(&ledger, branch_id).await;

    println!("Seeding expenses...");
    seed_expenses(&ledger, branch_id).await;

    println!("Seeding refunds...");
    seed_refunds(&ledger, branch_id).await;

    let summary = ledger.finance_summary(branch_id).await;
    println!(
        "Seeding complete! income={} expenses={} balance={}",
        summary.income, summary.expenses, summary.balance
    );
    Ok(())
}

fn demo_branch_id() -> Result<BranchId, uuid::Error> {
    Ok(BranchId::from_uuid(Uuid::parse_str(DEMO_BRANCH_ID)?))
}

fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

async fn record(ledger: &Aggregator, input: CreateTransactionInput) -> Option<FinancialTransaction> {
    match ledger.create(input).await {
        Ok(txn) => Some(txn),
        Err(e) => {
            eprintln!("Failed to insert transaction: {e}");
            None
        }
    }
}

/// Seeds two weeks of membership and personal-training income.
async fn seed_income(ledger: &Aggregator, branch_id: BranchId) {
    let plans = [
        ("Monthly membership", "Membership", 4_500),
        ("Personal training x5", "Training", 12_000),
        ("Day pass", "Membership", 1_000),
    ];
    let mut inserted = 0;

    for day_offset in 0..14 {
        let (description, category, cents) = plans[day_offset % plans.len()];
        let input = CreateTransactionInput {
            transaction_type: Some(TransactionType::Income),
            amount: money(cents),
            description: Some(description.to_string()),
            transaction_date: Some(days_ago(i64::try_from(day_offset).unwrap_or_default())),
            payment_method: Some(if day_offset % 2 == 0 { "card" } else { "cash" }.to_string()),
            category: Some(category.to_string()),
            branch_id,
            reference_id: Some(format!("INV-{:04}", day_offset + 1)),
            source: Some("Front Desk".to_string()),
            ..CreateTransactionInput::default()
        };
        if record(ledger, input).await.is_some() {
            inserted += 1;
        }
    }

    println!("  Created {inserted} income records");
}

/// Seeds recurring operating expenses.
async fn seed_expenses(ledger: &Aggregator, branch_id: BranchId) {
    let bills = [
        ("Equipment servicing", "Maintenance", "Acme Supplies", 25_000, 3),
        ("Electricity", "Utilities", "City Power", 41_250, 7),
        ("Cleaning supplies", "Operations", "Acme Supplies", 6_480, 10),
    ];
    let mut inserted = 0;

    for (description, category, vendor, cents, day_offset) in bills {
        let input = CreateTransactionInput {
            transaction_type: Some(TransactionType::Expense),
            amount: money(cents),
            description: Some(description.to_string()),
            transaction_date: Some(days_ago(day_offset)),
            payment_method: Some("bank_transfer".to_string()),
            category: Some(category.to_string()),
            branch_id,
            vendor: Some(vendor.to_string()),
            ..CreateTransactionInput::default()
        };
        if record(ledger, input).await.is_some() {
            inserted += 1;
        }
    }

    println!("  Created {inserted} expense records");
}

/// Seeds a refund into the unified table.
async fn seed_refunds(ledger: &Aggregator, branch_id: BranchId) {
    let input = CreateTransactionInput {
        transaction_type: Some(TransactionType::Refund),
        amount: money(1_000),
        description: Some("Day pass refund".to_string()),
        transaction_date: Some(days_ago(1)),
        payment_method: Some("cash".to_string()),
        category: Some("Membership".to_string()),
        branch_id,
        reference_id: Some("INV-0003".to_string()),
        ..CreateTransactionInput::default()
    };

    if let Some(txn) = record(ledger, input).await {
        println!("  Created refund: {}", txn.id);
    }
}
