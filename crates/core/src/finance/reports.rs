//! Aggregations over the merged ledger.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;

use super::types::{CategoryTotal, FinancialTransaction, MonthlyTotals, TransactionType};

/// Groups transactions by `(type, category)`.
///
/// Output is ordered by type, then by descending total, then by category.
#[must_use]
pub fn category_breakdown(transactions: &[FinancialTransaction]) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<(TransactionType, String), (Decimal, usize)> = BTreeMap::new();
    for txn in transactions {
        let entry = groups
            .entry((txn.transaction_type.clone(), txn.category.clone()))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += txn.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|((transaction_type, category), (total, count))| CategoryTotal {
            transaction_type,
            category,
            total,
            count,
        })
        .collect();
    totals.sort_by(|a, b| {
        a.transaction_type
            .cmp(&b.transaction_type)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

/// Twelve monthly totals for `year`, by effective date.
///
/// Rows of other types are not counted.
#[must_use]
pub fn monthly_totals(transactions: &[FinancialTransaction], year: i32) -> Vec<MonthlyTotals> {
    let mut months: Vec<MonthlyTotals> = (1..=12)
        .map(|month| MonthlyTotals {
            month,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            refunds: Decimal::ZERO,
            net: Decimal::ZERO,
        })
        .collect();

    for txn in transactions {
        let date = txn.effective_date();
        if date.year() != year {
            continue;
        }
        let slot = &mut months[date.month0() as usize];
        match txn.transaction_type {
            TransactionType::Income => slot.income += txn.amount,
            TransactionType::Expense => slot.expenses += txn.amount,
            TransactionType::Refund => slot.refunds += txn.amount,
            TransactionType::Other(_) => {}
        }
    }

    for slot in &mut months {
        slot.net = slot.income - slot.expenses - slot.refunds;
    }
    months
}
