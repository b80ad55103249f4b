//! Derived financial aggregates.
//!
//! Pure functions over the current record collections: totals, balance, the
//! per-category breakdown and the trailing six-month expense histogram.
//! Callers recompute on every data change; there is no incremental state.

use chrono::{Datelike, NaiveDate};

use shared::{CategoryBreakdownEntry, FinanceSummary, MonthlyExpenseEntry};

use crate::domain::categories::{EXPENSE_CATEGORIES, MONTH_LABELS, OTHER_CATEGORY_KEY};
use crate::domain::models::expense::Expense;
use crate::domain::models::income::Income;
use crate::domain::month_filter::parse_record_date;

/// Number of calendar months in the expense histogram, current month
/// included.
pub const HISTOGRAM_MONTHS: u32 = 6;

/// Compute the full summary for the given record collections.
///
/// `today` anchors the histogram window; production callers pass the local
/// calendar date.
pub fn aggregate(expenses: &[Expense], incomes: &[Income], today: NaiveDate) -> FinanceSummary {
    let total_income: f64 = incomes.iter().map(|income| income.amount).sum();
    let total_expenses: f64 = expenses.iter().map(|expense| expense.amount).sum();

    FinanceSummary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        category_breakdown: category_breakdown(expenses, total_expenses),
        monthly_expenses: monthly_histogram(expenses, today),
    }
}

/// Group expenses into the fixed category buckets.
///
/// Unknown category keys are counted in "other", never dropped, so the
/// entry amounts always reconstruct the expense total. Zero buckets are
/// omitted and the rest sorted by amount, largest first.
fn category_breakdown(expenses: &[Expense], total_expenses: f64) -> Vec<CategoryBreakdownEntry> {
    let mut amounts = vec![0.0f64; EXPENSE_CATEGORIES.len()];
    let other_index = EXPENSE_CATEGORIES
        .iter()
        .position(|c| c.key == OTHER_CATEGORY_KEY)
        .expect("catalog always contains the catch-all bucket");

    for expense in expenses {
        let index = EXPENSE_CATEGORIES
            .iter()
            .position(|c| c.key == expense.category)
            .unwrap_or(other_index);
        amounts[index] += expense.amount;
    }

    let mut breakdown: Vec<CategoryBreakdownEntry> = EXPENSE_CATEGORIES
        .iter()
        .zip(amounts)
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(category, amount)| CategoryBreakdownEntry {
            name: category.label.to_string(),
            amount,
            percent: if total_expenses > 0.0 {
                amount / total_expenses * 100.0
            } else {
                0.0
            },
            color: category.color.to_string(),
        })
        .collect();

    breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    breakdown
}

/// Sum expenses per month over the trailing window, oldest month first.
///
/// Expenses outside the window are excluded here but still count toward the
/// totals; months without expenses report 0. Matching is by year and month,
/// so a March expense from another year never lands in this March's bar.
fn monthly_histogram(expenses: &[Expense], today: NaiveDate) -> Vec<MonthlyExpenseEntry> {
    let window: Vec<(i32, u32)> = (0..HISTOGRAM_MONTHS)
        .rev()
        .map(|back| months_back(today.year(), today.month(), back))
        .collect();

    let mut histogram: Vec<MonthlyExpenseEntry> = window
        .iter()
        .map(|(_, month)| MonthlyExpenseEntry {
            label: MONTH_LABELS[(*month - 1) as usize].to_string(),
            amount: 0.0,
        })
        .collect();

    for expense in expenses {
        let Some(date) = parse_record_date(&expense.date) else {
            continue;
        };
        if let Some(slot) = window
            .iter()
            .position(|&(year, month)| date.year() == year && date.month() == month)
        {
            histogram[slot].amount += expense.amount;
        }
    }

    histogram
}

fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 - back as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}
