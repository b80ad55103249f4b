//! Static category catalogs.
//!
//! Categories are a fixed vocabulary: forms offer these keys, aggregation
//! groups by them, and anything unknown collapses into "other". Labels are
//! the Spanish display names the app has always shown.

/// A known expense category with its display name and chart color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

pub const EXPENSE_CATEGORIES: &[ExpenseCategory] = &[
    ExpenseCategory { key: "housing", label: "Vivienda", color: "#3b82f6" },
    ExpenseCategory { key: "food", label: "Alimentación", color: "#22c55e" },
    ExpenseCategory { key: "transport", label: "Transporte", color: "#eab308" },
    ExpenseCategory { key: "utilities", label: "Servicios", color: "#a855f7" },
    ExpenseCategory { key: "entertainment", label: "Entretenimiento", color: "#ec4899" },
    ExpenseCategory { key: "health", label: "Salud", color: "#ef4444" },
    ExpenseCategory { key: "savings", label: "Ahorros", color: "#10b981" },
    ExpenseCategory { key: "other", label: "Otros", color: "#6b7280" },
];

/// Catch-all bucket for unknown category keys.
pub const OTHER_CATEGORY_KEY: &str = "other";

/// Category of goal-funding expenses.
pub const SAVINGS_CATEGORY_KEY: &str = "savings";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeCategory {
    pub key: &'static str,
    pub label: &'static str,
}

pub const INCOME_CATEGORIES: &[IncomeCategory] = &[
    IncomeCategory { key: "salary", label: "Salario" },
    IncomeCategory { key: "freelance", label: "Trabajo independiente" },
    IncomeCategory { key: "investment", label: "Inversiones" },
    IncomeCategory { key: "gift", label: "Regalo" },
    IncomeCategory { key: "other", label: "Otros" },
];

/// Short month labels for the expense histogram, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Fixed bucket table used when a rule category carries no explicit
/// expense-category mapping. Only the three classic bucket names resolve;
/// any other name gets no match (and therefore zero actual spending).
pub fn default_bucket_matches(rule_category_name: &str) -> &'static [&'static str] {
    match rule_category_name {
        "Needs" => &["housing", "food", "transport", "utilities", "health"],
        "Wants" => &["entertainment", "other"],
        "Savings" => &["savings"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_catalog_has_the_fixed_keys() {
        let keys: Vec<&str> = EXPENSE_CATEGORIES.iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            vec![
                "housing",
                "food",
                "transport",
                "utilities",
                "entertainment",
                "health",
                "savings",
                "other"
            ]
        );
    }

    #[test]
    fn test_default_bucket_matches_unknown_name_is_empty() {
        assert!(default_bucket_matches("Necesidades").is_empty());
        assert_eq!(default_bucket_matches("Savings"), &["savings"]);
    }
}
