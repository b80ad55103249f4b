//! Domain-level command and query types.
//!
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the public DTOs defined
//! in the `shared` crate to these internal types.
//!
//! Mutation results carry a `success_message` for the UI plus an optional
//! `warning` set when the in-memory update was applied but the persistence
//! write failed (optimistic-write policy: never rolled back).

pub mod expense {
    use crate::domain::models::expense::Expense;

    /// Input for recording a new expense.
    #[derive(Debug, Clone)]
    pub struct CreateExpenseCommand {
        pub description: String,
        pub amount: f64,
        pub category: String,
        pub date: String,
        pub notes: Option<String>,
    }

    /// Full-record update of an existing expense.
    #[derive(Debug, Clone)]
    pub struct UpdateExpenseCommand {
        pub id: String,
        pub description: String,
        pub amount: f64,
        pub category: String,
        pub date: String,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteExpenseCommand {
        pub id: String,
    }

    /// Query parameters for listing expenses.
    #[derive(Debug, Clone, Default)]
    pub struct ExpenseListQuery {
        /// `"YYYY-MM"` or `"all"`; `None` means all
        pub month: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateExpenseResult {
        pub expense: Expense,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateExpenseResult {
        pub expense: Expense,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteExpenseResult {
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct ExpenseListResult {
        pub expenses: Vec<Expense>,
    }
}

pub mod income {
    use crate::domain::models::income::Income;

    /// Input for recording a new income.
    #[derive(Debug, Clone)]
    pub struct CreateIncomeCommand {
        pub description: String,
        pub amount: f64,
        pub category: String,
        pub date: String,
        pub notes: Option<String>,
    }

    /// Full-record update of an existing income.
    #[derive(Debug, Clone)]
    pub struct UpdateIncomeCommand {
        pub id: String,
        pub description: String,
        pub amount: f64,
        pub category: String,
        pub date: String,
        pub notes: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteIncomeCommand {
        pub id: String,
    }

    #[derive(Debug, Clone, Default)]
    pub struct IncomeListQuery {
        pub month: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateIncomeResult {
        pub income: Income,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateIncomeResult {
        pub income: Income,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteIncomeResult {
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct IncomeListResult {
        pub incomes: Vec<Income>,
    }
}

pub mod goal {
    use crate::domain::models::expense::Expense;
    use crate::domain::models::goal::Goal;

    /// Input for creating a new goal.
    #[derive(Debug, Clone)]
    pub struct CreateGoalCommand {
        pub title: String,
        pub description: Option<String>,
        pub target_amount: f64,
        /// Optional starting amount, defaults to 0
        pub current_amount: Option<f64>,
        pub deadline: String,
    }

    /// General goal update. Has no `current_amount` on purpose: funds move
    /// only through [`AddFundsCommand`].
    #[derive(Debug, Clone)]
    pub struct UpdateGoalCommand {
        pub id: String,
        pub title: String,
        pub description: Option<String>,
        pub target_amount: f64,
        pub deadline: String,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteGoalCommand {
        pub id: String,
    }

    /// Input for routing money into a goal.
    #[derive(Debug, Clone)]
    pub struct AddFundsCommand {
        pub goal_id: String,
        pub amount: f64,
    }

    #[derive(Debug, Clone)]
    pub struct CreateGoalResult {
        pub goal: Goal,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateGoalResult {
        pub goal: Goal,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteGoalResult {
        pub success_message: String,
        pub warning: Option<String>,
    }

    /// Result of adding funds: the updated goal and the linked funding
    /// expense created alongside it.
    #[derive(Debug, Clone)]
    pub struct AddFundsResult {
        pub goal: Goal,
        pub expense: Expense,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct GoalListResult {
        pub goals: Vec<Goal>,
    }
}

pub mod budget_rule {
    use crate::domain::models::budget_rule::BudgetRule;

    /// One rule allocation as entered in the rule form.
    #[derive(Debug, Clone)]
    pub struct RuleCategoryInput {
        pub name: String,
        pub percentage: f64,
        pub color: String,
        /// Expense-category keys mapped to this allocation; `None` keeps
        /// the fixed bucket-name fallback
        pub matches: Option<Vec<String>>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateRuleCommand {
        pub name: String,
        pub description: Option<String>,
        pub categories: Vec<RuleCategoryInput>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateRuleCommand {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub categories: Vec<RuleCategoryInput>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteRuleCommand {
        pub id: String,
    }

    #[derive(Debug, Clone)]
    pub struct SetActiveRuleCommand {
        pub rule_id: String,
    }

    /// Query for evaluating a rule; `None` evaluates the active rule.
    #[derive(Debug, Clone, Default)]
    pub struct EvaluateRuleQuery {
        pub rule_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct RuleListResult {
        pub rules: Vec<BudgetRule>,
        pub active_rule_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct CreateRuleResult {
        pub rule: BudgetRule,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateRuleResult {
        pub rule: BudgetRule,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteRuleResult {
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SetActiveRuleResult {
        pub active_rule_id: String,
        pub success_message: String,
        pub warning: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct EvaluateRuleResult {
        pub rule_id: String,
        pub rule_name: String,
        pub categories: Vec<shared::RuleCategoryValue>,
    }
}

pub mod settings {
    use crate::domain::models::currency::Currency;

    #[derive(Debug, Clone)]
    pub struct ChangeCurrencyCommand {
        pub code: String,
    }

    #[derive(Debug, Clone)]
    pub struct ChangeCurrencyResult {
        pub currency: Currency,
        pub success_message: String,
        pub warning: Option<String>,
    }
}

pub mod summary {
    /// Query parameters for the dashboard summary.
    #[derive(Debug, Clone, Default)]
    pub struct SummaryQuery {
        /// `"YYYY-MM"` or `"all"`; `None` means all
        pub month: Option<String>,
    }
}
