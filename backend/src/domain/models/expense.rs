//! Domain model for an expense.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notes prefix written into funding expenses, kept for display
/// compatibility with records created before `goal_id` existed.
pub const GOAL_FUNDING_NOTE_PREFIX: &str = "Fondos para meta: ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    /// Always positive; expenses subtract from the balance by construction
    pub amount: f64,
    /// Category key, e.g. "food". Unknown keys are tolerated and collapse
    /// into the "other" bucket at aggregation time.
    pub category: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Structural link to the goal this expense funds, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Expense {
    /// Generate a unique expense ID. Format: `expense::<uuid>`
    pub fn generate_id() -> String {
        format!("expense::{}", Uuid::new_v4())
    }

    /// Whether this expense was created by the add-funds operation.
    pub fn is_goal_funding(&self) -> bool {
        self.goal_id.is_some()
    }

    /// Notes text for a funding expense, `"Fondos para meta: <title>"`.
    pub fn funding_note(goal_title: &str) -> String {
        format!("{}{}", GOAL_FUNDING_NOTE_PREFIX, goal_title)
    }
}

impl From<Expense> for shared::Expense {
    fn from(expense: Expense) -> Self {
        shared::Expense {
            id: expense.id,
            description: expense.description,
            amount: expense.amount,
            category: expense.category,
            date: expense.date,
            notes: expense.notes,
            goal_id: expense.goal_id,
            user_id: expense.user_id,
            created_at: expense.created_at,
        }
    }
}
