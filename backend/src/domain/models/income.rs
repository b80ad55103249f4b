//! Domain model for an income record.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: String,
    pub description: String,
    /// Always positive; incomes add to the balance
    pub amount: f64,
    /// Category key from the income vocabulary: salary, freelance,
    /// investment, gift, other
    pub category: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Income {
    /// Generate a unique income ID. Format: `income::<uuid>`
    pub fn generate_id() -> String {
        format!("income::{}", Uuid::new_v4())
    }
}

impl From<Income> for shared::Income {
    fn from(income: Income) -> Self {
        shared::Income {
            id: income.id,
            description: income.description,
            amount: income.amount,
            category: income.category,
            date: income.date,
            notes: income.notes,
            user_id: income.user_id,
            created_at: income.created_at,
        }
    }
}
