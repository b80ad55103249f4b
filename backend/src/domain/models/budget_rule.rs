//! Domain model for budget rules.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The built-in rule. It must always exist, is not editable and not
/// deletable, and is the fallback active rule.
pub const DEFAULT_RULE_ID: &str = "50-30-20";

/// One allocation of a rule: a share of income plus the expense-category
/// keys whose spending counts toward it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCategory {
    pub name: String,
    /// Share of total income, 0..=100
    pub percentage: f64,
    pub color: String,
    /// Expense-category keys mapped to this allocation. Older records have
    /// no mapping; evaluation falls back to the fixed bucket table by name.
    #[serde(default)]
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub categories: Vec<RuleCategory>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl BudgetRule {
    /// Generate a unique rule ID. Format: `rule::<uuid>`
    pub fn generate_id() -> String {
        format!("rule::{}", Uuid::new_v4())
    }

    /// Sum of the category percentages. Valid rules sum to 100; evaluation
    /// must not assume they do.
    pub fn percentage_sum(&self) -> f64 {
        self.categories.iter().map(|c| c.percentage).sum()
    }

    /// The built-in 50/30/20 rule with its fixed expense-category mapping.
    pub fn default_rule() -> BudgetRule {
        BudgetRule {
            id: DEFAULT_RULE_ID.to_string(),
            name: "50/30/20".to_string(),
            description: Some(
                "50% needs, 30% wants, 20% savings".to_string(),
            ),
            categories: vec![
                RuleCategory {
                    name: "Needs".to_string(),
                    percentage: 50.0,
                    color: "#0ea5e9".to_string(),
                    matches: vec![
                        "housing".to_string(),
                        "food".to_string(),
                        "transport".to_string(),
                        "utilities".to_string(),
                        "health".to_string(),
                    ],
                },
                RuleCategory {
                    name: "Wants".to_string(),
                    percentage: 30.0,
                    color: "#8b5cf6".to_string(),
                    matches: vec!["entertainment".to_string(), "other".to_string()],
                },
                RuleCategory {
                    name: "Savings".to_string(),
                    percentage: 20.0,
                    color: "#10b981".to_string(),
                    matches: vec!["savings".to_string()],
                },
            ],
            is_default: true,
            user_id: None,
        }
    }
}

impl From<RuleCategory> for shared::BudgetRuleCategory {
    fn from(category: RuleCategory) -> Self {
        shared::BudgetRuleCategory {
            name: category.name,
            percentage: category.percentage,
            color: category.color,
            matches: category.matches,
        }
    }
}

impl From<BudgetRule> for shared::BudgetRule {
    fn from(rule: BudgetRule) -> Self {
        shared::BudgetRule {
            id: rule.id,
            name: rule.name,
            description: rule.description,
            categories: rule.categories.into_iter().map(Into::into).collect(),
            is_default: rule.is_default,
        }
    }
}
