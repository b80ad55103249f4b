//! Domain model for a savings goal.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_amount: f64,
    /// Only mutated through add-funds and the funding-expense linkage
    pub current_amount: f64,
    /// A calendar date or a free-text month/year, e.g. "Diciembre 2026"
    pub deadline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Goal {
    /// Generate a unique goal ID. Format: `goal::<uuid>`
    pub fn generate_id() -> String {
        format!("goal::{}", Uuid::new_v4())
    }

    /// Completion percentage, clamped to 0..=100. A non-positive target
    /// yields 0 rather than a division fault.
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).clamp(0.0, 100.0)
    }
}

impl From<Goal> for shared::Goal {
    fn from(goal: Goal) -> Self {
        let progress = goal.progress();
        shared::Goal {
            id: goal.id,
            title: goal.title,
            description: goal.description,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            deadline: goal.deadline,
            user_id: goal.user_id,
            created_at: goal.created_at,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(current: f64, target: f64) -> Goal {
        Goal {
            id: "goal::test".to_string(),
            title: "Fondo de emergencia".to_string(),
            description: None,
            target_amount: target,
            current_amount: current,
            deadline: "2026-12".to_string(),
            user_id: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_progress_halfway() {
        assert_eq!(goal(50.0, 100.0).progress(), 50.0);
    }

    #[test]
    fn test_progress_caps_at_100() {
        assert_eq!(goal(250.0, 100.0).progress(), 100.0);
    }

    #[test]
    fn test_progress_zero_target_is_zero_not_nan() {
        assert_eq!(goal(50.0, 0.0).progress(), 0.0);
        assert_eq!(goal(50.0, -10.0).progress(), 0.0);
    }

    #[test]
    fn test_progress_never_negative() {
        assert_eq!(goal(-20.0, 100.0).progress(), 0.0);
    }
}
