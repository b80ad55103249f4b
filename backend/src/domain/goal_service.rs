//! Goal management and funding.
//!
//! `current_amount` is deliberately untouchable through the general update
//! path; money enters a goal only through [`GoalService::add_funds`], which
//! also records the linked savings expense so total expenses stay consistent
//! with money routed into goals. Both records change under the store's write
//! lock, so they can never diverge in memory; a failed persistence write
//! surfaces as a warning on the result (optimistic-write policy).

use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, Utc};
use tracing::info;

use crate::domain::categories::SAVINGS_CATEGORY_KEY;
use crate::domain::commands::goal::{
    AddFundsCommand, AddFundsResult, CreateGoalCommand, CreateGoalResult, DeleteGoalCommand,
    DeleteGoalResult, GoalListResult, UpdateGoalCommand, UpdateGoalResult,
};
use crate::domain::error::{not_found, validation};
use crate::domain::models::expense::Expense;
use crate::domain::models::goal::Goal;
use crate::domain::store::FinanceStore;

#[derive(Clone)]
pub struct GoalService {
    store: Arc<FinanceStore>,
}

impl GoalService {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    pub fn list_goals(&self) -> GoalListResult {
        GoalListResult {
            goals: self.store.read(|s| s.goals.clone()),
        }
    }

    pub fn create_goal(&self, command: CreateGoalCommand) -> Result<CreateGoalResult> {
        info!("Creating goal: {:?}", command);

        let title = command.title.trim();
        if title.is_empty() {
            return Err(validation("El título de la meta no puede estar vacío"));
        }
        if title.len() > 256 {
            return Err(validation("El título no puede superar 256 caracteres"));
        }
        if !command.target_amount.is_finite() || command.target_amount <= 0.0 {
            return Err(validation("El monto objetivo debe ser positivo"));
        }
        let current_amount = command.current_amount.unwrap_or(0.0);
        if !current_amount.is_finite() || current_amount < 0.0 {
            return Err(validation("El monto inicial no puede ser negativo"));
        }
        if command.deadline.trim().is_empty() {
            return Err(validation("La fecha límite es obligatoria"));
        }

        let goal = Goal {
            id: Goal::generate_id(),
            title: title.to_string(),
            description: clean_description(command.description),
            target_amount: command.target_amount,
            current_amount,
            deadline: command.deadline.trim().to_string(),
            user_id: self.store.session().map(|u| u.uid),
            created_at: Utc::now().to_rfc3339(),
        };

        let warning = self.store.insert_goal(goal.clone());
        info!("Successfully created goal: {}", goal.id);

        Ok(CreateGoalResult {
            goal,
            success_message: "Meta creada correctamente".to_string(),
            warning,
        })
    }

    /// Update title, description, target and deadline. `current_amount` is
    /// carried over untouched.
    pub fn update_goal(&self, command: UpdateGoalCommand) -> Result<UpdateGoalResult> {
        info!("Updating goal: {:?}", command);

        let title = command.title.trim();
        if title.is_empty() {
            return Err(validation("El título de la meta no puede estar vacío"));
        }
        if title.len() > 256 {
            return Err(validation("El título no puede superar 256 caracteres"));
        }
        if !command.target_amount.is_finite() || command.target_amount <= 0.0 {
            return Err(validation("El monto objetivo debe ser positivo"));
        }
        if command.deadline.trim().is_empty() {
            return Err(validation("La fecha límite es obligatoria"));
        }

        let existing = self
            .store
            .read(|s| s.goals.iter().find(|g| g.id == command.id).cloned())
            .ok_or_else(|| not_found(format!("No existe la meta {}", command.id)))?;

        let updated = Goal {
            id: existing.id,
            title: title.to_string(),
            description: clean_description(command.description),
            target_amount: command.target_amount,
            current_amount: existing.current_amount,
            deadline: command.deadline.trim().to_string(),
            user_id: existing.user_id,
            created_at: existing.created_at,
        };

        let warning = self.store.update_goal(updated.clone())?;

        Ok(UpdateGoalResult {
            goal: updated,
            success_message: "Meta actualizada correctamente".to_string(),
            warning,
        })
    }

    /// Delete a goal. Funding expenses that pointed at it stay in the
    /// expense collection as plain records; their dangling link is
    /// tolerated everywhere.
    pub fn delete_goal(&self, command: DeleteGoalCommand) -> Result<DeleteGoalResult> {
        info!("Deleting goal: {}", command.id);
        let warning = self.store.remove_goal(&command.id)?;
        Ok(DeleteGoalResult {
            success_message: "Meta eliminada correctamente".to_string(),
            warning,
        })
    }

    /// Route money into a goal: bump `current_amount` and record the linked
    /// savings expense in one store operation.
    pub fn add_funds(&self, command: AddFundsCommand) -> Result<AddFundsResult> {
        info!("Adding funds to goal {}: {}", command.goal_id, command.amount);

        if !command.amount.is_finite() || command.amount <= 0.0 {
            return Err(validation("El monto a añadir debe ser positivo"));
        }

        let mut goal = self
            .store
            .read(|s| s.goals.iter().find(|g| g.id == command.goal_id).cloned())
            .ok_or_else(|| not_found(format!("No existe la meta {}", command.goal_id)))?;

        goal.current_amount += command.amount;

        let expense = Expense {
            id: Expense::generate_id(),
            description: goal.title.clone(),
            amount: command.amount,
            category: SAVINGS_CATEGORY_KEY.to_string(),
            date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            notes: Some(Expense::funding_note(&goal.title)),
            goal_id: Some(goal.id.clone()),
            user_id: self.store.session().map(|u| u.uid),
            created_at: Utc::now().to_rfc3339(),
        };

        let warning = self.store.insert_expense(expense.clone(), Some(goal.clone()));
        info!(
            "Added {} to goal {}, linked expense {}",
            command.amount, goal.id, expense.id
        );

        Ok(AddFundsResult {
            goal,
            expense,
            success_message: "Fondos añadidos correctamente a tu meta".to_string(),
            warning,
        })
    }
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::expense::ExpenseListQuery;
    use crate::domain::expense_service::ExpenseService;
    use crate::storage::{FileDocumentStore, FileSnapshotStore};

    fn create_test_services() -> (GoalService, ExpenseService, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let documents = Arc::new(FileDocumentStore::new(dir.path().join("documents")).unwrap());
        let snapshots = Arc::new(FileSnapshotStore::new(dir.path().join("local")).unwrap());
        let store = FinanceStore::new(documents, snapshots).expect("Failed to init store");
        (
            GoalService::new(store.clone()),
            ExpenseService::new(store),
            dir,
        )
    }

    fn create_command(target: f64) -> CreateGoalCommand {
        CreateGoalCommand {
            title: "Viaje a Cartagena".to_string(),
            description: Some("Vacaciones".to_string()),
            target_amount: target,
            current_amount: None,
            deadline: "2026-12".to_string(),
        }
    }

    #[test]
    fn test_goal_creation() {
        let (service, _, _dir) = create_test_services();
        let result = service.create_goal(create_command(1000.0)).unwrap();
        assert_eq!(result.goal.title, "Viaje a Cartagena");
        assert_eq!(result.goal.current_amount, 0.0);
        assert_eq!(result.goal.progress(), 0.0);
    }

    #[test]
    fn test_goal_creation_rejects_bad_input() {
        let (service, _, _dir) = create_test_services();
        assert!(service.create_goal(create_command(0.0)).is_err());
        assert!(service.create_goal(create_command(-10.0)).is_err());

        let mut command = create_command(100.0);
        command.title = "  ".to_string();
        assert!(service.create_goal(command).is_err());

        let mut command = create_command(100.0);
        command.current_amount = Some(-1.0);
        assert!(service.create_goal(command).is_err());
    }

    #[test]
    fn test_update_goal_preserves_current_amount() {
        let (service, _, _dir) = create_test_services();
        let goal = service.create_goal(create_command(1000.0)).unwrap().goal;
        service
            .add_funds(AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 250.0,
            })
            .unwrap();

        let updated = service
            .update_goal(UpdateGoalCommand {
                id: goal.id,
                title: "Viaje más largo".to_string(),
                description: None,
                target_amount: 2000.0,
                deadline: "2027-06".to_string(),
            })
            .unwrap();

        assert_eq!(updated.goal.current_amount, 250.0);
        assert_eq!(updated.goal.target_amount, 2000.0);
    }

    #[test]
    fn test_add_funds_creates_linked_savings_expense() {
        let (service, expenses, _dir) = create_test_services();
        let goal = service.create_goal(create_command(1000.0)).unwrap().goal;

        let result = service
            .add_funds(AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 100.0,
            })
            .unwrap();

        assert_eq!(result.goal.current_amount, 100.0);
        assert_eq!(result.expense.category, "savings");
        assert_eq!(result.expense.goal_id.as_deref(), Some(goal.id.as_str()));
        assert_eq!(
            result.expense.notes.as_deref(),
            Some("Fondos para meta: Viaje a Cartagena")
        );

        // the funding expense counts as a regular expense
        let listed = expenses.list_expenses(ExpenseListQuery::default()).unwrap();
        assert_eq!(listed.expenses.len(), 1);
        assert_eq!(listed.expenses[0].amount, 100.0);
    }

    #[test]
    fn test_add_funds_rejects_non_positive_amount_without_mutation() {
        let (service, expenses, _dir) = create_test_services();
        let goal = service.create_goal(create_command(1000.0)).unwrap().goal;

        for amount in [0.0, -50.0, f64::NAN] {
            let result = service.add_funds(AddFundsCommand {
                goal_id: goal.id.clone(),
                amount,
            });
            assert!(result.is_err());
        }

        let after = service.list_goals().goals.remove(0);
        assert_eq!(after.current_amount, 0.0);
        assert!(expenses
            .list_expenses(ExpenseListQuery::default())
            .unwrap()
            .expenses
            .is_empty());
    }

    #[test]
    fn test_add_funds_unknown_goal_is_not_found() {
        let (service, _, _dir) = create_test_services();
        let err = service
            .add_funds(AddFundsCommand {
                goal_id: "goal::ghost".to_string(),
                amount: 10.0,
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::domain::error::DomainError>(),
            Some(crate::domain::error::DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_funding_symmetry_add_then_delete_restores_goal() {
        let (service, expenses, _dir) = create_test_services();
        let goal = service.create_goal(create_command(1000.0)).unwrap().goal;

        service
            .add_funds(AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 40.0,
            })
            .unwrap();
        let funded = service
            .add_funds(AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 100.0,
            })
            .unwrap();
        assert_eq!(funded.goal.current_amount, 140.0);

        expenses
            .delete_expense(crate::domain::commands::expense::DeleteExpenseCommand {
                id: funded.expense.id,
            })
            .unwrap();

        let after = service.list_goals().goals.remove(0);
        assert_eq!(after.current_amount, 40.0);
    }

    #[test]
    fn test_progress_reaches_and_caps_at_100() {
        let (service, _, _dir) = create_test_services();
        let goal = service.create_goal(create_command(100.0)).unwrap().goal;
        let result = service
            .add_funds(AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 150.0,
            })
            .unwrap();
        assert_eq!(result.goal.current_amount, 150.0);
        assert_eq!(result.goal.progress(), 100.0);
    }
}
