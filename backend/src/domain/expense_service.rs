//! Expense management.
//!
//! Beyond plain CRUD this service owns the reverse side of the goal-funding
//! linkage: deleting a funding expense hands the money back to its goal,
//! editing one adjusts the goal by the delta, and re-categorizing one away
//! from savings withdraws its contribution and detaches the link.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::domain::categories::SAVINGS_CATEGORY_KEY;
use crate::domain::commands::expense::{
    CreateExpenseCommand, CreateExpenseResult, DeleteExpenseCommand, DeleteExpenseResult,
    ExpenseListQuery, ExpenseListResult, UpdateExpenseCommand, UpdateExpenseResult,
};
use crate::domain::error::{not_found, validation};
use crate::domain::models::expense::Expense;
use crate::domain::models::goal::Goal;
use crate::domain::month_filter::{filter_by_month, parse_month_param, parse_record_date};
use crate::domain::store::FinanceStore;

#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<FinanceStore>,
}

impl ExpenseService {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    /// List expenses, optionally narrowed to one calendar month.
    pub fn list_expenses(&self, query: ExpenseListQuery) -> Result<ExpenseListResult> {
        let key = parse_month_param(query.month.as_deref())?;
        let expenses = self.store.read(|s| filter_by_month(&s.expenses, key));
        Ok(ExpenseListResult { expenses })
    }

    pub fn create_expense(&self, command: CreateExpenseCommand) -> Result<CreateExpenseResult> {
        info!("Creating expense: {:?}", command);
        let (description, amount, category, date, notes) = validate_fields(
            &command.description,
            command.amount,
            &command.category,
            &command.date,
            command.notes,
        )?;

        let expense = Expense {
            id: Expense::generate_id(),
            description,
            amount,
            category,
            date,
            notes,
            goal_id: None,
            user_id: self.store.session().map(|u| u.uid),
            created_at: Utc::now().to_rfc3339(),
        };

        let warning = self.store.insert_expense(expense.clone(), None);
        info!("Successfully created expense: {}", expense.id);

        Ok(CreateExpenseResult {
            expense,
            success_message: "Gasto registrado correctamente".to_string(),
            warning,
        })
    }

    /// Replace every user-editable field of an expense.
    pub fn update_expense(&self, command: UpdateExpenseCommand) -> Result<UpdateExpenseResult> {
        info!("Updating expense: {:?}", command);
        let (description, amount, category, date, notes) = validate_fields(
            &command.description,
            command.amount,
            &command.category,
            &command.date,
            command.notes,
        )?;

        let existing = self
            .store
            .read(|s| s.expenses.iter().find(|e| e.id == command.id).cloned())
            .ok_or_else(|| not_found(format!("No existe el gasto {}", command.id)))?;

        let mut updated = Expense {
            id: existing.id.clone(),
            description,
            amount,
            category,
            date,
            notes,
            goal_id: existing.goal_id.clone(),
            user_id: existing.user_id.clone(),
            created_at: existing.created_at.clone(),
        };

        let goal_update = self.funding_adjustment(&existing, Some(&mut updated));
        let warning = self.store.update_expense(updated.clone(), goal_update)?;
        info!("Successfully updated expense: {}", updated.id);

        Ok(UpdateExpenseResult {
            expense: updated,
            success_message: "Gasto actualizado correctamente".to_string(),
            warning,
        })
    }

    pub fn delete_expense(&self, command: DeleteExpenseCommand) -> Result<DeleteExpenseResult> {
        info!("Deleting expense: {}", command.id);
        let existing = self
            .store
            .read(|s| s.expenses.iter().find(|e| e.id == command.id).cloned())
            .ok_or_else(|| not_found(format!("No existe el gasto {}", command.id)))?;

        let goal_update = self.funding_adjustment(&existing, None);
        let warning = self.store.remove_expense(&command.id, goal_update)?;

        Ok(DeleteExpenseResult {
            success_message: "Gasto eliminado correctamente".to_string(),
            warning,
        })
    }

    /// Goal adjustment implied by editing (`Some`) or deleting (`None`) a
    /// funding expense. Non-funding expenses and orphaned links adjust
    /// nothing. The goal's amount never drops below zero.
    fn funding_adjustment(&self, existing: &Expense, updated: Option<&mut Expense>) -> Option<Goal> {
        let goal_id = existing.goal_id.clone()?;
        let Some(mut goal) = self
            .store
            .read(|s| s.goals.iter().find(|g| g.id == goal_id).cloned())
        else {
            // the goal was deleted out from under its funding expenses
            warn!(
                "funding expense {} references missing goal {}, no adjustment",
                existing.id, goal_id
            );
            return None;
        };

        match updated {
            None => {
                goal.current_amount = (goal.current_amount - existing.amount).max(0.0);
                Some(goal)
            }
            Some(updated) => {
                if updated.category == SAVINGS_CATEGORY_KEY {
                    let delta = updated.amount - existing.amount;
                    if delta == 0.0 {
                        return None;
                    }
                    goal.current_amount = (goal.current_amount + delta).max(0.0);
                    Some(goal)
                } else {
                    // no longer a savings expense: withdraw the contribution
                    // and detach the link
                    updated.goal_id = None;
                    goal.current_amount = (goal.current_amount - existing.amount).max(0.0);
                    Some(goal)
                }
            }
        }
    }
}

/// Shared field validation for create and update. Returns the cleaned
/// values; any failure aborts before any state is touched.
fn validate_fields(
    description: &str,
    amount: f64,
    category: &str,
    date: &str,
    notes: Option<String>,
) -> Result<(String, f64, String, String, Option<String>)> {
    let description = description.trim();
    if description.is_empty() {
        return Err(validation("La descripción no puede estar vacía"));
    }
    if description.len() > 256 {
        return Err(validation("La descripción no puede superar 256 caracteres"));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(validation("El monto debe ser un número positivo"));
    }
    let category = category.trim();
    if category.is_empty() {
        return Err(validation("La categoría es obligatoria"));
    }
    if parse_record_date(date).is_none() {
        return Err(validation("La fecha debe tener formato AAAA-MM-DD"));
    }
    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok((
        description.to_string(),
        amount,
        category.to_string(),
        date.to_string(),
        notes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::goal_service::GoalService;
    use crate::storage::{FileDocumentStore, FileSnapshotStore};

    fn create_test_services() -> (ExpenseService, GoalService, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let documents = Arc::new(FileDocumentStore::new(dir.path().join("documents")).unwrap());
        let snapshots = Arc::new(FileSnapshotStore::new(dir.path().join("local")).unwrap());
        let store = FinanceStore::new(documents, snapshots).expect("Failed to init store");
        (
            ExpenseService::new(store.clone()),
            GoalService::new(store),
            dir,
        )
    }

    fn create_command(amount: f64, category: &str) -> CreateExpenseCommand {
        CreateExpenseCommand {
            description: "Gasto de prueba".to_string(),
            amount,
            category: category.to_string(),
            date: "2024-03-10".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_create_expense() {
        let (service, _, _dir) = create_test_services();
        let result = service
            .create_expense(create_command(120.0, "food"))
            .expect("Failed to create expense");
        assert_eq!(result.expense.amount, 120.0);
        assert!(result.warning.is_none());
        assert_eq!(
            service.list_expenses(ExpenseListQuery::default()).unwrap().expenses.len(),
            1
        );
    }

    #[test]
    fn test_create_expense_rejects_bad_input() {
        let (service, _, _dir) = create_test_services();
        assert!(service.create_expense(create_command(0.0, "food")).is_err());
        assert!(service.create_expense(create_command(-5.0, "food")).is_err());
        assert!(service.create_expense(create_command(f64::NAN, "food")).is_err());

        let mut command = create_command(10.0, "food");
        command.description = "   ".to_string();
        assert!(service.create_expense(command).is_err());

        let mut command = create_command(10.0, "food");
        command.date = "10/03/2024".to_string();
        assert!(service.create_expense(command).is_err());

        // nothing was stored
        assert!(service
            .list_expenses(ExpenseListQuery::default())
            .unwrap()
            .expenses
            .is_empty());
    }

    #[test]
    fn test_list_expenses_by_month() {
        let (service, _, _dir) = create_test_services();
        let mut march = create_command(10.0, "food");
        march.date = "2024-03-05".to_string();
        service.create_expense(march).unwrap();
        let mut april = create_command(20.0, "food");
        april.date = "2024-04-05".to_string();
        service.create_expense(april).unwrap();

        let query = ExpenseListQuery {
            month: Some("2024-03".to_string()),
        };
        let result = service.list_expenses(query).unwrap();
        assert_eq!(result.expenses.len(), 1);
        assert_eq!(result.expenses[0].date, "2024-03-05");

        assert!(service
            .list_expenses(ExpenseListQuery { month: Some("marzo".to_string()) })
            .is_err());
    }

    #[test]
    fn test_delete_funding_expense_returns_money_to_goal() {
        let (expenses, goals, _dir) = create_test_services();
        let goal = goals
            .create_goal(crate::domain::commands::goal::CreateGoalCommand {
                title: "Viaje".to_string(),
                description: None,
                target_amount: 1000.0,
                current_amount: None,
                deadline: "2026-12".to_string(),
            })
            .unwrap()
            .goal;

        let funded = goals
            .add_funds(crate::domain::commands::goal::AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 100.0,
            })
            .unwrap();
        assert_eq!(funded.goal.current_amount, 100.0);

        expenses
            .delete_expense(DeleteExpenseCommand {
                id: funded.expense.id.clone(),
            })
            .unwrap();

        let after = goals.list_goals().goals.remove(0);
        assert_eq!(after.current_amount, 0.0);
    }

    #[test]
    fn test_editing_funding_expense_adjusts_goal_by_delta() {
        let (expenses, goals, _dir) = create_test_services();
        let goal = goals
            .create_goal(crate::domain::commands::goal::CreateGoalCommand {
                title: "Viaje".to_string(),
                description: None,
                target_amount: 1000.0,
                current_amount: None,
                deadline: "2026-12".to_string(),
            })
            .unwrap()
            .goal;
        let funded = goals
            .add_funds(crate::domain::commands::goal::AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 100.0,
            })
            .unwrap();

        expenses
            .update_expense(UpdateExpenseCommand {
                id: funded.expense.id.clone(),
                description: funded.expense.description.clone(),
                amount: 60.0,
                category: funded.expense.category.clone(),
                date: funded.expense.date.clone(),
                notes: funded.expense.notes.clone(),
            })
            .unwrap();

        let after = goals.list_goals().goals.remove(0);
        assert_eq!(after.current_amount, 60.0);
    }

    #[test]
    fn test_recategorizing_funding_expense_detaches_link() {
        let (expenses, goals, _dir) = create_test_services();
        let goal = goals
            .create_goal(crate::domain::commands::goal::CreateGoalCommand {
                title: "Viaje".to_string(),
                description: None,
                target_amount: 1000.0,
                current_amount: None,
                deadline: "2026-12".to_string(),
            })
            .unwrap()
            .goal;
        let funded = goals
            .add_funds(crate::domain::commands::goal::AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 100.0,
            })
            .unwrap();

        let updated = expenses
            .update_expense(UpdateExpenseCommand {
                id: funded.expense.id.clone(),
                description: "Ya no es ahorro".to_string(),
                amount: 100.0,
                category: "entertainment".to_string(),
                date: funded.expense.date.clone(),
                notes: None,
            })
            .unwrap();

        assert!(updated.expense.goal_id.is_none());
        let after = goals.list_goals().goals.remove(0);
        assert_eq!(after.current_amount, 0.0);

        // deleting the detached expense must not touch the goal again
        expenses
            .delete_expense(DeleteExpenseCommand {
                id: funded.expense.id,
            })
            .unwrap();
        let after = goals.list_goals().goals.remove(0);
        assert_eq!(after.current_amount, 0.0);
    }

    #[test]
    fn test_deleting_orphaned_funding_expense_does_not_fault() {
        let (expenses, goals, _dir) = create_test_services();
        let goal = goals
            .create_goal(crate::domain::commands::goal::CreateGoalCommand {
                title: "Viaje".to_string(),
                description: None,
                target_amount: 1000.0,
                current_amount: None,
                deadline: "2026-12".to_string(),
            })
            .unwrap()
            .goal;
        let funded = goals
            .add_funds(crate::domain::commands::goal::AddFundsCommand {
                goal_id: goal.id.clone(),
                amount: 100.0,
            })
            .unwrap();

        goals
            .delete_goal(crate::domain::commands::goal::DeleteGoalCommand { id: goal.id })
            .unwrap();

        // the funding expense is orphaned; deleting it still succeeds
        expenses
            .delete_expense(DeleteExpenseCommand {
                id: funded.expense.id,
            })
            .unwrap();
        assert!(expenses
            .list_expenses(ExpenseListQuery::default())
            .unwrap()
            .expenses
            .is_empty());
    }

    #[test]
    fn test_unknown_expense_is_not_found() {
        let (service, _, _dir) = create_test_services();
        let err = service
            .delete_expense(DeleteExpenseCommand {
                id: "expense::ghost".to_string(),
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::domain::error::DomainError>(),
            Some(crate::domain::error::DomainError::NotFound(_))
        ));
    }
}
