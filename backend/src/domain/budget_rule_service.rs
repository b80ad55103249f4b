//! Budget rule management and evaluation.
//!
//! Rules are validated at the edges: percentages must sum to 100 when a
//! rule is created or edited, and never again. Evaluation takes whatever is
//! stored — a rule corrupted below the service (drifted percentages, odd
//! mappings) still evaluates row by row instead of faulting.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::categories::default_bucket_matches;
use crate::domain::commands::budget_rule::{
    CreateRuleCommand, CreateRuleResult, DeleteRuleCommand, DeleteRuleResult, EvaluateRuleQuery,
    EvaluateRuleResult, RuleCategoryInput, RuleListResult, SetActiveRuleCommand,
    SetActiveRuleResult, UpdateRuleCommand, UpdateRuleResult,
};
use crate::domain::error::{not_found, validation};
use crate::domain::models::budget_rule::{BudgetRule, RuleCategory, DEFAULT_RULE_ID};
use crate::domain::models::expense::Expense;
use crate::domain::store::FinanceStore;

/// Tolerance for the percentage-sum check; covers decimal inputs like
/// 33.3 + 33.3 + 33.4 without letting 99 or 101 through.
const PERCENTAGE_SUM_TOLERANCE: f64 = 0.01;

#[derive(Clone)]
pub struct BudgetRuleService {
    store: Arc<FinanceStore>,
}

impl BudgetRuleService {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    pub fn list_rules(&self) -> RuleListResult {
        self.store.read(|s| RuleListResult {
            rules: s.budget_rules.clone(),
            active_rule_id: s.active_budget_rule_id.clone(),
        })
    }

    pub fn create_rule(&self, command: CreateRuleCommand) -> Result<CreateRuleResult> {
        info!("Creating budget rule: {:?}", command);
        let (name, categories) = validate_rule_fields(&command.name, command.categories)?;

        let rule = BudgetRule {
            id: BudgetRule::generate_id(),
            name,
            description: command
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            categories,
            is_default: false,
            user_id: self.store.session().map(|u| u.uid),
        };

        let warning = self.store.insert_rule(rule.clone());
        info!("Successfully created budget rule: {}", rule.id);

        Ok(CreateRuleResult {
            rule,
            success_message: "Regla de presupuesto creada correctamente".to_string(),
            warning,
        })
    }

    pub fn update_rule(&self, command: UpdateRuleCommand) -> Result<UpdateRuleResult> {
        info!("Updating budget rule: {:?}", command);

        let existing = self
            .store
            .read(|s| s.budget_rules.iter().find(|r| r.id == command.id).cloned())
            .ok_or_else(|| not_found(format!("No existe la regla {}", command.id)))?;
        if existing.is_default {
            return Err(validation("La regla 50/30/20 no se puede editar"));
        }

        let (name, categories) = validate_rule_fields(&command.name, command.categories)?;

        let updated = BudgetRule {
            id: existing.id,
            name,
            description: command
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            categories,
            is_default: false,
            user_id: existing.user_id,
        };

        let warning = self.store.update_rule(updated.clone())?;

        Ok(UpdateRuleResult {
            rule: updated,
            success_message: "Regla de presupuesto actualizada correctamente".to_string(),
            warning,
        })
    }

    /// Delete a rule. The built-in rule is explicitly protected; deleting
    /// the active rule makes the built-in one active again.
    pub fn delete_rule(&self, command: DeleteRuleCommand) -> Result<DeleteRuleResult> {
        info!("Deleting budget rule: {}", command.id);
        if command.id == DEFAULT_RULE_ID {
            return Err(validation("La regla 50/30/20 no se puede eliminar"));
        }
        let warning = self.store.remove_rule(&command.id)?;
        Ok(DeleteRuleResult {
            success_message: "Regla de presupuesto eliminada correctamente".to_string(),
            warning,
        })
    }

    pub fn set_active_rule(&self, command: SetActiveRuleCommand) -> Result<SetActiveRuleResult> {
        info!("Setting active budget rule: {}", command.rule_id);
        let warning = self.store.set_active_rule(&command.rule_id)?;
        Ok(SetActiveRuleResult {
            active_rule_id: command.rule_id,
            success_message: "Regla activa cambiada correctamente".to_string(),
            warning,
        })
    }

    /// Evaluate a rule (the active one by default) against total income and
    /// the full expense collection.
    pub fn evaluate(&self, query: EvaluateRuleQuery) -> Result<EvaluateRuleResult> {
        let (rule, total_income, expenses) = self.store.read(|s| {
            let rule_id = query
                .rule_id
                .clone()
                .unwrap_or_else(|| s.active_budget_rule_id.clone());
            (
                s.budget_rules.iter().find(|r| r.id == rule_id).cloned(),
                s.incomes.iter().map(|i| i.amount).sum::<f64>(),
                s.expenses.clone(),
            )
        });
        let rule = rule.ok_or_else(|| {
            not_found(format!(
                "No existe la regla {}",
                query.rule_id.as_deref().unwrap_or("activa")
            ))
        })?;

        let categories = evaluate_rule(&rule, total_income, &expenses);
        Ok(EvaluateRuleResult {
            rule_id: rule.id,
            rule_name: rule.name,
            categories,
        })
    }
}

/// Compute target, actual and completion per rule category.
///
/// A category with an explicit mapping counts exactly those expense
/// categories; one without falls back to the fixed bucket table, which only
/// resolves the classic Needs/Wants/Savings names — anything else simply
/// reports zero actual spending. `percent` is capped at 100; `over_target`
/// and the raw amounts keep over-spending representable.
pub fn evaluate_rule(
    rule: &BudgetRule,
    total_income: f64,
    expenses: &[Expense],
) -> Vec<shared::RuleCategoryValue> {
    rule.categories
        .iter()
        .map(|category| {
            let current = matched_spending(category, expenses);
            let target = total_income * category.percentage / 100.0;
            let percent = if target > 0.0 {
                (current / target * 100.0).min(100.0)
            } else {
                0.0
            };
            shared::RuleCategoryValue {
                name: category.name.clone(),
                percentage: category.percentage,
                color: category.color.clone(),
                target,
                current,
                percent,
                over_target: current > target,
            }
        })
        .collect()
}

fn matched_spending(category: &RuleCategory, expenses: &[Expense]) -> f64 {
    let fallback = default_bucket_matches(&category.name);
    let is_match = |key: &str| {
        if category.matches.is_empty() {
            fallback.contains(&key)
        } else {
            category.matches.iter().any(|m| m == key)
        }
    };
    expenses
        .iter()
        .filter(|e| is_match(&e.category))
        .map(|e| e.amount)
        .sum()
}

fn validate_rule_fields(
    name: &str,
    categories: Vec<RuleCategoryInput>,
) -> Result<(String, Vec<RuleCategory>)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(validation("El nombre de la regla no puede estar vacío"));
    }
    if categories.is_empty() {
        return Err(validation("La regla debe tener al menos una categoría"));
    }

    let mut cleaned = Vec::with_capacity(categories.len());
    for category in categories {
        let category_name = category.name.trim();
        if category_name.is_empty() {
            return Err(validation("Las categorías de la regla necesitan un nombre"));
        }
        if !category.percentage.is_finite()
            || category.percentage < 0.0
            || category.percentage > 100.0
        {
            return Err(validation(format!(
                "El porcentaje de \"{category_name}\" debe estar entre 0 y 100"
            )));
        }
        cleaned.push(RuleCategory {
            name: category_name.to_string(),
            percentage: category.percentage,
            color: category.color.trim().to_string(),
            matches: category.matches.unwrap_or_default(),
        });
    }

    let sum: f64 = cleaned.iter().map(|c| c.percentage).sum();
    if (sum - 100.0).abs() > PERCENTAGE_SUM_TOLERANCE {
        return Err(validation(format!(
            "Los porcentajes deben sumar 100% (actual: {sum}%)"
        )));
    }

    Ok((name.to_string(), cleaned))
}
