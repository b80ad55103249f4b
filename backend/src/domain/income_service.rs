//! Income management: plain CRUD over the income collection.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::domain::commands::income::{
    CreateIncomeCommand, CreateIncomeResult, DeleteIncomeCommand, DeleteIncomeResult,
    IncomeListQuery, IncomeListResult, UpdateIncomeCommand, UpdateIncomeResult,
};
use crate::domain::error::{not_found, validation};
use crate::domain::models::income::Income;
use crate::domain::month_filter::{filter_by_month, parse_month_param, parse_record_date};
use crate::domain::store::FinanceStore;

#[derive(Clone)]
pub struct IncomeService {
    store: Arc<FinanceStore>,
}

impl IncomeService {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    /// List incomes, optionally narrowed to one calendar month.
    pub fn list_incomes(&self, query: IncomeListQuery) -> Result<IncomeListResult> {
        let key = parse_month_param(query.month.as_deref())?;
        let incomes = self.store.read(|s| filter_by_month(&s.incomes, key));
        Ok(IncomeListResult { incomes })
    }

    pub fn create_income(&self, command: CreateIncomeCommand) -> Result<CreateIncomeResult> {
        info!("Creating income: {:?}", command);
        let (description, amount, category, date, notes) = validate_fields(
            &command.description,
            command.amount,
            &command.category,
            &command.date,
            command.notes,
        )?;

        let income = Income {
            id: Income::generate_id(),
            description,
            amount,
            category,
            date,
            notes,
            user_id: self.store.session().map(|u| u.uid),
            created_at: Utc::now().to_rfc3339(),
        };

        let warning = self.store.insert_income(income.clone());
        info!("Successfully created income: {}", income.id);

        Ok(CreateIncomeResult {
            income,
            success_message: "Ingreso registrado correctamente".to_string(),
            warning,
        })
    }

    pub fn update_income(&self, command: UpdateIncomeCommand) -> Result<UpdateIncomeResult> {
        info!("Updating income: {:?}", command);
        let (description, amount, category, date, notes) = validate_fields(
            &command.description,
            command.amount,
            &command.category,
            &command.date,
            command.notes,
        )?;

        let existing = self
            .store
            .read(|s| s.incomes.iter().find(|i| i.id == command.id).cloned())
            .ok_or_else(|| not_found(format!("No existe el ingreso {}", command.id)))?;

        let updated = Income {
            id: existing.id,
            description,
            amount,
            category,
            date,
            notes,
            user_id: existing.user_id,
            created_at: existing.created_at,
        };

        let warning = self.store.update_income(updated.clone())?;

        Ok(UpdateIncomeResult {
            income: updated,
            success_message: "Ingreso actualizado correctamente".to_string(),
            warning,
        })
    }

    pub fn delete_income(&self, command: DeleteIncomeCommand) -> Result<DeleteIncomeResult> {
        info!("Deleting income: {}", command.id);
        let warning = self.store.remove_income(&command.id)?;
        Ok(DeleteIncomeResult {
            success_message: "Ingreso eliminado correctamente".to_string(),
            warning,
        })
    }
}

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
